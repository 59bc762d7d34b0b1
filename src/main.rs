mod audit;
mod cli;
mod config;
mod inventory;
mod logging;
mod rewrite;
mod utils;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Inventory { terraform_output, inventory_output } => {
            inventory::run_inventory(&terraform_output, &inventory_output, &config.inventory)
                .context("generating Ansible inventory")
        }
        Commands::Audit { host, port, output_dir, verify_tls } => {
            let overrides = audit::AuditOverrides { host, port, output_dir, verify_tls };
            audit::run_audit(config, overrides).context("auditing Proxmox containers")
        }
        Commands::Rewrite { input, output, rules } => {
            rewrite::run_rewrite(&input, output.as_deref(), rules.as_deref())
                .with_context(|| format!("rewriting {}", input.display()))
        }
    }
}
