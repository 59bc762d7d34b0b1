use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pvefleet")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Terraform / Ansible / Proxmox VE bridge tools for LXC fleets", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $PVEFLEET_CONFIG, then ./pvefleet.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an Ansible inventory from `terraform output -json`
    #[command(arg_required_else_help = true)]
    Inventory {
        /// Terraform output JSON file
        terraform_output: PathBuf,

        /// Inventory YAML file to write
        inventory_output: PathBuf,
    },

    /// Compare expected LXC containers with the live Proxmox cluster
    Audit {
        /// Proxmox host (overrides proxmox.host)
        #[arg(long)]
        host: Option<String>,

        /// Proxmox API port (overrides proxmox.port)
        #[arg(long)]
        port: Option<u16>,

        /// Directory for the JSON reports (overrides audit.output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Verify the API's TLS certificate
        #[arg(long)]
        verify_tls: bool,
    },

    /// Rewrite container resources in main.tf so re-applying keeps them
    Rewrite {
        /// Terraform file to read
        #[arg(short, long, default_value = "main.tf")]
        input: PathBuf,

        /// Output file (default: <input>.updated)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML rules file replacing the built-in rule set
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_without_paths_is_a_usage_error() {
        let err = Cli::try_parse_from(["pvefleet", "inventory"]).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rewrite_defaults_to_main_tf() {
        let cli = Cli::try_parse_from(["pvefleet", "-vv", "rewrite"]).ok().unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Rewrite { input, output, rules } => {
                assert_eq!(input, PathBuf::from("main.tf"));
                assert!(output.is_none() && rules.is_none());
            }
            _ => panic!("expected rewrite"),
        }
    }
}
