pub mod api;
pub mod output;
pub mod parse;
pub mod reconcile;
pub mod report;

use std::path::PathBuf;
use tracing::info;

use crate::config::FleetConfig;
use crate::utils::Result;

/// 命令行对配置的覆盖项
#[derive(Debug, Default)]
pub struct AuditOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub output_dir: Option<PathBuf>,
    pub verify_tls: bool,
}

pub fn run_audit(mut config: FleetConfig, overrides: AuditOverrides) -> Result<()> {
    if let Some(host) = overrides.host {
        config.proxmox.host = host;
    }
    if let Some(port) = overrides.port {
        config.proxmox.port = port;
    }
    if let Some(dir) = overrides.output_dir {
        config.audit.output_dir = dir;
    }
    if overrides.verify_tls {
        config.proxmox.verify_tls = true;
    }

    let client = api::HttpApi::new(&config.proxmox)?;
    info!("querying {} for {} containers", config.proxmox.base_url(), config.audit.expected.len());

    println!("Querying Proxmox API for container configurations...");
    println!("{}", "=".repeat(80));

    let report = reconcile::reconcile(&client, &config.audit.expected, &config.audit.naming)?;

    output::print_summary(&report);
    let (inventory_path, mapping_path) = output::save(
        &report,
        &config.audit.output_dir,
        &config.audit.inventory_file,
        &config.audit.mapping_file,
    )?;
    info!("reports written to {}", config.audit.output_dir.display());
    print!("{}", output::closing_text(&report, &inventory_path, &mapping_path));

    Ok(())
}
