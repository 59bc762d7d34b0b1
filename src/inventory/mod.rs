pub mod generator;
pub mod output;
pub mod terraform;

use std::path::Path;
use tracing::info;

use crate::config::InventoryConf;
use crate::utils::Result;

pub fn run_inventory(terraform_output: &Path, inventory_output: &Path, conf: &InventoryConf) -> Result<()> {
    println!("Loading Terraform outputs from: {}", terraform_output.display());
    let outputs = terraform::load(terraform_output)?;

    println!("Generating Ansible inventory...");
    let inventory = generator::generate(&outputs, conf)?;
    info!(
        infrastructure = inventory.infrastructure_count(),
        services = inventory.service_count(),
        "inventory generated"
    );

    output::print_summary(&inventory);
    output::write(&inventory, inventory_output)?;

    println!("✓ Inventory generation complete");
    Ok(())
}
