//! 输出层：写 YAML 库存文件并打印摘要

use std::path::Path;

use crate::inventory::generator::Inventory;
use crate::utils::{write_file, Result};

pub fn write(inventory: &Inventory, path: &Path) -> Result<()> {
    write_file(path, &inventory.to_yaml()?)?;
    println!("✓ Ansible inventory generated: {}", path.display());
    Ok(())
}

pub fn print_summary(inventory: &Inventory) {
    let infra = inventory.infrastructure_count();
    let services = inventory.service_count();

    println!("\n{}", "=".repeat(40));
    println!("Inventory Summary");
    println!("{}", "=".repeat(40));
    println!("Infrastructure hosts: {}", infra);
    println!("Service hosts: {}", services);
    println!("Total hosts: {}", infra + services);
    for (role, members) in inventory.all.children.roles() {
        println!("  {:<22} {}", role.group_name(), members.hosts.len());
    }
    println!("{}\n", "=".repeat(40));
}
