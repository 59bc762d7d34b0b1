//! 输出层：控制台进度、摘要、映射，以及两个 JSON 报告文件

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::audit::report::{AuditReport, ContainerRecord};
use crate::utils::types::ExpectedContainer;
use crate::utils::{write_file, Result};

pub fn print_found(r: &ContainerRecord) {
    println!("  ✓ Found: {}", r.hostname);
    println!("    Node: {}", r.node);
    println!("    Status: {}", r.state);
    println!("    Resources: {} cores, {}MB RAM, {}MB swap", r.cores, r.memory, r.swap);
    println!("    Storage: {}, {}GB", r.storage, r.size);
    println!("    Network: {}, IP={}", r.bridge, r.ip);
}

pub fn print_missing() {
    println!("  ✗ Not found on any node");
}

/// 预期节点未命中、在别处找到时的提示行
pub fn relocation_notice(expected: &ExpectedContainer, actual_node: &str) -> Option<String> {
    (expected.node != actual_node).then(|| format!("  Warning: Found on {} instead of {}", actual_node, expected.node))
}

pub fn summary_text(report: &AuditReport) -> String {
    let mut out = rule();
    out.push_str(&format!("Summary: Found {} of {} containers\n", report.containers.len(), report.expected_total));
    out.push_str(&format!("Collected at: {}\n", report.collected_at));
    for m in &report.missing {
        out.push_str(&format!("  missing: {}\n", m));
    }
    out
}

pub fn print_summary(report: &AuditReport) {
    print!("{}", summary_text(report));
}

/// 漂移提示：存储池分布与容器→节点映射
pub fn terraform_updates_text(report: &AuditReport) -> String {
    let mut out = rule();
    out.push_str("Terraform Configuration Updates Required:\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));

    let mut pools: BTreeMap<&str, usize> = BTreeMap::new();
    for c in &report.containers {
        *pools.entry(c.storage.as_str()).or_insert(0) += 1;
    }
    out.push_str("\n# Storage pools in use:\n");
    for (pool, count) in &pools {
        out.push_str(&format!("#   {}: {} container(s)\n", pool, count));
    }

    out.push_str("\n# Container-to-Node Mapping:\n");
    for item in &report.mapping {
        out.push_str(&format!(
            "# {}: node={}, vmid={}, ip={}\n",
            item.resource_name, item.node, item.vmid, item.ip
        ));
    }
    out
}

pub fn saved_files_text(inventory_path: &Path, mapping_path: &Path) -> String {
    format!(
        "\nConfiguration files saved:\n  - {}: Complete container details\n  - {}: Terraform resource mapping\n",
        inventory_path.display(),
        mapping_path.display()
    )
}

/// 运行末尾的输出：先是 Terraform 更新提示，已保存文件列表放在最后
pub fn closing_text(report: &AuditReport, inventory_path: &Path, mapping_path: &Path) -> String {
    let mut out = terraform_updates_text(report);
    out.push_str(&saved_files_text(inventory_path, mapping_path));
    out
}

/// 写 container-inventory.json 与 terraform-mapping.json，返回两个路径
pub fn save(report: &AuditReport, dir: &Path, inventory_file: &str, mapping_file: &str) -> Result<(PathBuf, PathBuf)> {
    let inventory_path = dir.join(inventory_file);
    let mapping_path = dir.join(mapping_file);

    write_file(&inventory_path, &serde_json::to_string_pretty(&report.containers)?)?;
    write_file(&mapping_path, &serde_json::to_string_pretty(&report.mapping)?)?;

    Ok((inventory_path, mapping_path))
}

fn rule() -> String {
    format!("\n{}\n", "=".repeat(80))
}
