//! 顶层报告结构体

use serde::{Deserialize, Serialize};

use crate::audit::api::{LxcConfig, LxcStatus};
use crate::audit::parse::{derive_resource_name, parse_net0, parse_rootfs, parse_size_gb};
use crate::config::NamingConf;
use crate::utils::types::ExpectedContainer;

/// container-inventory.json 的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub vmid: u32,
    pub hostname: String,
    pub node: String,
    pub cores: u32,
    pub memory: u64,
    pub swap: u64,
    pub storage: String,
    pub size: u64,
    pub bridge: String,
    pub ip: String,
    pub state: String,
    pub expected_name: String,
}

/// terraform-mapping.json 的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub resource_name: String,
    pub vmid: u32,
    pub node: String,
    pub hostname: String,
    pub cores: u32,
    pub memory: u64,
    pub swap: u64,
    pub storage: String,
    pub size: u64,
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub collected_at: String,
    pub expected_total: usize,
    pub containers: Vec<ContainerRecord>,
    pub mapping: Vec<MappingEntry>,
    pub missing: Vec<ExpectedContainer>,
}

impl ContainerRecord {
    pub fn build(
        expected: &ExpectedContainer,
        node: &str,
        config: &LxcConfig,
        status: Option<&LxcStatus>,
    ) -> Self {
        let rootfs = parse_rootfs(config.rootfs.as_deref().unwrap_or(""));
        let net = parse_net0(config.net0.as_deref().unwrap_or(""));
        let size = rootfs.get("size").map(String::as_str).unwrap_or("0G");

        ContainerRecord {
            vmid:          expected.vmid,
            hostname:      config.hostname.clone().unwrap_or_else(|| "unknown".into()),
            node:          node.to_string(),
            cores:         config.cores.unwrap_or(1),
            memory:        config.memory.unwrap_or(1024),
            swap:          config.swap.unwrap_or(0),
            storage:       rootfs.get("storage").cloned().unwrap_or_else(|| "unknown".into()),
            size:          parse_size_gb(size),
            bridge:        net.get("bridge").cloned().unwrap_or_else(|| "vmbr0".into()),
            ip:            net.get("ip").cloned().unwrap_or_else(|| "dhcp".into()),
            state:         status.and_then(|s| s.status.clone()).unwrap_or_else(|| "unknown".into()),
            expected_name: expected.name.clone(),
        }
    }

    pub fn mapping(&self, naming: &NamingConf) -> MappingEntry {
        MappingEntry {
            resource_name: derive_resource_name(&self.hostname, naming),
            vmid:          self.vmid,
            node:          self.node.clone(),
            hostname:      self.hostname.clone(),
            cores:         self.cores,
            memory:        self.memory,
            swap:          self.swap,
            storage:       self.storage.clone(),
            size:          self.size,
            ip:            self.ip.clone(),
        }
    }
}
