//! 配置加载
//! 来源：--config / $PVEFLEET_CONFIG / ./pvefleet.yaml，外加 .env 与环境变量覆盖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::types::{default_fleet, ExpectedContainer};
use crate::utils::{read_file, FleetError, Result};

pub const CONFIG_ENV: &str = "PVEFLEET_CONFIG";
pub const TOKEN_ENV: &str = "PVEFLEET_API_TOKEN";
const DEFAULT_CONFIG_FILE: &str = "pvefleet.yaml";

// ── 数据结构 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub proxmox: ProxmoxConf,
    pub audit: AuditConf,
    pub inventory: InventoryConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxmoxConf {
    pub host: String,
    pub port: u16,
    /// `user@realm!tokenid=secret`
    pub token: Option<String>,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl Default for ProxmoxConf {
    fn default() -> Self {
        Self {
            host: "10.27.27.192".into(),
            port: 8006,
            token: None,
            verify_tls: false,
            timeout_secs: 30,
        }
    }
}

impl ProxmoxConf {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/api2/json", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConf {
    pub expected: Vec<ExpectedContainer>,
    pub naming: NamingConf,
    pub output_dir: PathBuf,
    pub inventory_file: String,
    pub mapping_file: String,
}

impl Default for AuditConf {
    fn default() -> Self {
        Self {
            expected: default_fleet(),
            naming: NamingConf::default(),
            output_dir: PathBuf::from("."),
            inventory_file: "container-inventory.json".into(),
            mapping_file: "terraform-mapping.json".into(),
        }
    }
}

/// hostname → Terraform 资源名 的改写规则
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConf {
    pub strip_prefix: String,
    pub strip_suffix: String,
    pub aliases: BTreeMap<String, String>,
}

impl Default for NamingConf {
    fn default() -> Self {
        let aliases = [
            ("jobs", "job_processing"),
            ("files", "file_processing"),
            ("limits", "match_limits"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            strip_prefix: "btd-".into(),
            strip_suffix: "-01".into(),
            aliases,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConf {
    pub default_node: String,
    pub default_service_port: u16,
    pub default_grpc_port: u16,
    pub ansible_user: String,
    pub python_interpreter: String,
    pub app_root: String,
    pub ssh_private_key_file: String,
    pub ssh_common_args: String,
}

impl Default for InventoryConf {
    fn default() -> Self {
        Self {
            default_node: "pve".into(),
            default_service_port: 3000,
            default_grpc_port: 50051,
            ansible_user: "root".into(),
            python_interpreter: "/usr/bin/python3".into(),
            app_root: "/opt/btd-app".into(),
            ssh_private_key_file: "~/.ssh/ansible_rsa".into(),
            ssh_common_args: "-o StrictHostKeyChecking=no".into(),
        }
    }
}

// ── 加载入口 ────────────────────────────────────────────────────────────────

pub fn load(explicit: Option<&Path>) -> Result<FleetConfig> {
    // .env 不存在也没关系
    dotenvy::dotenv().ok();

    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists())),
    };

    let mut config = match path {
        Some(p) => {
            info!("loading configuration from {}", p.display());
            parse(&read_file(&p)?)
                .map_err(|e| FleetError::Config(format!("{}: {}", p.display(), e)))?
        }
        None => {
            debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            FleetConfig::default()
        }
    };

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.proxmox.token = Some(token.trim().to_string());
        }
    }

    Ok(config)
}

fn parse(text: &str) -> Result<FleetConfig> {
    if text.trim().is_empty() {
        return Ok(FleetConfig::default());
    }
    Ok(serde_yaml::from_str(text)?)
}
