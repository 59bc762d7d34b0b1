//! Proxmox VE REST API 访问
//! 端点：/nodes, /nodes/{node}/lxc/{vmid}/config, /nodes/{node}/lxc/{vmid}/status/current

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{ProxmoxConf, TOKEN_ENV};
use crate::utils::{FleetError, Result};

// ── 数据结构 ────────────────────────────────────────────────────────────────

/// `lxc/{vmid}/config` 中用到的字段，其余忽略
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LxcConfig {
    pub hostname: Option<String>,
    pub cores: Option<u32>,
    pub memory: Option<u64>,
    pub swap: Option<u64>,
    pub rootfs: Option<String>,
    pub net0: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LxcStatus {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    node: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// 审计所需的三个查询；404 视为 `Ok(None)`，其余非 2xx 为错误
pub trait ProxmoxApi {
    fn cluster_nodes(&self) -> Result<Vec<String>>;
    fn container_config(&self, node: &str, vmid: u32) -> Result<Option<LxcConfig>>;
    fn container_status(&self, node: &str, vmid: u32) -> Result<Option<LxcStatus>>;
}

// ── HTTP 实现 ───────────────────────────────────────────────────────────────

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(conf: &ProxmoxConf) -> Result<Self> {
        let token = conf.token.as_deref().ok_or_else(|| {
            FleetError::Config(format!("no API token: set {} or proxmox.token", TOKEN_ENV))
        })?;
        Self::with_base_url(conf.base_url(), token, conf.verify_tls, Duration::from_secs(conf.timeout_secs))
    }

    pub fn with_base_url(base_url: String, token: &str, verify_tls: bool, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("PVEAPIToken={}", token))
            .map_err(|e| FleetError::Config(format!("invalid API token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        // 集群多为自签名证书
        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_tls)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        debug!("GET {} -> {}", url, status);

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FleetError::Api { status: status.as_u16(), url });
        }

        let body: Envelope<T> = resp.json()?;
        Ok(Some(body.data))
    }
}

impl ProxmoxApi for HttpApi {
    fn cluster_nodes(&self) -> Result<Vec<String>> {
        let nodes: Vec<NodeEntry> = self.get("/nodes")?
            .ok_or_else(|| FleetError::Api { status: 404, url: format!("{}/nodes", self.base_url) })?;
        Ok(nodes.into_iter().map(|n| n.node).collect())
    }

    fn container_config(&self, node: &str, vmid: u32) -> Result<Option<LxcConfig>> {
        self.get(&format!("/nodes/{}/lxc/{}/config", node, vmid))
    }

    fn container_status(&self, node: &str, vmid: u32) -> Result<Option<LxcStatus>> {
        self.get(&format!("/nodes/{}/lxc/{}/status/current", node, vmid))
    }
}
