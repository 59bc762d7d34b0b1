//! Terraform 输出 → Ansible 库存结构
//! 纯函数：相同输入得到逐字节相同的 YAML

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::config::InventoryConf;
use crate::inventory::terraform::{TerraformOutputs, INFRA_OUTPUT, SERVICE_OUTPUT};
use crate::utils::{field_or, Result};

// ── 数据结构 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub all: AllGroup,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllGroup {
    pub children: Children,
    pub vars: GlobalVars,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalVars {
    pub ansible_ssh_private_key_file: String,
    pub ansible_ssh_common_args: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupVars {
    pub ansible_user: String,
    pub ansible_python_interpreter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub btd_app_root: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostGroup<H> {
    pub hosts: BTreeMap<String, H>,
    pub vars: GroupVars,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfraHost {
    pub ansible_host: Value,
    pub container_id: Value,
    pub vmid: Value,
    pub node: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHost {
    #[serde(flatten)]
    pub base: InfraHost,
    pub service_name: Value,
    pub service_port: Value,
    pub grpc_port: Value,
}

/// 只含主机名的角色分组，如 database_servers
#[derive(Debug, Clone, Serialize)]
pub struct RoleMembers {
    pub hosts: BTreeMap<String, BTreeMap<String, Value>>,
}

/// children 的键顺序即字段顺序：infrastructure, services, 再按 RoleGroup::ALL
#[derive(Debug, Clone, Serialize)]
pub struct Children {
    pub infrastructure: HostGroup<InfraHost>,
    pub services: HostGroup<ServiceHost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestrator_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_servers: Option<RoleMembers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_servers: Option<RoleMembers>,
}

impl Children {
    fn new(infrastructure: HostGroup<InfraHost>, services: HostGroup<ServiceHost>) -> Self {
        Self {
            infrastructure,
            services,
            orchestrator_servers: None,
            auth_servers: None,
            user_servers: None,
            messaging_servers: None,
            database_servers: None,
            cache_servers: None,
            storage_servers: None,
        }
    }

    fn slot_mut(&mut self, role: RoleGroup) -> &mut Option<RoleMembers> {
        match role {
            RoleGroup::Orchestrator => &mut self.orchestrator_servers,
            RoleGroup::Auth         => &mut self.auth_servers,
            RoleGroup::User         => &mut self.user_servers,
            RoleGroup::Messaging    => &mut self.messaging_servers,
            RoleGroup::Database     => &mut self.database_servers,
            RoleGroup::Cache        => &mut self.cache_servers,
            RoleGroup::Storage      => &mut self.storage_servers,
        }
    }

    pub fn role(&self, role: RoleGroup) -> Option<&RoleMembers> {
        match role {
            RoleGroup::Orchestrator => self.orchestrator_servers.as_ref(),
            RoleGroup::Auth         => self.auth_servers.as_ref(),
            RoleGroup::User         => self.user_servers.as_ref(),
            RoleGroup::Messaging    => self.messaging_servers.as_ref(),
            RoleGroup::Database     => self.database_servers.as_ref(),
            RoleGroup::Cache        => self.cache_servers.as_ref(),
            RoleGroup::Storage      => self.storage_servers.as_ref(),
        }
    }

    /// 非空的角色分组，按固定顺序
    pub fn roles(&self) -> impl Iterator<Item = (RoleGroup, &RoleMembers)> + '_ {
        RoleGroup::ALL.into_iter().filter_map(move |r| self.role(r).map(|m| (r, m)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoleGroup {
    Orchestrator,
    Auth,
    User,
    Messaging,
    Database,
    Cache,
    Storage,
}

impl RoleGroup {
    pub const ALL: [RoleGroup; 7] = [
        RoleGroup::Orchestrator,
        RoleGroup::Auth,
        RoleGroup::User,
        RoleGroup::Messaging,
        RoleGroup::Database,
        RoleGroup::Cache,
        RoleGroup::Storage,
    ];

    pub fn group_name(self) -> &'static str {
        match self {
            RoleGroup::Orchestrator => "orchestrator_servers",
            RoleGroup::Auth         => "auth_servers",
            RoleGroup::User         => "user_servers",
            RoleGroup::Messaging    => "messaging_servers",
            RoleGroup::Database     => "database_servers",
            RoleGroup::Cache        => "cache_servers",
            RoleGroup::Storage      => "storage_servers",
        }
    }
}

// 按顺序匹配，首个命中者胜出
const INFRA_ROLES: &[(&str, RoleGroup)] = &[
    ("postgres", RoleGroup::Database),
    ("redis",    RoleGroup::Cache),
    ("minio",    RoleGroup::Storage),
];

const SERVICE_ROLES: &[(&str, RoleGroup)] = &[
    ("orchestrator", RoleGroup::Orchestrator),
    ("auth",         RoleGroup::Auth),
    ("user",         RoleGroup::User),
    ("messaging",    RoleGroup::Messaging),
];

pub fn classify(hostname: &str, rules: &[(&str, RoleGroup)]) -> Option<RoleGroup> {
    let lower = hostname.to_lowercase();
    rules
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, role)| *role)
}

// ── 生成 ────────────────────────────────────────────────────────────────────

pub fn generate(outputs: &TerraformOutputs, conf: &InventoryConf) -> Result<Inventory> {
    let mut infrastructure = BTreeMap::new();
    for (name, d) in outputs.containers(INFRA_OUTPUT)? {
        infrastructure.insert(name, infra_host(&d, conf));
    }

    let mut services = BTreeMap::new();
    for (name, d) in outputs.containers(SERVICE_OUTPUT)? {
        let host = ServiceHost {
            base:         infra_host(&d, conf),
            service_name: field_or(&d, "service_name", json!(name)),
            service_port: field_or(&d, "service_port", json!(conf.default_service_port)),
            grpc_port:    field_or(&d, "grpc_port", json!(conf.default_grpc_port)),
        };
        services.insert(name, host);
    }

    let mut members: BTreeMap<RoleGroup, Vec<String>> = BTreeMap::new();
    let tagged = infrastructure.keys().map(|h| (h, INFRA_ROLES))
        .chain(services.keys().map(|h| (h, SERVICE_ROLES)));
    for (hostname, rules) in tagged {
        if let Some(role) = classify(hostname, rules) {
            members.entry(role).or_default().push(hostname.clone());
        }
    }

    let mut children = Children::new(
        HostGroup { hosts: infrastructure, vars: group_vars(conf, None) },
        HostGroup { hosts: services, vars: group_vars(conf, Some(conf.app_root.clone())) },
    );
    for (role, hosts) in members {
        let hosts = hosts.into_iter().map(|h| (h, BTreeMap::new())).collect();
        *children.slot_mut(role) = Some(RoleMembers { hosts });
    }

    Ok(Inventory {
        all: AllGroup {
            children,
            vars: GlobalVars {
                ansible_ssh_private_key_file: conf.ssh_private_key_file.clone(),
                ansible_ssh_common_args:      conf.ssh_common_args.clone(),
            },
        },
    })
}

fn infra_host(d: &serde_json::Map<String, Value>, conf: &InventoryConf) -> InfraHost {
    InfraHost {
        ansible_host: field_or(d, "ip_address", json!("")),
        container_id: field_or(d, "container_id", json!("")),
        vmid:         field_or(d, "vmid", json!("")),
        node:         field_or(d, "node", json!(conf.default_node)),
    }
}

fn group_vars(conf: &InventoryConf, app_root: Option<String>) -> GroupVars {
    GroupVars {
        ansible_user: conf.ansible_user.clone(),
        ansible_python_interpreter: conf.python_interpreter.clone(),
        btd_app_root: app_root,
    }
}

impl Inventory {
    pub fn infrastructure_count(&self) -> usize {
        self.all.children.infrastructure.hosts.len()
    }

    pub fn service_count(&self) -> usize {
        self.all.children.services.hosts.len()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
