use serde::{Deserialize, Serialize};

/// 运维人员认为应当存在的容器：(vmid, 名称, 预期节点)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedContainer {
    pub vmid: u32,
    pub name: String,
    pub node: String,
}

impl ExpectedContainer {
    pub fn new(vmid: u32, name: &str, node: &str) -> Self {
        Self { vmid, name: name.to_string(), node: node.to_string() }
    }
}

impl std::fmt::Display for ExpectedContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}@{})", self.vmid, self.name, self.node)
    }
}

// 原始 btd 集群清单：基础设施 300-302，服务 310-327
const BTD_FLEET: &[(u32, &str, &str)] = &[
    (300, "btd-postgres-01",     "pveserver2"),
    (301, "btd-redis-01",        "pves3"),
    (302, "btd-minio-01",        "pveserver4"),
    (310, "btd-auth-01",         "pveserver2"),
    (311, "btd-users-01",        "pves3"),
    (312, "btd-messaging-01",    "pveserver4"),
    (313, "btd-matches-01",      "pveserver2"),
    (314, "btd-analytics-01",    "pves3"),
    (315, "btd-video-call-01",   "pveserver4"),
    (316, "btd-travel-01",       "pveserver2"),
    (317, "btd-moderation-01",   "pves3"),
    (318, "btd-permission-01",   "pveserver4"),
    (319, "btd-notification-01", "pveserver2"),
    (320, "btd-payment-01",      "pves3"),
    (321, "btd-admin-01",        "pveserver4"),
    (322, "btd-ai-01",           "pveserver2"),
    (323, "btd-jobs-01",         "pves3"),
    (324, "btd-location-01",     "pveserver4"),
    (325, "btd-limits-01",       "pveserver2"),
    (326, "btd-files-01",        "pves3"),
    (327, "btd-orchestrator-01", "pveserver4"),
];

pub fn default_fleet() -> Vec<ExpectedContainer> {
    BTD_FLEET
        .iter()
        .map(|(vmid, name, node)| ExpectedContainer::new(*vmid, name, node))
        .collect()
}
