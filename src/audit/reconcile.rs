//! 预期清单与集群实际状态的对账
//! 先查预期节点，未命中再扫描其余节点；节点列表每次运行只取一次

use tracing::debug;

use crate::audit::api::{LxcConfig, LxcStatus, ProxmoxApi};
use crate::audit::output;
use crate::audit::report::{AuditReport, ContainerRecord};
use crate::config::NamingConf;
use crate::utils::types::ExpectedContainer;
use crate::utils::Result;

#[derive(Debug, Clone)]
pub struct Located {
    pub node: String,
    pub config: LxcConfig,
    pub status: Option<LxcStatus>,
}

pub struct Locator<'a, A: ProxmoxApi + ?Sized> {
    api: &'a A,
    nodes: Option<Vec<String>>,
}

impl<'a, A: ProxmoxApi + ?Sized> Locator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api, nodes: None }
    }

    fn nodes(&mut self) -> Result<&[String]> {
        if self.nodes.is_none() {
            let nodes = self.api.cluster_nodes()?;
            debug!("cluster nodes: {:?}", nodes);
            self.nodes = Some(nodes);
        }
        Ok(self.nodes.as_deref().unwrap_or_default())
    }

    pub fn locate(&mut self, expected: &ExpectedContainer) -> Result<Option<Located>> {
        if let Some(found) = self.try_node(&expected.node, expected.vmid)? {
            return Ok(Some(found));
        }

        let api = self.api;
        let vmid = expected.vmid;
        for node in self.nodes()?.iter().filter(|n| **n != expected.node) {
            if let Some(config) = api.container_config(node, vmid)? {
                debug!("vmid {} found on {} instead of {}", vmid, node, expected.node);
                let status = api.container_status(node, vmid)?;
                return Ok(Some(Located { node: node.clone(), config, status }));
            }
        }
        Ok(None)
    }

    fn try_node(&self, node: &str, vmid: u32) -> Result<Option<Located>> {
        let Some(config) = self.api.container_config(node, vmid)? else {
            return Ok(None);
        };
        let status = self.api.container_status(node, vmid)?;
        Ok(Some(Located { node: node.to_string(), config, status }))
    }
}

/// 逐个核对预期容器，过程中打印进度
pub fn reconcile<A: ProxmoxApi + ?Sized>(
    api: &A,
    expected: &[ExpectedContainer],
    naming: &NamingConf,
) -> Result<AuditReport> {
    let mut locator = Locator::new(api);
    let mut containers = Vec::new();
    let mut mapping = Vec::new();
    let mut missing = Vec::new();

    for exp in expected {
        println!("\nChecking VMID {} ({})...", exp.vmid, exp.name);

        match locator.locate(exp)? {
            Some(found) => {
                if let Some(notice) = output::relocation_notice(exp, &found.node) {
                    println!("{}", notice);
                }
                let record = ContainerRecord::build(exp, &found.node, &found.config, found.status.as_ref());
                output::print_found(&record);
                mapping.push(record.mapping(naming));
                containers.push(record);
            }
            None => {
                output::print_missing();
                missing.push(exp.clone());
            }
        }
    }

    Ok(AuditReport {
        collected_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string(),
        expected_total: expected.len(),
        containers,
        mapping,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FleetError;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// 内存中的假集群：(node, vmid) → hostname
    struct FakeCluster {
        nodes: Vec<String>,
        containers: HashMap<(String, u32), String>,
        node_calls: Cell<usize>,
        config_calls: Cell<usize>,
    }

    impl FakeCluster {
        fn new(nodes: &[&str], containers: &[(&str, u32, &str)]) -> Self {
            Self {
                nodes: nodes.iter().map(|n| n.to_string()).collect(),
                containers: containers
                    .iter()
                    .map(|(node, vmid, host)| ((node.to_string(), *vmid), host.to_string()))
                    .collect(),
                node_calls: Cell::new(0),
                config_calls: Cell::new(0),
            }
        }
    }

    impl ProxmoxApi for FakeCluster {
        fn cluster_nodes(&self) -> Result<Vec<String>> {
            self.node_calls.set(self.node_calls.get() + 1);
            Ok(self.nodes.clone())
        }

        fn container_config(&self, node: &str, vmid: u32) -> Result<Option<LxcConfig>> {
            self.config_calls.set(self.config_calls.get() + 1);
            Ok(self.containers.get(&(node.to_string(), vmid)).map(|host| LxcConfig {
                hostname: Some(host.clone()),
                cores: Some(2),
                rootfs: Some(format!("local-lvm:vm-{}-disk-0,size=8G", vmid)),
                net0: Some("name=eth0,bridge=vmbr0,ip=10.27.27.10/23".into()),
                ..LxcConfig::default()
            }))
        }

        fn container_status(&self, node: &str, vmid: u32) -> Result<Option<LxcStatus>> {
            Ok(self.containers.get(&(node.to_string(), vmid)).map(|_| LxcStatus {
                status: Some(format!("running-on-{}", node)),
            }))
        }
    }

    struct BrokenCluster;

    impl ProxmoxApi for BrokenCluster {
        fn cluster_nodes(&self) -> Result<Vec<String>> {
            Err(FleetError::Api { status: 401, url: "/nodes".into() })
        }
        fn container_config(&self, _: &str, _: u32) -> Result<Option<LxcConfig>> {
            Ok(None)
        }
        fn container_status(&self, _: &str, _: u32) -> Result<Option<LxcStatus>> {
            Ok(None)
        }
    }

    #[test]
    fn found_on_expected_node_skips_scan() {
        let api = FakeCluster::new(&["pve1", "pve2"], &[("pve1", 300, "btd-postgres-01")]);
        let mut locator = Locator::new(&api);
        let found = locator
            .locate(&ExpectedContainer::new(300, "btd-postgres-01", "pve1"))
            .unwrap()
            .expect("found");
        assert_eq!(found.node, "pve1");
        assert_eq!(api.node_calls.get(), 0);
    }

    #[test]
    fn fallback_reports_actual_node() {
        let api = FakeCluster::new(
            &["pve1", "pve2", "pve3"],
            &[("pve3", 301, "btd-redis-01"), ("pve1", 300, "btd-postgres-01")],
        );
        let expected = vec![
            ExpectedContainer::new(300, "btd-postgres-01", "pve1"),
            ExpectedContainer::new(301, "btd-redis-01", "pve1"),
        ];
        let report = reconcile(&api, &expected, &NamingConf::default()).unwrap();

        assert_eq!(report.containers.len(), 2);
        let redis = &report.containers[1];
        assert_eq!(redis.node, "pve3");
        assert_eq!(redis.state, "running-on-pve3");
        assert_eq!(redis.expected_name, "btd-redis-01");
        assert_eq!(report.mapping[1].node, "pve3");
        assert_eq!(report.mapping[1].resource_name, "redis");
        assert!(report.missing.is_empty());
    }

    #[test]
    fn first_alternate_node_in_api_order_wins() {
        let api = FakeCluster::new(
            &["pve1", "pve3", "pve2"],
            &[("pve2", 320, "btd-payment-01"), ("pve3", 320, "btd-payment-01")],
        );
        let mut locator = Locator::new(&api);
        let found = locator
            .locate(&ExpectedContainer::new(320, "btd-payment-01", "pve1"))
            .unwrap()
            .expect("found");
        assert_eq!(found.node, "pve3");
        assert_eq!(found.status.and_then(|s| s.status).as_deref(), Some("running-on-pve3"));
        // pve1 落空，pve3 命中即停止，不再查 pve2
        assert_eq!(api.config_calls.get(), 2);
    }

    #[test]
    fn missing_containers_are_listed_and_node_list_cached() {
        let api = FakeCluster::new(&["pve1", "pve2"], &[]);
        let expected = vec![
            ExpectedContainer::new(310, "btd-auth-01", "pve1"),
            ExpectedContainer::new(311, "btd-users-01", "pve2"),
        ];
        let report = reconcile(&api, &expected, &NamingConf::default()).unwrap();

        assert!(report.containers.is_empty());
        assert_eq!(report.missing, expected);
        assert_eq!(report.expected_total, 2);
        assert_eq!(api.node_calls.get(), 1);
        // 每个 vmid：预期节点 1 次 + 另一节点 1 次
        assert_eq!(api.config_calls.get(), 4);
    }

    #[test]
    fn api_errors_abort_the_run() {
        let expected = vec![ExpectedContainer::new(300, "btd-postgres-01", "pve1")];
        let err = reconcile(&BrokenCluster, &expected, &NamingConf::default()).unwrap_err();
        assert!(matches!(err, FleetError::Api { status: 401, .. }));
    }
}
