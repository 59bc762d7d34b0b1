//! PVE 配置串解析：net0 / rootfs 的 `k=v,k=v` 格式与资源命名

use std::collections::BTreeMap;
use tracing::warn;

use crate::config::NamingConf;

/// `name=eth0,bridge=vmbr0,ip=10.0.0.5/24` → {name, bridge, ip}
pub fn parse_net0(net0: &str) -> BTreeMap<String, String> {
    net0.split(',')
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `local-lvm:vm-300-disk-0,size=8G` → {storage, volume, size}
pub fn parse_rootfs(rootfs: &str) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    for part in rootfs.split(',') {
        if let Some((k, v)) = part.split_once('=') {
            result.insert(k.to_string(), v.to_string());
        } else if let Some((storage, volume)) = part.split_once(':') {
            result.insert("storage".to_string(), storage.to_string());
            result.insert("volume".to_string(), volume.to_string());
        }
    }
    result
}

/// 只认 `<n>G`，其他单位记为 0
pub fn parse_size_gb(size: &str) -> u64 {
    match size.strip_suffix('G') {
        Some(n) => n.trim().parse().unwrap_or_else(|_| {
            warn!("unparseable rootfs size {:?}, recording 0", size);
            0
        }),
        None => 0,
    }
}

/// btd-video-call-01 → video_call；再套用别名表
pub fn derive_resource_name(hostname: &str, naming: &NamingConf) -> String {
    let mut name = hostname.to_string();
    if !naming.strip_prefix.is_empty() {
        name = name.replace(&naming.strip_prefix, "");
    }
    if !naming.strip_suffix.is_empty() {
        name = name.replace(&naming.strip_suffix, "");
    }
    let name = name.replace('-', "_");

    naming.aliases.get(&name).cloned().unwrap_or(name)
}
