pub mod error;
pub mod types;

pub use error::{FleetError, Result};

use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| FleetError::io(path, e))
}

/// 写文件前先创建缺失的父目录
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FleetError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| FleetError::io(path, e))
}

/// 键不存在时才使用默认值；显式的 null 原样保留
pub fn field_or(obj: &serde_json::Map<String, serde_json::Value>, key: &str, default: serde_json::Value) -> serde_json::Value {
    obj.get(key).cloned().unwrap_or(default)
}
