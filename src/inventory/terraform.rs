//! Terraform `output -json` 读取
//! 只关心 infrastructure_containers / service_containers 两个输出

use serde_json::{Map, Value};
use std::path::Path;

use crate::utils::{read_file, FleetError, Result};

pub const INFRA_OUTPUT: &str = "infrastructure_containers";
pub const SERVICE_OUTPUT: &str = "service_containers";

/// `terraform output -json` 的顶层对象
#[derive(Debug, Clone)]
pub struct TerraformOutputs {
    raw: Value,
}

impl TerraformOutputs {
    pub fn from_value(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(FleetError::Parse("terraform outputs must be a JSON object".into()));
        }
        Ok(Self { raw })
    }

    /// `<output>.value` 下的 name → details；输出不存在时为空
    pub fn containers(&self, output: &str) -> Result<Vec<(String, Map<String, Value>)>> {
        let value = &self.raw[output]["value"];
        let Some(obj) = value.as_object() else {
            if !value.is_null() {
                return Err(FleetError::Parse(format!("{}.value is not an object", output)));
            }
            return Ok(vec![]);
        };

        obj.iter()
            .map(|(name, details)| {
                details
                    .as_object()
                    .cloned()
                    .map(|d| (name.clone(), d))
                    .ok_or_else(|| FleetError::Parse(format!("{}.value.{} is not an object", output, name)))
            })
            .collect()
    }
}

pub fn load(path: &Path) -> Result<TerraformOutputs> {
    let text = read_file(path)?;
    let raw: Value = serde_json::from_str(&text)?;
    TerraformOutputs::from_value(raw)
}
