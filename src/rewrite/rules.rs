//! 改写规则：有序的正则查找/替换表
//! 内置一套针对 proxmox_virtual_environment_container 的规则，也可从 YAML 文件加载

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::{read_file, FleetError, Result};

// ── 规则描述（可序列化） ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Replacement {
    /// regex 替换串，`${1}` 引用捕获组
    Template { with: String },
    /// 整个匹配逐行加 `  # ` 前缀，空行清空
    CommentLines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub replace: Replacement,
}

impl RuleSpec {
    fn template(name: &str, pattern: &str, with: &str) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replace: Replacement::Template { with: with.into() },
        }
    }
}

/// 规则文件格式；缺省字段取内置值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleFile {
    /// 多行模式，`.` 不跨行
    pub line_rules: Vec<RuleSpec>,
    /// 多行模式，`.` 跨行
    pub block_rules: Vec<RuleSpec>,
    /// 为空时不插入 lifecycle 块
    pub lifecycle_ignore: Vec<String>,
}

impl Default for RuleFile {
    fn default() -> Self {
        let line_rules = vec![
            RuleSpec::template(
                "description",
                r"(\s+)(description\s*=.*)",
                "${1}# ${2}  # Commented to avoid changes",
            ),
            RuleSpec::template(
                "tags",
                r"(\s+)tags\s*=\s*\[.*?\]",
                r#"${1}tags        = ["btd"]  # Using existing tag to match current state"#,
            ),
            RuleSpec::template(
                "unprivileged",
                r"(\s+)(unprivileged\s*=.*)",
                "${1}# ${2}  # Removed to prevent recreation",
            ),
            RuleSpec::template(
                "start_on_boot",
                r"(\s+)(start_on_boot\s*=.*)",
                "${1}# ${2}  # Removed to prevent changes",
            ),
            RuleSpec::template(
                "hostname",
                r#"(\s+hostname\s*=\s*"[^"]+)\.btd\.internal""#,
                r#"${1}"  # Simplified to match current state"#,
            ),
        ];

        let block_rules = vec![
            RuleSpec::template(
                "dns",
                r"(\s+)(dns\s*\{[^}]*\})",
                "${1}# dns {\n${1}#   servers = var.network_dns\n${1}# }",
            ),
            RuleSpec::template(
                "user_account",
                r"(\s+)(user_account\s*\{[^}]*\})",
                "${1}# user_account {  # Removed to prevent recreation\n${1}#   keys = var.ssh_public_keys\n${1}# }",
            ),
            RuleSpec {
                name: "startup".into(),
                pattern: r"(\s+)(startup\s*\{[^}]*?\n\s*\})".into(),
                replace: Replacement::CommentLines,
            },
        ];

        let lifecycle_ignore = [
            "description",
            "operating_system[0].template_file_id",
            "initialization[0].user_account",
            "initialization[0].dns",
            "startup",
            "start_on_boot",
            "unprivileged",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self { line_rules, block_rules, lifecycle_ignore }
    }
}

// ── 编译后的规则 ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    regex: Regex,
    replace: Replacement,
}

impl CompiledRule {
    fn compile(spec: &RuleSpec, dot_all: bool) -> Result<Self> {
        let regex = RegexBuilder::new(&spec.pattern)
            .multi_line(true)
            .dot_matches_new_line(dot_all)
            .build()
            .map_err(|e| FleetError::Config(format!("rule {}: {}", spec.name, e)))?;
        Ok(Self { name: spec.name.clone(), regex, replace: spec.replace.clone() })
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.replace {
            Replacement::Template { with } => self.regex.replace_all(text, with.as_str()).into_owned(),
            Replacement::CommentLines => self
                .regex
                .replace_all(text, |caps: &Captures| comment_lines(&caps[0]))
                .into_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub line: Vec<CompiledRule>,
    pub block: Vec<CompiledRule>,
    pub lifecycle_ignore: Vec<String>,
}

impl RuleSet {
    pub fn compile(file: &RuleFile) -> Result<Self> {
        Ok(Self {
            line: file.line_rules.iter().map(|r| CompiledRule::compile(r, false)).collect::<Result<_>>()?,
            block: file.block_rules.iter().map(|r| CompiledRule::compile(r, true)).collect::<Result<_>>()?,
            lifecycle_ignore: file.lifecycle_ignore.clone(),
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::compile(&RuleFile::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file: RuleFile = serde_yaml::from_str(&read_file(path)?)?;
        Self::compile(&file)
    }
}

pub fn comment_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| if line.trim().is_empty() { String::new() } else { format!("  # {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn lifecycle_block(ignore: &[String]) -> String {
    let entries: Vec<String> = ignore.iter().map(|i| format!("      {}", i)).collect();
    format!("\n  lifecycle {{\n    ignore_changes = [\n{}\n    ]\n  }}", entries.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> CompiledRule {
        let set = RuleSet::builtin().unwrap();
        set.line.into_iter().chain(set.block).find(|r| r.name == name).unwrap()
    }

    #[test]
    fn builtin_rules_compile() {
        let set = RuleSet::builtin().unwrap();
        assert_eq!(set.line.len(), 5);
        assert_eq!(set.block.len(), 3);
        assert_eq!(set.lifecycle_ignore.len(), 7);
    }

    #[test]
    fn description_is_commented_in_place() {
        let out = rule("description").apply("{\n  description = \"Redis cache\"\n  cores = 2\n}");
        assert_eq!(out, "{\n  # description = \"Redis cache\"  # Commented to avoid changes\n  cores = 2\n}");
    }

    #[test]
    fn hostname_suffix_is_dropped() {
        let out = rule("hostname").apply("\n    hostname = \"btd-redis-01.btd.internal\"\n");
        assert_eq!(out, "\n    hostname = \"btd-redis-01\"  # Simplified to match current state\n");
    }

    #[test]
    fn comment_lines_prefixes_non_blank_lines() {
        assert_eq!(comment_lines("\n  startup {\n   \n  }"), "\n  #   startup {\n\n  #   }");
    }

    #[test]
    fn lifecycle_block_lists_entries() {
        let block = lifecycle_block(&["a".to_string(), "b".to_string()]);
        assert_eq!(block, "\n  lifecycle {\n    ignore_changes = [\n      a,\n      b\n    ]\n  }");
    }

    #[test]
    fn rule_file_fields_default_to_builtin() {
        let file: RuleFile = serde_yaml::from_str(
            "line_rules:\n  - name: cores\n    pattern: '(\\s+)cores\\s*=\\s*\\d+'\n    replace: {kind: template, with: '${1}cores = 4'}\n",
        )
        .unwrap();
        assert_eq!(file.line_rules.len(), 1);
        assert_eq!(file.block_rules, RuleFile::default().block_rules);

        let set = RuleSet::compile(&file).unwrap();
        assert_eq!(set.line[0].apply("\n  cores = 2"), "\n  cores = 4");
    }

    #[test]
    fn invalid_pattern_names_the_rule() {
        let file = RuleFile {
            line_rules: vec![RuleSpec::template("broken", "(unclosed", "")],
            ..RuleFile::default()
        };
        let err = RuleSet::compile(&file).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
