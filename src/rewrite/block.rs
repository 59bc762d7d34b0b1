//! 资源块定位与逐块改写
//! 用括号配对找出每个 proxmox_virtual_environment_container 块，块外文本原样保留

use regex::Regex;
use std::ops::Range;
use tracing::{debug, warn};

use crate::rewrite::rules::{lifecycle_block, RuleSet};
use crate::utils::Result;

pub const CONTAINER_HEADER: &str = r#"resource "proxmox_virtual_environment_container""#;

// ── 块定位 ──────────────────────────────────────────────────────────────────

/// 每个容器资源块的字节范围（从 `resource` 到配对的 `}`）；注释里的资源头不算
pub fn find_container_blocks(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(start) = find_header(bytes, from) {
        let Some(open_rel) = text[start..].find('{') else { break };
        match matching_brace(bytes, start + open_rel) {
            Some(close) => {
                blocks.push(start..close + 1);
                from = close + 1;
            }
            None => {
                warn!("unbalanced braces in resource block at byte {}, leaving the rest untouched", start);
                break;
            }
        }
    }
    blocks
}

/// 从 `from` 起第一个位于代码中（不在字符串、注释内）的资源头
fn find_header(bytes: &[u8], from: usize) -> Option<usize> {
    let header = CONTAINER_HEADER.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i..].starts_with(header) {
            return Some(i);
        }
        i = skip_trivia(bytes, i)?;
    }
    None
}

/// 字符串与注释感知的单步前进；返回下一个待检查的位置，块注释未闭合时为 None
fn skip_trivia(bytes: &[u8], i: usize) -> Option<usize> {
    let next = match bytes[i] {
        b'"' => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b'"' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            j
        }
        b'#' => line_end(bytes, i),
        b'/' if bytes.get(i + 1) == Some(&b'/') => line_end(bytes, i),
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let rel = bytes[i + 2..].windows(2).position(|w| w == b"*/")?;
            i + 2 + rel + 1
        }
        _ => i,
    };
    Some(next + 1)
}

/// 跳过字符串与注释中的括号
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i = skip_trivia(bytes, i)?;
    }
    None
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| from + p)
        .unwrap_or(bytes.len())
}

// ── 改写 ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Rewritten {
    pub text: String,
    /// 实际改写过的资源名
    pub resources: Vec<String>,
}

pub struct Rewriter {
    rules: RuleSet,
    name_re: Regex,
}

impl Rewriter {
    pub fn new(rules: RuleSet) -> Result<Self> {
        let name_re = Regex::new(&format!(r#"{} "(\w+)""#, regex::escape(CONTAINER_HEADER)))?;
        Ok(Self { rules, name_re })
    }

    /// 资源名不是 `\w+` 的块返回 None
    pub fn rewrite_block(&self, block: &str) -> Option<(String, String)> {
        let name = self.name_re.captures(block)?.get(1)?.as_str().to_string();

        let mut out = block.to_string();
        for rule in self.rules.line.iter().chain(&self.rules.block) {
            let next = rule.apply(&out);
            if next != out {
                debug!("{}: rule {} applied", name, rule.name);
            }
            out = next;
        }

        if !self.rules.lifecycle_ignore.is_empty() && !out.contains("lifecycle {") {
            if let Some(last) = out.rfind('}') {
                out.insert_str(last, &format!("{}\n", lifecycle_block(&self.rules.lifecycle_ignore)));
            }
        }

        Some((name, out))
    }

    pub fn rewrite_document(&self, text: &str) -> Rewritten {
        let mut result = String::with_capacity(text.len() + 512);
        let mut resources = Vec::new();
        let mut cursor = 0;

        for range in find_container_blocks(text) {
            result.push_str(&text[cursor..range.start]);
            let block = &text[range.clone()];
            match self.rewrite_block(block) {
                Some((name, new_block)) => {
                    result.push_str(&new_block);
                    resources.push(name);
                }
                None => result.push_str(block),
            }
            cursor = range.end;
        }
        result.push_str(&text[cursor..]);

        Rewritten { text: result, resources }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_TF: &str = r#"terraform {
  required_providers {
    proxmox = { source = "bpg/proxmox" }
  }
}

resource "proxmox_virtual_environment_container" "postgres" {
  description = "PostgreSQL primary"
  node_name   = "pveserver2"
  vm_id       = 300
  tags        = ["btd", "database"]
  unprivileged = true
  start_on_boot = true

  initialization {
    hostname = "btd-postgres-01.btd.internal"

    ip_config {
      ipv4 {
        address = "10.27.27.100/23"
      }
    }

    dns {
      servers = var.network_dns
    }

    user_account {
      keys = var.ssh_public_keys
    }
  }

  startup {
    order = 1
  }
}

resource "proxmox_virtual_environment_vm" "builder" {
  description = "keep me"
}
"#;

    fn rewriter() -> Rewriter {
        Rewriter::new(RuleSet::builtin().unwrap()).unwrap()
    }

    #[test]
    fn finds_blocks_with_nested_braces() {
        let blocks = find_container_blocks(MAIN_TF);
        assert_eq!(blocks.len(), 1);
        let block = &MAIN_TF[blocks[0].clone()];
        assert!(block.starts_with(CONTAINER_HEADER));
        assert!(block.ends_with("order = 1\n  }\n}"));
    }

    #[test]
    fn braces_in_strings_and_comments_are_ignored() {
        let text = "resource \"proxmox_virtual_environment_container\" \"a\" {\n  description = \"uses } brace\" # stray }\n  // also }\n  /* and } */\n}\ntail";
        let blocks = find_container_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(&text[blocks[0].end..], "\ntail");
    }

    #[test]
    fn commented_out_resource_does_not_hide_later_blocks() {
        let text = "# resource \"proxmox_virtual_environment_container\" \"old\" {\n#   description = \"retired\"\n# }\n\n\
                    /* resource \"proxmox_virtual_environment_container\" \"older\" { */\n\
                    resource \"proxmox_virtual_environment_container\" \"redis\" {\n  description = \"Redis\"\n}\n";
        let blocks = find_container_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert!(text[blocks[0].clone()].contains("\"redis\""));

        let out = rewriter().rewrite_document(text);
        assert_eq!(out.resources, vec!["redis"]);
        assert!(out.text.starts_with("# resource \"proxmox_virtual_environment_container\" \"old\" {\n#   description = \"retired\"\n# }"));
        assert!(out.text.contains("# description = \"Redis\"  # Commented to avoid changes"));
    }

    #[test]
    fn slash_commented_header_is_ignored() {
        let text = "// resource \"proxmox_virtual_environment_container\" \"tmp\" {\n\
                    resource \"proxmox_virtual_environment_container\" \"minio\" {\n  cores = 1\n}\n";
        let blocks = find_container_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert!(text[blocks[0].clone()].starts_with("resource \"proxmox_virtual_environment_container\" \"minio\""));
    }

    #[test]
    fn unbalanced_block_is_skipped() {
        let text = "resource \"proxmox_virtual_environment_container\" \"a\" {\n  cores = 2\n";
        assert!(find_container_blocks(text).is_empty());
        assert_eq!(rewriter().rewrite_document(text).text, text);
    }

    #[test]
    fn container_block_is_rewritten() {
        let out = rewriter().rewrite_document(MAIN_TF);
        let text = &out.text;
        assert_eq!(out.resources, vec!["postgres"]);

        assert!(text.contains("# description = \"PostgreSQL primary\"  # Commented to avoid changes"));
        assert!(text.contains("tags        = [\"btd\"]  # Using existing tag to match current state"));
        assert!(text.contains("# unprivileged = true  # Removed to prevent recreation"));
        assert!(text.contains("# start_on_boot = true  # Removed to prevent changes"));
        assert!(text.contains("hostname = \"btd-postgres-01\"  # Simplified to match current state"));
        assert!(text.contains("#   servers = var.network_dns"));
        assert!(!text.contains("\n      servers = var.network_dns"));
        assert!(text.contains("# user_account {  # Removed to prevent recreation"));
        assert!(text.contains("#   keys = var.ssh_public_keys"));
        assert!(text.contains("  #   startup {\n  #     order = 1\n  #   }"));
        assert!(text.contains("address = \"10.27.27.100/23\""));
    }

    #[test]
    fn lifecycle_is_appended_before_closing_brace() {
        let out = rewriter().rewrite_document(MAIN_TF).text;
        assert_eq!(out.matches("lifecycle {").count(), 1);
        assert!(out.contains("      unprivileged\n    ]\n  }\n}\n\nresource \"proxmox_virtual_environment_vm\""));
    }

    #[test]
    fn text_outside_container_blocks_is_untouched() {
        let out = rewriter().rewrite_document(MAIN_TF).text;
        assert!(out.starts_with("terraform {\n  required_providers {"));
        assert!(out.ends_with("resource \"proxmox_virtual_environment_vm\" \"builder\" {\n  description = \"keep me\"\n}\n"));
    }

    #[test]
    fn existing_lifecycle_is_kept() {
        let text = "resource \"proxmox_virtual_environment_container\" \"redis\" {\n  cores = 2\n  lifecycle {\n    prevent_destroy = true\n  }\n}\n";
        let out = rewriter().rewrite_document(text).text;
        assert_eq!(out, text);
    }

    #[test]
    fn non_word_resource_names_are_left_alone() {
        let text = "resource \"proxmox_virtual_environment_container\" \"web-1\" {\n  description = \"x\"\n}\n";
        let out = rewriter().rewrite_document(text);
        assert_eq!(out.text, text);
        assert!(out.resources.is_empty());
    }

    #[test]
    fn second_pass_is_not_idempotent() {
        let rw = rewriter();
        let once = rw.rewrite_document(MAIN_TF).text;
        let twice = rw.rewrite_document(&once).text;
        assert_ne!(once, twice);
        assert!(twice.contains("# # description"));
        assert_eq!(twice.matches("lifecycle {").count(), 1);
    }
}
