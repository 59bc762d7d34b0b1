pub mod block;
pub mod rules;

use std::path::{Path, PathBuf};
use tracing::info;

use crate::utils::{read_file, write_file, FleetError, Result};
use block::Rewriter;
use rules::RuleSet;

pub fn run_rewrite(input: &Path, output: Option<&Path>, rules_file: Option<&Path>) -> Result<()> {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    if same_file(input, &output) {
        return Err(FleetError::Config(format!(
            "refusing to overwrite {}; choose a different --output",
            input.display()
        )));
    }

    let rules = match rules_file {
        Some(p) => {
            info!("loading rewrite rules from {}", p.display());
            RuleSet::load(p)?
        }
        None => RuleSet::builtin()?,
    };
    let rewriter = Rewriter::new(rules)?;

    let content = read_file(input)?;
    let result = rewriter.rewrite_document(&content);
    info!("rewrote {} container resource(s): {}", result.resources.len(), result.resources.join(", "));

    write_file(&output, &result.text)?;

    println!("Updated configuration written to {}", output.display());
    println!("Review the changes and then run: mv {} {}", output.display(), input.display());
    Ok(())
}

/// main.tf → main.tf.updated
fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".updated");
    PathBuf::from(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    matches!((a.canonicalize(), b.canonicalize()), (Ok(x), Ok(y)) if x == y)
}
