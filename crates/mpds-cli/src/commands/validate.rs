use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use mpds_client::validate::validate_response;

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Validate a saved API response page against a JSON schema.
pub fn run_validate(schema: &Path, response: &Path) -> Result<()> {
    let schema = read_json(schema)?;
    let response = read_json(response)?;

    let report = validate_response(&schema, &response)?;
    for violation in &report.violations {
        println!("✗ entry {}: {}", violation.index, violation.message);
    }

    if report.is_valid() {
        println!("✓ {} entries valid", report.checked);
        Ok(())
    } else {
        anyhow::bail!(
            "{} violation(s) in {} entries",
            report.violations.len(),
            report.checked
        )
    }
}
