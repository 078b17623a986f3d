use anyhow::{Context, Result};
use std::path::Path;

use mpds_core::apidoc::{parse_api_project, render_api_project};
use mpds_core::ProjectMetadata;

/// Read a project record from `file`, or take the built-in MPDS record.
fn load_project(file: Option<&Path>) -> Result<ProjectMetadata> {
    let Some(path) = file else {
        return Ok(ProjectMetadata::mpds());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_api_project(&source).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print the API project metadata, as a summary, a define() module or a
/// conformance audit.
pub fn show_project(file: Option<&Path>, js: bool, check: bool) -> Result<()> {
    let meta = load_project(file)?;

    if js {
        print!("{}", render_api_project(&meta)?);
        return Ok(());
    }

    if check {
        let findings = meta.conformance();
        if findings.is_empty() {
            println!("✓ {} {}: no findings", meta.name, meta.version);
            return Ok(());
        }
        for finding in &findings {
            println!("✗ {finding}");
        }
        anyhow::bail!("{} conformance finding(s)", findings.len());
    }

    println!("{} {}", meta.title, meta.version);
    println!("  {}", meta.description);
    println!("  Base URL: {}", meta.api_base());
    println!("  Facet endpoint: {}", meta.facet_endpoint());
    match meta.sample_url.as_url() {
        Some(url) => println!("  Sample requests: {url}"),
        None => println!("  Sample requests: disabled"),
    }
    println!(
        "  Generated by {} {} at {}",
        meta.generator.name, meta.generator.version, meta.generator.time
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpds_core::apidoc::API_PROJECT_JS;
    use tempfile::TempDir;

    #[test]
    fn test_load_builtin_project() {
        assert_eq!(load_project(None).unwrap(), ProjectMetadata::mpds());
    }

    #[test]
    fn test_check_project_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("api_project.js");
        std::fs::write(&path, API_PROJECT_JS).unwrap();
        assert!(show_project(Some(&path), false, true).is_ok());

        let bad = API_PROJECT_JS.replace("\"0.0.3\"", "\"v0.0.3\"");
        std::fs::write(&path, bad).unwrap();
        assert_eq!(load_project(Some(&path)).unwrap().version, "v0.0.3");
        assert!(show_project(Some(&path), false, true).is_err());
    }

    #[test]
    fn test_unreadable_project_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("api_project.js");
        std::fs::write(&path, "define({\"name\": \"MPDS API\"});").unwrap();
        let err = load_project(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));

        assert!(load_project(Some(&temp_dir.path().join("absent.js"))).is_err());
    }
}
