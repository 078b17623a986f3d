//! apidoc project metadata.
//!
//! The MPDS API documentation is generated by apidoc from a small
//! project record (`api_project.js`). This module models that record,
//! reads and writes its `define({...});` file form, and checks the
//! structural properties apidoc relies on.

mod conformance;
mod metadata;

pub use conformance::Finding;
pub use metadata::{Generator, ProjectMetadata, SampleUrl};

use crate::error::Result;

/// The shipped `api_project.js`.
pub const API_PROJECT_JS: &str = include_str!("api_project.js");

/// Parse an apidoc project record.
///
/// Accepts bare JSON as well as the AMD-wrapped `define({...});` form
/// apidoc writes to `api_project.js`.
pub fn parse_api_project(source: &str) -> Result<ProjectMetadata> {
    let body = strip_define(source.trim());
    Ok(serde_json::from_str(body)?)
}

/// Render a project record in the `api_project.js` file form.
pub fn render_api_project(meta: &ProjectMetadata) -> Result<String> {
    let body = serde_json::to_string_pretty(meta)?;
    Ok(format!("define({body});\n"))
}

fn strip_define(source: &str) -> &str {
    let Some(inner) = source.strip_prefix("define(") else {
        return source;
    };
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(';').unwrap_or(inner).trim_end();
    inner.strip_suffix(')').unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_define() {
        assert_eq!(strip_define("define({\"a\": 1});"), "{\"a\": 1}");
        assert_eq!(strip_define("define({}) ;"), "{}");
        assert_eq!(strip_define("{}"), "{}");
    }

    #[test]
    fn test_parse_shipped_file() {
        let meta = parse_api_project(API_PROJECT_JS).unwrap();
        assert_eq!(meta, ProjectMetadata::mpds());
    }

    #[test]
    fn test_render_matches_shipped_file() {
        let rendered = render_api_project(&ProjectMetadata::mpds()).unwrap();
        assert_eq!(rendered, API_PROJECT_JS);
    }

    #[test]
    fn test_parse_bare_json() {
        let json = serde_json::to_string(&ProjectMetadata::mpds()).unwrap();
        let meta = parse_api_project(&json).unwrap();
        assert_eq!(meta.title, "MPDS Online Platform API");
    }

    #[test]
    fn test_extra_keys_survive_round_trip() {
        let mut value = serde_json::to_value(ProjectMetadata::mpds()).unwrap();
        value["template"] = serde_json::json!({"withCompare": false});
        value["order"] = serde_json::json!(["Facet", "Download"]);
        let source = format!("define({value});");

        let meta = parse_api_project(&source).unwrap();
        assert_eq!(meta.extra["template"]["withCompare"], false);

        let rendered = render_api_project(&meta).unwrap();
        assert!(rendered.contains("\"template\""));
        let reparsed = parse_api_project(&rendered).unwrap();
        assert_eq!(reparsed, meta);
        assert_eq!(
            serde_json::to_value(&reparsed).unwrap(),
            serde_json::to_value(&meta).unwrap()
        );
    }

    #[test]
    fn test_parse_missing_field_fails() {
        let source = r#"define({"name": "MPDS API", "version": "0.0.3"});"#;
        assert!(parse_api_project(source).is_err());
    }

    #[test]
    fn test_parse_non_string_field_fails() {
        let mut value = serde_json::to_value(ProjectMetadata::mpds()).unwrap();
        value["version"] = serde_json::json!(3);
        assert!(parse_api_project(&value.to_string()).is_err());
    }
}
