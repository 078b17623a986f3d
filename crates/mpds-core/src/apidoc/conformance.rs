use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;

use super::metadata::{ProjectMetadata, SampleUrl};

#[allow(clippy::expect_used)]
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid version pattern"));

/// A structural problem found in a project record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A required string field is empty.
    EmptyField(&'static str),
    /// A version field is not digits separated by dots.
    MalformedVersion { field: &'static str, value: String },
    /// `generator.time` is not a parseable timestamp.
    MalformedTimestamp { value: String, reason: String },
    /// `sampleUrl` is set to an empty string instead of `false`.
    EmptySampleUrl,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} is empty"),
            Self::MalformedVersion { field, value } => {
                write!(f, "{field} {value:?} is not a dotted version number")
            }
            Self::MalformedTimestamp { value, reason } => {
                write!(f, "generator.time {value:?} is not a timestamp: {reason}")
            }
            Self::EmptySampleUrl => write!(f, "sampleUrl is an empty string (use false)"),
        }
    }
}

impl ProjectMetadata {
    /// Check the record against the shape apidoc expects.
    ///
    /// Returns every finding; an empty list means the record conforms.
    pub fn conformance(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        let required = [
            ("name", &self.name),
            ("version", &self.version),
            ("description", &self.description),
            ("title", &self.title),
            ("url", &self.url),
            ("apidoc", &self.apidoc),
            ("generator.name", &self.generator.name),
            ("generator.time", &self.generator.time),
            ("generator.url", &self.generator.url),
            ("generator.version", &self.generator.version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                findings.push(Finding::EmptyField(field));
            }
        }

        if let SampleUrl::Url(url) = &self.sample_url {
            if url.trim().is_empty() {
                findings.push(Finding::EmptySampleUrl);
            }
        }

        for (field, value) in [("version", &self.version), ("apidoc", &self.apidoc)] {
            if !value.is_empty() && !VERSION_PATTERN.is_match(value) {
                findings.push(Finding::MalformedVersion {
                    field,
                    value: value.clone(),
                });
            }
        }

        if !self.generator.time.is_empty() {
            if let Err(e) = self.generator_time() {
                findings.push(Finding::MalformedTimestamp {
                    value: self.generator.time.clone(),
                    reason: e.to_string(),
                });
            }
        }

        findings
    }

    /// Parse `generator.time` as an ISO-8601 timestamp.
    ///
    /// RFC 3339 is tried first; a timestamp without an offset is read as UTC.
    pub fn generator_time(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        let time = self.generator.time.as_str();
        DateTime::parse_from_rfc3339(time).or_else(|e| {
            NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
                .map_err(|_| e)
        })
    }
}
