use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The `sampleUrl` setting of an apidoc project.
///
/// apidoc accepts either a URL, which enables the "send a sample request"
/// form, or the literal `false`, which disables it. `true` is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SampleUrl {
    #[default]
    Disabled,
    Url(String),
}

impl SampleUrl {
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Disabled => None,
            Self::Url(url) => Some(url),
        }
    }
}

impl Serialize for SampleUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Url(url) => serializer.serialize_str(url),
        }
    }
}

impl<'de> Deserialize<'de> for SampleUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Url(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::Disabled),
            Raw::Flag(true) => Err(D::Error::custom(
                "sampleUrl must be a URL string or false",
            )),
            Raw::Url(url) => Ok(Self::Url(url)),
        }
    }
}

/// The tool that produced the documentation artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    /// Generation timestamp, kept verbatim (ISO-8601).
    pub time: String,
    pub url: String,
    pub version: String,
}

/// Project metadata consumed by the apidoc documentation generator.
///
/// Field order matches the `api_project.js` layout, so serializing a
/// parsed record reproduces the same key order. Keys apidoc supports beyond
/// these (`template`, `header`, `order`, ...) are kept in `extra` and
/// rendered after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "sampleUrl")]
    pub sample_url: SampleUrl,
    pub apidoc: String,
    pub generator: Generator,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectMetadata {
    /// The MPDS Online Platform API project record.
    #[must_use]
    pub fn mpds() -> Self {
        Self {
            name: "MPDS API".to_string(),
            version: "0.0.3".to_string(),
            description: "Web-based platform, presenting all the data of the Linus Pauling \
                          File materials database in the developer-friendly machine-readable \
                          formats."
                .to_string(),
            title: "MPDS Online Platform API".to_string(),
            url: "https://api.mpds.io/v0".to_string(),
            sample_url: SampleUrl::Disabled,
            apidoc: "0.2.0".to_string(),
            generator: Generator {
                name: "apidoc".to_string(),
                time: "2016-12-20T15:48:49.266Z".to_string(),
                url: "http://apidocjs.com".to_string(),
                version: "0.16.1".to_string(),
            },
            extra: Map::new(),
        }
    }

    /// Base URL of the documented API, without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// The faceted-search download endpoint under [`Self::api_base`].
    #[must_use]
    pub fn facet_endpoint(&self) -> String {
        format!("{}/download/facet", self.api_base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mpds_record_fields() {
        let meta = ProjectMetadata::mpds();
        assert_eq!(meta.name, "MPDS API");
        assert_eq!(meta.version, "0.0.3");
        assert_eq!(meta.sample_url, SampleUrl::Disabled);
        assert_eq!(meta.generator.name, "apidoc");
        assert!(meta.description.starts_with("Web-based platform, presenting"));
        assert!(meta.description.ends_with("machine-readable formats."));
    }

    #[test]
    fn test_sample_url_false_serializes_as_false() {
        let value = serde_json::to_value(ProjectMetadata::mpds()).unwrap();
        assert_eq!(value["sampleUrl"], json!(false));
    }

    #[test]
    fn test_sample_url_accepts_string() {
        let url: SampleUrl = serde_json::from_value(json!("https://api.mpds.io/v0")).unwrap();
        assert_eq!(url.as_url(), Some("https://api.mpds.io/v0"));
        assert!(!url.is_disabled());
    }

    #[test]
    fn test_sample_url_rejects_true() {
        let err = serde_json::from_value::<SampleUrl>(json!(true)).unwrap_err();
        assert!(err.to_string().contains("sampleUrl"));
    }

    #[test]
    fn test_sample_url_rejects_number() {
        assert!(serde_json::from_value::<SampleUrl>(json!(1)).is_err());
    }

    #[test]
    fn test_facet_endpoint() {
        let mut meta = ProjectMetadata::mpds();
        assert_eq!(meta.facet_endpoint(), "https://api.mpds.io/v0/download/facet");

        meta.url = "http://localhost:7070/v0/".to_string();
        assert_eq!(meta.api_base(), "http://localhost:7070/v0");
    }
}
