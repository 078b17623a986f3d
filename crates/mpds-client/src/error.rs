//! Error types for the MPDS API client.

use thiserror::Error;

/// Errors that can occur while talking to the MPDS API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key was configured.
    #[error("MPDS API key is not set (export MPDS_KEY or set api_key in the config file)")]
    MissingKey,

    /// The server answered with a non-success status and no error message.
    #[error("HTTP error code {status} from {url}")]
    Http { status: u16, url: String },

    /// The API reported an error.
    #[error("API error: {message} (code {code})")]
    Api { message: String, code: i64 },

    /// The query matches more entries than may be paged through.
    #[error("too many hits ({count} > {limit}), please, be more specific")]
    TooManyHits { count: u64, limit: u64 },

    /// The number of hits changed between pages of one query.
    #[error("hits count has been changed during the query ({before} -> {after})")]
    CountChanged { before: u64, after: u64 },

    /// The number of collected entries differs from the declared count.
    #[error("collected and declared counts of hits differ ({collected} != {declared})")]
    CountMismatch { collected: u64, declared: u64 },

    /// An entry has an `object_type` other than S, P or C.
    #[error("unknown entry type {0:?}")]
    UnknownEntryType(String),

    /// A configuration value cannot be used by the client.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// A field expression could not be parsed.
    #[error("invalid field expression {expr:?}: {reason}")]
    InvalidField { expr: String, reason: String },

    /// A response or request was not shaped as expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A JSON schema failed to compile.
    #[error("schema error: {0}")]
    Schema(String),

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error propagated from the core domain layer.
    #[error(transparent)]
    Core(#[from] mpds_core::Error),
}

impl ApiError {
    /// Returns `true` when the error is transient and the request may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The numeric code reported by the API, if any.
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::TooManyHits { .. } => Some(1),
            _ => None,
        }
    }
}

/// Convenience alias for client results.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let busy = ApiError::Http {
            status: 503,
            url: "u".to_string(),
        };
        let limited = ApiError::Http {
            status: 429,
            url: "u".to_string(),
        };
        let forbidden = ApiError::Http {
            status: 403,
            url: "u".to_string(),
        };
        assert!(busy.is_transient());
        assert!(limited.is_transient());
        assert!(!forbidden.is_transient());
        assert!(!ApiError::MissingKey.is_transient());
    }

    #[test]
    fn test_codes() {
        let api = ApiError::Api {
            message: "Unknown property".to_string(),
            code: 204,
        };
        assert_eq!(api.code(), Some(204));
        assert_eq!(ApiError::TooManyHits { count: 1, limit: 0 }.code(), Some(1));
        assert_eq!(ApiError::MissingKey.code(), None);
    }

    #[test]
    fn test_too_many_hits_message() {
        let err = ApiError::TooManyHits {
            count: 200_000,
            limit: 120_000,
        };
        assert_eq!(
            err.to_string(),
            "too many hits (200000 > 120000), please, be more specific"
        );
    }
}
