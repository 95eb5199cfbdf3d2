//! Error types for the Matcha client core
//!
//! Wire decoding and configuration validation errors, unified under
//! [`ClientError`]. Connection-level errors live in the realtime crate,
//! next to the transport they describe.

// ----------------------------------------------------------------------------
// Wire Errors
// ----------------------------------------------------------------------------

/// Errors produced while decoding an inbound frame.
///
/// A wire error is always scoped to the single frame that produced it; the
/// channel logs it and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame has no type tag")]
    MissingTag,
    #[error("unknown event tag: {tag}")]
    UnknownTag { tag: String },
}

impl WireError {
    /// Whether this frame carried a tag the client simply does not know.
    ///
    /// Unknown tags are expected across client/backend version skew and are
    /// logged quieter than malformed payloads.
    pub fn is_unknown_tag(&self) -> bool {
        matches!(self, WireError::UnknownTag { .. })
    }
}

// ----------------------------------------------------------------------------
// Configuration Errors
// ----------------------------------------------------------------------------

/// Errors produced by configuration validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error for a named field
    pub fn invalid<R: Into<String>>(field: &'static str, reason: R) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Core error type for the Matcha client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = core::result::Result<T, ClientError>;

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_classification() {
        let err = WireError::UnknownTag {
            tag: "presence".to_string(),
        };
        assert!(err.is_unknown_tag());

        let err: WireError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(!err.is_unknown_tag());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("commit_threshold", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration for commit_threshold: must be positive"
        );

        let unified: ClientError = err.into();
        assert!(unified.to_string().starts_with("configuration error"));
    }
}
