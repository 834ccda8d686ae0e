//! Error types for dialect compilation and schema introspection.

/// Boxed error produced by a metadata collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while compiling statements or introspecting a schema.
#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    /// The requested feature has no valid rendering for the active dialect.
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedByDialect {
        /// Name of the dialect that rejected the request.
        dialect: &'static str,
        /// The feature, function or argument combination that was requested.
        feature: String,
    },

    /// The request is structurally malformed, independent of the dialect.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The external metadata collaborator failed.
    #[error("Failed to fetch metadata for [{}]: {source}", .tables.join(", "))]
    MetadataFetch {
        /// Tables that were being introspected.
        tables: Vec<String>,
        /// The collaborator's own error, unchanged.
        #[source]
        source: BoxError,
    },

    /// No dialect is registered under the given name.
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration or operation.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DialectError {
    /// Builds an [`DialectError::UnsupportedByDialect`] error.
    #[must_use]
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::UnsupportedByDialect {
            dialect,
            feature: feature.into(),
        }
    }

    /// Builds an [`DialectError::InvalidConfiguration`] error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Returns the unsupported feature name, if this is an unsupported-feature error.
    #[must_use]
    pub fn unsupported_feature(&self) -> Option<&str> {
        match self {
            Self::UnsupportedByDialect { feature, .. } => Some(feature),
            _ => None,
        }
    }
}

/// Result type for dialect operations.
pub type Result<T> = std::result::Result<T, DialectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_dialect_and_feature() {
        let err = DialectError::unsupported("generic", "DELETE LIMIT");
        assert_eq!(
            err.to_string(),
            "DELETE LIMIT is not supported by the generic dialect"
        );
        assert_eq!(err.unsupported_feature(), Some("DELETE LIMIT"));
    }

    #[test]
    fn metadata_fetch_keeps_source() {
        let source: BoxError = "connection reset".into();
        let err = DialectError::MetadataFetch {
            tables: vec!["users".into(), "posts".into()],
            source,
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch metadata for [users, posts]: connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.unsupported_feature().is_none());
    }
}
