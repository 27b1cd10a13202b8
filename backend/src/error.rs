//! Error types for catalog operations.
//!
//! Only input validation, configuration and cancellation surface to callers.
//! Upstream adapter failures are absorbed at the registry boundary and
//! reported next to the (possibly empty) result instead; see
//! [`crate::adapters::AdapterError`].

use std::fmt;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Structured context for catalog errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "parse_bbox", "search")
    pub operation: Option<String>,
    /// The offending input field, if any
    pub field: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref field) = self.field {
            parts.push(format!("field={}", field));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Caller-visible error taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Malformed coordinate, bbox, paging, category or query input.
    #[error("Validation error: {message} {context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// Invalid configuration file or environment value.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// The caller cancelled the operation before it completed.
    #[error("Cancelled: {message} {context}")]
    Cancelled {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl CatalogError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a validation error naming the offending field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::default().with_field(field),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error was caused by caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Validation { context, .. }
            | Self::Configuration { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::Validation { context, .. }
            | Self::Configuration { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Internal { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        CatalogError::configuration(format!("Failed to parse config file: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("parse_bbox")
            .with_field("bbox")
            .with_details("expected 4 values");
        assert_eq!(
            ctx.to_string(),
            "[operation=parse_bbox, field=bbox, details=expected 4 values]"
        );
    }

    #[test]
    fn test_with_operation_sets_context() {
        let err = CatalogError::invalid_field("page", "must be >= 1").with_operation("search");
        assert!(err.is_validation());
        assert_eq!(err.context().operation.as_deref(), Some("search"));
        assert_eq!(err.context().field.as_deref(), Some("page"));
        assert!(err.to_string().contains("must be >= 1"));
    }

    #[test]
    fn test_cancelled_is_not_validation() {
        let err = CatalogError::cancelled("search aborted");
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("Cancelled"));
    }
}
