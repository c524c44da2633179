//! Error types for coercion, configuration and document loading.
//!
//! Coercion failures are ordinary values returned by [`coerce`](crate::coerce)
//! and folded into a validation report. [`ConfigurationError`] is the single
//! fatal error raised when a plugin cannot be configured. [`DocumentError`]
//! covers reading params and schema documents from disk.

use thiserror::Error;

use crate::validate::Diagnostic;

/// Reasons a raw value could not be coerced into its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// More than one value (or none) was given where a single one is expected.
    #[error("expected exactly one value, got {0}")]
    ExpectedSingleValue(usize),
    /// Value is not in the list of allowed literals.
    #[error("invalid value {value}, expected one of {allowed:?}")]
    NotAllowed {
        /// The offending value, rendered as text.
        value: String,
        /// The allowed literals.
        allowed: Vec<String>,
    },
    /// A hash given as a flat sequence had an odd number of items.
    #[error("hash must contain an even number of items, got {0}")]
    OddHashLength(usize),
    /// A hash key was not a scalar.
    #[error("hash key must be a scalar, got {0}")]
    NonScalarHashKey(String),
    /// A string option received a sequence, mapping or secret.
    #[error("expected string, got {0}")]
    NotAString(String),
    /// Text did not round-trip through integer parsing.
    #[error("expected number, got {0}")]
    InvalidNumber(String),
    /// Text was neither `true` nor `false`.
    #[error("expected boolean, got {0}")]
    InvalidBoolean(String),
    /// Text was not a dotted-quad IPv4 address.
    #[error("expected IP address, got {0}")]
    InvalidIpAddress(String),
    /// Message returned by a custom validator.
    #[error("{0}")]
    Custom(String),
    /// The option declared a validator name nobody recognizes.
    #[error("unknown validator {0}")]
    UnknownValidator(String),
}

/// Fatal configuration fault.
///
/// Returned once per failed initialization, after every diagnostic has been
/// logged. The message is rendered through the active
/// [`MessageCatalog`](crate::MessageCatalog).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    /// Localized summary message.
    pub message: String,
    /// Diagnostics collected before the fault was raised.
    pub diagnostics: Vec<Diagnostic>,
}

impl ConfigurationError {
    /// Creates an error with no attached diagnostics.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Attaches the diagnostics that led to this error.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Errors raised while loading params or schema documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A value that has no configuration counterpart (e.g. `null`).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Structurally invalid schema document.
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
