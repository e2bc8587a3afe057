//! Error definitions
//!
//! This module provides the failure record emitted for every failed assertion
//! and the crate-wide error type.

use thiserror::Error;

/// The failure record produced when an assertion does not hold.
///
/// The same record is emitted on the `failure` event and, unless throwing is
/// suppressed, returned to the caller. Its message always starts with the
/// `"[{type}.{name}] "` prefix of the assertion that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    assertion: String,
    message: String,
}

impl AssertionError {
    /// Name tag carried by every assertion failure.
    pub const NAME: &'static str = "AssertionError";

    /// Create a failure record for the given full assertion name.
    #[must_use]
    pub fn new(assertion: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            message: message.into(),
        }
    }

    /// The name tag, always `"AssertionError"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// The fully interpolated failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Full name of the originating assertion, e.g. `assert.rejects`.
    #[must_use]
    pub fn assertion(&self) -> &str {
        &self.assertion
    }
}

/// Main error type for referee
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An assertion (or its argument-count check) failed.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// A predicate body failed for a reason unrelated to its condition.
    ///
    /// These never reach the event channel.
    #[error("predicate {assertion} failed internally: {reason}")]
    Predicate {
        /// Full name of the assertion whose body failed.
        assertion: String,
        /// What went wrong.
        reason: String,
    },

    /// No assertion is registered under this name.
    #[error("no assertion registered as {0:?}")]
    UnknownAssertion(String),

    /// A configuration value could not be understood.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig {
        /// Configuration key (environment variable name).
        key: String,
        /// The rejected value.
        value: String,
    },
}

impl Error {
    /// Create a predicate internal error.
    #[must_use]
    pub fn predicate(assertion: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Predicate {
            assertion: assertion.into(),
            reason: reason.into(),
        }
    }

    /// Returns the assertion failure, if this is one.
    #[must_use]
    pub fn as_assertion(&self) -> Option<&AssertionError> {
        match self {
            Self::Assertion(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_error_display_is_message() {
        let err = AssertionError::new("assert.same", "[assert.same] 1 expected to be 2");
        assert_eq!(err.to_string(), "[assert.same] 1 expected to be 2");
        assert_eq!(err.name(), "AssertionError");
        assert_eq!(err.assertion(), "assert.same");
    }

    #[test]
    fn test_error_is_transparent_over_assertion() {
        let err: Error = AssertionError::new("refute", "[refute] nope").into();
        assert_eq!(err.to_string(), "[refute] nope");
        assert!(err.as_assertion().is_some());
        assert!(Error::predicate("assert.x", "boom").as_assertion().is_none());
    }
}
