//! Engine configuration and builder.

use std::sync::Arc;

use crate::engine::{Referee, ShapeMatcher};
use crate::error::{Error, Result};
use crate::expect::ExpectationFacade;
use crate::message::Formatter;
use crate::value::Value;

/// Environment variable read by [`RefereeConfig::from_env`].
pub const THROW_ON_FAILURE_ENV: &str = "REFEREE_THROW_ON_FAILURE";

/// Configuration for a [`Referee`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefereeConfig {
    /// Whether a failed direct call is returned to the caller as an error.
    ///
    /// The failure event is emitted either way.
    pub throw_on_failure: bool,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            throw_on_failure: true,
        }
    }
}

impl RefereeConfig {
    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether failures are returned as errors.
    #[must_use]
    pub fn throw_on_failure(mut self, enabled: bool) -> Self {
        self.throw_on_failure = enabled;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults. Accepted boolean spellings are
    /// `true`, `false`, `1`, `0`, `yes` and `no` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable is set to anything else.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable holds an unknown value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(THROW_ON_FAILURE_ENV) {
            config.throw_on_failure = parse_bool(THROW_ON_FAILURE_ENV, &raw)?;
        }
        Ok(config)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Builder for a [`Referee`].
///
/// # Example
///
/// ```rust
/// use referee::Referee;
///
/// let referee = Referee::builder()
///     .throw_on_failure(false)
///     .formatter(|v| format!("<{v}>"))
///     .build();
///
/// assert!(!referee.throw_on_failure());
/// assert_eq!(referee.format(&"x".into()), "<x>");
/// ```
#[derive(Default)]
#[must_use]
pub struct RefereeBuilder {
    config: RefereeConfig,
    formatter: Option<Formatter>,
    shape_matcher: Option<ShapeMatcher>,
    expectations: Option<Arc<dyn ExpectationFacade>>,
}

impl RefereeBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: RefereeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set whether failures are returned as errors.
    pub fn throw_on_failure(mut self, enabled: bool) -> Self {
        self.config.throw_on_failure = enabled;
        self
    }

    /// Value renderer used for message placeholders.
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Structural matcher exposed to predicates through
    /// [`Invocation::matches`](crate::Invocation::matches).
    pub fn shape_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.shape_matcher = Some(Arc::new(matcher));
        self
    }

    /// Install an expectation façade before any assertion is registered.
    pub fn expectations(mut self, facade: impl ExpectationFacade + 'static) -> Self {
        self.expectations = Some(Arc::new(facade));
        self
    }

    /// Build the engine.
    pub fn build(self) -> Referee {
        let referee = Referee::with_config(self.config);
        if let Some(formatter) = self.formatter {
            referee.set_formatter_arc(formatter);
        }
        if let Some(matcher) = self.shape_matcher {
            referee.set_shape_matcher_arc(matcher);
        }
        if let Some(facade) = self.expectations {
            referee.install_expectations_arc(facade);
        }
        referee
    }
}
