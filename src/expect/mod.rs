//! Chainable expectation façade.
//!
//! Assertions may declare an expectation name (`toThrow`, `toResolve`, ...).
//! [`Expectation`] routes `expect(actual).to(name, args)` to the assert entry
//! point registered under that name, and `expect(actual).not().to(..)` to the
//! refute one, with `actual` as the first argument.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, Assertion, Referee};
//!
//! let referee = Referee::new();
//! referee.add(
//!     "equals",
//!     Assertion::predicate(|args| args[0] == args[1])
//!         .min_args(2)
//!         .expectation("toEqual"),
//! );
//!
//! assert!(referee.expect(2).to("toEqual", args![2]).is_ok());
//! assert!(referee.expect(2).not().to("toEqual", args![2]).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::engine::{Completion, Referee};
use crate::error::{Error, Result};
use crate::registry::Polarity;
use crate::value::Value;

/// Receives expectation names as assertions are installed.
///
/// Installed with [`Referee::install_expectations`]; from then on every
/// assertion declaring an expectation name is handed to the façade instead
/// of keeping a plain alias.
pub trait ExpectationFacade: Send + Sync {
    /// Expose `assertion` under `expectation`.
    fn wrap_assertion(&self, assertion: &str, expectation: &str);

    /// The assertion exposed under `expectation`, if any.
    fn resolve(&self, expectation: &str) -> Option<String>;

    /// Forget every expectation that exposes `assertion`.
    ///
    /// Called before an assertion is (re)installed. The default keeps
    /// existing mappings.
    fn release_assertion(&self, assertion: &str) {
        let _ = assertion;
    }
}

/// A plain expectation-name table.
#[derive(Debug, Default)]
pub struct ExpectationTable {
    entries: RwLock<HashMap<String, String>>,
}

impl ExpectationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expectation names known so far, sorted.
    #[must_use]
    pub fn expectations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ExpectationFacade for ExpectationTable {
    fn wrap_assertion(&self, assertion: &str, expectation: &str) {
        self.entries
            .write()
            .insert(expectation.to_string(), assertion.to_string());
    }

    fn resolve(&self, expectation: &str) -> Option<String> {
        self.entries.read().get(expectation).cloned()
    }

    fn release_assertion(&self, assertion: &str) {
        self.entries.write().retain(|_, name| *name != assertion);
    }
}

impl<T: ExpectationFacade + ?Sized> ExpectationFacade for std::sync::Arc<T> {
    fn wrap_assertion(&self, assertion: &str, expectation: &str) {
        (**self).wrap_assertion(assertion, expectation);
    }

    fn resolve(&self, expectation: &str) -> Option<String> {
        (**self).resolve(expectation)
    }

    fn release_assertion(&self, assertion: &str) {
        (**self).release_assertion(assertion);
    }
}

/// An expectation about one value, created by [`Referee::expect`].
#[must_use]
#[derive(Clone)]
pub struct Expectation {
    referee: Referee,
    actual: Value,
    negated: bool,
}

impl Expectation {
    pub(crate) fn new(referee: Referee, actual: Value) -> Self {
        Self {
            referee,
            actual,
            negated: false,
        }
    }

    /// Flip the expectation to the refute side.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// The value under test.
    pub fn actual(&self) -> &Value {
        &self.actual
    }

    /// Run the assertion registered under `expectation` with `actual`
    /// followed by `args`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAssertion`] if no assertion is exposed under
    /// `expectation`, otherwise whatever the direct call returns.
    pub fn to(&self, expectation: &str, args: Vec<Value>) -> Result<Completion> {
        let polarity = if self.negated {
            Polarity::Refute
        } else {
            Polarity::Assert
        };
        let entry = self
            .referee
            .resolve_expectation(expectation)
            .and_then(|name| self.referee.entry(polarity, &name))
            .ok_or_else(|| Error::UnknownAssertion(expectation.to_string()))?;

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(self.actual.clone());
        call_args.extend(args);
        entry.call(call_args)
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("actual", &self.actual)
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::args;
    use crate::registry::Assertion;

    #[test]
    fn test_plain_alias_without_facade() {
        let referee = Referee::new();
        let handle = referee.add(
            "isTrue",
            Assertion::predicate(|args| args[0] == Value::Bool(true))
                .min_args(1)
                .expectation("toBeTrue"),
        );

        assert_eq!(handle.expectation_name(), Some("toBeTrue"));
        assert_eq!(referee.resolve_expectation("toBeTrue").as_deref(), Some("isTrue"));
        assert!(referee.expect(true).to("toBeTrue", args![]).is_ok());
        assert!(referee.expect(false).not().to("toBeTrue", args![]).is_ok());
    }

    #[test]
    fn test_facade_receives_names() {
        let table = Arc::new(ExpectationTable::new());
        let referee = Referee::builder()
            .expectations(Arc::clone(&table))
            .build();

        let handle = referee.add(
            "match",
            Assertion::predicate(|args| args[0] == args[1])
                .min_args(2)
                .expectation("toMatch"),
        );
        referee.add("plain", Assertion::predicate(|_| true));

        assert_eq!(handle.expectation_name(), None);
        assert_eq!(table.expectations(), vec!["toMatch"]);
        assert_eq!(referee.resolve_expectation("toMatch").as_deref(), Some("match"));
        assert!(referee.expect("a").to("toMatch", args!["a"]).is_ok());
    }

    #[test]
    fn test_reinstall_releases_stale_facade_mapping() {
        let table = Arc::new(ExpectationTable::new());
        let referee = Referee::builder()
            .expectations(Arc::clone(&table))
            .build();

        referee.add("equals", Assertion::predicate(|_| true).expectation("toEqual"));
        referee.add("equals", Assertion::predicate(|_| true).expectation("toBe"));

        assert_eq!(table.expectations(), vec!["toBe"]);
        assert_eq!(referee.resolve_expectation("toBe").as_deref(), Some("equals"));
        assert!(referee.resolve_expectation("toEqual").is_none());

        referee.add("equals", Assertion::predicate(|_| true));
        assert!(table.expectations().is_empty());
    }

    #[test]
    fn test_unknown_expectation() {
        let referee = Referee::new();
        let err = referee.expect(1).to("toFly", args![]).unwrap_err();
        assert_eq!(err, Error::UnknownAssertion("toFly".into()));
        assert_eq!(referee.count(), 0);
    }

    #[test]
    fn test_double_not_cancels() {
        let referee = Referee::builder().throw_on_failure(false).build();
        referee.add(
            "equals",
            Assertion::predicate(|args| args[0] == args[1])
                .min_args(2)
                .expectation("toEqual"),
        );
        let log = referee.record();

        let _ = referee.expect(1).not().not().to("toEqual", args![1]).unwrap();
        assert_eq!(log.passes()[0].name, "assert.equals");
        assert_eq!(log.passes()[0].args, args![1, 1]);
    }
}
