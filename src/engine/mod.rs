//! The assertion engine.
//!
//! A [`Referee`] owns everything an assertion run shares: the registry, the
//! event channel, the invocation counter and the throw-on-failure flag.
//! Independent runs use independent instances; clones share one instance.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, Assertion, Referee};
//!
//! let referee = Referee::builder().throw_on_failure(false).build();
//! let log = referee.record();
//!
//! let equals = referee.add(
//!     "equals",
//!     Assertion::predicate(|args| args[0] == args[1])
//!         .min_args(2)
//!         .assert_message("${0} expected to equal ${1}")
//!         .refute_message("${0} expected not to equal ${1}"),
//! );
//!
//! let _ = equals.assert().call(args!["Yo", "Hey"]).unwrap();
//! let _ = equals.refute().call(args!["Yo", "Hey"]).unwrap();
//!
//! assert_eq!(referee.count(), 2);
//! assert_eq!(log.failures()[0].message(), "[assert.equals] Yo expected to equal Hey");
//! assert_eq!(log.passes()[0].name, "refute.equals");
//! ```

mod arity;
mod config;
mod execute;
mod handle;
mod invocation;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{AssertionError, Error, Result};
use crate::events::{Event, EventChannel, EventKind, EventLog, PassEvent, Subscription};
use crate::expect::{Expectation, ExpectationFacade};
use crate::message::{self, Formatter};
use crate::registry::{Assertion, Polarity, Registry};
use crate::value::Value;

use execute::Reporter;

pub use config::{RefereeBuilder, RefereeConfig, THROW_ON_FAILURE_ENV};
pub use handle::{AssertionHandle, Completion, EntryPoint, PendingAssertion};
pub use invocation::Invocation;

/// Structural matcher: does `actual` satisfy `matcher`?
pub type ShapeMatcher = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// An assertion engine instance.
#[derive(Clone)]
pub struct Referee {
    inner: Arc<RefereeInner>,
}

struct RefereeInner {
    registry: Registry,
    channel: Arc<EventChannel>,
    /// Invocations of any assert, refute or root-level check.
    count: AtomicUsize,
    throw_on_failure: AtomicBool,
    formatter: RwLock<Formatter>,
    shape_matcher: RwLock<ShapeMatcher>,
    expectations: RwLock<Option<Arc<dyn ExpectationFacade>>>,
}

impl Referee {
    /// Creates an engine with the default configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use referee::Referee;
    ///
    /// let referee = Referee::new();
    /// assert_eq!(referee.count(), 0);
    /// assert!(referee.throw_on_failure());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RefereeConfig::default())
    }

    /// Creates an engine from `config`.
    #[must_use]
    pub fn with_config(config: RefereeConfig) -> Self {
        let shape_matcher: ShapeMatcher = Arc::new(Value::matches_shape);
        Self {
            inner: Arc::new(RefereeInner {
                registry: Registry::default(),
                channel: Arc::new(EventChannel::new()),
                count: AtomicUsize::new(0),
                throw_on_failure: AtomicBool::new(config.throw_on_failure),
                formatter: RwLock::new(message::default_formatter()),
                shape_matcher: RwLock::new(shape_matcher),
                expectations: RwLock::new(None),
            }),
        }
    }

    /// Starts building an engine.
    pub fn builder() -> RefereeBuilder {
        RefereeBuilder::new()
    }

    /// Installs `assertion` under `name`, deriving both entry points.
    ///
    /// Installing a name that already exists replaces the old definition.
    /// If an expectation façade is installed and the assertion declares an
    /// expectation name, the façade is told about it, after any mapping left
    /// by an earlier definition of `name` is released. Otherwise the name is
    /// kept as a plain alias. When several assertions declare the same
    /// alias, the one installed last owns it; replacing that assertion with
    /// a definition that drops the alias leaves the alias unresolved.
    pub fn add(&self, name: impl Into<String>, assertion: Assertion) -> AssertionHandle {
        let name = name.into();
        let expectation = assertion.expectation_name().map(str::to_string);

        let facade = self.inner.expectations.read().clone();
        if let Some(facade) = &facade {
            facade.release_assertion(&name);
        }
        let alias = match (facade, expectation) {
            (Some(facade), Some(expectation)) => {
                tracing::debug!(assertion = %name, %expectation, "delegating to expectation facade");
                facade.wrap_assertion(&name, &expectation);
                None
            }
            (None, expectation) => expectation,
            (Some(_), None) => None,
        };

        let entry = Arc::new(assertion.into_entry(name.clone(), alias));
        if self.inner.registry.insert(Arc::clone(&entry)).is_some() {
            tracing::debug!(assertion = %name, "replaced existing assertion");
        } else {
            tracing::debug!(assertion = %name, "registered assertion");
        }

        AssertionHandle::new(self.clone(), entry)
    }

    /// The handle for an installed assertion.
    #[must_use]
    pub fn assertion(&self, name: &str) -> Option<AssertionHandle> {
        self.inner
            .registry
            .get(name)
            .map(|entry| AssertionHandle::new(self.clone(), entry))
    }

    /// One entry point of an installed assertion.
    #[must_use]
    pub fn entry(&self, polarity: Polarity, name: &str) -> Option<EntryPoint> {
        self.assertion(name).map(|handle| handle.side(polarity))
    }

    /// Names of every installed assertion, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Calls `assert.<name>` by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAssertion`] if nothing is installed under `name`,
    /// otherwise whatever [`EntryPoint::call`] returns.
    pub fn assert(&self, name: &str, args: Vec<Value>) -> Result<Completion> {
        self.call_named(Polarity::Assert, name, args)
    }

    /// Calls `refute.<name>` by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAssertion`] if nothing is installed under `name`,
    /// otherwise whatever [`EntryPoint::call`] returns.
    pub fn refute(&self, name: &str, args: Vec<Value>) -> Result<Completion> {
        self.call_named(Polarity::Refute, name, args)
    }

    fn call_named(&self, polarity: Polarity, name: &str, args: Vec<Value>) -> Result<Completion> {
        self.entry(polarity, name)
            .ok_or_else(|| Error::UnknownAssertion(name.to_string()))?
            .call(args)
    }

    /// Number of assert, refute and root-level calls since creation or the
    /// last [`reset_counters`](Self::reset_counters).
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    /// Resets the invocation counter to zero.
    pub fn reset_counters(&self) {
        self.inner.count.store(0, Ordering::SeqCst);
    }

    pub(crate) fn count_assertion(&self) {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether failed direct calls return an error.
    #[must_use]
    pub fn throw_on_failure(&self) -> bool {
        self.inner.throw_on_failure.load(Ordering::SeqCst)
    }

    /// Switch returning failures as errors on or off.
    pub fn set_throw_on_failure(&self, enabled: bool) {
        self.inner.throw_on_failure.store(enabled, Ordering::SeqCst);
    }

    /// Applies the throw-on-failure flag to an already reported failure.
    pub(crate) fn raise(&self, err: AssertionError) -> Result<()> {
        if self.throw_on_failure() {
            Err(Error::Assertion(err))
        } else {
            Ok(())
        }
    }

    /// Replaces the value renderer used for message placeholders.
    pub fn set_formatter<F>(&self, formatter: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.set_formatter_arc(Arc::new(formatter));
    }

    pub(crate) fn set_formatter_arc(&self, formatter: Formatter) {
        *self.inner.formatter.write() = formatter;
    }

    pub(crate) fn formatter(&self) -> Formatter {
        self.inner.formatter.read().clone()
    }

    /// Renders `value` with the current formatter.
    #[must_use]
    pub fn format(&self, value: &Value) -> String {
        (self.formatter())(value)
    }

    /// Replaces the structural matcher.
    pub fn set_shape_matcher<F>(&self, matcher: F)
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.set_shape_matcher_arc(Arc::new(matcher));
    }

    pub(crate) fn set_shape_matcher_arc(&self, matcher: ShapeMatcher) {
        *self.inner.shape_matcher.write() = matcher;
    }

    pub(crate) fn shape_matcher(&self) -> ShapeMatcher {
        self.inner.shape_matcher.read().clone()
    }

    /// Checks `actual` against `matcher` with the current structural matcher.
    #[must_use]
    pub fn matches(&self, actual: &Value, matcher: &Value) -> bool {
        (self.shape_matcher())(actual, matcher)
    }

    /// Installs an expectation façade.
    ///
    /// Only assertions installed afterwards are handed to it.
    pub fn install_expectations(&self, facade: impl ExpectationFacade + 'static) {
        self.install_expectations_arc(Arc::new(facade));
    }

    pub(crate) fn install_expectations_arc(&self, facade: Arc<dyn ExpectationFacade>) {
        *self.inner.expectations.write() = Some(facade);
    }

    /// The assertion name registered under `expectation`.
    ///
    /// Asks the installed façade first, then the plain aliases kept for
    /// assertions installed without one. A plain alias resolves to the
    /// assertion that most recently declared it.
    #[must_use]
    pub fn resolve_expectation(&self, expectation: &str) -> Option<String> {
        let facade = self.inner.expectations.read().clone();
        facade
            .and_then(|facade| facade.resolve(expectation))
            .or_else(|| {
                self.inner
                    .registry
                    .by_expectation(expectation)
                    .map(|entry| entry.name.clone())
            })
    }

    /// Starts a chainable expectation about `actual`.
    pub fn expect(&self, actual: impl Into<Value>) -> Expectation {
        Expectation::new(self.clone(), actual.into())
    }

    /// Subscribes `handler` to `kind` events.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.channel.on(kind, handler)
    }

    /// Attaches a recorder that keeps every subsequent event.
    ///
    /// The recorder unsubscribes once the last clone of the log is dropped.
    #[must_use]
    pub fn record(&self) -> EventLog {
        self.inner.channel.record()
    }

    /// The event channel itself.
    #[must_use]
    pub fn channel(&self) -> &Arc<EventChannel> {
        &self.inner.channel
    }

    pub(crate) fn reporter(&self) -> Reporter {
        Reporter::Channel(Arc::clone(&self.inner.channel))
    }

    /// Bare affirmative check: passes iff `actual` is truthy.
    ///
    /// # Errors
    ///
    /// [`Error::Assertion`] on failure when throwing on failure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use referee::Referee;
    ///
    /// let referee = Referee::new();
    /// assert!(referee.assert_truthy(1, None).is_ok());
    ///
    /// let err = referee.assert_truthy(0, None).unwrap_err();
    /// assert_eq!(err.to_string(), "[assert] Expected 0 to be truthy");
    /// assert_eq!(referee.count(), 2);
    /// ```
    pub fn assert_truthy(&self, actual: impl Into<Value>, message: Option<&str>) -> Result<()> {
        self.root_check(Polarity::Assert, actual.into(), message)
    }

    /// Bare negated check: passes iff `actual` is falsy.
    ///
    /// # Errors
    ///
    /// [`Error::Assertion`] on failure when throwing on failure.
    pub fn refute_truthy(&self, actual: impl Into<Value>, message: Option<&str>) -> Result<()> {
        self.root_check(Polarity::Refute, actual.into(), message)
    }

    fn root_check(&self, polarity: Polarity, actual: Value, message: Option<&str>) -> Result<()> {
        self.count_assertion();
        let reporter = self.reporter();
        let name = polarity.as_str();

        if actual.is_truthy() == (polarity == Polarity::Assert) {
            let payload = vec![Value::from(message.unwrap_or_default()), actual];
            reporter.pass(&PassEvent::new(name, payload));
            return Ok(());
        }

        let text = match message {
            Some(custom) if !custom.is_empty() => custom.to_string(),
            _ => {
                let expected = match polarity {
                    Polarity::Assert => "truthy",
                    Polarity::Refute => "falsy",
                };
                format!("[{name}] Expected {} to be {expected}", self.format(&actual))
            }
        };
        let err = AssertionError::new(name, text);
        reporter.failure(&err);
        self.raise(err)
    }
}

impl Default for Referee {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Referee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Referee")
            .field("assertions", &self.inner.registry.names())
            .field("count", &self.count())
            .field("throw_on_failure", &self.throw_on_failure())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn quiet() -> Referee {
        Referee::builder().throw_on_failure(false).build()
    }

    #[test]
    fn test_unknown_assertion() {
        let referee = Referee::new();
        let err = referee.assert("nope", args![]).unwrap_err();
        assert_eq!(err, Error::UnknownAssertion("nope".into()));
        assert_eq!(referee.count(), 0);
    }

    #[test]
    fn test_reregistering_replaces() {
        let referee = quiet();
        referee.add("flip", Assertion::predicate(|_| true));
        referee.add("flip", Assertion::predicate(|_| false));

        let log = referee.record();
        let _ = referee.assert("flip", args![]).unwrap();
        assert_eq!(log.failures().len(), 1);
        assert_eq!(referee.names(), vec!["flip"]);
    }

    #[test]
    fn test_counter_and_reset() {
        let referee = quiet();
        referee.add("yes", Assertion::predicate(|_| true));

        let _ = referee.assert("yes", args![]).unwrap();
        let _ = referee.refute("yes", args![]).unwrap();
        referee.assert_truthy(true, None).unwrap();
        assert_eq!(referee.count(), 3);

        referee.reset_counters();
        assert_eq!(referee.count(), 0);
    }

    #[test]
    fn test_root_primitives() {
        let referee = quiet();
        let log = referee.record();

        referee.assert_truthy("x", Some("hi")).unwrap();
        referee.refute_truthy(Value::Null, None).unwrap();
        referee.refute_truthy("x", None).unwrap();
        referee.assert_truthy(false, Some("custom words")).unwrap();

        let passes = log.passes();
        assert_eq!(passes[0], PassEvent::new("assert", args!["hi", "x"]));
        assert_eq!(passes[1], PassEvent::new("refute", args!["", Value::Null]));

        let failures = log.failures();
        assert_eq!(failures[0].message(), "[refute] Expected x to be falsy");
        assert_eq!(failures[0].assertion(), "refute");
        assert_eq!(failures[1].message(), "custom words");
    }

    #[test]
    fn test_throw_flag_toggles() {
        let referee = Referee::new();
        assert!(referee.assert_truthy(false, None).is_err());
        referee.set_throw_on_failure(false);
        assert!(referee.assert_truthy(false, None).is_ok());
    }

    #[test]
    fn test_custom_formatter() {
        let referee = quiet();
        referee.set_formatter(|v| format!("«{v}»"));
        let log = referee.record();
        referee.assert_truthy(0, None).unwrap();
        assert_eq!(log.failures()[0].message(), "[assert] Expected «0» to be truthy");
    }

    #[test]
    fn test_clones_share_state() {
        let referee = quiet();
        let other = referee.clone();
        other.assert_truthy(1, None).unwrap();
        assert_eq!(referee.count(), 1);
    }
}
