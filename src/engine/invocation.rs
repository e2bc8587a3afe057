//! Per-call invocation context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::execute::Reporter;
use crate::engine::ShapeMatcher;
use crate::error::AssertionError;
use crate::events::PassEvent;
use crate::message::{self, Formatter, CUSTOM_MESSAGE};
use crate::registry::{Entry, Messages, Polarity, Verdict};
use crate::value::Value;

/// The environment a predicate body runs in.
///
/// A fresh context is created for every call and dropped once the call
/// settles. A body uses it to stash values for its failure message and to
/// fail with a specific message key. Clones share state, so a body returning
/// a pending verdict can move a clone into its future.
///
/// # Example
///
/// ```rust
/// use referee::{args, Assertion, Messages, Referee, Verdict};
///
/// let referee = Referee::builder().throw_on_failure(false).build();
/// let log = referee.record();
/// let even = referee.add(
///     "even",
///     Assertion::new(|ctx, args| {
///         let Some(n) = args.first().and_then(|v| match v {
///             referee::Value::Number(n) => Some(*n),
///             _ => None,
///         }) else {
///             return Ok(ctx.fail("notNumber"));
///         };
///         ctx.set("remainder", n % 2.0);
///         Ok(Verdict::from(n % 2.0 == 0.0))
///     })
///     .min_args(1)
///     .assert_message(
///         Messages::from("${0} left ${remainder}").with("notNumber", "${0} is not a number"),
///     ),
/// );
///
/// let _ = even.assert().call(args![3]).unwrap();
/// let _ = even.assert().call(args!["x"]).unwrap();
///
/// let failures = log.failures();
/// assert_eq!(failures[0].message(), "[assert.even] 3 left 1");
/// assert_eq!(failures[1].message(), "[assert.even] x is not a number");
/// ```
#[derive(Clone)]
pub struct Invocation {
    inner: Arc<InvocationInner>,
}

struct InvocationInner {
    entry: Arc<Entry>,
    polarity: Polarity,
    full_name: String,
    args: Vec<Value>,
    named: BTreeMap<String, Value>,
    formatter: Formatter,
    shape_matcher: ShapeMatcher,
    reporter: Reporter,
    state: Mutex<InvocationState>,
}

#[derive(Default)]
struct InvocationState {
    properties: BTreeMap<String, Value>,
    failure: Option<AssertionError>,
}

pub(crate) struct InvocationParts {
    pub(crate) entry: Arc<Entry>,
    pub(crate) polarity: Polarity,
    pub(crate) args: Vec<Value>,
    pub(crate) named: BTreeMap<String, Value>,
    pub(crate) formatter: Formatter,
    pub(crate) shape_matcher: ShapeMatcher,
    pub(crate) reporter: Reporter,
}

impl Invocation {
    pub(crate) fn new(parts: InvocationParts) -> Self {
        let full_name = parts.entry.full_name(parts.polarity);
        Self {
            inner: Arc::new(InvocationInner {
                entry: parts.entry,
                polarity: parts.polarity,
                full_name,
                args: parts.args,
                named: parts.named,
                formatter: parts.formatter,
                shape_matcher: parts.shape_matcher,
                reporter: parts.reporter,
                state: Mutex::new(InvocationState::default()),
            }),
        }
    }

    /// The assertion name, e.g. `rejects`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.entry.name
    }

    /// The full name, e.g. `refute.rejects`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    /// Which side is running.
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.inner.polarity
    }

    /// The effective arguments used for `${N}` placeholders.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.inner.args
    }

    /// Store a named value for `${name}` placeholders.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .state
            .lock()
            .properties
            .insert(name.into(), value.into());
    }

    /// A value previously stored with [`set`](Self::set).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.state.lock().properties.get(name).cloned()
    }

    /// Store the value rendered by `${expected}`.
    pub fn set_expected(&self, expected: impl Into<Value>) {
        self.set("expected", expected);
    }

    /// Store (or clear) the caller's custom message.
    pub fn set_custom_message(&self, message: Option<&str>) {
        let mut state = self.inner.state.lock();
        match message {
            Some(msg) => {
                state
                    .properties
                    .insert(CUSTOM_MESSAGE.to_string(), Value::from(msg));
            }
            None => {
                state.properties.remove(CUSTOM_MESSAGE);
            }
        }
    }

    /// Check `actual` against `matcher` with the engine's shape matcher.
    #[must_use]
    pub fn matches(&self, actual: &Value, matcher: &Value) -> bool {
        (self.inner.shape_matcher)(actual, matcher)
    }

    /// Render a value with the engine's formatter.
    #[must_use]
    pub fn format(&self, value: &Value) -> String {
        (self.inner.formatter)(value)
    }

    /// Returns `true` once [`fail`](Self::fail) has been called.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.inner.state.lock().failure.is_some()
    }

    /// The failure record, if this call failed.
    #[must_use]
    pub fn failure(&self) -> Option<AssertionError> {
        self.inner.state.lock().failure.clone()
    }

    /// Fail the call with the template registered under `key`.
    ///
    /// When no template is registered under `key`, `key` itself is used as
    /// the template. The rendered message is prefixed with
    /// `"[{type}.{name}] "` and reported. Only the first call has an effect.
    ///
    /// Always returns [`Verdict::fail`], so a body can `return Ok(ctx.fail(..))`.
    pub fn fail(&self, key: &str) -> Verdict {
        if let Some(first) = self.failure() {
            self.ignore_repeat(key, &first);
            return Verdict::fail();
        }

        let message = format!("[{}] {}", self.inner.full_name, self.render(key));
        let err = AssertionError::new(&self.inner.full_name, message);

        {
            let mut state = self.inner.state.lock();
            // Another thread may have failed while the message rendered.
            if let Some(first) = &state.failure {
                let first = first.clone();
                drop(state);
                self.ignore_repeat(key, &first);
                return Verdict::fail();
            }
            state.failure = Some(err.clone());
        }

        self.inner.reporter.failure(&err);
        Verdict::fail()
    }

    fn ignore_repeat(&self, key: &str, first: &AssertionError) {
        tracing::warn!(
            assertion = %self.inner.full_name,
            key,
            first = %first,
            "fail called again on a failed invocation; ignoring"
        );
    }

    /// Fail with the default template.
    pub fn fail_default(&self) -> Verdict {
        self.fail(Messages::DEFAULT_KEY)
    }

    /// Render the template for `key` without failing.
    #[must_use]
    pub fn render(&self, key: &str) -> String {
        let template = self.inner.entry.side(self.inner.polarity).template(key);
        let properties = self.inner.state.lock().properties.clone();

        let positional =
            message::interpolate_positional(&template, &self.inner.args, &self.inner.formatter);

        message::interpolate_named(&positional, |name| {
            let value = properties.get(name).or_else(|| self.inner.named.get(name));
            if name == CUSTOM_MESSAGE {
                let raw = match value {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(v) if !v.is_nullish() => Some(v.to_string()),
                    _ => None,
                };
                return Some(message::prepare_message(raw.as_deref()));
            }
            value.map(|v| (self.inner.formatter)(v))
        })
    }

    /// Settle the call: the failure if one was recorded, otherwise report
    /// and return the pass payload.
    pub(crate) fn conclude(&self) -> Result<PassEvent, AssertionError> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let pass = PassEvent::new(self.inner.full_name.clone(), self.inner.args.clone());
        self.inner.reporter.pass(&pass);
        Ok(pass)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Invocation")
            .field("assertion", &self.inner.full_name)
            .field("args", &self.inner.args)
            .field("properties", &state.properties)
            .field("failed", &state.failure.is_some())
            .finish()
    }
}
