//! Assertion definitions and the name-keyed registry.
//!
//! An [`Assertion`] is defined once and installed under a unique name with
//! [`Referee::add`](crate::Referee::add). Installing it derives both entry
//! points: `assert.<name>` runs the assert body, `refute.<name>` runs the
//! refute body, which defaults to the logical inverse of the assert body.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, Assertion, Referee, Verdict};
//!
//! let referee = Referee::new();
//! let same = referee.add(
//!     "same",
//!     Assertion::new(|_ctx, args| Ok(Verdict::from(args[0] == args[1])))
//!         .min_args(2)
//!         .custom_message_at(2)
//!         .assert_message("${customMessage}${0} expected to be the same object as ${1}")
//!         .refute_message("${customMessage}${0} expected not to be the same object as ${1}"),
//! );
//!
//! assert!(same.assert().call(args!["Hey", "Hey"]).is_ok());
//! assert!(same.refute().call(args!["Hey", "Hey"]).is_err());
//! ```

mod messages;
mod verdict;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::Invocation;
use crate::error::Result;
use crate::value::Value;

pub use messages::Messages;
pub use verdict::Verdict;

/// Which side of an assertion is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// The affirmative entry point.
    Assert,
    /// The negated entry point.
    Refute,
}

impl Polarity {
    /// `assert` or `refute`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assert => "assert",
            Self::Refute => "refute",
        }
    }

    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Assert => Self::Refute,
            Self::Refute => Self::Assert,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values derived from the call arguments for message rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageValues {
    /// Extra values for `${identifier}` placeholders.
    Named(BTreeMap<String, Value>),
    /// A replacement argument list for `${N}` placeholders and the pass
    /// payload.
    Positional(Vec<Value>),
}

impl MessageValues {
    /// Build a named map from key/value pairs.
    pub fn named<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Vec<Value>> for MessageValues {
    fn from(args: Vec<Value>) -> Self {
        Self::Positional(args)
    }
}

/// A predicate body.
///
/// Runs with the call's [`Invocation`] context and the raw call arguments.
/// Returning `Err` signals a defect in the predicate itself: the error goes
/// straight back to the caller and no event is emitted.
pub type Body = Arc<dyn Fn(&Invocation, &[Value]) -> Result<Verdict> + Send + Sync>;

/// Derives message values from the raw call arguments.
pub type ValuesFn = Arc<dyn Fn(&[Value]) -> MessageValues + Send + Sync>;

/// Definition of one logical assertion.
///
/// Built with [`Assertion::new`] and the chained setters, then installed
/// with [`Referee::add`](crate::Referee::add).
#[derive(Clone)]
pub struct Assertion {
    assert: Body,
    refute: Option<Body>,
    min_args: usize,
    refute_min_args: Option<usize>,
    values: Option<ValuesFn>,
    assert_messages: Messages,
    refute_messages: Messages,
    expectation: Option<String>,
    custom_message_at: Option<usize>,
}

impl Assertion {
    /// Define an assertion from its assert body.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Invocation, &[Value]) -> Result<Verdict> + Send + Sync + 'static,
    {
        Self {
            assert: Arc::new(body),
            refute: None,
            min_args: 0,
            refute_min_args: None,
            values: None,
            assert_messages: Messages::new(),
            refute_messages: Messages::new(),
            expectation: None,
            custom_message_at: None,
        }
    }

    /// Define an assertion from a plain boolean predicate over the arguments.
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Self::new(move |_, args| Ok(Verdict::from(check(args))))
    }

    /// Supply an independent refute body instead of the negated assert body.
    #[must_use]
    pub fn refute<F>(mut self, body: F) -> Self
    where
        F: Fn(&Invocation, &[Value]) -> Result<Verdict> + Send + Sync + 'static,
    {
        self.refute = Some(Arc::new(body));
        self
    }

    /// Smallest argument count accepted by the assert side (and by the
    /// refute side unless [`refute_min_args`](Self::refute_min_args) is set).
    #[must_use]
    pub fn min_args(mut self, count: usize) -> Self {
        self.min_args = count;
        self
    }

    /// Smallest argument count accepted by the refute side.
    #[must_use]
    pub fn refute_min_args(mut self, count: usize) -> Self {
        self.refute_min_args = Some(count);
        self
    }

    /// Derive message values from the call arguments.
    #[must_use]
    pub fn values<F>(mut self, extract: F) -> Self
    where
        F: Fn(&[Value]) -> MessageValues + Send + Sync + 'static,
    {
        self.values = Some(Arc::new(extract));
        self
    }

    /// Failure templates for the assert side.
    #[must_use]
    pub fn assert_message(mut self, messages: impl Into<Messages>) -> Self {
        self.assert_messages = messages.into();
        self
    }

    /// Failure templates for the refute side.
    #[must_use]
    pub fn refute_message(mut self, messages: impl Into<Messages>) -> Self {
        self.refute_messages = messages.into();
        self
    }

    /// Name under which an expectation façade exposes this assertion.
    #[must_use]
    pub fn expectation(mut self, name: impl Into<String>) -> Self {
        self.expectation = Some(name.into());
        self
    }

    /// Treat the argument at `index`, when it is a string, as the caller's
    /// custom message, rendered by `${customMessage}`.
    #[must_use]
    pub fn custom_message_at(mut self, index: usize) -> Self {
        self.custom_message_at = Some(index);
        self
    }

    pub(crate) fn expectation_name(&self) -> Option<&str> {
        self.expectation.as_deref()
    }

    pub(crate) fn into_entry(self, name: String, alias: Option<String>) -> Entry {
        let refute_min_args = self.refute_min_args.unwrap_or(self.min_args);
        let refute = self.refute.unwrap_or_else(|| {
            let assert = Arc::clone(&self.assert);
            let negated: Body =
                Arc::new(move |ctx: &Invocation, args: &[Value]| assert(ctx, args).map(Verdict::negate));
            negated
        });

        Entry {
            name,
            expectation: alias,
            values: self.values,
            custom_message_at: self.custom_message_at,
            assert: Side {
                body: self.assert,
                min_args: self.min_args,
                messages: RwLock::new(self.assert_messages),
            },
            refute: Side {
                body: refute,
                min_args: refute_min_args,
                messages: RwLock::new(self.refute_messages),
            },
        }
    }
}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assertion")
            .field("min_args", &self.min_args)
            .field("refute_min_args", &self.refute_min_args)
            .field("custom_refute", &self.refute.is_some())
            .field("expectation", &self.expectation)
            .finish_non_exhaustive()
    }
}

/// One installed assertion: both sides plus shared metadata.
pub(crate) struct Entry {
    pub(crate) name: String,
    pub(crate) expectation: Option<String>,
    pub(crate) values: Option<ValuesFn>,
    pub(crate) custom_message_at: Option<usize>,
    assert: Side,
    refute: Side,
}

pub(crate) struct Side {
    pub(crate) body: Body,
    pub(crate) min_args: usize,
    pub(crate) messages: RwLock<Messages>,
}

impl Entry {
    pub(crate) fn side(&self, polarity: Polarity) -> &Side {
        match polarity {
            Polarity::Assert => &self.assert,
            Polarity::Refute => &self.refute,
        }
    }

    pub(crate) fn full_name(&self, polarity: Polarity) -> String {
        format!("{polarity}.{}", self.name)
    }
}

impl Side {
    /// Template for `key`, falling back to the key itself.
    pub(crate) fn template(&self, key: &str) -> String {
        self.messages.read().resolve(key).to_string()
    }
}

/// Name-keyed table of installed assertions.
///
/// Plain expectation aliases are resolved last-registration-wins.
#[derive(Default)]
pub(crate) struct Registry {
    table: RwLock<Table>,
}

#[derive(Default)]
struct Table {
    entries: HashMap<String, Arc<Entry>>,
    aliases: HashMap<String, String>,
}

impl Registry {
    /// Install `entry`, returning the definition it replaced.
    pub(crate) fn insert(&self, entry: Arc<Entry>) -> Option<Arc<Entry>> {
        let mut table = self.table.write();
        table.aliases.retain(|_, name| *name != entry.name);
        if let Some(alias) = &entry.expectation {
            if let Some(previous) = table.aliases.insert(alias.clone(), entry.name.clone()) {
                tracing::debug!(expectation = %alias, %previous, assertion = %entry.name, "expectation alias taken over");
            }
        }
        table.entries.insert(entry.name.clone(), entry)
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<Entry>> {
        self.table.read().entries.get(name).cloned()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn by_expectation(&self, expectation: &str) -> Option<Arc<Entry>> {
        let table = self.table.read();
        let name = table.aliases.get(expectation)?;
        table.entries.get(name).cloned()
    }
}
