//! Handles to installed assertions and their call forms.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use futures::future::{self, BoxFuture, Either, FutureExt, Ready};
use pin_project_lite::pin_project;

use crate::engine::execute::{self, Call, Execution, Reporter, Verification};
use crate::engine::Referee;
use crate::error::{Error, Result};
use crate::events::PassEvent;
use crate::registry::{Entry, Messages, Polarity};
use crate::value::Value;

/// Opaque handle returned by [`Referee::add`].
///
/// Gives access to both entry points of one installed assertion.
#[derive(Clone)]
pub struct AssertionHandle {
    referee: Referee,
    entry: Arc<Entry>,
}

impl AssertionHandle {
    pub(crate) fn new(referee: Referee, entry: Arc<Entry>) -> Self {
        Self { referee, entry }
    }

    /// The assertion name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// The plain expectation alias.
    ///
    /// Only set when no expectation façade was installed at registration;
    /// otherwise the name was handed to the façade instead.
    #[must_use]
    pub fn expectation_name(&self) -> Option<&str> {
        self.entry.expectation.as_deref()
    }

    /// The `assert.<name>` entry point.
    #[must_use]
    pub fn assert(&self) -> EntryPoint {
        self.side(Polarity::Assert)
    }

    /// The `refute.<name>` entry point.
    #[must_use]
    pub fn refute(&self) -> EntryPoint {
        self.side(Polarity::Refute)
    }

    /// The entry point for `polarity`.
    #[must_use]
    pub fn side(&self, polarity: Polarity) -> EntryPoint {
        EntryPoint {
            referee: self.referee.clone(),
            entry: Arc::clone(&self.entry),
            polarity,
        }
    }
}

impl fmt::Debug for AssertionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionHandle")
            .field("name", &self.entry.name)
            .field("expectation", &self.entry.expectation)
            .finish()
    }
}

/// One side (`assert.<name>` or `refute.<name>`) of an installed assertion.
#[derive(Clone)]
pub struct EntryPoint {
    referee: Referee,
    entry: Arc<Entry>,
    polarity: Polarity,
}

impl EntryPoint {
    /// Full name, e.g. `assert.equals`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.entry.full_name(self.polarity)
    }

    /// Which side this is.
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Smallest accepted argument count.
    #[must_use]
    pub fn min_args(&self) -> usize {
        self.entry.side(self.polarity).min_args
    }

    /// Direct call form.
    ///
    /// Counts the call and emits exactly one event. A synchronous predicate
    /// settles before this returns: a failure is returned as
    /// [`Error::Assertion`] unless throwing is switched off. A deferred
    /// predicate returns [`Completion::Pending`], whose outcome is emitted
    /// once it is awaited. Dropping a pending completion without awaiting it
    /// leaves the call counted but emits no event at all.
    ///
    /// # Errors
    ///
    /// [`Error::Assertion`] for arity or assertion failures (when throwing
    /// on failure), [`Error::Predicate`] when the body itself failed.
    pub fn call(&self, args: Vec<Value>) -> Result<Completion> {
        self.referee.count_assertion();

        match execute::execute(self.prepare(args, self.referee.reporter()))? {
            Execution::Settled(Ok(_)) => Ok(Completion::Settled),
            Execution::Settled(Err(err)) => self.referee.raise(err).map(|()| Completion::Settled),
            Execution::Pending(outcome) => Ok(Completion::Pending(PendingAssertion {
                outcome,
                referee: self.referee.clone(),
            })),
        }
    }

    /// Deferred-outcome call form.
    ///
    /// Always yields one future: `Ok` with the pass payload on success,
    /// `Err` on failure. Neither counts the call nor emits events.
    pub fn verify(&self, args: Vec<Value>) -> BoxFuture<'static, Result<PassEvent>> {
        match execute::execute(self.prepare(args, Reporter::Silent)) {
            Err(err) => future::ready(Err(err)).boxed(),
            Ok(Execution::Settled(outcome)) => future::ready(outcome.map_err(Error::from)).boxed(),
            Ok(Execution::Pending(outcome)) => outcome.map(|v| v.map_err(Error::from)).boxed(),
        }
    }

    /// The template registered under `key`.
    #[must_use]
    pub fn message(&self, key: &str) -> Option<String> {
        self.entry
            .side(self.polarity)
            .messages
            .read()
            .get(key)
            .map(ToString::to_string)
    }

    /// Register or override the template for `key`.
    pub fn set_message(&self, key: impl Into<String>, template: impl Into<String>) {
        self.entry
            .side(self.polarity)
            .messages
            .write()
            .insert(key, template);
    }

    /// Snapshot of every template on this side.
    #[must_use]
    pub fn messages(&self) -> Messages {
        self.entry.side(self.polarity).messages.read().clone()
    }

    fn prepare(&self, args: Vec<Value>, reporter: Reporter) -> Call {
        Call {
            entry: Arc::clone(&self.entry),
            polarity: self.polarity,
            args,
            formatter: self.referee.formatter(),
            shape_matcher: self.referee.shape_matcher(),
            reporter,
        }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryPoint").field(&self.full_name()).finish()
    }
}

/// What a direct call returned.
///
/// A [`Pending`](Self::Pending) completion must be awaited to report. If it
/// is dropped first, its call stays counted and its event is lost.
#[must_use = "a pending assertion reports nothing until it is awaited"]
pub enum Completion {
    /// The outcome was already emitted.
    Settled,
    /// The predicate is waiting on a deferred computation.
    Pending(PendingAssertion),
}

impl Completion {
    /// Returns `true` if the outcome is still to come.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl IntoFuture for Completion {
    type Output = Result<()>;
    type IntoFuture = Either<Ready<Result<()>>, PendingAssertion>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Settled => Either::Left(future::ready(Ok(()))),
            Self::Pending(pending) => Either::Right(pending),
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settled => f.write_str("Settled"),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

pin_project! {
    /// A direct call whose predicate returned a deferred verdict.
    ///
    /// Emits its single event when the deferred computation settles, which
    /// only happens while this future is polled. Dropping it unpolled loses
    /// the event. Resolves to `Err` on failure unless throwing is switched off.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct PendingAssertion {
        #[pin]
        outcome: BoxFuture<'static, Verification>,
        referee: Referee,
    }
}

impl Future for PendingAssertion {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match ready!(this.outcome.poll(cx)) {
            Ok(_) => Poll::Ready(Ok(())),
            Err(err) => Poll::Ready(this.referee.raise(err)),
        }
    }
}

impl fmt::Debug for PendingAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAssertion").finish_non_exhaustive()
    }
}
