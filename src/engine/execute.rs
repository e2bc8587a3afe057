//! Runs one invocation of an installed assertion.
//!
//! Every path ends in exactly one outcome: one `pass` or one `failure`. A
//! synchronous verdict settles before [`execute`] returns; a pending verdict
//! settles when the returned future completes.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::engine::arity;
use crate::engine::invocation::{Invocation, InvocationParts};
use crate::engine::ShapeMatcher;
use crate::error::{AssertionError, Result};
use crate::events::{Event, EventChannel, PassEvent};
use crate::message::Formatter;
use crate::registry::{Entry, MessageValues, Polarity, Verdict};
use crate::value::Value;

/// Outcome of one invocation.
pub(crate) type Verification = std::result::Result<PassEvent, AssertionError>;

/// Where an invocation reports its outcome.
#[derive(Clone)]
pub(crate) enum Reporter {
    /// Emit on the event channel (direct call form).
    Channel(Arc<EventChannel>),
    /// Report only through the returned value (deferred-outcome form).
    Silent,
}

impl Reporter {
    pub(crate) fn pass(&self, pass: &PassEvent) {
        if let Self::Channel(channel) = self {
            tracing::trace!(assertion = %pass.name, "pass");
            channel.emit(&Event::Pass(pass.clone()));
        }
    }

    pub(crate) fn failure(&self, err: &AssertionError) {
        if let Self::Channel(channel) = self {
            tracing::debug!(assertion = %err.assertion(), failure = %err.message(), "failure");
            channel.emit(&Event::Failure(err.clone()));
        }
    }
}

pub(crate) enum Execution {
    Settled(Verification),
    Pending(BoxFuture<'static, Verification>),
}

pub(crate) struct Call {
    pub(crate) entry: Arc<Entry>,
    pub(crate) polarity: Polarity,
    pub(crate) args: Vec<Value>,
    pub(crate) formatter: Formatter,
    pub(crate) shape_matcher: ShapeMatcher,
    pub(crate) reporter: Reporter,
}

/// Run `call` through the arity gate, the predicate body and resolution.
///
/// `Err` is returned only for a predicate internal error, which bypasses
/// the reporter.
pub(crate) fn execute(call: Call) -> Result<Execution> {
    let Call {
        entry,
        polarity,
        args,
        formatter,
        shape_matcher,
        reporter,
    } = call;

    let side = entry.side(polarity);
    let full_name = entry.full_name(polarity);

    if let Err(err) = arity::validate(&reporter, &full_name, args.len(), side.min_args) {
        return Ok(Execution::Settled(Err(err)));
    }

    let extracted = entry.values.as_ref().map(|extract| extract(args.as_slice()));
    let (effective, named) = match extracted {
        Some(MessageValues::Named(named)) => (args.clone(), named),
        Some(MessageValues::Positional(replaced)) => (replaced, BTreeMap::new()),
        None => (args.clone(), BTreeMap::new()),
    };

    let ctx = Invocation::new(InvocationParts {
        entry: Arc::clone(&entry),
        polarity,
        args: effective,
        named,
        formatter,
        shape_matcher,
        reporter,
    });

    if let Some(message) = entry
        .custom_message_at
        .and_then(|index| args.get(index))
        .and_then(Value::as_str)
    {
        ctx.set_custom_message(Some(message));
    }

    let body = Arc::clone(&side.body);
    let verdict = body(&ctx, args.as_slice())?;

    match verdict {
        Verdict::Immediate(holds) => {
            if !holds && !ctx.failed() {
                ctx.fail_default();
            }
            Ok(Execution::Settled(ctx.conclude()))
        }
        Verdict::Pending(settlement) => Ok(Execution::Pending(
            async move {
                // The rejection branch completes before the pass decision.
                if settlement.await.is_err() && !ctx.failed() {
                    ctx.fail_default();
                }
                ctx.conclude()
            }
            .boxed(),
        )),
    }
}
