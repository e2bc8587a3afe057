//! `rejects`: the computation must settle into a rejection.
//!
//! ```text
//! assert.rejects(deferred[, matcher][, message])
//! refute.rejects(deferred[, message])
//! ```
//!
//! The assert form passes when the computation rejects and the reason
//! satisfies the optional matcher: an object is matched by shape, a function
//! must return `true`, a string is taken as the custom message. The refute
//! form passes when the computation resolves.

use futures::FutureExt;

use crate::assertions::matcher::{record_exception, Matcher, Mismatch};
use crate::engine::Invocation;
use crate::error::{Error, Result};
use crate::registry::{Assertion, Messages, Verdict};
use crate::value::{Deferred, Value};

/// Registered name.
pub const NAME: &str = "rejects";

/// Expectation name.
pub const EXPECTATION: &str = "toThrow";

/// The `rejects` definition.
#[must_use]
pub fn assertion() -> Assertion {
    Assertion::new(assert_rejects)
        .refute(refute_rejects)
        .min_args(1)
        .expectation(EXPECTATION)
        .assert_message(
            Messages::from("${customMessage}Expected rejection")
                .with(
                    "typeNoExceptionMessage",
                    "${customMessage}Expected ${expected} but no exception was thrown",
                )
                .with(
                    "typeFailMessage",
                    "${customMessage}Expected ${expected} but threw ${actualExceptionType} (${actualExceptionMessage})",
                )
                .with(
                    "matchFailMessage",
                    "${customMessage}Expected thrown ${actualExceptionType} (${actualExceptionMessage}) to pass matcher function",
                ),
        )
        .refute_message(
            "${customMessage}Expected not to throw but threw ${actualExceptionType} (${actualExceptionMessage})",
        )
}

pub(crate) fn deferred_arg(ctx: &Invocation, args: &[Value]) -> Result<Deferred> {
    match args.first() {
        Some(Value::Deferred(deferred)) => Ok(deferred.clone()),
        other => Err(Error::predicate(
            ctx.full_name(),
            format!(
                "expected a deferred computation, got {}",
                other.map_or_else(|| "nothing".to_string(), |v| format!("{v:?}"))
            ),
        )),
    }
}

fn assert_rejects(ctx: &Invocation, args: &[Value]) -> Result<Verdict> {
    let deferred = deferred_arg(ctx, args)?;
    let (matcher, custom) = Matcher::dispatch(args.get(1), args.get(2));

    ctx.set_custom_message(custom.as_deref());
    if let Some(expected) = matcher.expected() {
        ctx.set_expected(expected);
    }

    let ctx = ctx.clone();
    Ok(Verdict::pending(deferred.settle().map(move |settled| {
        match settled {
            Ok(_) => {
                if matcher.is_shape() {
                    ctx.fail("typeNoExceptionMessage");
                } else {
                    ctx.fail_default();
                }
            }
            Err(reason) => {
                record_exception(&ctx, &reason);
                match matcher.check(&ctx, &reason) {
                    Ok(()) => {}
                    Err(Mismatch::Shape) => {
                        ctx.fail("typeFailMessage");
                    }
                    Err(Mismatch::Predicate) => {
                        ctx.fail("matchFailMessage");
                    }
                }
            }
        }
        Ok(Value::Undefined)
    })))
}

fn refute_rejects(ctx: &Invocation, args: &[Value]) -> Result<Verdict> {
    let deferred = deferred_arg(ctx, args)?;
    ctx.set_custom_message(args.get(1).and_then(Value::as_str));

    let ctx = ctx.clone();
    Ok(Verdict::pending(deferred.settle().map(move |settled| {
        if let Err(reason) = &settled {
            record_exception(&ctx, reason);
        }
        settled
    })))
}
