//! `resolves`: the computation must settle successfully.
//!
//! ```text
//! assert.resolves(deferred[, matcher][, message])
//! refute.resolves(deferred[, message])
//! ```
//!
//! Mirror of [`rejects`](super::rejects). The optional matcher is applied to
//! the resolved value with the same dispatch rule.

use futures::FutureExt;

use crate::assertions::matcher::{record_exception, Matcher, Mismatch};
use crate::assertions::rejects::deferred_arg;
use crate::engine::Invocation;
use crate::error::Result;
use crate::registry::{Assertion, Messages, Verdict};
use crate::value::Value;

/// Registered name.
pub const NAME: &str = "resolves";

/// Expectation name.
pub const EXPECTATION: &str = "toResolve";

/// The `resolves` definition.
#[must_use]
pub fn assertion() -> Assertion {
    Assertion::new(assert_resolves)
        .refute(refute_resolves)
        .min_args(1)
        .expectation(EXPECTATION)
        .assert_message(
            Messages::from(
                "${customMessage}Expected resolution but rejected with ${actualExceptionType} (${actualExceptionMessage})",
            )
            .with(
                "typeFailMessage",
                "${customMessage}Expected ${expected} but resolved with ${actual}",
            )
            .with(
                "matchFailMessage",
                "${customMessage}Expected resolved ${actual} to pass matcher function",
            ),
        )
        .refute_message("${customMessage}Expected rejection but resolved with ${actual}")
}

fn assert_resolves(ctx: &Invocation, args: &[Value]) -> Result<Verdict> {
    let deferred = deferred_arg(ctx, args)?;
    let (matcher, custom) = Matcher::dispatch(args.get(1), args.get(2));

    ctx.set_custom_message(custom.as_deref());
    if let Some(expected) = matcher.expected() {
        ctx.set_expected(expected);
    }

    let ctx = ctx.clone();
    Ok(Verdict::pending(deferred.settle().map(move |settled| {
        let value = match settled {
            Ok(value) => value,
            Err(reason) => {
                record_exception(&ctx, &reason);
                return Err(reason);
            }
        };

        ctx.set("actual", value.clone());
        match matcher.check(&ctx, &value) {
            Ok(()) => {}
            Err(Mismatch::Shape) => {
                ctx.fail("typeFailMessage");
            }
            Err(Mismatch::Predicate) => {
                ctx.fail("matchFailMessage");
            }
        }
        Ok(value)
    })))
}

fn refute_resolves(ctx: &Invocation, args: &[Value]) -> Result<Verdict> {
    let deferred = deferred_arg(ctx, args)?;
    ctx.set_custom_message(args.get(1).and_then(Value::as_str));

    let ctx = ctx.clone();
    Ok(Verdict::pending(deferred.settle().map(move |settled| match settled {
        Ok(value) => {
            ctx.set("actual", value.clone());
            Err(value)
        }
        Err(reason) => Ok(reason),
    })))
}
