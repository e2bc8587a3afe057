//! Built-in assertions over deferred computations.
//!
//! - [`rejects`] - the computation must reject
//! - [`resolves`] - the computation must resolve
//!
//! Both return a pending verdict, so their direct call yields
//! [`Completion::Pending`](crate::Completion::Pending) and reports once
//! awaited.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, assertions, Deferred, Referee, Value};
//!
//! # futures::executor::block_on(async {
//! let referee = Referee::new();
//! assertions::install_defaults(&referee);
//!
//! let boom = Deferred::rejected(Value::error("TypeError", "boom"));
//! referee.assert("rejects", args![boom.clone()]).unwrap().await.unwrap();
//!
//! let err = referee.refute("rejects", args![boom]).unwrap().await.unwrap_err();
//! assert!(err.to_string().contains("threw TypeError (boom)"));
//! # });
//! ```

mod matcher;
pub mod rejects;
pub mod resolves;

use crate::engine::{AssertionHandle, Referee};

/// Install every built-in assertion on `referee`.
pub fn install_defaults(referee: &Referee) -> Vec<AssertionHandle> {
    vec![
        referee.add(rejects::NAME, rejects::assertion()),
        referee.add(resolves::NAME, resolves::assertion()),
    ]
}

#[cfg(test)]
mod tests {
    use std::future::IntoFuture;

    use futures::executor::block_on;

    use super::*;
    use crate::args;
    use crate::error::Error;
    use crate::value::{Deferred, Value};

    fn setup() -> Referee {
        let referee = Referee::builder().throw_on_failure(false).build();
        install_defaults(&referee);
        referee
    }

    #[test]
    fn test_install_defaults() {
        let referee = Referee::new();
        let handles = install_defaults(&referee);
        assert_eq!(handles.len(), 2);
        assert_eq!(referee.names(), vec!["rejects", "resolves"]);
        assert_eq!(referee.resolve_expectation("toThrow").as_deref(), Some("rejects"));
        assert_eq!(referee.resolve_expectation("toResolve").as_deref(), Some("resolves"));
    }

    #[test]
    fn test_rejects_with_shape_matcher() {
        let referee = setup();
        let log = referee.record();
        let boom = Deferred::rejected(Value::error("TypeError", "boom"));

        let pass = referee
            .assert("rejects", args![boom.clone(), Value::object([("name", "TypeError")])])
            .unwrap();
        block_on(pass.into_future()).unwrap();

        let fail = referee
            .assert("rejects", args![boom, Value::object([("name", "RangeError")])])
            .unwrap();
        block_on(fail.into_future()).unwrap();

        assert_eq!(log.passes().len(), 1);
        assert_eq!(
            log.failures()[0].message(),
            "[assert.rejects] Expected [object Object] but threw TypeError (boom)"
        );
    }

    #[test]
    fn test_rejects_shape_matcher_on_resolution() {
        let referee = setup();
        let log = referee.record();

        let completion = referee
            .assert(
                "rejects",
                args![Deferred::resolved(1), Value::object([("name", "TypeError")]), "ctx"],
            )
            .unwrap();
        block_on(completion.into_future()).unwrap();

        assert_eq!(
            log.failures()[0].message(),
            "[assert.rejects] ctx: Expected [object Object] but no exception was thrown"
        );
    }

    #[test]
    fn test_rejects_with_matcher_function() {
        let referee = setup();
        let log = referee.record();
        let boom = Deferred::rejected(Value::error("TypeError", "boom"));
        let is_type_error = Value::function(|args| {
            Value::Bool(args[0].property("name") == Value::from("TypeError"))
        });
        let never = Value::function(|_| Value::from("yes"));

        block_on(
            referee
                .assert("rejects", args![boom.clone(), is_type_error])
                .unwrap()
                .into_future(),
        )
        .unwrap();
        block_on(
            referee
                .assert("rejects", args![boom, never])
                .unwrap()
                .into_future(),
        )
        .unwrap();

        assert_eq!(log.passes().len(), 1);
        assert_eq!(
            log.failures()[0].message(),
            "[assert.rejects] Expected thrown TypeError (boom) to pass matcher function"
        );
    }

    #[test]
    fn test_rejects_requires_deferred() {
        let referee = setup();
        let log = referee.record();

        let err = referee.assert("rejects", args![42]).unwrap_err();
        assert!(matches!(err, Error::Predicate { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn test_resolves() {
        let referee = setup();
        let log = referee.record();

        block_on(
            referee
                .assert("resolves", args![Deferred::resolved(Value::object([("id", 7)]))])
                .unwrap()
                .into_future(),
        )
        .unwrap();
        block_on(
            referee
                .assert("resolves", args![Deferred::rejected(Value::error("Error", "nope"))])
                .unwrap()
                .into_future(),
        )
        .unwrap();
        block_on(
            referee
                .refute("resolves", args![Deferred::resolved("done")])
                .unwrap()
                .into_future(),
        )
        .unwrap();

        assert_eq!(log.passes().len(), 1);
        let failures = log.failures();
        assert_eq!(
            failures[0].message(),
            "[assert.resolves] Expected resolution but rejected with Error (nope)"
        );
        assert_eq!(
            failures[1].message(),
            "[refute.resolves] Expected rejection but resolved with done"
        );
    }

    #[test]
    fn test_resolves_matcher() {
        let referee = setup();
        let log = referee.record();

        block_on(
            referee
                .assert("resolves", args![Deferred::resolved(3), Value::object([("id", 1)])])
                .unwrap()
                .into_future(),
        )
        .unwrap();

        assert_eq!(
            log.failures()[0].message(),
            "[assert.resolves] Expected [object Object] but resolved with 3"
        );
    }
}
