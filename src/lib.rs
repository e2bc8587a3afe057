//! # referee
//!
//! > Pluggable assertions with one reporting contract
//!
//! **referee** lets you define an assertion once and get both its `assert`
//! and `refute` forms. Every call emits exactly one `pass` or one `failure`
//! event, whether the predicate answers right away or waits on a deferred
//! computation.
//!
//! ## Quick Start
//!
//! ```rust
//! use referee::prelude::*;
//! use referee::args;
//!
//! let referee = Referee::new();
//! let log = referee.record();
//!
//! let equals = referee.add(
//!     "equals",
//!     Assertion::predicate(|args| args[0] == args[1])
//!         .min_args(2)
//!         .custom_message_at(2)
//!         .assert_message("${customMessage}${0} expected to equal ${1}")
//!         .refute_message("${customMessage}${0} expected not to equal ${1}"),
//! );
//!
//! assert!(equals.assert().call(args![1, 1]).is_ok());
//!
//! let err = equals.assert().call(args!["Yo", "Hey", "greeting"]).unwrap_err();
//! assert_eq!(err.to_string(), "[assert.equals] greeting: Yo expected to equal Hey");
//! assert_eq!(log.len(), 2);
//! ```
//!
//! ## Features
//!
//! - **Registry** - define assert and refute once, negation derived
//! - **Deferred predicates** - await computations, report when they settle
//! - **Message templates** - `${0}` positional and `${name}` named placeholders
//! - **Event channel** - subscribe to `pass` and `failure`
//! - **Expectations** - `expect(actual).not().to("toThrow", ..)`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Dynamically typed assertion arguments
pub mod value;

pub mod assertions;
pub mod engine;
pub mod error;
pub mod events;
pub mod expect;
pub mod message;
pub mod registry;

/// Prelude for convenient imports
///
/// ```rust
/// use referee::prelude::*;
/// ```
pub mod prelude {
    pub use crate::engine::{
        AssertionHandle, Completion, EntryPoint, Invocation, PendingAssertion, Referee,
        RefereeConfig,
    };
    pub use crate::error::{AssertionError, Error, Result};
    pub use crate::events::{Event, EventKind, EventLog, PassEvent};
    pub use crate::registry::{Assertion, MessageValues, Messages, Polarity, Verdict};
    pub use crate::value::{Deferred, Value};
}

// Re-exports
pub use engine::{
    AssertionHandle, Completion, EntryPoint, Invocation, PendingAssertion, Referee,
    RefereeBuilder, RefereeConfig, ShapeMatcher,
};
pub use error::{AssertionError, Error, Result};
pub use events::{Event, EventChannel, EventKind, EventLog, PassEvent, Subscription};
pub use expect::{Expectation, ExpectationFacade, ExpectationTable};
pub use message::Formatter;
pub use registry::{Assertion, MessageValues, Messages, Polarity, Verdict};
pub use value::{Callable, Deferred, ErrorValue, Settlement, Value};
