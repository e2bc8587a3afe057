//! What a predicate body hands back to the engine.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt};

use crate::value::Settlement;

/// The result of running a predicate body.
///
/// A body either knows its answer right away, or returns a computation that
/// settles later. A pending verdict counts as held when the computation
/// resolves and as failed when it rejects.
pub enum Verdict {
    /// The condition was decided synchronously.
    Immediate(bool),
    /// The condition is decided when the computation settles.
    Pending(BoxFuture<'static, Settlement>),
}

impl Verdict {
    /// An immediate pass.
    #[must_use]
    pub fn pass() -> Self {
        Self::Immediate(true)
    }

    /// An immediate failure.
    #[must_use]
    pub fn fail() -> Self {
        Self::Immediate(false)
    }

    /// A verdict decided by `future`.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// The logical inverse.
    ///
    /// A pending verdict is inverted by swapping resolution and rejection.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Immediate(holds) => Self::Immediate(!holds),
            Self::Pending(future) => Self::Pending(
                future
                    .map(|settled| match settled {
                        Ok(value) => Err(value),
                        Err(reason) => Ok(reason),
                    })
                    .boxed(),
            ),
        }
    }

    /// Returns `true` for a pending verdict.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<bool> for Verdict {
    fn from(holds: bool) -> Self {
        Self::Immediate(holds)
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(holds) => f.debug_tuple("Immediate").field(holds).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use futures::executor::block_on;

    #[test]
    fn test_negate_immediate() {
        assert!(matches!(Verdict::pass().negate(), Verdict::Immediate(false)));
        assert!(matches!(Verdict::from(false).negate(), Verdict::Immediate(true)));
    }

    #[test]
    fn test_negate_pending_swaps_settlement() {
        let Verdict::Pending(resolved) =
            Verdict::pending(async { Ok(Value::from(1)) }).negate()
        else {
            panic!("expected pending");
        };
        assert_eq!(block_on(resolved), Err(Value::from(1)));

        let Verdict::Pending(rejected) =
            Verdict::pending(async { Err(Value::from("boom")) }).negate()
        else {
            panic!("expected pending");
        };
        assert_eq!(block_on(rejected), Ok(Value::from("boom")));
    }
}
