//! Minimum argument count check.

use crate::engine::execute::Reporter;
use crate::error::AssertionError;

/// Check that a call received at least `required` arguments.
///
/// On a short call the standard failure is reported through `reporter` and
/// returned; the predicate must not run.
pub(crate) fn validate(
    reporter: &Reporter,
    full_name: &str,
    received: usize,
    required: usize,
) -> Result<(), AssertionError> {
    if received >= required {
        return Ok(());
    }

    let plural = if required == 1 { "" } else { "s" };
    let err = AssertionError::new(
        full_name,
        format!("[{full_name}] Expected to receive at least {required} argument{plural}"),
    );
    reporter.failure(&err);
    Err(err)
}
