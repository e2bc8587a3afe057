//! Matcher argument dispatch shared by the deferred assertions.

use crate::engine::Invocation;
use crate::value::{Callable, Value};

/// How a settled value is checked.
#[derive(Debug, Clone, Default)]
pub(crate) enum Matcher {
    /// No matcher was supplied.
    #[default]
    Absent,
    /// Deep property-shape match.
    Shape(Value),
    /// Must return literal `true`.
    Predicate(Callable),
}

/// Outcome of [`Matcher::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mismatch {
    /// The shape did not match.
    Shape,
    /// The matcher function did not return `true`.
    Predicate,
}

impl Matcher {
    /// Split the optional matcher argument from the custom message.
    ///
    /// A string in the matcher slot is the custom message and no matcher is
    /// used; otherwise the message is taken from the following slot.
    pub(crate) fn dispatch(slot: Option<&Value>, next: Option<&Value>) -> (Self, Option<String>) {
        let message = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_string);

        match slot {
            Some(Value::String(custom)) => (Self::Absent, Some(custom.clone())),
            Some(Value::Function(func)) => (Self::Predicate(func.clone()), message(next)),
            Some(shape @ (Value::Object(_) | Value::Array(_) | Value::Error(_))) => {
                (Self::Shape(shape.clone()), message(next))
            }
            _ => (Self::Absent, message(next)),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub(crate) fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// The matcher as a value for `${expected}`.
    pub(crate) fn expected(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Shape(shape) => Some(shape.clone()),
            Self::Predicate(func) => Some(Value::Function(func.clone())),
        }
    }

    /// Check `actual`, using the engine's shape matcher for shapes.
    pub(crate) fn check(&self, ctx: &Invocation, actual: &Value) -> Result<(), Mismatch> {
        match self {
            Self::Absent => Ok(()),
            Self::Shape(shape) if ctx.matches(actual, shape) => Ok(()),
            Self::Shape(_) => Err(Mismatch::Shape),
            Self::Predicate(func) => match func.call(std::slice::from_ref(actual)) {
                Value::Bool(true) => Ok(()),
                _ => Err(Mismatch::Predicate),
            },
        }
    }
}

/// Store a rejection's `name` and `message` for message templates.
pub(crate) fn record_exception(ctx: &Invocation, reason: &Value) {
    ctx.set("actualExceptionType", reason.property("name"));
    ctx.set("actualExceptionMessage", reason.property("message"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_slot_is_custom_message() {
        let (matcher, message) = Matcher::dispatch(Some(&"careful".into()), Some(&"ignored".into()));
        assert!(matcher.is_absent());
        assert_eq!(message.as_deref(), Some("careful"));
    }

    #[test]
    fn test_object_and_function_slots() {
        let shape = Value::object([("name", "TypeError")]);
        let (matcher, message) = Matcher::dispatch(Some(&shape), Some(&"msg".into()));
        assert!(matcher.is_shape());
        assert_eq!(matcher.expected(), Some(shape));
        assert_eq!(message.as_deref(), Some("msg"));

        let func = Value::function(|_| Value::Bool(true));
        let (matcher, message) = Matcher::dispatch(Some(&func), None);
        assert!(matches!(matcher, Matcher::Predicate(_)));
        assert!(message.is_none());
    }

    #[test]
    fn test_missing_slot() {
        let (matcher, message) = Matcher::dispatch(None, None);
        assert!(matcher.is_absent());
        assert!(matcher.expected().is_none());
        assert!(message.is_none());
    }
}
