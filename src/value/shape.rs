//! Default shape matcher.
//!
//! Used wherever an assertion needs a loose "does this value look like that"
//! comparison, e.g. the object matcher accepted by `rejects`.

use super::Value;

/// Check `actual` against `matcher`.
///
/// - object matcher: every property of the matcher must match the same
///   property of `actual`, recursively; extra properties on `actual` are
///   ignored.
/// - function matcher: called with `actual`, must return literal `true`.
/// - array matcher: must appear as a contiguous run inside an array `actual`,
///   element-wise matched with these same rules.
/// - anything else: plain equality.
pub(crate) fn matches_shape(actual: &Value, matcher: &Value) -> bool {
    match matcher {
        Value::Object(expected) => {
            actual.is_object_like()
                && expected
                    .iter()
                    .all(|(key, m)| matches_shape(&actual.property(key), m))
        }
        Value::Function(predicate) => {
            predicate.call(std::slice::from_ref(actual)) == Value::Bool(true)
        }
        Value::Array(expected) => match actual {
            Value::Array(items) => {
                expected.is_empty()
                    || items.windows(expected.len()).any(|window| {
                        window
                            .iter()
                            .zip(expected)
                            .all(|(item, m)| matches_shape(item, m))
                    })
            }
            _ => false,
        },
        _ => actual == matcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_matcher_is_a_recursive_subset() {
        let actual = Value::object([
            ("id", Value::from(42)),
            ("name", Value::from("Christian")),
            (
                "owner",
                Value::object([("someDude", "Yes"), ("hello", "ok")]),
            ),
        ]);

        assert!(matches_shape(&actual, &Value::object([("id", 42)])));
        assert!(matches_shape(
            &actual,
            &Value::object([(
                "owner",
                Value::object([(
                    "hello",
                    Value::function(|args| Value::Bool(args[0] == Value::from("ok"))),
                )]),
            )])
        ));
        assert!(!matches_shape(
            &actual,
            &Value::object([("owner", Value::object([("someDude", "No")]))])
        ));
        assert!(!matches_shape(&Value::from(42), &Value::object([("id", 42)])));
    }

    #[test]
    fn test_error_values_expose_name_and_message() {
        let err = Value::error("TypeError", "boom");
        assert!(matches_shape(&err, &Value::object([("name", "TypeError")])));
        assert!(!matches_shape(&err, &Value::object([("message", "bang")])));
    }

    #[test]
    fn test_function_matcher_requires_literal_true() {
        let truthy = Value::function(|_| Value::from("Hey"));
        let exact = Value::function(|_| Value::Bool(true));
        assert!(!matches_shape(&Value::from(1), &truthy));
        assert!(matches_shape(&Value::from(1), &exact));
    }

    #[test]
    fn test_array_matcher_is_contiguous() {
        let actual = Value::from(vec![1, 2, 3]);
        assert!(matches_shape(&actual, &Value::from(vec![2, 3])));
        assert!(matches_shape(&actual, &Value::from(vec![1])));
        assert!(!matches_shape(&actual, &Value::from(vec![1, 3])));
        assert!(!matches_shape(&actual, &Value::from(vec![2, 3, 4])));
    }
}
