//! Message template interpolation.
//!
//! Failure messages are templates with two placeholder syntaxes:
//!
//! - `${N}` - the N-th (0-based) effective call argument, rendered through
//!   the injectable [`Formatter`]
//! - `${identifier}` - a named value, resolved by the caller
//!
//! Positional placeholders are substituted first, then named ones.
//! Placeholders that cannot be resolved are left in place as literal text.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, message};
//!
//! let formatter = message::default_formatter();
//! let msg = message::interpolate_positional(
//!     "${0} expected to equal ${1}",
//!     &args!["Yo", "Hey"],
//!     &formatter,
//! );
//! assert_eq!(msg, "Yo expected to equal Hey");
//! ```

use std::sync::Arc;

use crate::value::Value;

/// Renders an argument for inclusion in a failure message.
pub type Formatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The named placeholder under which the caller's custom message is exposed.
pub const CUSTOM_MESSAGE: &str = "customMessage";

/// The default formatter: plain string coercion.
#[must_use]
pub fn default_formatter() -> Formatter {
    Arc::new(|value: &Value| value.to_string())
}

/// Prepare a caller-supplied message for use as a prefix.
///
/// A message ending in terminal punctuation (`.`, `:`, `!`, `?`) is followed
/// by a single space, any other message by `": "`. An absent or empty message
/// renders as the empty string.
///
/// ```rust
/// use referee::message::prepare_message;
///
/// assert_eq!(prepare_message(Some("Oh")), "Oh: ");
/// assert_eq!(prepare_message(Some("Sigh...")), "Sigh... ");
/// assert_eq!(prepare_message(None), "");
/// ```
#[must_use]
pub fn prepare_message(message: Option<&str>) -> String {
    match message {
        None | Some("") => String::new(),
        Some(msg) if msg.ends_with(['.', ':', '!', '?']) => format!("{msg} "),
        Some(msg) => format!("{msg}: "),
    }
}

/// Substitute every `${N}` placeholder with the formatted N-th argument.
///
/// Each referenced argument is formatted once, however many times it
/// appears. Indices past the end of `args` are left untouched.
pub fn interpolate_positional(template: &str, args: &[Value], formatter: &Formatter) -> String {
    let mut rendered: Vec<Option<String>> = vec![None; args.len()];

    substitute(template, |token| {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: usize = token.parse().ok()?;
        let value = args.get(index)?;
        Some(
            rendered[index]
                .get_or_insert_with(|| formatter(value))
                .clone(),
        )
    })
}

/// Substitute every `${identifier}` placeholder using `lookup`.
///
/// `lookup` returns `None` to leave a placeholder as it is.
pub fn interpolate_named<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    substitute(template, |token| {
        if is_identifier(token) {
            lookup(token)
        } else {
            None
        }
    })
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Single left-to-right scan; substituted text is never rescanned.
fn substitute<F>(template: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let token = &after[..end];
        match resolve(token) {
            Some(text) => out.push_str(&text),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use parking_lot::Mutex;

    #[test]
    fn test_positional_substitution() {
        let formatter = default_formatter();
        let msg = interpolate_positional("${0} expected to equal ${1}", &args!["Yo", "Hey"], &formatter);
        assert_eq!(msg, "Yo expected to equal Hey");
    }

    #[test]
    fn test_positional_out_of_range_is_left_literal() {
        let formatter = default_formatter();
        let msg = interpolate_positional("${0} and ${3}", &args![1], &formatter);
        assert_eq!(msg, "1 and ${3}");
    }

    #[test]
    fn test_positional_formats_each_referenced_argument_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let formatter: Formatter = Arc::new(move |v: &Value| {
            seen2.lock().push(v.clone());
            format!("<{v}>")
        });

        let msg = interpolate_positional("${1} ${1} ${0}", &args!["a", "b", "c"], &formatter);

        assert_eq!(msg, "<b> <b> <a>");
        assert_eq!(*seen.lock(), args!["b", "a"]);
    }

    #[test]
    fn test_named_substitution_leaves_unknown_placeholders() {
        let msg = interpolate_named("Expected ${expected} but threw ${actualExceptionType}", |name| {
            (name == "expected").then(|| "TypeError".to_string())
        });
        assert_eq!(msg, "Expected TypeError but threw ${actualExceptionType}");
    }

    #[test]
    fn test_named_pass_ignores_positional_and_malformed_tokens() {
        let msg = interpolate_named("${0} ${a-b} ${ok} ${unterminated", |_| Some("X".into()));
        assert_eq!(msg, "${0} ${a-b} X ${unterminated");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let formatter = default_formatter();
        let msg = interpolate_positional("${0}", &args!["${0}"], &formatter);
        assert_eq!(msg, "${0}");
    }

    #[test]
    fn test_prepare_message_separator() {
        assert_eq!(prepare_message(Some("Here:")), "Here: ");
        assert_eq!(prepare_message(Some("Nooo!")), "Nooo! ");
        assert_eq!(prepare_message(Some("Why?")), "Why? ");
        assert_eq!(prepare_message(Some("Too bad")), "Too bad: ");
        assert_eq!(prepare_message(Some("")), "");
    }
}
