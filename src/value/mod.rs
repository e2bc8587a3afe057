//! Dynamic values passed to assertions.
//!
//! Assertions accept heterogeneous argument lists, so every argument is a
//! [`Value`]. Besides plain data, a value can carry a [`Callable`] (used as a
//! matcher) or a [`Deferred`] computation that settles later.
//!
//! # Example
//!
//! ```rust
//! use referee::{args, Value};
//!
//! let values = args![42, "Hey", true];
//! assert_eq!(values[0], Value::Number(42.0));
//! assert_eq!(values[1].to_string(), "Hey");
//! ```

mod shape;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

/// Outcome of a deferred computation: the resolved value, or the rejection
/// reason.
pub type Settlement = Result<Value, Value>;

/// Build a `Vec<Value>` argument list from anything convertible into
/// [`Value`].
///
/// ```rust
/// use referee::args;
///
/// let empty = args![];
/// assert!(empty.is_empty());
/// assert_eq!(args!["Yo", "Hey"].len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

/// A dynamically typed assertion argument.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list.
    Array(Vec<Value>),
    /// A property bag.
    Object(BTreeMap<String, Value>),
    /// An error carrying a type tag and message.
    Error(ErrorValue),
    /// A callable, typically used as a matcher.
    Function(Callable),
    /// A computation that settles later.
    Deferred(Deferred),
}

impl Value {
    /// Build an object from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array from any iterator of convertible items.
    pub fn array<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Wrap a closure as a callable value.
    pub fn function<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Function(Callable::new(func))
    }

    /// Build an error value.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error(ErrorValue::new(name, message))
    }

    /// Truthiness under the usual dynamic-language rules.
    ///
    /// `undefined`, `null`, `false`, `0`, `NaN` and the empty string are
    /// falsy; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Returns `true` for `undefined` and `null`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Returns `true` for property-bag values (objects and errors).
    #[must_use]
    pub fn is_object_like(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Error(_))
    }

    /// The string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The callable, if this is a function.
    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The deferred computation, if this is one.
    #[must_use]
    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Self::Deferred(d) => Some(d),
            _ => None,
        }
    }

    /// Look up a named property.
    ///
    /// Objects expose their entries; errors expose `name` and `message`.
    /// Anything else has no properties and yields `undefined`.
    #[must_use]
    pub fn property(&self, key: &str) -> Value {
        match self {
            Self::Object(map) => map.get(key).cloned().unwrap_or_default(),
            Self::Error(err) => match key {
                "name" => Self::String(err.name.clone()),
                "message" => Self::String(err.message.clone()),
                _ => Self::Undefined,
            },
            _ => Self::Undefined,
        }
    }

    /// Check this value against a shape matcher.
    ///
    /// See [`shape::matches_shape`] for the rules.
    #[must_use]
    pub fn matches_shape(&self, matcher: &Value) -> bool {
        shape::matches_shape(self, matcher)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Deferred(a), Self::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// Default stringification, the coercion used when no formatter is injected.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => fmt_number(*n, f),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
            Self::Error(err) => write!(f, "{err}"),
            Self::Function(_) => f.write_str("function"),
            Self::Deferred(_) => f.write_str("[object Promise]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => fmt_number(*n, f),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => f.debug_list().entries(items).finish(),
            Self::Object(map) => f.debug_map().entries(map).finish(),
            Self::Error(err) => write!(f, "{err:?}"),
            Self::Function(_) => f.write_str("[Function]"),
            Self::Deferred(d) => write!(f, "{d:?}"),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

/// An error value: a type tag plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    /// Type tag, e.g. `TypeError`.
    pub name: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorValue {
    /// Create an error value.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

/// A shareable callable value.
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Callable {
    /// Wrap a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// Invoke the callable.
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// A computation that settles later, either resolving with a value or
/// rejecting with a reason.
///
/// Clones share the same underlying computation, which runs at most once.
///
/// # Example
///
/// ```rust
/// use referee::{Deferred, Value};
///
/// let deferred = Deferred::rejected(Value::error("TypeError", "boom"));
/// let settled = futures::executor::block_on(deferred.settle());
/// assert!(settled.is_err());
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Shared<BoxFuture<'static, Settlement>>,
}

impl Deferred {
    /// Wrap a future producing a settlement.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// A computation already resolved with `value`.
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self::new(futures::future::ready(Ok(value.into())))
    }

    /// A computation already rejected with `reason`.
    pub fn rejected(reason: impl Into<Value>) -> Self {
        Self::new(futures::future::ready(Err(reason.into())))
    }

    /// A future that completes when the computation settles.
    #[must_use]
    pub fn settle(&self) -> Shared<BoxFuture<'static, Settlement>> {
        self.inner.clone()
    }

    /// The settlement, if some clone already drove the computation to
    /// completion.
    #[must_use]
    pub fn peek(&self) -> Option<&Settlement> {
        self.inner.peek()
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "rejected",
        };
        f.debug_tuple("Deferred").field(&state).finish()
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

#[allow(clippy::cast_precision_loss)]
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

#[allow(clippy::cast_precision_loss)]
impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Self::Error(err)
    }
}

impl From<Callable> for Value {
    fn from(f: Callable) -> Self {
        Self::Function(f)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stringification() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(32).to_string(), "32");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::from("Hey").to_string(), "Hey");
        assert_eq!(Value::from(vec![0, 1, 2]).to_string(), "0,1,2");
        assert_eq!(
            Value::array([Value::Null, Value::from(1), Value::Undefined]).to_string(),
            ",1,"
        );
        assert_eq!(Value::object([("id", 42)]).to_string(), "[object Object]");
        assert_eq!(Value::error("TypeError", "boom").to_string(), "TypeError: boom");
        assert_eq!(Value::error("Error", "").to_string(), "Error");
    }

    #[test]
    fn test_truthiness() {
        for falsy in [
            Value::Undefined,
            Value::Null,
            Value::from(false),
            Value::from(0),
            Value::from(f64::NAN),
            Value::from(""),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?} should be falsy");
        }
        for truthy in [
            Value::from(true),
            Value::from(-1),
            Value::from("0"),
            Value::array(Vec::<Value>::new()),
            Value::object(Vec::<(String, Value)>::new()),
        ] {
            assert!(truthy.is_truthy(), "{truthy:?} should be truthy");
        }
    }

    #[test]
    fn test_equality_is_structural_for_data_and_identity_for_callables() {
        assert_eq!(Value::object([("id", 42)]), Value::object([("id", 42)]));
        assert_ne!(Value::from(666), Value::from("666"));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));

        let f = Callable::new(|_| Value::Undefined);
        let g = Callable::new(|_| Value::Undefined);
        assert_eq!(Value::from(f.clone()), Value::from(f));
        assert_ne!(
            Value::from(g),
            Value::function(|_| Value::Undefined)
        );
    }

    #[test]
    fn test_property_lookup() {
        let err = Value::error("TypeError", "boom");
        assert_eq!(err.property("name"), Value::from("TypeError"));
        assert_eq!(err.property("message"), Value::from("boom"));
        assert_eq!(err.property("stack"), Value::Undefined);
        assert_eq!(Value::object([("a", 1)]).property("a"), Value::from(1));
        assert_eq!(Value::from(3).property("a"), Value::Undefined);
    }

    #[test]
    fn test_args_macro_converts_each_item() {
        let values = args![1, "two", true, ()];
        assert_eq!(
            values,
            vec![
                Value::Number(1.0),
                Value::String("two".into()),
                Value::Bool(true),
                Value::Undefined
            ]
        );
    }

    #[test]
    fn test_deferred_clones_share_one_settlement() {
        let deferred = Deferred::resolved(42);
        let twin = deferred.clone();
        assert!(deferred.ptr_eq(&twin));
        assert_eq!(deferred.peek(), None);

        let settled = futures::executor::block_on(deferred.settle());
        assert_eq!(settled, Ok(Value::from(42)));
        assert_eq!(twin.peek(), Some(&Ok(Value::from(42))));
        assert_eq!(format!("{twin:?}"), "Deferred(\"resolved\")");
    }
}
