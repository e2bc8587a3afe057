//! Per-entry-point failure message templates.

use std::collections::HashMap;

/// Failure message templates keyed by failure reason.
///
/// Every entry point has a default template under [`Messages::DEFAULT_KEY`].
/// A predicate that can fail for several distinguishable reasons registers
/// one template per reason and passes the key to
/// [`Invocation::fail`](crate::Invocation::fail).
///
/// Lookup falls back to the key itself: `fail("Something custom")` with no
/// template registered under that key uses the key as a literal template.
///
/// # Example
///
/// ```rust
/// use referee::Messages;
///
/// let messages = Messages::from("${0} expected to be truthy")
///     .with("notFound", "Could not find ${0}");
///
/// assert_eq!(messages.resolve("message"), "${0} expected to be truthy");
/// assert_eq!(messages.resolve("notFound"), "Could not find ${0}");
/// assert_eq!(messages.resolve("Literal text"), "Literal text");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    templates: HashMap<String, String>,
}

impl Messages {
    /// Key of the default failure template.
    pub const DEFAULT_KEY: &'static str = "message";

    /// An empty template map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the template for `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(key, template);
        self
    }

    /// Add (or replace) the template for `key`, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) -> Option<String> {
        self.templates.insert(key.into(), template.into())
    }

    /// The template registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// The template registered under `key`, or `key` itself.
    #[must_use]
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.templates.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl From<&str> for Messages {
    fn from(template: &str) -> Self {
        Self::new().with(Self::DEFAULT_KEY, template)
    }
}

impl From<String> for Messages {
    fn from(template: String) -> Self {
        Self::new().with(Self::DEFAULT_KEY, template)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Messages
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |messages, (k, v)| messages.with(k, v))
    }
}
