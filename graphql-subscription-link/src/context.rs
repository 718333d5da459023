//! Provide a [`Context`] for the link chain.
//!
//! Every [`link::Request`](crate::services::link::Request) owns a `Context`. Non-terminating
//! stages record what they learned about an operation in it, and later stages of the same chain
//! read it back. A `Context` is never shared between requests: forwarding a request moves it, and
//! cloning a request clones its entries.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::BoxError;

use crate::json_ext::Value;

/// Holds [`Context`] entries.
pub(crate) type Entries = IndexMap<String, Value>;

/// Metadata accumulated by the stages an operation went through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    entries: Entries,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from the context using the provided key.
    ///
    /// Fails if the stored value cannot be deserialized into `V`.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: AsRef<str>,
        V: DeserializeOwned,
    {
        self.entries
            .get(key.as_ref())
            .map(|v| serde_json_bytes::from_value(v.clone()))
            .transpose()
            .map_err(|e| e.into())
    }

    /// Insert a value into the context using the provided key, returning the previous value.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Result<Option<Value>, BoxError>
    where
        K: Into<String>,
        V: Serialize,
    {
        let value = serde_json_bytes::to_value(value)?;
        Ok(self.insert_json_value(key, value))
    }

    /// Get a JSON value from the context.
    pub fn get_json_value(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.entries.get(key.as_ref())
    }

    /// Insert a JSON value into the context, returning the previous value.
    pub fn insert_json_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Whether an entry exists for this key, even if its value is `null`.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.entries.contains_key(key.as_ref())
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use serde_json_bytes::json;

    use crate::Context;

    #[test]
    fn test_context_insert() {
        let mut c = Context::new();
        assert!(c.insert("key1", 1).is_ok());
        assert_eq!(c.get("key1").unwrap(), Some(1));
    }

    #[test]
    fn test_context_overwrite() {
        let mut c = Context::new();
        assert!(c.insert("overwrite", 2).is_ok());
        assert_eq!(c.insert("overwrite", 3).unwrap(), Some(json!(2)));
        assert_eq!(c.get("overwrite").unwrap(), Some(3));
    }

    #[test]
    fn test_context_null_is_present() {
        let mut c = Context::new();
        c.insert_json_value("empty", json!(null));
        assert!(c.contains_key("empty"));
        assert_eq!(c.get_json_value("empty"), Some(&json!(null)));
        assert!(!c.contains_key("missing"));
    }

    #[test]
    fn test_context_clones_are_independent() {
        let mut a = Context::new();
        a.insert_json_value("shared", json!(1));
        let mut b = a.clone();
        b.insert_json_value("only_b", json!(2));

        assert!(!a.contains_key("only_b"));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_context_wrong_type() {
        let mut c = Context::new();
        c.insert_json_value("text", json!("not a number"));
        assert!(c.get::<_, u32>("text").is_err());
    }
}
