//! Configuration values and raw parameter maps.
//!
//! A [`Value`] is either a scalar, a sequence, a mapping, or an opaque
//! secret. Raw input arrives as [`Params`]: the config language allows a key
//! to be repeated, so a single name may carry a sequence of scalars (see
//! [`Params::append`]).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

use crate::error::{DocumentError, Result};

/// Mapping produced by `Hash` coercion.
pub type Hash = BTreeMap<String, Value>;

/// Text shown wherever a secret would otherwise be rendered.
pub const REDACTED: &str = "<secret>";

/// A raw or coerced configuration value.
///
/// # Examples
///
/// ```
/// use plugin_config_core::Value;
///
/// let v = Value::from("42");
/// assert!(v.is_scalar());
/// assert_eq!(v.scalar_text().as_deref(), Some("42"));
///
/// let secret = Value::secret("hunter2");
/// assert_eq!(secret.to_string(), "<secret>");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Native boolean.
    Boolean(bool),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Mapping keyed by the text of scalar keys.
    Hash(Hash),
    /// Opaque secret handle.
    Secret(SecretString),
}

impl Value {
    /// Wraps text into a secret handle.
    pub fn secret(raw: impl Into<String>) -> Self {
        Value::Secret(SecretString::from(raw.into()))
    }

    /// Returns `true` for strings, integers and booleans.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::String(_) | Value::Integer(_) | Value::Boolean(_)
        )
    }

    /// Textual form of a scalar; `None` for sequences, mappings and secrets.
    pub fn scalar_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Integer(n) => Some(Cow::Owned(n.to_string())),
            Value::Boolean(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&Hash> {
        match self {
            Value::Hash(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_secret(&self) -> Option<&SecretString> {
        match self {
            Value::Secret(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value. `null` has no configuration counterpart.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => {
                return Err(DocumentError::InvalidValue("null".to_string()));
            }
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // Keep the text so numeric coercion can reject it.
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<_>>()?,
            ),
            serde_json::Value::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(k, v)| Ok::<_, DocumentError>((k, Value::from_json(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Converts a YAML value. Tags are ignored; mapping keys must be scalars.
    pub fn from_yaml(value: serde_yaml::Value) -> Result<Self> {
        Ok(match value {
            serde_yaml::Value::Null => {
                return Err(DocumentError::InvalidValue("null".to_string()));
            }
            serde_yaml::Value::Bool(b) => Value::Boolean(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::String(n.to_string()),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_yaml)
                    .collect::<Result<_>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut hash = Hash::new();
                for (k, v) in map {
                    let key = Value::from_yaml(k)?;
                    let key = key.scalar_text().map(Cow::into_owned).ok_or_else(|| {
                        DocumentError::InvalidValue(format!("non-scalar mapping key {key}"))
                    })?;
                    hash.insert(key, Value::from_yaml(v)?);
                }
                Value::Hash(hash)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value)?,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Secret(a), Value::Secret(b)) => a.expose_secret() == b.expose_secret(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Hash(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                f.write_str("}")
            }
            Value::Secret(_) => f.write_str(REDACTED),
        }
    }
}

/// Secrets serialize as [`REDACTED`].
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Array(items) => items.serialize(serializer),
            Value::Hash(map) => map.serialize(serializer),
            Value::Secret(_) => serializer.serialize_str(REDACTED),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Hash> for Value {
    fn from(map: Hash) -> Self {
        Value::Hash(map)
    }
}

impl From<SecretString> for Value {
    fn from(secret: SecretString) -> Self {
        Value::Secret(secret)
    }
}

/// Raw parameters handed to a plugin at construction time.
///
/// # Examples
///
/// ```
/// use plugin_config_core::{Params, Value};
///
/// let mut params = Params::new().with("path", "/tmp/x");
/// params.append("tag", "a");
/// params.append("tag", "b");
///
/// assert_eq!(params.get("path"), Some(&Value::from("/tmp/x")));
/// assert_eq!(
///     params.get("tag"),
///     Some(&Value::Array(vec!["a".into(), "b".into()]))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params {
    entries: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Params::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Adds another occurrence of `name`.
    ///
    /// The first occurrence is stored as given; the second turns the entry
    /// into a two-element sequence and later ones append to it.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.entry(name.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, Value::Array(Vec::new()));
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON object of params.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(Value::from_json(value)?)
    }

    /// Parses a YAML mapping of params.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        Self::from_value(Value::from_yaml(value)?)
    }

    /// Loads params from a file; `.json` files are read as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DocumentError::IoError) if the file cannot be
    /// read, or a parse error if its contents are not a mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Hash(entries) => Ok(Self { entries }),
            other => Err(DocumentError::InvalidValue(format!(
                "params must be a mapping, got {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_builds_sequence_from_repeated_keys() {
        let mut params = Params::new();
        params.append("add_tag", "a");
        params.append("add_tag", "b");
        params.append("add_tag", "c");

        assert_eq!(
            params.get("add_tag"),
            Some(&Value::Array(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_secret_is_redacted_in_display_and_json() {
        let params = Params::new().with("password", Value::secret("hunter2"));

        assert_eq!(params.get("password").unwrap().to_string(), "<secret>");
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"password":"<secret>"}"#);
        assert!(!format!("{params:?}").contains("hunter2"));
    }

    #[test]
    fn test_from_yaml_str_keeps_float_text() {
        let params = Params::from_yaml_str("port: 4.2\nname: web\nlist: [1, 2]\n").unwrap();

        assert_eq!(params.get("port"), Some(&Value::from("4.2")));
        assert_eq!(params.get("name"), Some(&Value::from("web")));
        assert_eq!(
            params.get("list"),
            Some(&Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
        );
    }

    #[test]
    fn test_from_json_str_rejects_null_and_non_mapping() {
        assert!(matches!(
            Params::from_json_str(r#"{"a": null}"#),
            Err(DocumentError::InvalidValue(_))
        ));
        assert!(matches!(
            Params::from_json_str("[1, 2]"),
            Err(DocumentError::InvalidValue(_))
        ));
    }
}
