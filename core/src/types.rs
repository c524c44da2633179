//! Option declaration types.
//!
//! These types describe what a plugin class accepts: how a provided key is
//! matched ([`Matcher`]), how its value is checked ([`ValidatorKind`]), and
//! the per-option markers collected in an [`OptionSpec`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// How a provided parameter key is matched against a declared option.
///
/// Exact names are consulted before patterns wherever both could match
/// (see [`sort_key`](Matcher::sort_key)).
///
/// # Examples
///
/// ```
/// use plugin_config_core::Matcher;
///
/// let exact = Matcher::exact("path");
/// assert!(exact.matches("path"));
/// assert!(!exact.matches("paths"));
///
/// let pattern = Matcher::pattern("^add_").unwrap();
/// assert!(pattern.matches("add_field"));
/// assert!(exact.sort_key() < pattern.sort_key());
/// ```
#[derive(Clone)]
pub enum Matcher {
    /// Matches a key by string equality.
    Exact(String),
    /// Matches any key the regex finds a match in.
    Pattern(Arc<Regex>),
}

impl Matcher {
    pub fn exact(name: impl Into<String>) -> Self {
        Matcher::Exact(name.into())
    }

    /// Compiles `source` into a pattern matcher.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Arc::new(Regex::new(source)?)))
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Matcher::Exact(name) => name == key,
            Matcher::Pattern(regex) => regex.is_match(key),
        }
    }

    /// Ordering key: exact matchers (0) before patterns (100).
    pub fn sort_key(&self) -> u8 {
        match self {
            Matcher::Exact(_) => 0,
            Matcher::Pattern(_) => 100,
        }
    }

    /// Whether two matchers denote the same schema entry.
    ///
    /// Exact names collide by string equality. Patterns collide only when
    /// they are the same compiled object; equal source text is not enough.
    pub fn same_entry(&self, other: &Matcher) -> bool {
        match (self, other) {
            (Matcher::Exact(a), Matcher::Exact(b)) => a == b,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The exact name, or the pattern source.
    pub fn as_str(&self) -> &str {
        match self {
            Matcher::Exact(name) => name,
            Matcher::Pattern(regex) => regex.as_str(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Matcher::Exact(_))
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            Matcher::Pattern(regex) => write!(f, "Pattern(/{}/)", regex.as_str()),
        }
    }
}

impl From<&str> for Matcher {
    fn from(name: &str) -> Self {
        Matcher::exact(name)
    }
}

impl From<String> for Matcher {
    fn from(name: String) -> Self {
        Matcher::Exact(name)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(Arc::new(regex))
    }
}

/// Built-in value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Mapping, or a flat sequence of key/value pairs.
    Hash,
    /// Sequence, passed through unchanged.
    Array,
    /// Single text value.
    String,
    /// Single integer.
    Number,
    /// Single `true`/`false`.
    Boolean,
    /// Single dotted-quad IPv4 address, kept as text.
    IpAddress,
    /// Single value wrapped into a secret handle.
    Secret,
}

impl Kind {
    /// Resolves a declared validator name.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_config_core::Kind;
    ///
    /// assert_eq!(Kind::from_name("number"), Some(Kind::Number));
    /// assert_eq!(Kind::from_name("password"), Some(Kind::Secret));
    /// assert_eq!(Kind::from_name("float"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Kind> {
        Some(match name {
            "hash" => Kind::Hash,
            "array" => Kind::Array,
            "string" => Kind::String,
            "number" => Kind::Number,
            "boolean" => Kind::Boolean,
            "ipaddr" | "ip_address" => Kind::IpAddress,
            "password" | "secret" => Kind::Secret,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Hash => "hash",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::IpAddress => "ipaddr",
            Kind::Secret => "password",
        }
    }
}

/// User-supplied check: returns the coerced value or a message.
pub type CustomValidator = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// How a provided value is checked and coerced.
#[derive(Clone, Default)]
pub enum ValidatorKind {
    /// Accept anything unchanged.
    #[default]
    None,
    /// Delegate to a function.
    Custom(CustomValidator),
    /// Single value out of a fixed list of literals.
    OneOf(Vec<String>),
    /// One of the built-in types.
    Typed(Kind),
    /// A validator name that resolved to nothing; fails at coercion time.
    Unrecognized(String),
}

impl ValidatorKind {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        ValidatorKind::Custom(Arc::new(f))
    }

    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidatorKind::OneOf(allowed.into_iter().map(Into::into).collect())
    }

    /// Resolves a validator by name, keeping unknown names around so the
    /// failure surfaces during validation.
    pub fn named(name: &str) -> Self {
        match Kind::from_name(name) {
            Some(kind) => ValidatorKind::Typed(kind),
            None => ValidatorKind::Unrecognized(name.to_string()),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, ValidatorKind::Typed(Kind::Secret))
    }
}

impl From<Kind> for ValidatorKind {
    fn from(kind: Kind) -> Self {
        ValidatorKind::Typed(kind)
    }
}

impl fmt::Debug for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorKind::None => f.write_str("None"),
            ValidatorKind::Custom(_) => f.write_str("Custom(..)"),
            ValidatorKind::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            ValidatorKind::Typed(kind) => f.debug_tuple("Typed").field(kind).finish(),
            ValidatorKind::Unrecognized(name) => {
                f.debug_tuple("Unrecognized").field(name).finish()
            }
        }
    }
}

/// A single declared option.
///
/// Build with [`OptionSpec::new`] and chain the builder methods.
///
/// # Examples
///
/// ```
/// use plugin_config_core::{Kind, OptionSpec};
///
/// let spec = OptionSpec::new("path")
///     .validate(Kind::String)
///     .required()
///     .with_description("File to read");
/// assert!(spec.required);
/// assert!(!spec.deprecated);
/// assert_eq!(spec.matcher.as_str(), "path");
/// ```
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Which keys this option applies to
    pub matcher: Matcher,
    /// How values are checked and coerced
    pub validator: ValidatorKind,
    /// Injected when no provided key matches
    pub default: Option<Value>,
    /// At least one provided key must match
    pub required: bool,
    /// Usage emits a warning
    pub deprecated: bool,
    /// Human-readable description
    pub description: Option<String>,
}

impl OptionSpec {
    pub fn new(matcher: impl Into<Matcher>) -> Self {
        Self {
            matcher: matcher.into(),
            validator: ValidatorKind::None,
            default: None,
            required: false,
            deprecated: false,
            description: None,
        }
    }

    pub fn validate(mut self, validator: impl Into<ValidatorKind>) -> Self {
        self.validator = validator.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Maturity level a plugin class declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Unsupported,
    Experimental,
    Beta,
    Stable,
}

impl PluginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginStatus::Unsupported => "unsupported",
            PluginStatus::Experimental => "experimental",
            PluginStatus::Beta => "beta",
            PluginStatus::Stable => "stable",
        }
    }
}

impl FromStr for PluginStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsupported" => Ok(PluginStatus::Unsupported),
            "experimental" => Ok(PluginStatus::Experimental),
            "beta" => Ok(PluginStatus::Beta),
            "stable" => Ok(PluginStatus::Stable),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a plugin, declared once on its base class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    Input,
    Filter,
    Output,
    Codec,
}

impl PluginCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginCategory::Input => "input",
            PluginCategory::Filter => "filter",
            PluginCategory::Output => "output",
            PluginCategory::Codec => "codec",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_with_equal_source_are_distinct_entries() {
        let a = Matcher::pattern("^tag_").unwrap();
        let b = Matcher::pattern("^tag_").unwrap();

        assert!(!a.same_entry(&b));
        assert!(a.same_entry(&a.clone()));
        assert!(Matcher::exact("x").same_entry(&Matcher::exact("x")));
    }

    #[test]
    fn test_named_validator_keeps_unknown_names() {
        assert!(matches!(
            ValidatorKind::named("ipaddr"),
            ValidatorKind::Typed(Kind::IpAddress)
        ));
        assert!(matches!(
            ValidatorKind::named("float"),
            ValidatorKind::Unrecognized(ref n) if n == "float"
        ));
    }

    #[test]
    fn test_status_parses_known_levels_only() {
        assert_eq!("beta".parse::<PluginStatus>(), Ok(PluginStatus::Beta));
        assert_eq!(
            "milestone".parse::<PluginStatus>(),
            Err("milestone".to_string())
        );
    }
}
