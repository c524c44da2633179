//! Applying validated configuration to a plugin instance.
//!
//! [`ConfigInitializer::initialize`] validates raw params, warns about
//! deprecated settings, injects defaults, assigns every resulting value onto
//! the instance through [`Configurable`], and hands the instance an
//! immutable [`ConfigSnapshot`].

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, error, warn};

use crate::catalog::{DefaultCatalog, MessageCatalog, keys};
use crate::error::ConfigurationError;
use crate::schema::Schema;
use crate::validate::{Diagnostic, DiagnosticKind, ValidationReport, Validator};
use crate::value::{Hash, Params, Value};

/// Keys starting with this prefix stay in the snapshot but are never
/// assigned as attributes.
pub const RESERVED_PREFIX: char = '@';

/// Immutable post-construction configuration.
pub type ConfigSnapshot = Arc<Params>;

/// Receives configuration during initialization.
///
/// Implement this on a typed plugin struct to populate named fields, or use
/// [`PluginInstance`] as a generic attribute bag.
///
/// # Examples
///
/// ```
/// use plugin_config_core::*;
///
/// #[derive(Default)]
/// struct Stdin {
///     codec: String,
///     config: ConfigSnapshot,
/// }
///
/// impl Configurable for Stdin {
///     fn assign(&mut self, name: &str, value: Value) {
///         if let ("codec", Value::String(s)) = (name, value) {
///             self.codec = s;
///         }
///     }
///
///     fn store_config(&mut self, config: ConfigSnapshot) {
///         self.config = config;
///     }
/// }
///
/// let mut schema = Schema::new();
/// schema.declare(OptionSpec::new("codec").validate(Kind::String).with_default("line"));
///
/// let mut stdin = Stdin::default();
/// ConfigInitializer::new("stdin", &schema, Some("stable"))
///     .initialize(&mut stdin, &Params::new())
///     .unwrap();
/// assert_eq!(stdin.codec, "line");
/// ```
pub trait Configurable {
    /// Sets one attribute. Names with the reserved prefix never reach here.
    fn assign(&mut self, name: &str, value: Value);

    /// Stores the complete post-default, post-coercion configuration.
    fn store_config(&mut self, config: ConfigSnapshot);
}

/// Runs validation and applies its result to an instance.
pub struct ConfigInitializer<'a> {
    plugin: &'a str,
    schema: &'a Schema,
    status: Option<&'a str>,
    catalog: &'a dyn MessageCatalog,
}

impl<'a> ConfigInitializer<'a> {
    pub fn new(plugin: &'a str, schema: &'a Schema, status: Option<&'a str>) -> Self {
        Self {
            plugin,
            schema,
            status,
            catalog: DefaultCatalog::shared(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'a dyn MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Configures `instance` from `params`.
    ///
    /// Returns the validation report, including deprecation warnings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the status is missing or invalid,
    /// or when any validation pass fails. Nothing is assigned in that case.
    pub fn initialize<T: Configurable + ?Sized>(
        &self,
        instance: &mut T,
        params: &Params,
    ) -> Result<ValidationReport, ConfigurationError> {
        let validator = Validator::new(self.plugin, self.schema).with_catalog(self.catalog);
        let mut report = validator.validate(self.status, params)?;
        if !report.is_valid() {
            let message = validator.lookup(keys::INVALID_SETTINGS, &[]);
            error!(plugin = %self.plugin, failed_pass = ?report.failed_pass, "{message}");
            return Err(ConfigurationError::new(message).with_diagnostics(report.diagnostics));
        }

        for key in params.keys() {
            let Some(spec) = self.schema.find_match(key) else {
                continue;
            };
            if !spec.deprecated {
                continue;
            }
            let message = validator.lookup(keys::DEPRECATED, &[("name", key.to_string())]);
            warn!(plugin = %self.plugin, setting = key, "{message}");
            report.warnings.push(Diagnostic {
                kind: DiagnosticKind::Deprecated,
                setting: key.to_string(),
                message,
            });
        }

        let mut config = report.values.clone();
        for spec in self.schema.entries() {
            let Some(default) = &spec.default else {
                continue;
            };
            // Only named options get defaults.
            if !spec.matcher.is_exact() || params.keys().any(|key| spec.matcher.matches(key)) {
                continue;
            }
            let value = if spec.validator.is_secret() {
                wrap_secret(default)
            } else {
                default.clone()
            };
            debug!(plugin = %self.plugin, setting = spec.matcher.as_str(), "Applying default");
            config.insert(spec.matcher.as_str(), value);
        }

        for (name, value) in config.iter() {
            if name.starts_with(RESERVED_PREFIX) {
                continue;
            }
            debug!(plugin = %self.plugin, setting = name, "Assigning setting");
            instance.assign(name, value.clone());
        }
        instance.store_config(Arc::new(config));

        Ok(report)
    }
}

fn wrap_secret(default: &Value) -> Value {
    match default {
        Value::Secret(_) => default.clone(),
        other => Value::Secret(SecretString::from(other.to_string())),
    }
}

/// Generic configured instance: an attribute table plus the snapshot.
///
/// [`set`](PluginInstance::set) changes an attribute after construction
/// without re-validation; the snapshot keeps the validated values.
///
/// # Examples
///
/// ```
/// use plugin_config_core::*;
///
/// let mut schema = Schema::new();
/// schema.declare(OptionSpec::new("path").validate(Kind::String).required());
///
/// let mut instance = PluginInstance::default();
/// ConfigInitializer::new("file", &schema, Some("stable"))
///     .initialize(&mut instance, &Params::new().with("path", "/tmp/x"))
///     .unwrap();
///
/// assert_eq!(instance.get_str("path"), Some("/tmp/x"));
///
/// instance.set("path", "/tmp/y");
/// assert_eq!(instance.get_str("path"), Some("/tmp/y"));
/// assert_eq!(instance.config().get("path"), Some(&Value::from("/tmp/x")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginInstance {
    attributes: BTreeMap<String, Value>,
    config: ConfigSnapshot,
}

impl PluginInstance {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_array(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_array)
    }

    pub fn get_array_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.attributes.get_mut(name).and_then(Value::as_array_mut)
    }

    pub fn get_hash(&self, name: &str) -> Option<&Hash> {
        self.get(name).and_then(Value::as_hash)
    }

    pub fn get_secret(&self, name: &str) -> Option<&SecretString> {
        self.get(name).and_then(Value::as_secret)
    }

    /// Overwrites an attribute, bypassing validation.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// The configuration snapshot taken at construction time.
    pub fn config(&self) -> &Params {
        &self.config
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        Arc::clone(&self.config)
    }
}

impl Configurable for PluginInstance {
    fn assign(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    fn store_config(&mut self, config: ConfigSnapshot) {
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use crate::types::{Kind, Matcher, OptionSpec};

    use super::*;

    fn init(
        schema: &Schema,
        params: &Params,
    ) -> Result<(PluginInstance, ValidationReport), ConfigurationError> {
        let mut instance = PluginInstance::default();
        let report = ConfigInitializer::new("test", schema, Some("stable"))
            .initialize(&mut instance, params)?;
        Ok((instance, report))
    }

    #[test]
    fn test_failure_assigns_nothing() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("path").validate(Kind::String).required());
        schema.declare(OptionSpec::new("mode").with_default("append"));

        let mut instance = PluginInstance::default();
        let err = ConfigInitializer::new("file", &schema, Some("stable"))
            .initialize(&mut instance, &Params::new())
            .unwrap_err();

        assert_eq!(
            err.message,
            "Something is wrong with your configuration for the file plugin"
        );
        assert_eq!(err.diagnostics.len(), 1);
        assert_eq!(err.diagnostics[0].setting, "path");
        assert_eq!(instance.attribute_names().count(), 0);
        assert!(instance.config().is_empty());
    }

    #[test]
    fn test_deprecated_key_warns_once_and_still_succeeds() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("old_path").validate(Kind::String).deprecated());
        schema.declare(OptionSpec::new("path").validate(Kind::String));

        let params = Params::new().with("old_path", "/a").with("path", "/b");
        let (instance, report) = init(&schema, &params).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, DiagnosticKind::Deprecated);
        assert_eq!(report.warnings[0].setting, "old_path");
        assert_eq!(instance.get_str("old_path"), Some("/a"));
    }

    #[test]
    fn test_defaults_fill_only_absent_named_options() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("mode").validate(Kind::String).with_default("append"));
        schema.declare(OptionSpec::new("workers").validate(Kind::Number).with_default(1_i64));
        schema.declare(
            OptionSpec::new(Matcher::pattern("^x_").unwrap()).with_default("unused"),
        );

        let (instance, _) = init(&schema, &Params::new().with("workers", "4")).unwrap();

        assert_eq!(instance.get_str("mode"), Some("append"));
        assert_eq!(instance.get_i64("workers"), Some(4));
        assert_eq!(instance.attribute_names().count(), 2);
    }

    #[test]
    fn test_sequence_default_is_not_shared_between_instances() {
        let mut schema = Schema::new();
        schema.declare(
            OptionSpec::new("tags")
                .validate(Kind::Array)
                .with_default(vec![Value::from("base")]),
        );

        let (mut first, _) = init(&schema, &Params::new()).unwrap();
        let (second, _) = init(&schema, &Params::new()).unwrap();

        first.get_array_mut("tags").unwrap().push(Value::from("extra"));

        assert_eq!(first.get_array("tags").unwrap().len(), 2);
        assert_eq!(second.get_array("tags"), Some(&[Value::from("base")][..]));
        assert_eq!(
            schema.get("tags").unwrap().default,
            Some(Value::Array(vec![Value::from("base")]))
        );
    }

    #[test]
    fn test_secret_default_is_wrapped() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("password").validate(Kind::Secret).with_default("changeme"));

        let (instance, _) = init(&schema, &Params::new()).unwrap();

        let secret = instance.get_secret("password").unwrap();
        assert_eq!(secret.expose_secret(), "changeme");
        assert_eq!(instance.get("password").unwrap().to_string(), "<secret>");
    }

    #[test]
    fn test_reserved_prefix_is_skipped_but_kept_in_snapshot() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("@meta").validate(Kind::String));
        schema.declare(OptionSpec::new("name").validate(Kind::String));

        let params = Params::new().with("@meta", "m").with("name", "n");
        let (instance, _) = init(&schema, &params).unwrap();

        assert!(!instance.has("@meta"));
        assert_eq!(instance.get_str("name"), Some("n"));
        assert_eq!(instance.config().get("@meta"), Some(&Value::from("m")));
    }
}
