//! Declarative schema documents.
//!
//! A [`SchemaDocument`] describes a plugin class in YAML or JSON so that a
//! class can be declared without code, e.g. for the `plugin-config` CLI.
//!
//! # Example YAML
//!
//! ```yaml
//! name: inputs::File
//! config_name: file
//! category: input
//! status: stable
//! options:
//!   - name: path
//!     validate: string
//!     required: true
//!   - name: mode
//!     validate: [read, tail]
//!     default: tail
//!   - pattern: "^tag_"
//!     validate: string
//! flags:
//!   - tokens: ["--since-db PATH"]
//!     help: Where to keep read offsets
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::flags::FlagSpec;
use crate::plugin::{PluginClass, PluginRegistry};
use crate::types::{Matcher, OptionSpec, PluginCategory, ValidatorKind};
use crate::value::Value;

/// How an option's value is checked, as written in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidateDocument {
    /// A kind name such as `number` or `password`.
    Kind(String),
    /// Allowed literals.
    OneOf(Vec<String>),
}

/// One option entry. Exactly one of `name` and `pattern` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidateDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One flag entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDocument {
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// A plugin class written down as data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Class name (may be a `::` path).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PluginCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionDocument>,
    #[serde(default)]
    pub flags: Vec<FlagDocument>,
}

impl SchemaDocument {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a document; `.json` files are read as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DocumentError::IoError) if the file cannot be
    /// read, or a parse error for malformed contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Builds the described class. The class is registered under its
    /// config name when a registry is given.
    ///
    /// Unknown validator names are kept and fail at validation time.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDocument`](DocumentError::InvalidDocument) for an
    /// option with both or neither of `name` and `pattern`, a pattern that
    /// does not compile, a `null` default, or a flag without tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugin_config_core::{Params, SchemaDocument};
    ///
    /// let doc = SchemaDocument::from_yaml_str(
    ///     "name: File\nstatus: stable\noptions:\n  - name: path\n    validate: string\n    required: true\n",
    /// )
    /// .unwrap();
    /// let class = doc.into_class(None).unwrap();
    ///
    /// assert!(class.instantiate(&Params::new()).is_err());
    /// let instance = class.instantiate(&Params::new().with("path", "/tmp/x")).unwrap();
    /// assert_eq!(instance.get_str("path"), Some("/tmp/x"));
    /// ```
    pub fn into_class(&self, registry: Option<&mut dyn PluginRegistry>) -> Result<PluginClass> {
        let mut class = PluginClass::new(&self.name);
        if let Some(category) = self.category {
            class = class.with_category(category);
        }
        if let Some(status) = &self.status {
            class = class.with_status(status);
        }

        for option in &self.options {
            class.option(option.to_spec()?);
        }

        for flag in &self.flags {
            let Some(first) = flag.tokens.first() else {
                return Err(DocumentError::InvalidDocument(format!(
                    "flag without tokens in {}",
                    self.name
                )));
            };
            let flag_name = first.clone();
            let mut spec = FlagSpec::new(
                first.clone(),
                Arc::new(move |value: &str| debug!(flag = %flag_name, value, "Flag set")),
            );
            for token in flag.tokens.iter().skip(1) {
                spec = spec.with_token(token.clone());
            }
            if let Some(help) = &flag.help {
                spec = spec.with_help(help.clone());
            }
            class.flag(spec);
        }

        if let (Some(name), Some(registry)) = (&self.config_name, registry) {
            class.config_name(name.clone(), registry);
        }
        Ok(class)
    }
}

impl OptionDocument {
    fn to_spec(&self) -> Result<OptionSpec> {
        let matcher = match (&self.name, &self.pattern) {
            (Some(name), None) => Matcher::exact(name.clone()),
            (None, Some(pattern)) => Matcher::pattern(pattern).map_err(|e| {
                DocumentError::InvalidDocument(format!("bad pattern {pattern}: {e}"))
            })?,
            _ => {
                return Err(DocumentError::InvalidDocument(
                    "option needs exactly one of name and pattern".to_string(),
                ));
            }
        };

        let mut spec = OptionSpec::new(matcher);
        spec.validator = match &self.validate {
            None => ValidatorKind::None,
            Some(ValidateDocument::Kind(name)) => ValidatorKind::named(name),
            Some(ValidateDocument::OneOf(allowed)) => ValidatorKind::OneOf(allowed.clone()),
        };
        if let Some(default) = &self.default {
            spec.default = Some(Value::from_json(default.clone()).map_err(|e| {
                DocumentError::InvalidDocument(format!(
                    "bad default for {}: {e}",
                    spec.matcher.as_str()
                ))
            })?);
        }
        spec.required = self.required;
        spec.deprecated = self.deprecated;
        spec.description = self.description.clone();
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use crate::plugin::InMemoryRegistry;
    use crate::types::Kind;

    use super::*;

    const FILE_YAML: &str = r#"
name: inputs::File
config_name: file
category: input
status: stable
options:
  - name: path
    validate: string
    required: true
  - name: mode
    validate: [read, tail]
    default: tail
  - name: stat_interval
    validate: number
    default: 1
  - pattern: "^tag_"
    validate: string
flags:
  - tokens: ["--since-db PATH"]
    help: Where to keep read offsets
"#;

    #[test]
    fn test_yaml_document_builds_class() {
        let doc = SchemaDocument::from_yaml_str(FILE_YAML).unwrap();
        let mut registry = InMemoryRegistry::default();
        let class = doc.into_class(Some(&mut registry)).unwrap();

        assert!(registry.contains("file"));
        assert_eq!(class.category(), Some(PluginCategory::Input));
        assert_eq!(class.schema().names(), vec!["path", "mode", "stat_interval", "^tag_"]);
        assert!(matches!(
            class.schema().get("stat_interval").unwrap().validator,
            ValidatorKind::Typed(Kind::Number)
        ));
        assert_eq!(class.flags().len(), 1);
        assert_eq!(
            class.flags().iter().next().unwrap().full_name(class.short_name()),
            "--file-since-db PATH"
        );
    }

    #[test]
    fn test_document_class_applies_defaults() {
        let class = SchemaDocument::from_yaml_str(FILE_YAML)
            .unwrap()
            .into_class(None)
            .unwrap();
        let instance = class
            .instantiate(&crate::Params::new().with("path", "/var/log/syslog"))
            .unwrap();

        assert_eq!(instance.get_str("mode"), Some("tail"));
        assert_eq!(instance.get_i64("stat_interval"), Some(1));
    }

    #[test]
    fn test_option_needs_exactly_one_matcher() {
        let json = r#"{"name": "x", "options": [{"name": "a", "pattern": "^a"}]}"#;
        let doc = SchemaDocument::from_json_str(json).unwrap();
        assert!(matches!(
            doc.into_class(None),
            Err(DocumentError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let json = r#"{"name": "x", "options": [{"pattern": "("}]}"#;
        let doc = SchemaDocument::from_json_str(json).unwrap();
        assert!(matches!(
            doc.into_class(None),
            Err(DocumentError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_unknown_validator_name_fails_at_validation() {
        let json = r#"{"name": "x", "status": "stable", "options": [{"name": "a", "validate": "float"}]}"#;
        let class = SchemaDocument::from_json_str(json)
            .unwrap()
            .into_class(None)
            .unwrap();

        let report = class.validate(&crate::Params::new().with("a", "1.5")).unwrap();
        assert!(!report.is_valid());
        assert!(report.diagnostics[0].message.contains("unknown validator float"));
    }
}
