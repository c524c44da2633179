//! Parameter validation.
//!
//! [`Validator::validate`] runs four passes over the provided params:
//!
//! 1. plugin status,
//! 2. unknown keys,
//! 3. required keys,
//! 4. value coercion.
//!
//! Each pass gates the next: once a pass fails the remaining ones are
//! skipped. Within the unknown-key, required-key and coercion passes every
//! problem is reported before the pass fails. A missing or unrecognized
//! status is a fault rather than a failure and is returned as `Err`.
//!
//! # Examples
//!
//! ```
//! use plugin_config_core::*;
//!
//! let mut schema = Schema::new();
//! schema.declare(OptionSpec::new("path").validate(Kind::String).required());
//! schema.declare(OptionSpec::new("port").validate(Kind::Number));
//!
//! let validator = Validator::new("file", &schema);
//!
//! let params = Params::new().with("path", "/tmp/x").with("port", "8080");
//! let report = validator.validate(Some("stable"), &params).unwrap();
//! assert!(report.is_valid());
//! assert_eq!(report.values.get("port"), Some(&Value::Integer(8080)));
//!
//! let report = validator.validate(Some("stable"), &Params::new()).unwrap();
//! assert_eq!(report.failed_pass, Some(ValidationPass::RequiredKeys));
//! ```

use tracing::{debug, error, info, warn};

use crate::catalog::{DefaultCatalog, MessageCatalog, keys};
use crate::coerce::coerce;
use crate::error::ConfigurationError;
use crate::schema::Schema;
use crate::types::PluginStatus;
use crate::value::{Params, REDACTED};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A provided key matches no declared option.
    UnknownSetting,
    /// A required option has no matching provided key.
    MissingRequired,
    /// A provided value failed coercion.
    InvalidValue,
    /// A deprecated option was used.
    Deprecated,
    /// The plugin is not stable.
    StatusNotice,
}

/// A single logged validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The provided key, or the declared option name for missing options.
    pub setting: String,
    /// Rendered message.
    pub message: String,
}

/// The validation passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationPass {
    Status,
    UnknownKeys,
    RequiredKeys,
    Values,
}

/// Outcome of a validation run.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Status the plugin declared.
    pub status: PluginStatus,
    /// The first pass that failed, if any.
    pub failed_pass: Option<ValidationPass>,
    /// Errors reported by the passes that ran.
    pub diagnostics: Vec<Diagnostic>,
    /// Non-fatal notices (status, deprecation).
    pub warnings: Vec<Diagnostic>,
    /// Coerced values; complete only when the report is valid.
    pub values: Params,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failed_pass.is_none()
    }

    /// Diagnostics and warnings of the given kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .chain(&self.warnings)
            .filter(|d| d.kind == kind)
            .collect()
    }
}

/// Validates params against a schema on behalf of one plugin.
pub struct Validator<'a> {
    plugin: &'a str,
    schema: &'a Schema,
    catalog: &'a dyn MessageCatalog,
}

impl<'a> Validator<'a> {
    /// `plugin` is the name used in messages.
    pub fn new(plugin: &'a str, schema: &'a Schema) -> Self {
        Self {
            plugin,
            schema,
            catalog: DefaultCatalog::shared(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'a dyn MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Runs all passes, stopping at the first one that fails.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when `status` is absent or not one of
    /// `unsupported`, `experimental`, `beta` or `stable`.
    pub fn validate(
        &self,
        status: Option<&str>,
        params: &Params,
    ) -> Result<ValidationReport, ConfigurationError> {
        let status = self.check_status(status)?;
        let mut report = ValidationReport {
            status,
            failed_pass: None,
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            values: Params::new(),
        };
        if let Some(notice) = self.status_notice(status) {
            report.warnings.push(notice);
        }

        if !self.check_unknown_keys(params, &mut report.diagnostics) {
            report.failed_pass = Some(ValidationPass::UnknownKeys);
            return Ok(report);
        }
        if !self.check_required_keys(params, &mut report.diagnostics) {
            report.failed_pass = Some(ValidationPass::RequiredKeys);
            return Ok(report);
        }
        if !self.check_values(params, &mut report) {
            report.failed_pass = Some(ValidationPass::Values);
            return Ok(report);
        }

        debug!(plugin = %self.plugin, settings = params.len(), "Validated plugin settings");
        Ok(report)
    }

    fn check_status(&self, status: Option<&str>) -> Result<PluginStatus, ConfigurationError> {
        let Some(raw) = status else {
            let message = self.lookup(keys::STATUS_MISSING, &[]);
            error!(plugin = %self.plugin, "{message}");
            return Err(ConfigurationError::new(message));
        };
        raw.parse::<PluginStatus>().map_err(|unknown| {
            let message = self.lookup(keys::STATUS_INVALID, &[("status", unknown)]);
            error!(plugin = %self.plugin, status = raw, "{message}");
            ConfigurationError::new(message)
        })
    }

    fn status_notice(&self, status: PluginStatus) -> Option<Diagnostic> {
        let key = match status {
            PluginStatus::Unsupported => keys::STATUS_UNSUPPORTED,
            PluginStatus::Experimental => keys::STATUS_EXPERIMENTAL,
            PluginStatus::Beta => keys::STATUS_BETA,
            PluginStatus::Stable => return None,
        };
        let message = self.lookup(key, &[]);
        match status {
            PluginStatus::Beta => info!(plugin = %self.plugin, "{message}"),
            _ => warn!(plugin = %self.plugin, "{message}"),
        }
        Some(Diagnostic {
            kind: DiagnosticKind::StatusNotice,
            setting: String::new(),
            message,
        })
    }

    fn check_unknown_keys(&self, params: &Params, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let mut ok = true;
        for key in params.keys() {
            if self.schema.find_match(key).is_some() {
                continue;
            }
            let message = self.lookup(keys::UNKNOWN_SETTING, &[("name", key.to_string())]);
            error!(plugin = %self.plugin, setting = key, "{message}");
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnknownSetting,
                setting: key.to_string(),
                message,
            });
            ok = false;
        }
        ok
    }

    fn check_required_keys(&self, params: &Params, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let mut ok = true;
        for spec in self.schema.entries().filter(|spec| spec.required) {
            if params.keys().any(|key| spec.matcher.matches(key)) {
                continue;
            }
            let name = spec.matcher.as_str();
            let message = self.lookup(keys::REQUIRED_MISSING, &[("name", name.to_string())]);
            error!(plugin = %self.plugin, setting = name, "{message}");
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MissingRequired,
                setting: name.to_string(),
                message,
            });
            ok = false;
        }
        ok
    }

    fn check_values(&self, params: &Params, report: &mut ValidationReport) -> bool {
        let mut ok = true;
        for (key, raw) in params.iter() {
            let Some(spec) = self.schema.find_match(key) else {
                continue;
            };
            match coerce(raw, &spec.validator) {
                Ok(value) => {
                    report.values.insert(key, value);
                }
                Err(err) => {
                    let shown = if spec.validator.is_secret() {
                        REDACTED.to_string()
                    } else {
                        raw.to_string()
                    };
                    let message = self.lookup(
                        keys::INVALID_VALUE,
                        &[
                            ("name", key.to_string()),
                            ("value", shown),
                            ("error", err.to_string()),
                        ],
                    );
                    error!(plugin = %self.plugin, setting = key, error = %err, "{message}");
                    report.diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::InvalidValue,
                        setting: key.to_string(),
                        message,
                    });
                    ok = false;
                }
            }
        }
        ok
    }

    /// Renders `key` with `plugin` always available as a parameter.
    pub(crate) fn lookup(&self, key: &str, params: &[(&str, String)]) -> String {
        let mut all: Vec<(&str, String)> = vec![("plugin", self.plugin.to_string())];
        all.extend(params.iter().cloned());
        self.catalog.lookup(key, &all)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Kind, Matcher, OptionSpec};
    use crate::value::Value;

    use super::*;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("path").validate(Kind::String).required());
        schema.declare(OptionSpec::new("host").validate(Kind::IpAddress).required());
        schema.declare(OptionSpec::new("port").validate(Kind::Number));
        schema.declare(OptionSpec::new(Matcher::pattern("^tag_").unwrap()).validate(Kind::String));
        schema
    }

    #[test]
    fn test_missing_status_is_a_fault() {
        let schema = schema();
        let err = Validator::new("file", &schema)
            .validate(None, &Params::new().with("bogus", "x"))
            .unwrap_err();

        assert_eq!(err.message, "Plugin file does not declare a status");
        assert!(err.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_status_is_a_fault() {
        let schema = schema();
        let err = Validator::new("file", &schema)
            .validate(Some("milestone"), &Params::new())
            .unwrap_err();

        assert!(err.message.contains("milestone"));
    }

    #[test]
    fn test_status_notices_by_level() {
        let schema = Schema::new();
        let validator = Validator::new("x", &schema);
        for (status, notices) in [
            ("unsupported", 1),
            ("experimental", 1),
            ("beta", 1),
            ("stable", 0),
        ] {
            let report = validator.validate(Some(status), &Params::new()).unwrap();
            assert!(report.is_valid());
            assert_eq!(report.warnings.len(), notices, "status {status}");
        }
    }

    #[test]
    fn test_unknown_keys_reported_once_each_and_gate_later_passes() {
        let schema = schema();
        let params = Params::new().with("bogus", "x").with("other", "y");
        let report = Validator::new("file", &schema)
            .validate(Some("stable"), &params)
            .unwrap();

        assert_eq!(report.failed_pass, Some(ValidationPass::UnknownKeys));
        assert_eq!(report.diagnostics.len(), 2);
        assert!(
            report
                .diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::UnknownSetting)
        );
        // Required keys are missing too, but that pass never ran.
        assert!(report.of_kind(DiagnosticKind::MissingRequired).is_empty());
    }

    #[test]
    fn test_required_pass_reports_every_missing_option() {
        let schema = schema();
        let report = Validator::new("file", &schema)
            .validate(Some("stable"), &Params::new().with("port", "nope"))
            .unwrap();

        assert_eq!(report.failed_pass, Some(ValidationPass::RequiredKeys));
        let missing: Vec<&str> = report
            .of_kind(DiagnosticKind::MissingRequired)
            .iter()
            .map(|d| d.setting.as_str())
            .collect();
        assert_eq!(missing, vec!["path", "host"]);
        // The bad port value is never coerced.
        assert!(report.of_kind(DiagnosticKind::InvalidValue).is_empty());
    }

    #[test]
    fn test_value_pass_continues_after_failure() {
        let schema = schema();
        let params = Params::new()
            .with("path", "/tmp/x")
            .with("host", "300.1.1.1")
            .with("port", "eighty")
            .with("tag_env", "prod");
        let report = Validator::new("file", &schema)
            .validate(Some("stable"), &params)
            .unwrap();

        assert_eq!(report.failed_pass, Some(ValidationPass::Values));
        assert_eq!(report.of_kind(DiagnosticKind::InvalidValue).len(), 2);
        assert_eq!(report.values.get("tag_env"), Some(&Value::from("prod")));
    }

    #[test]
    fn test_braces_in_raw_value_are_shown_verbatim() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("port").validate(Kind::Number));
        let report = Validator::new("file", &schema)
            .validate(Some("stable"), &Params::new().with("port", "{error}"))
            .unwrap();

        assert_eq!(
            report.diagnostics[0].message,
            "Invalid setting for file plugin: port => {error}: expected number, got {error}"
        );
    }

    #[test]
    fn test_secret_values_are_not_echoed_in_messages() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("password").validate(Kind::Secret));
        let params = Params::new().with(
            "password",
            Value::Array(vec!["hunter2".into(), "hunter3".into()]),
        );
        let report = Validator::new("db", &schema)
            .validate(Some("stable"), &params)
            .unwrap();

        assert!(!report.is_valid());
        assert!(!report.diagnostics[0].message.contains("hunter2"));
    }
}
