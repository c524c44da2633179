//! Message lookup for diagnostics and fatal errors.
//!
//! Every user-facing string goes through a [`MessageCatalog`] by message key
//! and named parameters. [`DefaultCatalog`] ships English templates with
//! `{name}` placeholders; hosts can override single entries or supply their
//! own catalog.
//!
//! # Example
//!
//! ```
//! use plugin_config_core::{DefaultCatalog, MessageCatalog, keys};
//!
//! let catalog = DefaultCatalog::new()
//!     .with_template(keys::UNKNOWN_SETTING, "no such setting {name} on {plugin}");
//! let msg = catalog.lookup(
//!     keys::UNKNOWN_SETTING,
//!     &[("name", "pth".to_string()), ("plugin", "file".to_string())],
//! );
//! assert_eq!(msg, "no such setting pth on file");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// Stable message keys used by the engine.
pub mod keys {
    pub const UNKNOWN_SETTING: &str = "config.unknown_setting";
    pub const REQUIRED_MISSING: &str = "config.required_missing";
    pub const INVALID_VALUE: &str = "config.invalid_value";
    pub const DEPRECATED: &str = "config.deprecated";
    pub const INVALID_SETTINGS: &str = "config.invalid_settings";
    pub const STATUS_UNSUPPORTED: &str = "config.status.unsupported";
    pub const STATUS_EXPERIMENTAL: &str = "config.status.experimental";
    pub const STATUS_BETA: &str = "config.status.beta";
    pub const STATUS_MISSING: &str = "config.status.missing";
    pub const STATUS_INVALID: &str = "config.status.invalid";
}

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (keys::UNKNOWN_SETTING, "Unknown setting '{name}' for {plugin}"),
    (
        keys::REQUIRED_MISSING,
        "Missing a required setting for the {plugin} plugin: {name}",
    ),
    (
        keys::INVALID_VALUE,
        "Invalid setting for {plugin} plugin: {name} => {value}: {error}",
    ),
    (
        keys::DEPRECATED,
        "You are using a deprecated config setting '{name}' set in {plugin}. \
         Deprecated settings will continue to work, but are scheduled for removal in a future release.",
    ),
    (
        keys::INVALID_SETTINGS,
        "Something is wrong with your configuration for the {plugin} plugin",
    ),
    (
        keys::STATUS_UNSUPPORTED,
        "Using unsupported plugin {plugin}. It may be removed without notice",
    ),
    (
        keys::STATUS_EXPERIMENTAL,
        "Using experimental plugin {plugin}. It may change without notice",
    ),
    (keys::STATUS_BETA, "Using beta plugin {plugin}"),
    (
        keys::STATUS_MISSING,
        "Plugin {plugin} does not declare a status",
    ),
    (
        keys::STATUS_INVALID,
        "Plugin {plugin} declares an unknown status '{status}'",
    ),
];

static SHARED: LazyLock<DefaultCatalog> = LazyLock::new(DefaultCatalog::new);

/// Renders a message from a key and named parameters.
pub trait MessageCatalog {
    fn lookup(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// Built-in English catalog.
#[derive(Debug, Clone)]
pub struct DefaultCatalog {
    templates: HashMap<String, String>,
}

impl DefaultCatalog {
    pub fn new() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Process-wide instance used when no catalog is supplied.
    pub fn shared() -> &'static DefaultCatalog {
        &SHARED
    }

    /// Overrides (or adds) the template for `key`.
    pub fn with_template(mut self, key: &str, template: &str) -> Self {
        self.templates.insert(key.to_string(), template.to_string());
        self
    }
}

impl Default for DefaultCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCatalog for DefaultCatalog {
    fn lookup(&self, key: &str, params: &[(&str, String)]) -> String {
        match self.templates.get(key) {
            Some(template) => render(template, params),
            None if params.is_empty() => key.to_string(),
            None => {
                let rendered: Vec<String> =
                    params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{key} ({})", rendered.join(", "))
            }
        }
    }
}

/// Substitutes `{ident}` tokens in one pass; substituted text is never
/// scanned again. Tokens without a parameter are kept as written.
fn render(template: &str, params: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let ident = &after[..close];
        match params.iter().find(|(name, _)| *name == ident) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
