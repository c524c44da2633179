//! Declarative option schemas and validation for plugin components.
//!
//! A plugin class declares the options it accepts; at construction time the
//! raw name-to-value params are validated against that schema, coerced into
//! typed values, completed with defaults and applied to the new instance.
//!
//! - [`Schema`]: ordered [`OptionSpec`]s, snapshotted into subclasses.
//! - [`coerce`]: converts raw scalars and sequences per [`ValidatorKind`].
//! - [`Validator`]: status, unknown-key, required-key and value passes,
//!   stopping at the first failing pass.
//! - [`ConfigInitializer`]: applies a successful validation to a
//!   [`Configurable`] instance and stores a [`ConfigSnapshot`].
//! - [`FlagRegistry`]: command-line flags declared per class, registered
//!   into any [`FlagParser`] (a clap adapter ships behind the `clap`
//!   feature).
//! - [`PluginClass`]: ties a schema, flags, status and
//!   [`PluginCategory`] together; [`SchemaDocument`] declares one from YAML
//!   or JSON.
//!
//! Diagnostics are logged through [`tracing`] and also collected in the
//! returned [`ValidationReport`]. Messages are rendered by a
//! [`MessageCatalog`].
//!
//! # Example
//!
//! ```
//! use plugin_config_core::*;
//!
//! let mut stdin = PluginClass::new("inputs::Stdin").with_status("stable");
//! stdin
//!     .option(OptionSpec::new("codec").validate(Kind::String).with_default("line"))
//!     .option(OptionSpec::new("workers").validate(Kind::Number))
//!     .option(OptionSpec::new("add_field").validate(Kind::Hash));
//!
//! let mut params = Params::new().with("workers", "2");
//! params.append("add_field", "env");
//! params.append("add_field", "prod");
//!
//! let instance = stdin.instantiate(&params).unwrap();
//! assert_eq!(instance.get_str("codec"), Some("line"));
//! assert_eq!(instance.get_i64("workers"), Some(2));
//! assert_eq!(instance.get_hash("add_field").unwrap()["env"], Value::from("prod"));
//!
//! let err = stdin.instantiate(&Params::new().with("wrokers", "2")).unwrap_err();
//! assert_eq!(err.diagnostics[0].kind, DiagnosticKind::UnknownSetting);
//! ```

mod catalog;
mod coerce;
mod document;
mod error;
mod flags;
mod initialize;
mod plugin;
mod schema;
mod types;
mod validate;
mod value;

pub use catalog::{DefaultCatalog, MessageCatalog, keys};
pub use coerce::coerce;
pub use document::{FlagDocument, OptionDocument, SchemaDocument, ValidateDocument};
pub use error::{CoercionError, ConfigurationError, DocumentError, Result};
#[cfg(feature = "clap")]
pub use flags::ClapFlagParser;
pub use flags::{FlagHandler, FlagParser, FlagRegistry, FlagSpec};
pub use initialize::{
    ConfigInitializer, ConfigSnapshot, Configurable, PluginInstance, RESERVED_PREFIX,
};
pub use plugin::{InMemoryRegistry, PluginClass, PluginRegistry, RegisteredPlugin};
pub use schema::Schema;
pub use types::*;
pub use validate::{Diagnostic, DiagnosticKind, ValidationPass, ValidationReport, Validator};
pub use value::{Hash, Params, REDACTED, Value};
