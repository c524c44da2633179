//! Plugin classes and the registry collaborator.
//!
//! A [`PluginClass`] owns everything declared for one component type: its
//! option [`Schema`], its [`FlagRegistry`], an explicit
//! [`PluginCategory`] and its status. Inheritance is an explicit call to
//! [`subclass`](PluginClass::subclass) at definition time.
//!
//! # Example
//!
//! ```
//! use plugin_config_core::*;
//!
//! let mut base = PluginClass::new("inputs::Base")
//!     .with_category(PluginCategory::Input)
//!     .with_status("stable");
//! base.option(OptionSpec::new("tags").validate(Kind::Array));
//!
//! let mut registry = InMemoryRegistry::default();
//! let mut file = base.subclass("inputs::File");
//! file.config_name("file", &mut registry)
//!     .option(OptionSpec::new("path").validate(Kind::String).required());
//!
//! let instance = file
//!     .instantiate(&Params::new().with("path", vec![Value::from("/tmp/x")]))
//!     .unwrap();
//! assert_eq!(instance.get_str("path"), Some("/tmp/x"));
//! assert!(registry.contains("file"));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::MessageCatalog;
use crate::error::ConfigurationError;
use crate::flags::{FlagParser, FlagRegistry, FlagSpec};
use crate::initialize::{ConfigInitializer, Configurable, PluginInstance};
use crate::schema::Schema;
use crate::types::{OptionSpec, PluginCategory};
use crate::validate::{ValidationReport, Validator};
use crate::value::Params;

/// Receives a class once its config name is declared.
pub trait PluginRegistry {
    fn register(&mut self, name: &str, class: &PluginClass);
}

/// What [`InMemoryRegistry`] keeps per registered name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPlugin {
    pub class_name: String,
    pub category: Option<PluginCategory>,
}

/// Registry that records registrations in a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    plugins: BTreeMap<String, RegisteredPlugin>,
}

impl InMemoryRegistry {
    pub fn get(&self, name: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginRegistry for InMemoryRegistry {
    fn register(&mut self, name: &str, class: &PluginClass) {
        self.plugins.insert(
            name.to_string(),
            RegisteredPlugin {
                class_name: class.name().to_string(),
                category: class.category(),
            },
        );
    }
}

/// Declarations of one plugin type.
#[derive(Debug, Clone)]
pub struct PluginClass {
    name: String,
    category: Option<PluginCategory>,
    status: Option<String>,
    config_name: Option<String>,
    schema: Schema,
    flags: FlagRegistry,
}

impl PluginClass {
    /// `name` may be a path such as `inputs::File`; the last segment is the
    /// short name used for flag prefixes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            status: None,
            config_name: None,
            schema: Schema::new(),
            flags: FlagRegistry::new(),
        }
    }

    /// Creates a subclass from a snapshot of this class's schema.
    ///
    /// Category and status carry over. The config name does not, and flags
    /// are not inherited: a subclass declares its own.
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(
            parent = %self.name,
            class = %name,
            options = self.schema.len(),
            "Creating subclass"
        );
        Self {
            name,
            category: self.category,
            status: self.status.clone(),
            config_name: None,
            schema: self.schema.snapshot_for_subclass(),
            flags: FlagRegistry::new(),
        }
    }

    pub fn with_category(mut self, category: PluginCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Declares the status; it is checked when params are validated.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the identifying name and registers the class under it.
    pub fn config_name(
        &mut self,
        name: impl Into<String>,
        registry: &mut dyn PluginRegistry,
    ) -> &mut Self {
        let name = name.into();
        registry.register(&name, self);
        self.config_name = Some(name);
        self
    }

    /// Declares (or overwrites) an option.
    pub fn option(&mut self, spec: OptionSpec) -> &mut Self {
        self.schema.declare(spec);
        self
    }

    pub fn flag(&mut self, flag: FlagSpec) -> &mut Self {
        self.flags.declare_flag(flag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Name used in messages: the config name, else the short name.
    pub fn display_name(&self) -> &str {
        self.config_name.as_deref().unwrap_or_else(|| self.short_name())
    }

    pub fn category(&self) -> Option<PluginCategory> {
        self.category
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn flags(&self) -> &FlagRegistry {
        &self.flags
    }

    /// Validates `params` without touching any instance.
    pub fn validate(&self, params: &Params) -> Result<ValidationReport, ConfigurationError> {
        Validator::new(self.display_name(), &self.schema).validate(self.status(), params)
    }

    /// Configures an existing instance.
    pub fn initialize<T: Configurable + ?Sized>(
        &self,
        instance: &mut T,
        params: &Params,
    ) -> Result<ValidationReport, ConfigurationError> {
        ConfigInitializer::new(self.display_name(), &self.schema, self.status())
            .initialize(instance, params)
    }

    /// Builds a configured [`PluginInstance`].
    pub fn instantiate(&self, params: &Params) -> Result<PluginInstance, ConfigurationError> {
        let mut instance = PluginInstance::default();
        self.initialize(&mut instance, params)?;
        Ok(instance)
    }

    /// Like [`instantiate`](PluginClass::instantiate) with messages from
    /// `catalog`.
    pub fn instantiate_with(
        &self,
        params: &Params,
        catalog: &dyn MessageCatalog,
    ) -> Result<PluginInstance, ConfigurationError> {
        let mut instance = PluginInstance::default();
        ConfigInitializer::new(self.display_name(), &self.schema, self.status())
            .with_catalog(catalog)
            .initialize(&mut instance, params)?;
        Ok(instance)
    }

    /// Registers this class's flags with `parser`.
    pub fn register_flags(&self, parser: &mut dyn FlagParser) {
        self.flags.register_into(self.short_name(), parser);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::types::Kind;

    use super::*;

    #[test]
    fn test_short_name_is_last_path_segment() {
        assert_eq!(PluginClass::new("inputs::HttpPoller").short_name(), "HttpPoller");
        assert_eq!(PluginClass::new("Stdin").short_name(), "Stdin");
    }

    #[test]
    fn test_config_name_registers_once() {
        let mut registry = InMemoryRegistry::default();
        let mut class = PluginClass::new("outputs::Stdout").with_category(PluginCategory::Output);
        class.config_name("stdout", &mut registry);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("stdout"),
            Some(&RegisteredPlugin {
                class_name: "outputs::Stdout".to_string(),
                category: Some(PluginCategory::Output),
            })
        );
        assert_eq!(class.display_name(), "stdout");
    }

    #[test]
    fn test_subclass_does_not_inherit_flags_or_config_name() {
        let mut registry = InMemoryRegistry::default();
        let mut base = PluginClass::new("Base").with_status("beta");
        base.config_name("base", &mut registry)
            .option(OptionSpec::new("a").validate(Kind::String))
            .flag(FlagSpec::new("--verbose", Arc::new(|_: &str| {})));

        let child = base.subclass("Child");

        assert_eq!(child.schema().names(), vec!["a"]);
        assert!(child.flags().is_empty());
        assert_eq!(child.status(), Some("beta"));
        assert_eq!(child.display_name(), "Child");
    }
}
