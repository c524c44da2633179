//! Command-line flag declarations.
//!
//! A plugin class may declare flags alongside its option schema. The two are
//! independent: flags are never validated against the schema. At startup the
//! host passes a [`FlagParser`] to [`FlagRegistry::register_into`], which
//! namespaces each flag with the class's short name:
//! `--<prefix>-<flag>`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use plugin_config_core::{FlagHandler, FlagParser, FlagRegistry, FlagSpec};
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl FlagParser for Names {
//!     fn register_flag(&mut self, full_name: &str, _extra: &[String], _handler: FlagHandler) {
//!         self.0.push(full_name.to_string());
//!     }
//! }
//!
//! let mut flags = FlagRegistry::new();
//! flags.declare_flag(FlagSpec::new("--interval SECONDS", Arc::new(|_: &str| {})));
//!
//! let mut names = Names::default();
//! flags.register_into("Stdin", &mut names);
//! assert_eq!(names.0, vec!["--stdin-interval SECONDS"]);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Called with the flag's value (`"true"` for switches).
pub type FlagHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// A single declared flag.
#[derive(Clone)]
pub struct FlagSpec {
    /// First token is the base name; the rest are passed to the parser.
    pub arg_tokens: Vec<String>,
    /// Extra parser arguments (help text first).
    pub extra_args: Vec<String>,
    pub handler: FlagHandler,
}

impl FlagSpec {
    pub fn new(name: impl Into<String>, handler: FlagHandler) -> Self {
        Self {
            arg_tokens: vec![name.into()],
            extra_args: Vec::new(),
            handler,
        }
    }

    /// Adds a token after the base name.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.arg_tokens.push(token.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.extra_args.insert(0, help.into());
        self
    }

    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// First token with its leading dashes removed.
    pub fn base_name(&self) -> &str {
        self.arg_tokens
            .first()
            .map(|token| token.trim_start_matches('-'))
            .unwrap_or_default()
    }

    /// Full name under the given class prefix.
    pub fn full_name(&self, class_short_name: &str) -> String {
        format!("--{}-{}", class_short_name.to_lowercase(), self.base_name())
    }
}

impl fmt::Debug for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSpec")
            .field("arg_tokens", &self.arg_tokens)
            .field("extra_args", &self.extra_args)
            .finish_non_exhaustive()
    }
}

/// Receives flag registrations.
pub trait FlagParser {
    fn register_flag(&mut self, full_name: &str, extra_args: &[String], handler: FlagHandler);
}

/// Ordered flag declarations of one class.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: Vec<FlagSpec>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_flag(&mut self, flag: FlagSpec) -> &mut Self {
        self.flags.push(flag);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Registers every declared flag with `parser`, prefixed by the
    /// lower-cased `class_short_name`.
    pub fn register_into(&self, class_short_name: &str, parser: &mut dyn FlagParser) {
        for flag in &self.flags {
            let full_name = flag.full_name(class_short_name);
            let extra: Vec<String> = flag
                .arg_tokens
                .iter()
                .skip(1)
                .chain(&flag.extra_args)
                .cloned()
                .collect();
            debug!(flag = %full_name, "Registering flag");
            parser.register_flag(&full_name, &extra, Arc::clone(&flag.handler));
        }
    }
}

#[cfg(feature = "clap")]
pub use self::clap_parser::ClapFlagParser;

#[cfg(feature = "clap")]
mod clap_parser {
    use clap::{Arg, ArgAction, ArgMatches, Command};
    use tracing::warn;

    use super::{FlagHandler, FlagParser};

    struct Registered {
        id: String,
        takes_value: bool,
        handler: FlagHandler,
    }

    /// Registers flags as [`clap::Arg`]s and dispatches their handlers.
    ///
    /// A full name of the form `--name VALUE` takes a value; anything else is
    /// a switch whose handler receives `"true"`. The first extra argument
    /// becomes the help text. A name that is already registered is skipped,
    /// so the first registration keeps its handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use plugin_config_core::{ClapFlagParser, FlagRegistry, FlagSpec};
    ///
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&seen);
    ///
    /// let mut flags = FlagRegistry::new();
    /// flags.declare_flag(
    ///     FlagSpec::new("--interval SECONDS", Arc::new(move |v: &str| sink.lock().unwrap().push(v.to_string())))
    ///         .with_help("Polling interval"),
    /// );
    ///
    /// let mut parser = ClapFlagParser::new(clap::Command::new("agent"));
    /// flags.register_into("Stdin", &mut parser);
    ///
    /// let matches = parser.parse_from(["agent", "--stdin-interval", "5"]).unwrap();
    /// assert_eq!(parser.dispatch(&matches), 1);
    /// assert_eq!(*seen.lock().unwrap(), vec!["5".to_string()]);
    /// ```
    pub struct ClapFlagParser {
        command: Command,
        registered: Vec<Registered>,
    }

    impl ClapFlagParser {
        pub fn new(command: Command) -> Self {
            Self {
                command,
                registered: Vec::new(),
            }
        }

        pub fn command(&self) -> &Command {
            &self.command
        }

        pub fn into_command(self) -> Command {
            self.command
        }

        /// Parses `args` (including the binary name) against the command.
        pub fn parse_from<I, T>(&self, args: I) -> Result<ArgMatches, clap::Error>
        where
            I: IntoIterator<Item = T>,
            T: Into<std::ffi::OsString> + Clone,
        {
            self.command.clone().try_get_matches_from(args)
        }

        /// Calls the handler of every registered flag present in `matches`
        /// and returns how many ran.
        pub fn dispatch(&self, matches: &ArgMatches) -> usize {
            let mut called = 0;
            for flag in &self.registered {
                if flag.takes_value {
                    if let Some(value) = matches.get_one::<String>(&flag.id) {
                        (flag.handler)(value.as_str());
                        called += 1;
                    }
                } else if matches.get_flag(&flag.id) {
                    (flag.handler)("true");
                    called += 1;
                }
            }
            called
        }
    }

    impl FlagParser for ClapFlagParser {
        fn register_flag(&mut self, full_name: &str, extra_args: &[String], handler: FlagHandler) {
            let mut parts = full_name.split_whitespace();
            let long = parts
                .next()
                .unwrap_or_default()
                .trim_start_matches('-')
                .to_string();
            let value_name = parts.next().map(str::to_string);
            if self.registered.iter().any(|flag| flag.id == long) {
                warn!(flag = %full_name, "Flag already registered, skipping");
                return;
            }

            let mut arg = Arg::new(long.clone()).long(long.clone());
            arg = match &value_name {
                Some(name) => arg.value_name(name.clone()).action(ArgAction::Set),
                None => arg.action(ArgAction::SetTrue),
            };
            if let Some(help) = extra_args.first() {
                arg = arg.help(help.clone());
            }

            let command = std::mem::replace(&mut self.command, Command::new(""));
            self.command = command.arg(arg);
            self.registered.push(Registered {
                id: long,
                takes_value: value_name.is_some(),
                handler,
            });
        }
    }
}
