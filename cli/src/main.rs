use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use plugin_config_core::{ClapFlagParser, Params, PluginClass, SchemaDocument};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI output format with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "plugin-config")]
#[command(about = "Check plugin configuration against declarative schema documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a params file and print the resulting configuration.
    Check(CheckArgs),
    /// Print the command-line flags a schema document declares.
    Flags(FlagsArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema document (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
    /// Params file (YAML, or JSON with a .json extension).
    #[arg(long)]
    params: PathBuf,
    /// Output format for the resulting configuration.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct FlagsArgs {
    /// Schema document (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Flags(args) => run_flags(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_class(path: &Path) -> Result<PluginClass, String> {
    let document = SchemaDocument::load(path)
        .map_err(|err| format!("Failed to load schema '{}': {err}", path.display()))?;
    debug!(schema = %path.display(), options = document.options.len(), "Loaded schema document");
    document
        .into_class(None)
        .map_err(|err| format!("Invalid schema '{}': {err}", path.display()))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let class = load_class(&args.schema)?;
    let params = Params::load(&args.params)
        .map_err(|err| format!("Failed to load params '{}': {err}", args.params.display()))?;

    let instance = class.instantiate(&params).map_err(|err| {
        let mut lines = vec![err.to_string()];
        lines.extend(err.diagnostics.iter().map(|d| format!("  - {}", d.message)));
        lines.join("\n")
    })?;

    let rendered = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(instance.config())
            .map_err(|err| format!("Failed to serialize configuration: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(instance.config())
            .map_err(|err| format!("Failed to serialize configuration: {err}"))?,
    };
    println!("{rendered}");
    Ok(())
}

fn run_flags(args: FlagsArgs) -> Result<(), String> {
    let class = load_class(&args.schema)?;
    if class.flags().is_empty() {
        println!("{} declares no flags.", class.name());
        return Ok(());
    }

    let mut parser = ClapFlagParser::new(clap::Command::new(class.short_name().to_lowercase()));
    class.register_flags(&mut parser);

    for arg in parser
        .command()
        .get_arguments()
        .filter(|arg| arg.get_id() != "help")
    {
        let long = arg.get_long().unwrap_or_default();
        match arg.get_help() {
            Some(help) => println!("--{long}\t{help}"),
            None => println!("--{long}"),
        }
    }
    Ok(())
}
