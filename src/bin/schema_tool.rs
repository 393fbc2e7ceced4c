//! Schema Tool CLI
//!
//! Downgrade schemas for OpenAPI 3.0, check values against schemas and
//! manage toolkit configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use typed_schemas::{
    cache_compile, downgrade, enhance_errors, merge_errors, needs_downgrade, Schema, SchemaRef,
    ToolkitConfig,
};

#[derive(Parser)]
#[command(name = "schema-tool")]
#[command(about = "Downgrade schemas and check values against them")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the OpenAPI 3.0 form of a JSON schema
    Downgrade {
        /// Schema file (JSON)
        file: PathBuf,

        /// Only report whether the schema needs downgrading
        #[arg(long)]
        check: bool,
    },

    /// Check a JSON value against a schema and print the error report
    Check {
        /// Schema file (JSON)
        schema: PathBuf,

        /// Value file (JSON)
        value: PathBuf,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration as TOML
    Show,

    /// Write a default config file
    Init {
        #[arg(short, long, default_value = "typed-schemas.toml")]
        output: String,
    },

    /// Load and validate configuration
    Validate,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_schema(path: &Path) -> Result<SchemaRef> {
    let json = read_json(path)?;
    let schema = Schema::from_json(&json).with_context(|| format!("loading schema {}", path.display()))?;
    Ok(schema.into_ref())
}

fn run(cli: Cli) -> Result<()> {
    let config = ToolkitConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Downgrade { file, check } => {
            let schema = read_schema(&file)?;
            if check {
                if needs_downgrade(&schema) {
                    println!("⚠️  {} needs downgrading for OpenAPI 3.0", file.display());
                    std::process::exit(1);
                }
                println!("✅ {} is OpenAPI 3.0 compatible", file.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&downgrade(&schema).to_json())?);
            }
        }

        Commands::Check { schema, value } => {
            config.register_formats()?;
            let checker = cache_compile(&read_schema(&schema)?, &[])?;
            let value = read_json(&value)?;

            let errors = checker.errors(&value);
            if errors.len() == 0 {
                println!("✅ Value matches schema");
                return Ok(());
            }

            let report = merge_errors(
                enhance_errors(errors, &config.enhance_options()),
                config.validation.strip_empty_paths,
            );
            println!("❌ {} invalid path(s)", report.len());
            println!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(1);
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init { output } => {
                ToolkitConfig::default().save(&output)?;
                println!("✅ Created config file: {}", output);
            }
            ConfigAction::Validate => {
                config.validate()?;
                println!("✅ Configuration is valid");
                println!("   Formats: {}", config.formats.patterns.len());
                println!("   Downgrade docs: {}", config.openapi.downgrade);
            }
        },
    }

    Ok(())
}
