// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Castfit CLI
//!
//! Casts JSON payloads or `KEY=VALUE` arguments against declared types.
//!
//! # Usage
//!
//! ```bash
//! castfit-cli cast --type "list[int]" --json '["1", 2.0]'
//! echo '{"a": 1}' | castfit-cli check --type "dict[str, int]"
//! castfit-cli describe --type "optional[tuple[int, ...]]"
//! castfit-cli args --schema server.toml port=8080 debug=yes
//! ```

use anyhow::Context;
use castfit::{Annotation, Caster, TypeCatalog, Value};
use castfit_cli::{input, SchemaConfig};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Castfit - type coercion for untyped data
#[derive(Parser, Debug)]
#[command(name = "castfit-cli")]
#[command(about = "Cast JSON payloads and KEY=VALUE arguments against declared types")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cast a payload and print the result as JSON
    Cast {
        /// Target annotation (e.g. "dict[str, list[int]]")
        #[arg(short, long = "type", value_name = "ANNOTATION")]
        type_name: String,

        #[command(flatten)]
        payload: Payload,
    },

    /// Check whether a payload already matches, without coercion
    Check {
        /// Annotation to check against
        #[arg(short, long = "type", value_name = "ANNOTATION")]
        type_name: String,

        #[command(flatten)]
        payload: Payload,
    },

    /// Print the normalized descriptor tree of an annotation
    Describe {
        /// Annotation to normalize
        #[arg(short, long = "type", value_name = "ANNOTATION")]
        type_name: String,
    },

    /// Cast KEY=VALUE arguments against a TOML schema
    Args {
        /// Schema file
        #[arg(short, long, value_name = "FILE")]
        schema: PathBuf,

        /// Assignments (a repeated key collects into a list)
        #[arg(value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
}

/// JSON payload source; stdin when neither is given.
#[derive(clap::Args, Debug)]
struct Payload {
    /// Inline JSON text
    #[arg(short, long, conflicts_with = "file")]
    json: Option<String>,

    /// JSON file
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the result.
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Cast { type_name, payload } => cmd_cast(&type_name, &payload),
        Commands::Check { type_name, payload } => cmd_check(&type_name, &payload),
        Commands::Describe { type_name } => cmd_describe(&type_name),
        Commands::Args {
            schema,
            assignments,
        } => cmd_args(&schema, &assignments),
    }
}

fn parse_annotation(text: &str) -> anyhow::Result<Annotation> {
    text.parse::<Annotation>()
        .with_context(|| format!("Failed to parse annotation `{text}`"))
}

fn read_payload(payload: &Payload) -> anyhow::Result<Value> {
    let text = match (&payload.json, &payload.file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(input::parse_json(&text)?)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

fn cmd_cast(type_name: &str, payload: &Payload) -> anyhow::Result<()> {
    let annotation = parse_annotation(type_name)?;
    let value = read_payload(payload)?;
    tracing::debug!("casting {} against {}", value.describe(), annotation);

    let result = castfit::cast(value, &annotation)?;
    print_json(&result)
}

fn cmd_check(type_name: &str, payload: &Payload) -> anyhow::Result<()> {
    let annotation = parse_annotation(type_name)?;
    let value = read_payload(payload)?;

    if castfit::is_type(&value, &annotation) {
        println!("[OK] {} matches {}", value.describe(), annotation);
        Ok(())
    } else {
        anyhow::bail!("{} does not match {}", value.describe(), annotation);
    }
}

fn cmd_describe(type_name: &str) -> anyhow::Result<()> {
    let annotation = parse_annotation(type_name)?;
    print!("{}", castfit::normalize(&annotation).tree());
    Ok(())
}

fn cmd_args(schema: &Path, assignments: &[String]) -> anyhow::Result<()> {
    let config = SchemaConfig::from_file(schema)
        .with_context(|| format!("Failed to load schema {}", schema.display()))?;
    let table = config.to_field_table(TypeCatalog::global())?;
    tracing::info!("loaded schema {} ({} fields)", table.name(), table.len());

    let map = input::parse_assignments(assignments, Some(&table))?;
    let record = table.cast_fields(&Caster::global(), map)?;
    print_json(&Value::Map(record))
}
