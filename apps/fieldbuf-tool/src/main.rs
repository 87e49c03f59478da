//! CLI tool for schema validation, evolution checks and record inspection.
//!
//! Provides commands for:
//! - Structural validation of a schema definition file
//! - Compatibility checks between two schema versions
//! - Encoding JSON values into records and decoding them back

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use fieldbuf_core::record::value_to_json;
use fieldbuf_core::{
    validate_evolution, validate_schema, CodecConfig, OperatorRegistry, Record, Schema,
    SchemaDefinition, TableCodec, TypeInterner,
};
use tracing::Level;

/// Command-line arguments for the schema tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Largest record buffer accepted on encode and decode, in bytes
    #[arg(long, global = true)]
    max_record_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a schema definition against the structural rules
    Validate {
        /// Schema definition file (JSON)
        schema: PathBuf,
    },
    /// Check that a new schema version can replace the current one
    Evolve {
        /// Current schema definition file
        current: PathBuf,
        /// Proposed schema definition file
        next: PathBuf,
    },
    /// Print the tables and fields of a schema
    Describe {
        /// Schema definition file (JSON)
        schema: PathBuf,
    },
    /// Encode a JSON object into a record file
    Encode {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        table: String,
        /// JSON object keyed by field name
        #[arg(long)]
        values: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Decode a record file and print it as JSON
    Decode {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        table: String,
        /// Record file written by `encode`
        file: PathBuf,
        /// Print only this field
        #[arg(long)]
        field: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = CodecConfig::default();
    if let Some(max) = args.max_record_size {
        config.max_record_size = max;
    }

    match args.command {
        Command::Validate { schema } => validate(&schema),
        Command::Evolve { current, next } => evolve(&current, &next),
        Command::Describe { schema } => describe(&schema),
        Command::Encode {
            schema,
            table,
            values,
            out,
        } => encode(config, &schema, &table, &values, &out),
        Command::Decode {
            schema,
            table,
            file,
            field,
        } => decode(config, &schema, &table, &file, field.as_deref()),
    }
}

fn load_definition(path: &Path) -> anyhow::Result<SchemaDefinition> {
    SchemaDefinition::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Builds a schema keeping dangling group references so validation can
/// name them.
fn load_for_validation(path: &Path, interner: &TypeInterner) -> anyhow::Result<Schema> {
    load_definition(path)?
        .build_unresolved(interner)
        .with_context(|| format!("Failed to build schema from {}", path.display()))
}

fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    load_definition(path)?
        .build(&TypeInterner::new())
        .with_context(|| format!("Failed to build schema from {}", path.display()))
}

fn table_codec(
    registry: &OperatorRegistry,
    schema: &Schema,
    table: &str,
) -> anyhow::Result<Arc<TableCodec>> {
    let table = schema
        .table(table)
        .ok_or_else(|| anyhow!("Table '{}' not found in schema '{}'", table, schema.name()))?;
    Ok(registry.table_codec(table)?)
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let schema = load_for_validation(path, &TypeInterner::new())?;
    validate_schema(&schema)
        .with_context(|| format!("Schema '{}' is invalid", schema.name()))?;
    println!(
        "Schema '{}' is valid ({} tables)",
        schema.name(),
        schema.tables().len()
    );
    Ok(())
}

fn evolve(current: &Path, next: &Path) -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current = load_for_validation(current, &interner)?;
    let next = load_for_validation(next, &interner)?;
    validate_evolution(&current, &next).with_context(|| {
        format!(
            "Schema '{}' cannot replace '{}'",
            next.name(),
            current.name()
        )
    })?;
    println!(
        "Schema '{}' is a compatible evolution of '{}'",
        next.name(),
        current.name()
    );
    Ok(())
}

fn describe(path: &Path) -> anyhow::Result<()> {
    let schema = load_for_validation(path, &TypeInterner::new())?;
    println!("schema {}", schema.name());
    for table in schema.tables() {
        println!("  table {} (version {})", table.name(), table.version());
        for field in table.fields() {
            let default = match field.default_value() {
                Some(value) => format!(" = {}", value_to_json(value)?),
                None => String::new(),
            };
            println!(
                "    {:>5}  {:<20} {:<20} [{}]{}",
                field.id(),
                field.name(),
                field.field_type().to_string(),
                field.constraints().names().join(", "),
                default
            );
        }
    }
    Ok(())
}

fn encode(
    config: CodecConfig,
    schema: &Path,
    table: &str,
    values: &str,
    out: &Path,
) -> anyhow::Result<()> {
    let schema = load_schema(schema)?;
    let registry = OperatorRegistry::with_config(config);
    let codec = table_codec(&registry, &schema, table)?;

    let json: serde_json::Value =
        serde_json::from_str(values).context("Failed to parse --values as JSON")?;
    let record = Record::from_json(codec, &json)?;
    let bytes = record.to_bytes()?;
    fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;

    tracing::info!("Wrote {} bytes to {}", bytes.len(), out.display());
    Ok(())
}

fn decode(
    config: CodecConfig,
    schema: &Path,
    table: &str,
    file: &Path,
    field: Option<&str>,
) -> anyhow::Result<()> {
    let schema = load_schema(schema)?;
    let registry = OperatorRegistry::with_config(config);
    let codec = table_codec(&registry, &schema, table)?;

    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let record = Record::from_bytes(codec, &bytes)
        .with_context(|| format!("{} is not a valid '{}' record", file.display(), table))?;

    let json = match field {
        Some(name) => value_to_json(&record.get_by_name(name)?)?,
        None => record.to_json()?,
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
