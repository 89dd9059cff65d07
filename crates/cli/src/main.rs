//! Findings Mapper CLI
//!
//! Command-line interface for inspecting schema catalogs, importing Smithy
//! models and mapping Security Hub JSON payloads.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use findings_mapper_codec::{RequestEnvelope, RequestMarshaller, TypedObjectCodec};
use findings_mapper_common::{Record, SchemaCatalog};
use findings_mapper_parser::SmithyParser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "findings-mapper")]
#[command(version, about = "Schema-driven JSON mapping for the AWS Security Hub API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records and operations of a catalog
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize the bundled Security Hub catalog\n  \
        findings-mapper inspect\n\n  \
        # Show the fields of one record\n  \
        findings-mapper inspect --catalog securityhub.yaml --record AwsSecurityFinding")]
    Inspect {
        /// Catalog file (YAML or JSON); the bundled sample if omitted
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Record to describe
        #[arg(short, long)]
        record: Option<String>,
    },

    /// Convert a Smithy JSON model into a catalog
    #[command(after_help = "EXAMPLES:\n  \
        # Import the Security Hub model\n  \
        findings-mapper import-smithy \\\n    \
        --spec securityhub-2018-10-26.json \\\n    \
        --output securityhub.yaml")]
    ImportSmithy {
        /// Path to the Smithy JSON AST file
        #[arg(short, long)]
        spec: PathBuf,

        /// Output catalog file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Service name (derived from the model if omitted)
        #[arg(long)]
        service: Option<String>,
    },

    /// Parse a JSON payload and write it back in canonical form
    #[command(after_help = "EXAMPLES:\n  \
        # Drop unknown fields from a finding\n  \
        findings-mapper normalize --type AwsSecurityFinding --input finding.json --pretty\n\n  \
        # Read from stdin\n  \
        cat response.json | findings-mapper normalize --type GetFindingsResponse")]
    Normalize {
        /// Record type of the payload
        #[arg(short, long = "type")]
        type_name: String,

        /// Catalog file (YAML or JSON); the bundled sample if omitted
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Input JSON file (stdin if omitted or "-")
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },

    /// Show the HTTP request an operation input maps to
    #[command(after_help = "EXAMPLES:\n  \
        # Build a ListInvitations request\n  \
        echo '{\"MaxResults\":10}' | findings-mapper request --operation ListInvitations --input -\n\n  \
        # Target another region\n  \
        findings-mapper request --operation GetFindings --region eu-west-1")]
    Request {
        /// Operation name
        #[arg(short, long)]
        operation: String,

        /// Catalog file (YAML or JSON); the bundled sample if omitted
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Input JSON file ("-" for stdin); empty input if omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// AWS region
        #[arg(long)]
        region: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { catalog, record } => {
            inspect_command(catalog.as_deref(), record.as_deref(), cli.verbose)?;
        }
        Commands::ImportSmithy {
            spec,
            output,
            service,
        } => {
            import_smithy_command(spec.as_path(), output.as_deref(), service.as_deref())?;
        }
        Commands::Normalize {
            type_name,
            catalog,
            input,
            pretty,
        } => {
            normalize_command(&type_name, catalog.as_deref(), input.as_deref(), pretty)?;
        }
        Commands::Request {
            operation,
            catalog,
            input,
            region,
        } => {
            request_command(
                &operation,
                catalog.as_deref(),
                input.as_deref(),
                region.as_deref(),
            )?;
        }
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn inspect_command(catalog_path: Option<&Path>, record: Option<&str>, verbose: bool) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;

    if let Some(name) = record {
        let schema = catalog
            .records
            .get(name)
            .with_context(|| format!("Record '{}' not found in catalog", name))?;

        println!("{}", schema.name.bold());
        if let Some(description) = &schema.description {
            println!("  {}", description.dimmed());
        }
        for field in &schema.fields {
            println!("  {} {}", field.name.cyan(), field.field_type.to_string().yellow());
            if verbose {
                if let Some(description) = &field.description {
                    println!("      {}", description.dimmed());
                }
            }
        }
        return Ok(());
    }

    println!("{}", "Catalog:".bold());
    println!("  Service: {}", catalog.service.yellow());
    if let Some(version) = &catalog.version {
        println!("  Version: {}", version.yellow());
    }
    println!("  Endpoint: {}", catalog.endpoint(None));
    println!("  Records: {}", catalog.records.len());
    println!("  Operations: {}", catalog.operations.len());

    if verbose {
        println!("\n{}", "Records:".bold());
        for schema in catalog.records.records() {
            println!("  • {} ({} fields)", schema.name.cyan(), schema.fields.len());
        }
    }

    println!("\n{}", "Operations:".bold());
    for op in &catalog.operations {
        println!(
            "  • {} {} {}",
            op.name.cyan(),
            op.method.to_string().yellow(),
            op.uri
        );
    }

    Ok(())
}

fn import_smithy_command(
    spec_path: &Path,
    output: Option<&Path>,
    service: Option<&str>,
) -> Result<()> {
    eprintln!("{} Importing Smithy model: {}", "→".cyan(), spec_path.display());

    let mut parser = SmithyParser::from_file(spec_path).context("Failed to load Smithy spec")?;
    if let Some(service) = service {
        parser = parser.with_service_name(service);
    }
    let catalog = parser.parse().context("Failed to convert Smithy spec")?;
    let yaml = catalog
        .to_yaml_string()
        .context("Failed to serialize catalog")?;

    match output {
        Some(path) => {
            fs::write(path, yaml)
                .with_context(|| format!("Failed to write catalog {}", path.display()))?;
            eprintln!(
                "{} Wrote {} records and {} operations to {}",
                "✓".green().bold(),
                catalog.records.len(),
                catalog.operations.len(),
                path.display()
            );
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn normalize_command(
    type_name: &str,
    catalog_path: Option<&Path>,
    input: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let codec = TypedObjectCodec::new(&catalog.records);

    let payload = read_input(input)?;
    tracing::debug!(type_name, bytes = payload.len(), "normalizing payload");
    let Some(record) = codec
        .parse_str(&payload, type_name)
        .with_context(|| format!("Failed to parse payload as '{}'", type_name))?
    else {
        bail!("Payload is not a JSON object");
    };

    let json = if pretty {
        codec.to_string_pretty(&record, type_name)?
    } else {
        codec.to_string(&record, type_name)?
    };
    println!("{}", json);

    Ok(())
}

fn request_command(
    operation: &str,
    catalog_path: Option<&Path>,
    input: Option<&Path>,
    region: Option<&str>,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let binding = catalog
        .operation(operation)
        .with_context(|| format!("Operation '{}' not found in catalog", operation))?;

    let record = match (input, &binding.input) {
        (Some(path), Some(input_type)) => {
            let payload = read_input(Some(path))?;
            let codec = TypedObjectCodec::new(&catalog.records);
            codec
                .parse_str(&payload, input_type)
                .with_context(|| format!("Failed to parse input as '{}'", input_type))?
                .unwrap_or_default()
        }
        (Some(_), None) => bail!("Operation '{}' takes no input", operation),
        (None, _) => Record::new(),
    };

    let mut marshaller = RequestMarshaller::new(&catalog);
    if let Some(region) = region {
        marshaller = marshaller.with_region(region);
    }
    let envelope = marshaller
        .marshall_binding(binding, &record)
        .with_context(|| format!("Failed to build request for '{}'", operation))?;

    print!("{}", render_envelope(&envelope));
    Ok(())
}

/// Bundled Security Hub sample unless a catalog file is given
fn load_catalog(path: Option<&Path>) -> Result<SchemaCatalog> {
    match path {
        Some(path) => SchemaCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => SchemaCatalog::security_hub_sample().context("Failed to load bundled catalog"),
    }
}

/// Read a payload from a file, or stdin for `None` and `-`
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// HTTP/1.1-style rendering of an envelope
fn render_envelope(envelope: &RequestEnvelope) -> String {
    let mut out = format!("{} {} HTTP/1.1\n", envelope.method, envelope.uri());
    out.push_str(&format!("Host: {}\n", envelope.host));
    for (name, value) in &envelope.headers {
        out.push_str(&format!("{}: {}\n", name, value));
    }
    if let Some(body) = &envelope.body {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    out
}
