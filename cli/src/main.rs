use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tabular_schema_convert::output::format_definitions;
use tabular_schema_convert::{ConversionOutcome, Converter, OutputFormat};
use tabular_schema_core::validate_table;
use tabular_schema_store::{ConvertConfig, DefinitionWriter, Manifest, loader};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "schema-convert")]
#[command(about = "Convert data-standard tables into JSON-Schema definitions")]
struct Cli {
    /// Log conversion progress (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert every table of a directory and write one file per definition.
    Convert(ConvertArgs),
    /// Convert a single table and print its definitions to stdout.
    Table(TableArgs),
    /// Validate the structure of one or more tables.
    Validate(ValidateArgs),
    /// Compare two definition manifests.
    Diff(DiffArgs),
    /// Check written definitions against their manifest checksums.
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Directory holding the `;`-delimited table files.
    #[arg(long)]
    input: PathBuf,
    /// Output root; definitions land in `<output>/<definitions_dir>`.
    #[arg(long)]
    output: PathBuf,
    /// Run configuration (YAML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Shared ISO date-time description, given directly.
    #[arg(long, conflicts_with = "iso_description_file")]
    iso_description: Option<String>,
    /// Definition document holding the ISO date-time description.
    #[arg(long)]
    iso_description_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "yaml")]
    format: OutputFormat,
    /// Write a checksum manifest of the written definitions.
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct TableArgs {
    /// Table file to convert.
    #[arg(long)]
    input: PathBuf,
    /// Permissions table marking gated fields.
    #[arg(long)]
    permissions: Option<PathBuf>,
    /// Run configuration (YAML), for its conversion rules.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Shared ISO date-time description.
    #[arg(long, default_value = "")]
    iso_description: String,
    #[arg(long, value_enum, default_value = "yaml")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Table files to validate.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct DiffArgs {
    /// Manifest of the earlier run.
    old: PathBuf,
    /// Manifest of the later run.
    new: PathBuf,
    /// Print the difference as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct VerifyArgs {
    /// Manifest written by `convert --manifest`.
    #[arg(long)]
    manifest: PathBuf,
    /// Directory holding the definition files.
    #[arg(long)]
    dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Table(args) => run_table(args),
        Command::Validate(args) => run_validate(args),
        Command::Diff(args) => run_diff(args),
        Command::Verify(args) => run_verify(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ConvertConfig, String> {
    match path {
        Some(path) => {
            let config = ConvertConfig::load(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
            debug!(config = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(ConvertConfig::default()),
    }
}

fn resolve_iso_description(args: &ConvertArgs, config: &ConvertConfig) -> Result<String, String> {
    if let Some(text) = &args.iso_description {
        return Ok(text.clone());
    }
    match &args.iso_description_file {
        Some(path) => loader::load_iso_description(path)
            .map_err(|err| format!("Failed to read ISO description '{}': {err}", path.display())),
        None => {
            let path = args.output.join(&config.iso_description_file);
            loader::load_iso_description_or_default(&path)
                .map_err(|err| format!("Failed to read ISO description '{}': {err}", path.display()))
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let iso_description = resolve_iso_description(&args, &config)?;

    let (tables, permissions) = loader::load_directory(&args.input, &config)
        .map_err(|err| format!("Failed to read tables from '{}': {err}", args.input.display()))?;

    let outcome = Converter::new(config.rules.clone())
        .with_iso_description(iso_description)
        .convert_tables(&tables, &permissions)
        .map_err(|err| err.to_string())?;

    let writer = DefinitionWriter::new(args.output.join(&config.definitions_dir), args.format);
    let removed = writer
        .remove_keys(outcome.collisions.iter().map(|c| c.key.as_str()))
        .map_err(|err| format!("Failed to remove stale definitions: {err}"))?;
    let written = writer
        .write_all(&outcome.definitions)
        .map_err(|err| format!("Failed to write '{}': {err}", writer.dir().display()))?;
    let report_path = writer
        .write_report(&outcome.report(PACKAGE_VERSION))
        .map_err(|err| format!("Failed to write conversion report: {err}"))?;

    if let Some(manifest_path) = &args.manifest {
        Manifest::from_written(PACKAGE_VERSION, args.format.extension(), &written)
            .save(manifest_path)
            .map_err(|err| format!("Failed to write '{}': {err}", manifest_path.display()))?;
    }

    println!(
        "Converted {} table(s) into {} definition(s) in {}",
        outcome.tables.len(),
        written.len(),
        writer.dir().display()
    );
    println!("Report: {}", report_path.display());
    print_collisions(&outcome, removed.len());
    Ok(())
}

fn print_collisions(outcome: &ConversionOutcome, removed: usize) {
    if outcome.collisions.is_empty() {
        return;
    }
    eprintln!(
        "warning: {} key(s) had conflicting descriptions and were not written ({removed} stale file(s) removed):",
        outcome.collisions.len()
    );
    for collision in &outcome.collisions {
        eprintln!("  {collision}");
    }
}

fn run_table(args: TableArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let table = loader::load_table(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    let permissions = match &args.permissions {
        Some(path) => loader::read_permissions(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => Vec::new(),
    };

    let outcome = Converter::new(config.rules)
        .with_iso_description(args.iso_description)
        .convert_tables(std::slice::from_ref(&table), &permissions)
        .map_err(|err| err.to_string())?;

    let rendered = format_definitions(&outcome.definitions, args.format)?;
    print!("{rendered}");
    print_collisions(&outcome, 0);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failures = 0usize;
    for path in &args.inputs {
        let records = loader::read_table(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let errors = validate_table(&records);
        if errors.is_empty() {
            println!("ok: {} ({} records)", path.display(), records.len());
        } else {
            failures += 1;
            for error in &errors {
                eprintln!("{}: {error}", path.display());
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} table(s) failed validation", args.inputs.len()));
    }
    println!("Validated {} table(s)", args.inputs.len());
    Ok(())
}

fn run_diff(args: DiffArgs) -> Result<(), String> {
    let old = Manifest::load(&args.old)
        .map_err(|err| format!("Failed to read '{}': {err}", args.old.display()))?;
    let new = Manifest::load(&args.new)
        .map_err(|err| format!("Failed to read '{}': {err}", args.new.display()))?;
    let diff = old.diff(&new);

    if args.json {
        let json = serde_json::to_string_pretty(&diff)
            .map_err(|err| format!("JSON serialization failed: {err}"))?;
        println!("{json}");
        return Ok(());
    }

    for key in &diff.added {
        println!("+ {key}");
    }
    for key in &diff.removed {
        println!("- {key}");
    }
    for key in &diff.changed {
        println!("~ {key}");
    }
    println!(
        "{} added, {} removed, {} changed",
        diff.added.len(),
        diff.removed.len(),
        diff.changed.len()
    );
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<(), String> {
    let manifest = Manifest::load(&args.manifest)
        .map_err(|err| format!("Failed to read '{}': {err}", args.manifest.display()))?;
    let mismatched = manifest
        .verify(&args.dir)
        .map_err(|err| format!("Failed to verify '{}': {err}", args.dir.display()))?;

    for key in &mismatched {
        eprintln!("modified or missing: {key}");
    }
    if !mismatched.is_empty() {
        return Err(format!(
            "{} of {} definition(s) do not match the manifest",
            mismatched.len(),
            manifest.definitions.len()
        ));
    }
    println!("Verified {} definition(s)", manifest.definitions.len());
    Ok(())
}
