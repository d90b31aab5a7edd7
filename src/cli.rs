use crate::declaration::Declaration;
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::resolver::ShapeResolver;
use crate::scanner::DeclarationScanner;
use crate::schema_mapper::SchemaMapper;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

/// shapedoc - Resolve REST resource shapes and generate OpenAPI schemas with examples
#[derive(Parser, Debug)]
#[command(name = "shapedoc")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Declaration file or directory of declaration files
    #[arg(value_name = "DECLARATION_PATH")]
    pub declaration_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Seed for reproducible examples (overrides the declared one)
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<String>,

    /// Skip example generation entirely
    #[arg(long = "no-examples")]
    pub no_examples: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.declaration_path.exists() {
        anyhow::bail!(
            "Declaration path does not exist: {}",
            args.declaration_path.display()
        );
    }

    info!("Declaration path: {}", args.declaration_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    if let Some(seed) = &args.seed {
        info!("Example seed: {}", seed);
    }

    Ok(args)
}

/// Loads, merges and documents every declaration below the given path.
pub fn generate(args: &CliArgs) -> Result<OpenApiDocument> {
    // Step 1: Find declaration files
    info!("Scanning for declaration files...");
    let scan_result = DeclarationScanner::new(args.declaration_path.clone()).scan()?;
    info!("Found {} declaration files", scan_result.declaration_files.len());
    for warning in &scan_result.warnings {
        log::warn!("{}", warning);
    }
    if scan_result.declaration_files.is_empty() {
        anyhow::bail!("No declaration files found at {}", args.declaration_path.display());
    }

    // Step 2: Load and merge them
    let mut declaration = Declaration::default();
    for (index, path) in scan_result.declaration_files.iter().enumerate() {
        let loaded = Declaration::load(path)
            .with_context(|| format!("Failed to load declaration file: {}", path.display()))?;
        if index == 0 {
            declaration = loaded;
        } else {
            declaration
                .merge(loaded)
                .with_context(|| format!("Failed to merge declaration file: {}", path.display()))?;
        }
    }
    if let Some(seed) = &args.seed {
        declaration.settings.example_seed = Some(seed.clone());
    }

    // Step 3: Build shapes and freeze the registry
    info!("Building shape registry...");
    let registry = declaration.build_registry().context("Invalid declaration")?;
    let resolver = ShapeResolver::new(Arc::new(registry)).with_wrap_result(declaration.settings.wrap_result);

    // Step 4: Map every registration
    info!("Building OpenAPI document...");
    let mapper = SchemaMapper::new(&declaration.settings)?;
    let info = &declaration.info;
    let document = OpenApiBuilder::new()
        .with_info(info.title.clone(), info.version.clone(), info.description.clone())
        .with_examples(!args.no_examples)
        .build(&resolver, &mapper)?;
    info!("OpenAPI document built successfully");

    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let document = generate(&args)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Schemas: {}", document.components.schemas.len());
    info!("  - Registrations documented: {}", document.registrations.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from([
            "shapedoc",
            "shapes/",
            "-f",
            "json",
            "-o",
            "out.json",
            "--seed",
            "docs",
            "--no-examples",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.declaration_path, PathBuf::from("shapes/"));
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.output_path, Some(PathBuf::from("out.json")));
        assert_eq!(args.seed.as_deref(), Some("docs"));
        assert!(args.no_examples);
        assert!(args.verbose);
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["shapedoc", "api.yaml"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Yaml));
        assert!(args.output_path.is_none());
        assert!(!args.no_examples);
    }

    #[test]
    fn test_missing_path_rejected() {
        let args = CliArgs::try_parse_from(["shapedoc", "/definitely/not/here.yaml"]).unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }
}
