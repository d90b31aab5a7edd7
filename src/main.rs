//! shapedoc - Command-line tool for documenting REST resource shapes as OpenAPI.
//!
//! Reads shape and resource declarations (YAML or JSON), resolves the registered shapes and
//! writes an OpenAPI 3.0 document with schemas, generated examples and error responses.
//!
//! # Usage
//!
//! ```bash
//! shapedoc [OPTIONS] <DECLARATION_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! shapedoc ./declarations -o openapi.yaml
//! ```
//!
//! Generate JSON with reproducible examples:
//! ```bash
//! shapedoc ./declarations -f json --seed docs -o openapi.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use shapedoc::cli;

fn main() -> Result<()> {
    let parsed = cli::CliArgs::parse();

    let log_level = if parsed.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("shapedoc starting...");

    let args = cli::parse_args_from_parsed(parsed)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
