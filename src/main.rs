//! Swagger From Annotations - Command-line Swagger 2.0 document compiler.
//!
//! This binary compiles a Swagger 2.0 document from `@api-*` annotations in
//! the doc comments of a Rust project. Controllers declare a base path with
//! `@api-path`; their methods declare operations, parameters and responses;
//! model structs declare scenario-filtered schemas.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-annotations [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate JSON documentation:
//! ```bash
//! swagger-from-annotations ./my-api-project -o docs/swagger.json
//! ```
//!
//! Generate YAML documentation with a title:
//! ```bash
//! swagger-from-annotations ./my-api-project -f yaml --title "Pet Store" -o swagger.yaml
//! ```
//!
//! Only parse controller files and show the full diagnostic transcript:
//! ```bash
//! swagger-from-annotations ./my-api-project --filter-by-name controller --log-level debug
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_annotations::cli;

fn main() -> Result<()> {
    // We need to parse args twice: once to get verbose flag, then again after logger init
    // First, do a quick parse just to check for verbose flag
    let args_for_verbose = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger From Annotations starting...");

    // Now do the full parse with validation
    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    // Run the main workflow
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
