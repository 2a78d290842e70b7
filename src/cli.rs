use crate::diagnostics::{DiagnosticLog, Severity};
use crate::document::{self, Info};
use crate::parser::{AstParser, ParsedFile};
use crate::reflection::ClassRegistry;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Swagger From Annotations - Compile a Swagger 2.0 document from @api-* doc comments
#[derive(Parser, Debug)]
#[command(name = "swagger-from-annotations")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// API title for the document's info object
    #[arg(long = "title", default_value = "Generated API")]
    pub title: String,

    /// API version for the document's info object
    #[arg(long = "api-version", default_value = "1.0.0")]
    pub api_version: String,

    /// API description for the document's info object
    #[arg(long = "description")]
    pub description: Option<String>,

    /// Base path prepended conceptually to every resource path
    #[arg(long = "base-path", default_value = "")]
    pub base_path: String,

    /// Only parse files whose name contains the given string (usually "controller")
    #[arg(long = "filter-by-name", value_name = "SUBSTRING")]
    pub filter_by_name: Option<String>,

    /// Most verbose severity to include in the diagnostic transcript
    #[arg(long = "log-level", value_enum, default_value = "notice")]
    pub log_level: LogLevel,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Transcript severity threshold options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warning,
    /// Errors, warnings and notices
    Notice,
    /// Everything
    Debug,
}

impl LogLevel {
    pub fn severity(self) -> Severity {
        match self {
            LogLevel::Error => Severity::Error,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Notice => Severity::Notice,
            LogLevel::Debug => Severity::Debug,
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger document generation...");
    info!("Project path: {}", args.project_path.display());

    // Step 1: Scan directory for Rust files
    info!("Scanning project directory...");
    let scanner =
        FileScanner::new(args.project_path.clone()).with_filter(args.filter_by_name.clone());
    let scan_result = scanner.scan()?;

    info!("Found {} Rust files", scan_result.rust_files.len());
    for warning in &scan_result.warnings {
        log::warn!("{}", warning);
    }

    if scan_result.rust_files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    // Step 2: Parse files into AST
    info!("Parsing Rust files...");
    let parse_results = AstParser::parse_files(&scan_result.rust_files);

    let parsed_files: Vec<ParsedFile> = parse_results
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to parse error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());

    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    // Step 3: Reflect classes, methods and properties
    info!("Reflecting annotated classes...");
    let registry = ClassRegistry::from_parsed_files(&parsed_files, &args.project_path);
    info!("Found {} classes", registry.len());

    // Step 4: Assemble the document
    info!("Assembling Swagger document...");
    let mut diagnostics = DiagnosticLog::new();
    let document = document::assemble(
        &registry,
        Info {
            title: args.title.clone(),
            version: args.api_version.clone(),
            description: args.description.clone(),
        },
        &args.base_path,
        &mut diagnostics,
    );
    info!(
        "Swagger document assembled with {} paths",
        document.paths.len()
    );

    // Step 5: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Json => serialize_json(&document)?,
        OutputFormat::Yaml => serialize_yaml(&document)?,
    };

    // Step 6: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!(
            "Successfully wrote Swagger document to {}",
            output_path.display()
        );
    } else {
        println!("{}", content);
    }

    // Step 7: Emit the diagnostic transcript
    let transcript = diagnostics.render(args.log_level.severity());
    if !transcript.is_empty() {
        eprintln!("{}", transcript.trim_start_matches('\n'));
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.rust_files.len());
    info!("  - Files parsed: {}", parsed_files.len());
    info!("  - Classes found: {}", registry.len());
    info!("  - Paths documented: {}", document.paths.len());

    Ok(())
}
