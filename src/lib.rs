//! Swagger From Annotations - Swagger 2.0 documents from annotated Rust source.
//!
//! This library compiles a Swagger 2.0 (OpenAPI 2.x) document from `@api-*`
//! annotations written in ordinary doc comments. A struct with an `@api-path`
//! tag is a controller; the methods in its inherent impl blocks declare
//! operations with `@api-method`, `@api-path`, `@api-tags`, `@api-param` and
//! `@api-response` tags; plain structs with `@api-scenario` tags serve as
//! models whose fields are typed through `@var` tags.
//!
//! # Architecture
//!
//! The library is organized into modules that work together:
//!
//! 1. [`scanner`] - Recursively scans project directories for Rust files
//! 2. [`parser`] - Parses Rust source files into Abstract Syntax Trees (AST)
//! 3. [`reflection`] - Indexes classes, methods, properties and import tables
//! 4. [`grammar`] - Parses doc comments and the tag micro-DSL
//! 5. [`canonical`] - Maps type tokens to canonical primitive schemas
//! 6. [`model`] - Resolves model references into object schemas
//! 7. [`operation`] - Builds one operation per annotated method
//! 8. [`document`] - Assembles operations into the root document
//! 9. [`serializer`] - Serializes the document to JSON or YAML
//! 10. [`diagnostics`] - Collects the per-run diagnostic transcript
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_annotations::{
//!     diagnostics::DiagnosticLog,
//!     document::{self, Info},
//!     parser::AstParser,
//!     reflection::ClassRegistry,
//!     scanner::FileScanner,
//!     serializer::serialize_json,
//! };
//! use std::path::PathBuf;
//!
//! // Scan project directory
//! let root = PathBuf::from("./my-project");
//! let scanner = FileScanner::new(root.clone());
//! let scan_result = scanner.scan().unwrap();
//!
//! // Parse files
//! let parse_results = AstParser::parse_files(&scan_result.rust_files);
//! let parsed_files: Vec<_> = parse_results.into_iter().filter_map(Result::ok).collect();
//!
//! // Reflect and assemble
//! let registry = ClassRegistry::from_parsed_files(&parsed_files, &root);
//! let mut log = DiagnosticLog::new();
//! let info = Info {
//!     title: "My API".to_string(),
//!     version: "1.0.0".to_string(),
//!     description: None,
//! };
//! let doc = document::assemble(&registry, info, "/api/v1", &mut log);
//!
//! // Serialize to JSON
//! let json = serialize_json(&doc).unwrap();
//! println!("{}", json);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod canonical;
pub mod cli;
pub mod diagnostics;
pub mod document;
pub mod grammar;
pub mod model;
pub mod operation;
pub mod parser;
pub mod reflection;
pub mod scanner;
pub mod serializer;
