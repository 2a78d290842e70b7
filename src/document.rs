//! Document assembly.
//!
//! Walks every reflected class, turns annotated controllers into path items
//! and attaches their operations. A class without an `api-path` tag is not a
//! controller and contributes nothing; a controller whose methods all fail
//! operation building is dropped entirely rather than left as an empty path
//! item.

use crate::diagnostics::{ContextKind, DiagnosticLog};
use crate::grammar::{self, DocBlock};
use crate::operation::{build_operation, HttpMethod, Operation, Parameter};
use crate::reflection::{ClassInfo, ClassRegistry};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The `info` object of the root document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The root Swagger 2.0 document.
#[derive(Debug, serde::Serialize)]
pub struct Document {
    pub swagger: String,
    pub info: Info,
    #[serde(rename = "basePath")]
    pub base_path: String,
    pub paths: IndexMap<String, Resource>,
}

/// One path item: the operations reachable under a full path, keyed by HTTP
/// method, plus the path-level parameters and tags inherited from the
/// controller that created it.
#[derive(Debug, Clone)]
pub struct Resource {
    pub parameters: Option<Vec<Parameter>>,
    pub operations: IndexMap<HttpMethod, Operation>,
    /// Controller tags, merged into every attached operation rather than
    /// serialized on the path item itself
    pub tags: Option<Vec<String>>,
}

impl Resource {
    fn new(tags: Option<Vec<String>>, parameters: Option<Vec<Parameter>>) -> Self {
        Self {
            parameters,
            operations: IndexMap::new(),
            tags,
        }
    }

    /// Attaches an operation under its method key, merging in the
    /// controller's tags. A later operation for the same method overwrites
    /// the earlier one silently.
    pub fn add_operation(&mut self, mut operation: Operation) {
        if let Some(tags) = &self.tags {
            operation.add_tags(tags);
        }
        self.operations.insert(operation.method, operation);
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(parameters) = &self.parameters {
            map.serialize_entry("parameters", parameters)?;
        }
        for (method, operation) in &self.operations {
            map.serialize_entry(method.as_str(), operation)?;
        }
        map.end()
    }
}

/// Assembles the document for every class in the registry.
pub fn assemble(
    registry: &ClassRegistry,
    info: Info,
    base_path: &str,
    log: &mut DiagnosticLog,
) -> Document {
    let mut document = Document {
        swagger: "2.0".to_string(),
        info,
        base_path: base_path.to_string(),
        paths: IndexMap::new(),
    };

    for class in registry.classes() {
        assemble_class(class, registry, &mut document.paths, log);
    }

    document
}

static PATH_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(.+?)\}").expect("valid regex"));

fn assemble_class(
    class: &ClassInfo,
    registry: &ClassRegistry,
    paths: &mut IndexMap<String, Resource>,
    log: &mut DiagnosticLog,
) {
    log.set_current(ContextKind::Controller, &class.name);

    let block = DocBlock::parse(&class.doc);
    let Some(controller_path) = block.tag("api-path") else {
        log.debug(format!(
            "Controller {} does not have the api-path tag, skipping",
            class.full_path
        ));
        return;
    };
    log.notice(format!("= Controller \"{}\"", class.full_path));

    // Every {name} placeholder in the controller path becomes a required
    // integer path parameter on the path item
    let path_params: Vec<Parameter> = PATH_PARAMS
        .captures_iter(controller_path)
        .map(|captures| Parameter::path_placeholder(&captures[1]))
        .collect();
    let parameters = if path_params.is_empty() {
        None
    } else {
        Some(path_params)
    };
    let tags = block.tag("api-tags").map(grammar::parse_tags_list);

    let mut valid_methods = 0;
    for method in &class.methods {
        let Some(operation) = build_operation(method, registry, log) else {
            continue;
        };
        let full_path = format!("{}{}", controller_path, operation.path);
        let resource = paths
            .entry(full_path)
            .or_insert_with(|| Resource::new(tags.clone(), parameters.clone()));
        resource.add_operation(operation);
        valid_methods += 1;
    }

    if valid_methods == 0 {
        log.warning("No valid methods in controller, skipping");
    }
}
