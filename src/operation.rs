//! Operation building.
//!
//! An operation is one HTTP method on one path, built from a single method's
//! doc comment. The `api-method` tag is its gate: missing or invalid means
//! the whole method is excluded. Everything else degrades gracefully, down
//! to a synthetic `200 ok` response when no `api-response` tag survives
//! parsing.

use crate::diagnostics::{ContextKind, DiagnosticLog};
use crate::grammar::{self, DocBlock};
use crate::model::SchemaPayload;
use crate::reflection::{ClassRegistry, MethodInfo};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// HTTP methods an operation may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Options,
    Head,
    Delete,
}

impl HttpMethod {
    /// Parses a method token case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Options => "options",
            Self::Head => "head",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as a plain lowercase string so it can key the path-item map
impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ParamLocation {
    #[serde(rename = "formData")]
    FormData,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "body")]
    Body,
}

impl ParamLocation {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "formData" => Some(Self::FormData),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "path" => Some(Self::Path),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FormData => "formData",
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Body => "body",
        }
    }
}

/// One operation parameter. A primitive schema flattens into the parameter
/// itself (`type`, `items`); a model or inline schema nests under `schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub required: bool,
    pub name: String,
    pub location: ParamLocation,
    pub description: Option<String>,
    pub schema: Option<SchemaPayload>,
    pub format: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
}

impl Parameter {
    /// A file-typed parameter makes its operation consume
    /// `multipart/form-data`.
    pub fn is_file(&self) -> bool {
        matches!(&self.schema, Some(SchemaPayload::Primitive(p)) if p.is_file())
    }

    /// A required integer path parameter, synthesized for a `{name}`
    /// placeholder in a controller path.
    pub fn path_placeholder(name: &str) -> Self {
        Self {
            required: true,
            name: name.to_string(),
            location: ParamLocation::Path,
            description: None,
            schema: Some(SchemaPayload::Primitive(
                crate::canonical::PrimitiveSchema::scalar("integer"),
            )),
            format: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
        }
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("required", &self.required)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("in", &self.location)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        match &self.schema {
            Some(SchemaPayload::Primitive(primitive)) => {
                map.serialize_entry("type", &primitive.schema_type)?;
                if let Some(items) = &primitive.items {
                    map.serialize_entry("items", items)?;
                }
            }
            Some(schema) => map.serialize_entry("schema", schema)?,
            None => {}
        }
        if let Some(format) = &self.format {
            map.serialize_entry("format", format)?;
        }
        if let Some(min) = &self.min {
            map.serialize_entry("min", min)?;
        }
        if let Some(max) = &self.max {
            map.serialize_entry("max", max)?;
        }
        if let Some(min_length) = &self.min_length {
            map.serialize_entry("minLength", min_length)?;
        }
        if let Some(max_length) = &self.max_length {
            map.serialize_entry("maxLength", max_length)?;
        }
        map.end()
    }
}

/// One response of an operation. The status code keys the response map and
/// is not serialized inside the value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Response {
    #[serde(skip)]
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaPayload>,
}

impl Response {
    /// The synthetic response substituted when a method declares none.
    pub fn default_ok() -> Self {
        Self {
            code: "200".to_string(),
            description: "ok".to_string(),
            schema: None,
        }
    }
}

/// One HTTP operation, keyed by method inside its path item.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Operation {
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    #[serde(skip)]
    pub method: HttpMethod,
    /// Path suffix from the method's own `api-path` tag, appended to the
    /// controller path
    #[serde(skip)]
    pub path: String,
}

impl Operation {
    pub fn add_tags(&mut self, tags: &[String]) {
        match &mut self.tags {
            Some(existing) => existing.extend(tags.iter().cloned()),
            None => self.tags = Some(tags.to_vec()),
        }
    }

    /// Consume types are appended as encountered; duplicates are kept since
    /// only presence matters downstream.
    pub fn add_consume_type(&mut self, mime: &str) {
        self.consumes
            .get_or_insert_with(Vec::new)
            .push(mime.to_string());
    }
}

/// Builds the operation for one reflected method, or `None` when the method
/// carries no valid `api-method` tag.
pub fn build_operation(
    method: &MethodInfo,
    registry: &ClassRegistry,
    log: &mut DiagnosticLog,
) -> Option<Operation> {
    let block = DocBlock::parse(&method.doc);

    let http_method = parse_method_tag(&block, &method.name, log)?;
    let path = block.tag("api-path").unwrap_or("").to_string();

    let mut operation = Operation {
        summary: block.summary.clone(),
        description: block.description.clone(),
        produces: None,
        parameters: None,
        responses: IndexMap::new(),
        tags: None,
        consumes: None,
        method: http_method,
        path,
    };

    if let Some(tags) = block.tag("api-tags") {
        operation.add_tags(&grammar::parse_tags_list(tags));
    }

    log.notice(format!("== Method \"{}\"", method.name));
    log.set_current(ContextKind::Method, &method.name);

    let mut parameters = Vec::new();
    for (number, content) in block.tags("api-param").into_iter().enumerate() {
        log.set_current(ContextKind::Parameter, number.to_string());
        let Some(parameter) = grammar::parse_param(content, registry, log) else {
            continue;
        };
        if parameter.is_file() {
            operation.add_consume_type("multipart/form-data");
        }
        parameters.push(parameter);
    }
    if !parameters.is_empty() {
        operation.parameters = Some(parameters);
    }

    for content in block.tags("api-response") {
        if let Some(response) = grammar::parse_response(content, registry, log) {
            // Later tags for the same status overwrite earlier ones
            operation.responses.insert(response.code.clone(), response);
        }
    }
    if operation.responses.is_empty() {
        log.warning("No responses set for a method! Setting a default response \"ok\"");
        operation
            .responses
            .insert("200".to_string(), Response::default_ok());
    }

    Some(operation)
}

fn parse_method_tag(
    block: &DocBlock,
    method_name: &str,
    log: &mut DiagnosticLog,
) -> Option<HttpMethod> {
    let Some(content) = block.tag("api-method") else {
        log.debug(format!("No method tag for method {}, skipping", method_name));
        return None;
    };
    match HttpMethod::parse(content) {
        Some(method) => Some(method),
        None => {
            log.warning(format!("Unsupported REST method: {}", content));
            None
        }
    }
}
