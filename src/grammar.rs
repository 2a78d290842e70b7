//! Annotation grammar.
//!
//! Doc comments carry the whole input language: free text (summary and long
//! description) followed by `@`-prefixed tag lines. [`DocBlock`] splits a raw
//! doc comment into those parts; the `parse_*` functions below handle the
//! micro-DSL inside the individual tags (`api-tags`, `api-param`,
//! `api-response`, `var`).

use crate::canonical::canonical_type;
use crate::diagnostics::DiagnosticLog;
use crate::model::{resolve_model, SchemaPayload};
use crate::operation::{ParamLocation, Parameter, Response};
use crate::reflection::ClassRegistry;
use once_cell::sync::Lazy;
use regex::Regex;

/// A doc comment split into free text and tags. Free text before the first
/// tag line becomes the summary (first paragraph) and the long description
/// (the rest); every `@name content` line becomes a tag, with later plain
/// lines folded into the preceding tag's content.
#[derive(Debug, Clone, Default)]
pub struct DocBlock {
    pub summary: String,
    pub description: String,
    tags: Vec<(String, String)>,
}

impl DocBlock {
    pub fn parse(doc: &str) -> Self {
        let mut paragraphs: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut tags: Vec<(String, String)> = Vec::new();
        let mut seen_tag = false;

        for line in doc.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix('@') {
                seen_tag = true;
                match rest.split_once(char::is_whitespace) {
                    Some((name, content)) => {
                        tags.push((name.to_string(), content.trim().to_string()))
                    }
                    None => tags.push((rest.to_string(), String::new())),
                }
            } else if line.is_empty() {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            } else if seen_tag {
                if let Some((_, content)) = tags.last_mut() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(line);
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }

        let mut texts = paragraphs.into_iter().map(|p| p.join(" "));
        let summary = texts.next().unwrap_or_default();
        let description = texts.collect::<Vec<_>>().join("\n\n");

        Self {
            summary,
            description,
            tags,
        }
    }

    /// The content of the first tag with the given name.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.as_str())
    }

    /// The contents of every tag with the given name, in source order.
    pub fn tags(&self, name: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, content)| content.as_str())
            .collect()
    }
}

/// Parses an `api-tags` content string: comma-separated with all whitespace
/// stripped. Empty input yields an empty list.
pub fn parse_tags_list(content: &str) -> Vec<String> {
    let stripped: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    stripped
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the `(type, description)` pair from a property doc comment's
/// `@var <type> <description>` tag. Returns `None` when the tag is missing
/// or has fewer than two tokens after it.
pub fn parse_var_tag(doc: &str) -> Option<(String, String)> {
    let block = DocBlock::parse(doc);
    let content = block.tag("var")?;
    let (type_token, description) = content.split_once(' ')?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    Some((type_token.to_string(), description.to_string()))
}

/// The recognized `key:value` attributes of an `api-param` tag, collected
/// before the parameter is validated. Unknown keys are rejected with a
/// warning rather than silently assigned.
#[derive(Debug, Default)]
struct ParamConfig {
    required: bool,
    location: Option<ParamLocation>,
    name: Option<String>,
    description: Option<String>,
    schema: Option<SchemaPayload>,
    format: Option<String>,
    min: Option<String>,
    max: Option<String>,
    min_length: Option<String>,
    max_length: Option<String>,
}

impl ParamConfig {
    fn apply_attribute(&mut self, key: &str, value: &str, log: &mut DiagnosticLog) {
        match key {
            "in" => match ParamLocation::parse(value) {
                Some(location) => self.location = Some(location),
                None => log.warning(format!("Unknown parameter location: {}", value)),
            },
            "name" => self.name = Some(value.to_string()),
            "format" => self.format = Some(value.to_string()),
            "min" => self.min = Some(value.to_string()),
            "max" => self.max = Some(value.to_string()),
            "minLength" => self.min_length = Some(value.to_string()),
            "maxLength" => self.max_length = Some(value.to_string()),
            _ => log.warning(format!("Unknown parameter attribute: {}", key)),
        }
    }
}

/// Parses an `api-param` tag content string into a [`Parameter`], or `None`
/// when the parameter is invalid and must be dropped.
///
/// Grammar: the first one or two space-separated tokens are a type token and
/// an optional required marker `*` in either order; then `key:value`
/// attribute pairs up to the first token without a colon, from which the
/// rest of the line is the description.
pub fn parse_param(
    content: &str,
    registry: &ClassRegistry,
    log: &mut DiagnosticLog,
) -> Option<Parameter> {
    log.notice("=== Parameter");
    let config = parse_param_config(content, registry, log);

    let Some(location) = config.location else {
        log.error("Attribute \"in\" not specified");
        return None;
    };
    let Some(name) = config.name else {
        log.error("Attribute \"name\" not specified");
        return None;
    };
    if config.schema.is_none() {
        log.error("Neither \"type\" nor \"schema\" specified");
        return None;
    }

    Some(Parameter {
        required: config.required,
        name,
        location,
        description: config.description,
        schema: config.schema,
        format: config.format,
        min: config.min,
        max: config.max,
        min_length: config.min_length,
        max_length: config.max_length,
    })
}

fn parse_param_config(
    content: &str,
    registry: &ClassRegistry,
    log: &mut DiagnosticLog,
) -> ParamConfig {
    let mut config = ParamConfig::default();
    let options: Vec<&str> = content.split(' ').collect();

    if options.len() < 2 {
        log.warning("Parameter must have at least type and description");
        return config;
    }

    let (type_token, rest) = if options[0] == "*" || options[1] == "*" {
        config.required = true;
        let token = if options[0] == "*" { options[1] } else { options[0] };
        (token, &options[2..])
    } else {
        (options[0], &options[1..])
    };

    if let Some(primitive) = canonical_type(type_token) {
        config.schema = Some(SchemaPayload::Primitive(primitive));
    } else if let Some(schema) = resolve_model(type_token, None, registry, log) {
        config.schema = Some(schema);
    } else {
        // An unresolvable type voids everything collected so far, including
        // the required marker
        log.warning(format!("Unknown parameter type: {}", type_token));
        return ParamConfig::default();
    }

    let mut desc_start = None;
    for (index, option) in rest.iter().enumerate() {
        let pieces: Vec<&str> = option.split(':').collect();
        if pieces.len() != 2 {
            desc_start = Some(index);
            break;
        }
        config.apply_attribute(pieces[0], pieces[1], log);
    }
    match desc_start {
        Some(index) => config.description = Some(rest[index..].join(" ")),
        None => log.warning("Parameter does not have a description"),
    }

    config
}

static INLINE_SCHEMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{.*\}").expect("valid regex"));

/// Parses an `api-response` tag content string into a [`Response`], or
/// `None` when the response is invalid and must be dropped.
///
/// Grammar: `<status> <rest>`, where `<rest>` is either an inline JSON
/// object followed by the description, or an optional type token followed by
/// the description. A type token that resolves to neither a primitive nor a
/// model folds back into the description.
pub fn parse_response(
    content: &str,
    registry: &ClassRegistry,
    log: &mut DiagnosticLog,
) -> Option<Response> {
    let Some((code, remainder)) = content.split_once(' ') else {
        log.warning("Response must have at least status and description, skipping");
        return None;
    };

    let mut response = Response {
        code: code.to_string(),
        description: String::new(),
        schema: None,
    };

    if let Some(found) = INLINE_SCHEMA.find(remainder) {
        // Greedy to the last closing brace; a non-object like "{a} and {b}"
        // fails the decode and drops the whole response
        match serde_json::from_str::<serde_json::Value>(found.as_str()) {
            Ok(value) => {
                response.schema = Some(SchemaPayload::Inline(value));
                response.description = remainder
                    .get(found.end() + 1..)
                    .unwrap_or("")
                    .to_string();
            }
            Err(_) => {
                log.warning("Failed to parse response schema, skipping");
                return None;
            }
        }
    } else {
        match remainder.split_once(' ') {
            None => response.description = remainder.to_string(),
            Some((type_token, description)) => {
                if let Some(primitive) = canonical_type(type_token) {
                    response.schema = Some(SchemaPayload::Primitive(primitive));
                    response.description = description.to_string();
                } else if let Some(schema) = resolve_model(type_token, None, registry, log) {
                    response.schema = Some(schema);
                    response.description = description.to_string();
                } else {
                    response.description = format!("{} {}", type_token, description);
                }
            }
        }
    }

    log.notice("=== Response");
    Some(response)
}
