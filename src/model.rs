//! Model schema resolution.
//!
//! A model is the resolved object schema for a (class, scenario) pair: the
//! class's properties filtered down to the requested scenario, each property
//! typed from its `@var` doc tag, with nested and array-of model references
//! resolved recursively. A property whose declared type is the class being
//! resolved takes a snapshot of the model as built so far instead of
//! re-entering resolution, which terminates self-referential schemas at the
//! cost of an incomplete nested copy when the self-reference is declared
//! before its siblings.

use crate::canonical::{canonical_type, PrimitiveSchema};
use crate::diagnostics::DiagnosticLog;
use crate::grammar;
use crate::reflection::{ClassRegistry, PropertyInfo};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The schema attached to a parameter, response or model property: exactly
/// one of a primitive descriptor, a (possibly array-wrapped) model, or a raw
/// inline literal decoded from an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaPayload {
    Primitive(PrimitiveSchema),
    Model { model: Model, is_array: bool },
    Inline(serde_json::Value),
}

impl Serialize for SchemaPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaPayload::Primitive(schema) => schema.serialize(serializer),
            SchemaPayload::Model {
                model,
                is_array: false,
            } => model.serialize(serializer),
            SchemaPayload::Model {
                model,
                is_array: true,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", model)?;
                map.end()
            }
            SchemaPayload::Inline(value) => value.serialize(serializer),
        }
    }
}

/// Resolved object schema for a (class, scenario) pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Model {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Always `object`
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: IndexMap<String, PropertySchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Identity for recursion purposes, together with `scenario`
    #[serde(skip)]
    pub class_path: String,
    #[serde(skip)]
    pub scenario: String,
}

/// A model property: its schema plus the description from the `@var` tag.
/// Serialized as the schema object with a `description` key merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub schema: SchemaPayload,
    pub description: String,
}

impl Serialize for PropertySchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.schema).map_err(serde::ser::Error::custom)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "description".to_string(),
                serde_json::Value::String(self.description.clone()),
            );
        }
        value.serialize(serializer)
    }
}

/// A parsed model reference token: `Path`, `Path[]`, `Path|scenario` or
/// `Path[]|scenario`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub class_path: String,
    pub scenario: String,
    pub is_array: bool,
}

impl ModelReference {
    pub fn parse(token: &str) -> Self {
        let mut parts = token.split('|').filter(|s| !s.is_empty());
        let class_part = parts.next().unwrap_or("");
        let scenario = parts.next().unwrap_or("default").to_string();

        let (class_path, is_array) = match class_part.strip_suffix("[]") {
            Some(base) => (base.to_string(), true),
            None => (class_part.to_string(), false),
        };

        Self {
            class_path,
            scenario,
            is_array,
        }
    }
}

/// Resolves a model reference token into a schema payload, or `None` when
/// the referenced class does not exist. Used for `param` and `response`
/// tags, where the token must be a fully-qualified path.
pub fn resolve_model(
    token: &str,
    title: Option<String>,
    registry: &ClassRegistry,
    log: &mut DiagnosticLog,
) -> Option<SchemaPayload> {
    let reference = ModelReference::parse(token);
    if !registry.contains(&reference.class_path) {
        return None;
    }

    let mut model = Model::build(&reference.class_path, &reference.scenario, registry, log);
    model.title = title;
    Some(SchemaPayload::Model {
        model,
        is_array: reference.is_array,
    })
}

impl Model {
    /// Builds the model for `class_path` under `scenario`.
    ///
    /// The caller must have checked that the class exists; an unknown
    /// scenario yields a model with zero properties. Property iteration
    /// follows the scenario's declaration order, not the order the fields
    /// were declared in.
    pub fn build(
        class_path: &str,
        scenario: &str,
        registry: &ClassRegistry,
        log: &mut DiagnosticLog,
    ) -> Model {
        let mut model = Model {
            title: None,
            schema_type: "object".to_string(),
            properties: IndexMap::new(),
            required: None,
            class_path: class_path.to_string(),
            scenario: scenario.to_string(),
        };

        let Some(class) = registry.get(class_path) else {
            return model;
        };
        log.notice(format!("==== Model {}", class.full_path));

        let Some(tokens) = class.scenarios.get(scenario) else {
            return model;
        };

        for token in tokens {
            let name = token.trim_start_matches('*');
            let required = name.len() != token.len();

            let Some(property) = class.properties.iter().find(|p| p.name == name) else {
                continue;
            };

            // Required membership is decided by the scenario marker alone; a
            // property that later fails type resolution stays in the set.
            if required {
                model
                    .required
                    .get_or_insert_with(Vec::new)
                    .push(property.name.clone());
            }

            let Some((type_token, description)) = grammar::parse_var_tag(&property.doc) else {
                log.error(format!(
                    "Malformed doc comment for property ({}), skipping",
                    property.name
                ));
                continue;
            };

            let payload = if let Some(primitive) = canonical_type(&type_token) {
                Some(SchemaPayload::Primitive(primitive))
            } else {
                model.resolve_child(&type_token, property, registry, log)
            };

            match payload {
                Some(schema) => {
                    model
                        .properties
                        .insert(property.name.clone(), PropertySchema { schema, description });
                }
                None => log.error(format!(
                    "Unknown type {} for property {}, skipping",
                    type_token, property.name
                )),
            }
        }

        model
    }

    /// Resolves a property whose `@var` type is a model reference, visible
    /// from the property's declaring class. A reference back to the class
    /// currently being built clones the partial model instead of recursing.
    fn resolve_child(
        &self,
        type_token: &str,
        property: &PropertyInfo,
        registry: &ClassRegistry,
        log: &mut DiagnosticLog,
    ) -> Option<SchemaPayload> {
        let (base, is_array) = match type_token.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (type_token, false),
        };

        let declaring = registry.get(&property.declaring_class)?;
        let class_path = match registry.resolve_reference(base, declaring) {
            Some(path) => path,
            None => {
                if is_array {
                    log.error(format!(
                        "Cannot parse array of child models - model class not found ({})",
                        type_token
                    ));
                }
                return None;
            }
        };

        let mut child = if class_path == self.class_path {
            // Self-recursion: snapshot of the model as built so far
            self.clone()
        } else {
            Model::build(&class_path, &self.scenario, registry, log)
        };
        child.title = Some(property.name.clone());

        Some(SchemaPayload::Model {
            model: child,
            is_array,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn registry_from(files: Vec<(&str, &str)>) -> (ClassRegistry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            paths.push(path);
        }
        let parsed: Vec<_> = AstParser::parse_files(&paths)
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        let registry = ClassRegistry::from_parsed_files(&parsed, temp_dir.path());
        (registry, temp_dir)
    }

    #[test]
    fn test_model_reference_parsing() {
        assert_eq!(
            ModelReference::parse("models::Pet"),
            ModelReference {
                class_path: "models::Pet".to_string(),
                scenario: "default".to_string(),
                is_array: false,
            }
        );
        assert_eq!(
            ModelReference::parse("models::Pet[]|view"),
            ModelReference {
                class_path: "models::Pet".to_string(),
                scenario: "view".to_string(),
                is_array: true,
            }
        );
        assert_eq!(ModelReference::parse("models::Pet|").scenario, "default");
    }

    #[test]
    fn test_build_filters_by_scenario_and_collects_required() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default *id name
                /// @api-scenario create *name
                pub struct Pet {
                    /// @var integer Unique id
                    pub id: u64,
                    /// @var string Display name
                    pub name: String,
                    /// @var string Internal notes
                    pub notes: String,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        assert_eq!(model.schema_type, "object");
        let names: Vec<&String> = model.properties.keys().collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(model.required, Some(vec!["id".to_string()]));

        let create = Model::build("models::Pet", "create", &registry, &mut log);
        assert_eq!(create.properties.len(), 1);
        assert_eq!(create.required, Some(vec!["name".to_string()]));
    }

    #[test]
    fn test_absent_scenario_yields_zero_properties() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default id
                pub struct Pet {
                    /// @var integer Unique id
                    pub id: u64,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "missing", &registry, &mut log);
        assert!(model.properties.is_empty());
        assert_eq!(model.required, None);
    }

    #[test]
    fn test_scenario_declaration_order_wins_over_field_order() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default name id
                pub struct Pet {
                    /// @var integer Unique id
                    pub id: u64,
                    /// @var string Display name
                    pub name: String,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        let names: Vec<&String> = model.properties.keys().collect();
        assert_eq!(names, vec!["name", "id"]);
    }

    #[test]
    fn test_malformed_var_tag_is_skipped_but_stays_required() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default *id name
                pub struct Pet {
                    /// No var tag at all
                    pub id: u64,
                    /// @var string Display name
                    pub name: String,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        assert!(!model.properties.contains_key("id"));
        assert!(model.properties.contains_key("name"));
        // The scenario marker decided membership before the doc was parsed
        assert_eq!(model.required, Some(vec!["id".to_string()]));
        assert!(log
            .entries()
            .iter()
            .any(|e| e.message.contains("Malformed doc comment for property (id)")));
    }

    #[test]
    fn test_unknown_property_type_is_skipped_with_error() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default id
                pub struct Pet {
                    /// @var Mystery Something odd
                    pub id: u64,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        assert!(model.properties.is_empty());
        assert!(log
            .entries()
            .iter()
            .any(|e| e.message.contains("Unknown type Mystery for property id")));
    }

    #[test]
    fn test_nested_model_resolved_through_import_table() {
        let (registry, _dir) = registry_from(vec![
            (
                "src/tags.rs",
                r#"
                    /// @api-scenario default label
                    pub struct Tag {
                        /// @var string Label text
                        pub label: String,
                    }
                "#,
            ),
            (
                "src/pets.rs",
                r#"
                    use crate::tags::Tag;

                    /// @api-scenario default name tag
                    pub struct Pet {
                        /// @var string Display name
                        pub name: String,
                        /// @var Tag Primary tag
                        pub tag: Tag,
                    }
                "#,
            ),
        ]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("pets::Pet", "default", &registry, &mut log);
        let tag_prop = model.properties.get("tag").unwrap();
        let SchemaPayload::Model { model: child, is_array } = &tag_prop.schema else {
            panic!("expected a nested model");
        };
        assert!(!is_array);
        assert_eq!(child.title.as_deref(), Some("tag"));
        assert_eq!(child.class_path, "tags::Tag");
        assert!(child.properties.contains_key("label"));
    }

    #[test]
    fn test_array_of_models_property() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default label
                pub struct Tag {
                    /// @var string Label text
                    pub label: String,
                }

                /// @api-scenario default tags
                pub struct Pet {
                    /// @var Tag[] All tags
                    pub tags: Vec<Tag>,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        let tags_prop = model.properties.get("tags").unwrap();
        let SchemaPayload::Model { model: child, is_array } = &tags_prop.schema else {
            panic!("expected a nested model");
        };
        assert!(*is_array);
        assert_eq!(child.class_path, "models::Tag");
    }

    #[test]
    fn test_missing_array_model_logs_both_errors() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default tags
                pub struct Pet {
                    /// @var Nothing[] All tags
                    pub tags: Vec<String>,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Pet", "default", &registry, &mut log);
        assert!(model.properties.is_empty());
        assert!(log
            .entries()
            .iter()
            .any(|e| e.message.contains("Cannot parse array of child models")));
        assert!(log
            .entries()
            .iter()
            .any(|e| e.message.contains("Unknown type Nothing[]")));
    }

    #[test]
    fn test_self_reference_snapshots_prior_properties_only() {
        // The snapshot strategy terminates but under-resolves: a sibling
        // declared after the recursive property is absent from the nested
        // copy. This pins the limitation down rather than fixing it.
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default id parent name
                pub struct Category {
                    /// @var integer Unique id
                    pub id: u64,
                    /// @var Category Parent category
                    pub parent: Option<u64>,
                    /// @var string Display name
                    pub name: String,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let model = Model::build("models::Category", "default", &registry, &mut log);
        let names: Vec<&String> = model.properties.keys().collect();
        assert_eq!(names, vec!["id", "parent", "name"]);

        let parent_prop = model.properties.get("parent").unwrap();
        let SchemaPayload::Model { model: snapshot, is_array } = &parent_prop.schema else {
            panic!("expected a nested model");
        };
        assert!(!is_array);
        assert_eq!(snapshot.title.as_deref(), Some("parent"));
        // Only the properties resolved before the self-reference made it in
        let nested: Vec<&String> = snapshot.properties.keys().collect();
        assert_eq!(nested, vec!["id"]);
    }

    #[test]
    fn test_resolve_model_for_unknown_class() {
        let (registry, _dir) = registry_from(vec![]);
        let mut log = DiagnosticLog::new();
        assert_eq!(resolve_model("models::Pet", None, &registry, &mut log), None);
    }

    #[test]
    fn test_resolve_model_array_reference() {
        let (registry, _dir) = registry_from(vec![(
            "models.rs",
            r#"
                /// @api-scenario default id
                pub struct Pet {
                    /// @var integer Unique id
                    pub id: u64,
                }
            "#,
        )]);
        let mut log = DiagnosticLog::new();

        let payload = resolve_model("models::Pet[]", None, &registry, &mut log).unwrap();
        let SchemaPayload::Model { model, is_array } = &payload else {
            panic!("expected a model payload");
        };
        assert!(*is_array);
        assert_eq!(model.class_path, "models::Pet");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "array");
        assert_eq!(json["items"]["type"], "object");
        assert_eq!(json["items"]["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn test_property_serialization_merges_description() {
        let prop = PropertySchema {
            schema: SchemaPayload::Primitive(canonical_type("int").unwrap()),
            description: "Unique id".to_string(),
        };
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "integer", "description": "Unique id"})
        );
    }

    #[test]
    fn test_inline_payload_serializes_verbatim() {
        let payload = SchemaPayload::Inline(serde_json::json!({"a": 1}));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1}));
    }
}
