//! Canonicalization of type tokens into the fixed set of primitive schema
//! types. A token that does not canonicalize is the signal to attempt model
//! resolution instead.

use serde::{Deserialize, Serialize};

/// Synonym table mapping annotation type tokens to canonical schema types.
/// Matching is case-sensitive.
const SIMPLE_TYPES: &[(&str, &[&str])] = &[
    ("integer", &["int", "integer"]),
    ("boolean", &["boolean", "bool"]),
    ("string", &["string"]),
    ("number", &["number", "float"]),
    ("array", &["array"]),
    ("file", &["file"]),
];

/// A primitive schema: `{type: canonical}` or, for array-suffixed tokens,
/// `{type: array, items: {type: canonical}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PrimitiveSchema>>,
}

impl PrimitiveSchema {
    pub fn scalar(canonical: &str) -> Self {
        Self {
            schema_type: canonical.to_string(),
            items: None,
        }
    }

    pub fn array_of(canonical: &str) -> Self {
        Self {
            schema_type: "array".to_string(),
            items: Some(Box::new(Self::scalar(canonical))),
        }
    }

    /// Whether this is a scalar file parameter type. Arrays of files do not
    /// count; only a plain `file` token registers a multipart consume type.
    pub fn is_file(&self) -> bool {
        self.schema_type == "file"
    }
}

/// Maps a raw type token, optionally suffixed with `[]`, to a primitive
/// schema. Returns `None` when the token is not a registered primitive.
pub fn canonical_type(token: &str) -> Option<PrimitiveSchema> {
    let (base, is_array) = match token.strip_suffix("[]") {
        Some(base) => (base, true),
        None => (token, false),
    };

    for (canonical, synonyms) in SIMPLE_TYPES {
        if synonyms.contains(&base) {
            return Some(if is_array {
                PrimitiveSchema::array_of(canonical)
            } else {
                PrimitiveSchema::scalar(canonical)
            });
        }
    }

    None
}
