//! The compiled schema document.
//!
//! Output types only; nothing here knows about field trees. Member order in
//! a serialized node is fixed (`type`, `required`, `description`, `default`,
//! `properties`, `items`, `enum`) and keys within a document keep the order
//! they were first inserted in.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name the export step offers the document under.
pub const EXPORT_FILE_NAME: &str = "schema.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Float,
    Boolean,
    #[serde(rename = "objectid")]
    ObjectId,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsSchema {
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SchemaDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsSchema>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl SchemaNode {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            required: false,
            description: None,
            default: None,
            properties: None,
            items: None,
            enum_values: None,
        }
    }
}

/// Field key → compiled node, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument(IndexMap<String, SchemaNode>);

impl SchemaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under `key`. An existing entry is overwritten in place, so the
    /// later node wins but the key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        self.0.insert(key.into(), node)
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Indented (2-space) JSON text, the export format.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
