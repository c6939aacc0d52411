//! Field tree → schema document.
//!
//! `compile` is total: every reachable field tree, including half-edited
//! ones with empty keys, duplicate keys or empty enum lists, yields some
//! schema. It reads its input and builds a fresh output; nothing is cached.
use crate::field::{ArrayItemType, FieldNode, FieldType};
use crate::schema::{ItemsSchema, SchemaDocument, SchemaNode, SchemaType};

/// Key emitted for fields whose key is still empty.
pub const EMPTY_KEY_PLACEHOLDER: &str = "---";

pub fn compile(nodes: &[FieldNode]) -> SchemaDocument {
    let mut out = SchemaDocument::new();
    for node in nodes {
        // untyped nodes are the only thing skipped
        let Some(field_type) = node.field_type else {
            continue;
        };
        let key = emitted_key(node);
        if let Some(prev) = out.insert(key, compile_node(node, field_type)) {
            tracing::trace!(key, replaced = ?prev.schema_type, "duplicate sibling key, last one wins");
        }
    }
    out
}

pub fn emitted_key(node: &FieldNode) -> &str {
    if node.key.is_empty() {
        EMPTY_KEY_PLACEHOLDER
    } else {
        &node.key
    }
}

/// Split a comma-separated enum list, trimming each piece. Empty pieces are
/// kept; an absent list is empty.
pub fn parse_enum_values(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(raw) => raw.split(',').map(|v| v.trim().to_string()).collect(),
    }
}

fn compile_node(node: &FieldNode, field_type: FieldType) -> SchemaNode {
    let mut schema = SchemaNode::new(schema_type_of(field_type));
    schema.required = node.required;
    if !node.description.is_empty() {
        schema.description = Some(node.description.clone());
    }
    // non-empty is the only test: "0" and "false" are kept
    if !node.default_value.is_empty() {
        schema.default = Some(node.default_value.clone());
    }

    match field_type {
        FieldType::Nested => {
            schema.properties = Some(compile(&node.children));
        }
        FieldType::Array => {
            let item_type = node
                .array_item_type
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(ArrayItemType::DEFAULT.as_str());
            schema.items = Some(ItemsSchema {
                item_type: item_type.to_string(),
            });
        }
        FieldType::Enum => {
            schema.enum_values = Some(parse_enum_values(node.enum_values.as_deref()));
        }
        FieldType::String
        | FieldType::Number
        | FieldType::Float
        | FieldType::Boolean
        | FieldType::ObjectId => {}
    }
    schema
}

fn schema_type_of(field_type: FieldType) -> SchemaType {
    match field_type {
        FieldType::String | FieldType::Enum => SchemaType::String,
        FieldType::Number => SchemaType::Number,
        FieldType::Float => SchemaType::Float,
        FieldType::Boolean => SchemaType::Boolean,
        FieldType::ObjectId => SchemaType::ObjectId,
        FieldType::Nested => SchemaType::Object,
        FieldType::Array => SchemaType::Array,
    }
}

// ------------------------------- Tests ------------------------------------ //
