//! Field definitions: the nodes of the user-authored field tree.
//!
//! A `FieldNode` is a tagged variant in spirit: `field_type` is the
//! discriminant and `enum_values` / `array_item_type` / `children` are the
//! type-specific payloads. Payloads for other types are kept around but are
//! inert; the compiler only looks at the ones relevant to the current type.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// FIELD TYPE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Float,
    Boolean,
    #[serde(rename = "objectid")]
    ObjectId,
    Nested,
    Array,
    Enum,
}

impl FieldType {
    /// Every field type, in the order an editing surface lists them.
    pub const ALL: [FieldType; 8] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Float,
        FieldType::Boolean,
        FieldType::ObjectId,
        FieldType::Nested,
        FieldType::Array,
        FieldType::Enum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::ObjectId => "objectid",
            Self::Nested => "nested",
            Self::Array => "array",
            Self::Enum => "enum",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::ObjectId => "ObjectId",
            Self::Nested => "Nested",
            Self::Array => "Array",
            Self::Enum => "Enum",
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type `{0}`")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == lowered)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ARRAY ITEM TYPE
// ————————————————————————————————————————————————————————————————————————————

/// The item types offered for `array` fields.
///
/// Nodes store the raw string so whatever the user picked (or typed) flows
/// through to the schema untouched; this enum is the menu, not the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayItemType {
    String,
    Number,
    Object,
}

impl ArrayItemType {
    pub const ALL: [ArrayItemType; 3] = [
        ArrayItemType::String,
        ArrayItemType::Number,
        ArrayItemType::Object,
    ];

    pub const DEFAULT: ArrayItemType = ArrayItemType::String;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Object => "object",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Object => "Object",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FIELD NODE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(default)]
    pub key: String,
    /// `None` only for nodes adopted from outside the tree API; such nodes
    /// compile to nothing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldNode>,
}

impl FieldNode {
    /// A fresh row: empty key, `string` type, nothing else set.
    pub fn new() -> Self {
        Self::with_type(FieldType::String)
    }

    pub fn with_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    pub fn is_nested(&self) -> bool {
        self.field_type.is_some_and(|ty| ty.is_nested())
    }

    /// Apply a type change along with its structural side effects.
    ///
    /// Entering `nested` seeds one default child when there are none;
    /// leaving `nested` drops all children for good.
    pub(crate) fn retype(&mut self, field_type: FieldType) {
        self.field_type = Some(field_type);
        if field_type.is_nested() {
            if self.children.is_empty() {
                self.children.push(FieldNode::new());
            }
        } else {
            self.children.clear();
        }
    }

    /// Restore the nested-children invariant on this node and everything
    /// below it. Returns how many nodes were touched.
    pub(crate) fn heal(&mut self) -> usize {
        let mut touched = 0;
        let mut stack: Vec<&mut FieldNode> = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_nested() {
                if node.children.is_empty() {
                    node.children.push(FieldNode::new());
                    touched += 1;
                }
            } else if !node.children.is_empty() {
                node.children.clear();
                touched += 1;
            }
            stack.extend(node.children.iter_mut());
        }
        touched
    }

    pub(crate) fn apply_attr(&mut self, attr: FieldAttr) {
        match attr {
            FieldAttr::Key(v) => self.key = v,
            FieldAttr::Required(v) => self.required = v,
            FieldAttr::Description(v) => self.description = v,
            FieldAttr::DefaultValue(v) => self.default_value = v,
            FieldAttr::EnumValues(v) => self.enum_values = Some(v),
            FieldAttr::ArrayItemType(v) => self.array_item_type = Some(v),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ATTRIBUTES
// ————————————————————————————————————————————————————————————————————————————

/// One scalar attribute edit. No cross-field validation happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attr", content = "value", rename_all = "camelCase")]
pub enum FieldAttr {
    Key(String),
    Required(bool),
    Description(String),
    DefaultValue(String),
    EnumValues(String),
    ArrayItemType(String),
}

impl FieldAttr {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Required(_) => "required",
            Self::Description(_) => "description",
            Self::DefaultValue(_) => "defaultValue",
            Self::EnumValues(_) => "enumValues",
            Self::ArrayItemType(_) => "arrayItemType",
        }
    }
}
