//! OpenAPI schema fragments produced by the mapper.

use crate::error_catalog::ErrorSection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single OpenAPI schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Value → label map for choice fields
    #[serde(rename = "x-choices", skip_serializing_if = "Option::is_none")]
    pub x_choices: Option<XChoices>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaNode>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Named examples, one per example set or labelled choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, Value>>,

    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaNode>>,

    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,

    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn array(items: SchemaNode) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// `$ref` to a component schema.
    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            reference: Some(target.into()),
            ..Default::default()
        }
    }

    /// A node carrying nothing but a `required` list.
    pub fn requiring<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: Some(fields.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }
}

/// `x-choices` extension payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XChoices {
    pub choices: IndexMap<String, String>,
}

/// What the mapper returns for one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFragment {
    pub schema: SchemaNode,
    pub errors: ErrorSection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serialized_keys_use_openapi_names() {
        let mut node = SchemaNode::typed("string");
        node.read_only = Some(true);
        node.max_length = Some(10);
        node.x_choices = Some(XChoices {
            choices: [("a".to_string(), "A".to_string())].into_iter().collect(),
        });

        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "string",
                "x-choices": {"choices": {"a": "A"}},
                "maxLength": 10,
                "readOnly": true
            })
        );
    }

    #[test]
    fn test_reference_serializes_alone() {
        let value = serde_json::to_value(SchemaNode::reference("#/components/schemas/Car")).unwrap();
        assert_eq!(value, json!({"$ref": "#/components/schemas/Car"}));
    }
}
