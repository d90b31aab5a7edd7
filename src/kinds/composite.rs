//! Nested shapes, lists and dictionaries.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::Result;
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::SchemaNode;
use serde_json::{Map, Value};

/// Key used in dictionary examples.
pub const DICTIONARY_EXAMPLE_KEY: &str = "key";

pub struct CompositeRule;

impl ExampleProducer for CompositeRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        match &field.kind {
            FieldKind::Nested(shape) => {
                let mut object = Map::new();
                for child in shape.fields() {
                    object.insert(child.name.clone(), ctx.child(child)?);
                }
                Ok(Value::Object(object))
            }
            FieldKind::ListOf(child) => Ok(Value::Array(vec![ctx.child(child)?])),
            FieldKind::Dictionary(child) => {
                let mut object = Map::new();
                object.insert(DICTIONARY_EXAMPLE_KEY.to_string(), ctx.child(child)?);
                Ok(Value::Object(object))
            }
            _ => Ok(Value::Null),
        }
    }
}

impl SchemaMappable for CompositeRule {
    fn map_schema(&self, field: &FieldDescriptor, ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        match &field.kind {
            FieldKind::Nested(shape) => ctx.map_shape(shape),
            FieldKind::ListOf(child) => Ok(SchemaNode::array(ctx.map_child(child)?)),
            FieldKind::Dictionary(child) => {
                let mut node = SchemaNode::typed("object");
                node.additional_properties = Some(Box::new(ctx.map_child(child)?));
                Ok(node)
            }
            _ => Ok(SchemaNode::default()),
        }
    }
}
