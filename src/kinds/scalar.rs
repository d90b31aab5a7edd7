//! Boolean, identifier and file fields.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::Result;
use crate::examples::ExampleContext;
use crate::field::FieldDescriptor;
use crate::schema::SchemaNode;
use rand::Rng;
use serde_json::Value;
use uuid::Builder;

pub struct BooleanRule;

impl ExampleProducer for BooleanRule {
    fn produce(&self, _field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        Ok(Value::Bool(ctx.rng().gen()))
    }
}

impl SchemaMappable for BooleanRule {
    fn map_schema(&self, _field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        Ok(SchemaNode::typed("boolean"))
    }
}

/// UUID fields.
pub struct IdentifierRule;

impl ExampleProducer for IdentifierRule {
    fn produce(&self, _field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let uuid = Builder::from_random_bytes(ctx.rng().gen()).into_uuid();
        Ok(Value::String(uuid.hyphenated().to_string()))
    }
}

impl SchemaMappable for IdentifierRule {
    fn map_schema(&self, _field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        Ok(SchemaNode::typed("string").with_format("uuid"))
    }
}

pub struct FileRule;

const FILE_NAMES: &[&str] = &["document.pdf", "report.csv", "image.png", "archive.zip"];

impl ExampleProducer for FileRule {
    fn produce(&self, _field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let index = ctx.rng().gen_range(0..FILE_NAMES.len());
        Ok(Value::String(FILE_NAMES[index].to_string()))
    }
}

impl SchemaMappable for FileRule {
    fn map_schema(&self, _field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        Ok(SchemaNode::typed("string").with_format("binary"))
    }
}
