//! Per-kind behaviour: example production and schema mapping.
//!
//! Every [`FieldKind`] family lives in its own module and implements both
//! [`ExampleProducer`] and [`SchemaMappable`]. Kinds the crate does not know natively
//! ([`FieldKind::Custom`]) are looked up in a [`KindRules`] registry supplied by the
//! caller; a custom kind without a rule is an [`Error::UnsupportedFieldKind`].

pub mod choice;
pub mod composite;
pub mod numeric;
pub mod pattern;
pub mod scalar;
pub mod temporal;
pub mod text;

use crate::error::{Error, Result};
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::SchemaNode;
use crate::schema_mapper::{MapContext, SchemaMapper};
use crate::shape::ShapeDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces an example value for a field.
pub trait ExampleProducer {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value>;
}

/// Produces the schema node for a field, without the attributes common to all kinds.
pub trait SchemaMappable {
    fn map_schema(&self, field: &FieldDescriptor, ctx: &MappingContext<'_>) -> Result<SchemaNode>;
}

/// A complete rule for one kind.
pub trait FieldRule: ExampleProducer + SchemaMappable + Send + Sync {}

impl<T> FieldRule for T where T: ExampleProducer + SchemaMappable + Send + Sync {}

/// Rules for [`FieldKind::Custom`] kinds, keyed by kind name.
#[derive(Clone, Default)]
pub struct KindRules {
    custom: HashMap<String, Arc<dyn FieldRule>>,
}

impl KindRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: impl Into<String>, rule: impl FieldRule + 'static) -> Self {
        self.custom.insert(kind.into(), Arc::new(rule));
        self
    }

    pub fn get(&self, kind: &str) -> Option<&dyn FieldRule> {
        self.custom.get(kind).map(|rule| rule.as_ref())
    }
}

impl fmt::Debug for KindRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.custom.keys().collect();
        kinds.sort();
        f.debug_struct("KindRules").field("custom", &kinds).finish()
    }
}

static BOOLEAN: scalar::BooleanRule = scalar::BooleanRule;
static IDENTIFIER: scalar::IdentifierRule = scalar::IdentifierRule;
static FILE: scalar::FileRule = scalar::FileRule;
static NUMERIC: numeric::NumericRule = numeric::NumericRule;
static TEXT: text::TextRule = text::TextRule;
static PATTERN: pattern::PatternRule = pattern::PatternRule;
static TEMPORAL: temporal::TemporalRule = temporal::TemporalRule;
static CHOICE: choice::ChoiceRule = choice::ChoiceRule;
static COMPOSITE: composite::CompositeRule = composite::CompositeRule;

/// Selects the rule handling `field`.
pub(crate) fn rule_for<'a>(field: &FieldDescriptor, rules: &'a KindRules) -> Result<&'a dyn FieldRule> {
    let rule: &'a dyn FieldRule = match &field.kind {
        FieldKind::Boolean => &BOOLEAN,
        FieldKind::Identifier => &IDENTIFIER,
        FieldKind::File => &FILE,
        FieldKind::Integer | FieldKind::Float | FieldKind::Decimal => &NUMERIC,
        FieldKind::String if field.constraints.pattern.is_some() => &PATTERN,
        FieldKind::String
        | FieldKind::Email
        | FieldKind::Url
        | FieldKind::Slug
        | FieldKind::IpAddress => &TEXT,
        FieldKind::Regex => &PATTERN,
        FieldKind::Date | FieldKind::Time | FieldKind::DateTime | FieldKind::Duration => &TEMPORAL,
        FieldKind::Choice | FieldKind::MultipleChoice => &CHOICE,
        FieldKind::Nested(_) | FieldKind::ListOf(_) | FieldKind::Dictionary(_) => &COMPOSITE,
        FieldKind::Custom(kind) => rules.get(kind).ok_or_else(|| Error::UnsupportedFieldKind {
            field: field.name.clone(),
            kind: kind.clone(),
        })?,
    };
    Ok(rule)
}

/// State handed to a [`SchemaMappable`].
pub struct MappingContext<'a> {
    pub(crate) mapper: &'a SchemaMapper,
    pub(crate) map: &'a MapContext,
}

impl<'a> MappingContext<'a> {
    pub fn decimal_as_string(&self) -> bool {
        self.mapper.decimal_as_string()
    }

    pub fn map_context(&self) -> &MapContext {
        self.map
    }

    /// Schema for a child field (list items, dictionary values), without examples.
    pub fn map_child(&self, field: &FieldDescriptor) -> Result<SchemaNode> {
        self.mapper.field_node(field, self.map)
    }

    /// Object schema for a nested shape, examples included.
    pub fn map_shape(&self, shape: &ShapeDescriptor) -> Result<SchemaNode> {
        self.mapper.object_node(shape, self.map)
    }
}
