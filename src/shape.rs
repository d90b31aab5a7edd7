//! Named data shapes: ordered field lists with optional inheritance.
//!
//! A shape is built once through [`ShapeBuilder`] and is immutable afterwards. When a shape
//! extends a parent, the parent's fields come first (minus any name the child redeclares),
//! followed by the child's own fields in declaration order. A redeclared field replaces the
//! parent's descriptor entirely; nothing is merged at the field level.

use crate::error::{Error, Result};
use crate::exclusivity::{ExclusiveGroup, ExclusivityValidator, FieldPresence, ValidationFailure};
use crate::field::{Access, FieldDescriptor};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// Name of the single field inside a result envelope.
pub const RESULT_ENVELOPE_FIELD: &str = "result";

/// An immutable, named, ordered collection of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    name: String,
    description: Option<String>,
    parent: Option<Arc<ShapeDescriptor>>,
    fields: Vec<FieldDescriptor>,
    groups: Vec<ExclusiveGroup>,
    example_sets: Vec<String>,
}

impl ShapeDescriptor {
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder::new(name)
    }

    /// Shape without fields, standing in for a response that has no body.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent: None,
            fields: Vec::new(),
            groups: Vec::new(),
            example_sets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent(&self) -> Option<&ShapeDescriptor> {
        self.parent.as_deref()
    }

    /// Effective fields, inherited ones included, in rendering order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn groups(&self) -> &[ExclusiveGroup] {
        &self.groups
    }

    /// Names of the example sets documented for this shape.
    pub fn example_sets(&self) -> &[String] {
        &self.example_sets
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields a request must provide, in field order.
    pub fn required_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.is_required_input())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Runs this shape's exclusive groups against provided values.
    pub fn validate<P>(&self, values: &P) -> std::result::Result<(), ValidationFailure>
    where
        P: FieldPresence + ?Sized,
    {
        ExclusivityValidator::validate(values, &self.groups)
    }

    /// Envelope shape `<Name>Result` holding this shape under a single `result` field.
    pub fn wrapped(&self) -> ShapeDescriptor {
        let mut inner = FieldDescriptor::nested(RESULT_ENVELOPE_FIELD, self.clone());
        inner.access = Access::ReadOnly;
        ShapeDescriptor {
            name: format!("{}Result", self.name),
            description: self.description.clone(),
            parent: None,
            fields: vec![inner],
            groups: Vec::new(),
            example_sets: self.example_sets.clone(),
        }
    }
}

/// Builder validating shape invariants.
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    description: Option<String>,
    parent: Option<Arc<ShapeDescriptor>>,
    fields: Vec<FieldDescriptor>,
    groups: Vec<ExclusiveGroup>,
    example_sets: Vec<String>,
}

impl ShapeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent: None,
            fields: Vec::new(),
            groups: Vec::new(),
            example_sets: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn extends(mut self, parent: Arc<ShapeDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn group(mut self, group: ExclusiveGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn example_set(mut self, name: impl Into<String>) -> Self {
        self.example_sets.push(name.into());
        self
    }

    pub fn build(self) -> Result<ShapeDescriptor> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::DuplicateField {
                    shape: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let mut fields = Vec::new();
        let mut groups = Vec::new();
        let mut example_sets = self.example_sets;
        if let Some(parent) = &self.parent {
            debug!("Shape {} extends {}", self.name, parent.name);
            fields.extend(
                parent
                    .fields
                    .iter()
                    .filter(|f| !seen.contains(f.name.as_str()))
                    .cloned(),
            );
            groups.extend(parent.groups.iter().cloned());
            if example_sets.is_empty() {
                example_sets = parent.example_sets.clone();
            }
        }
        fields.extend(self.fields);
        groups.extend(self.groups);

        for group in &groups {
            if group.fields().is_empty() {
                return Err(Error::InvalidGroup {
                    shape: self.name.clone(),
                    reason: "group has no members".to_string(),
                });
            }
            if let Some(missing) = group
                .fields()
                .iter()
                .find(|name| !fields.iter().any(|f| &f.name == *name))
            {
                return Err(Error::UnknownGroupMember {
                    shape: self.name.clone(),
                    field: missing.clone(),
                });
            }
        }

        Ok(ShapeDescriptor {
            name: self.name,
            description: self.description,
            parent: self.parent,
            fields,
            groups,
            example_sets,
        })
    }
}
