//! Declaration files: shapes, resources and settings in YAML or JSON.
//!
//! ```yaml
//! shapes:
//!   Car:
//!     fields:
//!       - { name: id, type: uuid, read_only: true }
//!       - { name: name, type: string, required: true, max_length: 40 }
//! resources:
//!   - name: cars
//!     registrations:
//!       - { shape: Car }
//!       - { method: post, action: create, role: result, status: 201, shape: Car }
//! ```

use crate::choices::{value_key, ChoiceSet};
use crate::error::{Error, Result};
use crate::exclusivity::ExclusiveGroup;
use crate::field::{Access, FieldDescriptor, FieldKind, MAC_ADDRESS_PATTERN};
use crate::registry::{
    HttpMethod, RegistrationConfig, ResourceOptions, ShapeKey, ShapeRegistry, ShapeRegistryBuilder, ShapeRole,
};
use crate::settings::Settings;
use crate::shape::ShapeDescriptor;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Declaration {
    pub info: InfoDecl,
    pub settings: Settings,
    pub shapes: IndexMap<String, ShapeDecl>,
    pub resources: Vec<ResourceDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoDecl {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for InfoDecl {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDecl {
    pub description: Option<String>,
    /// Name of the parent shape
    pub extends: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub exclusive: Vec<GroupDecl>,
    pub example_sets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub nullable: bool,
    pub help_text: Option<String>,
    pub example: Option<Value>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
    pub pattern: Option<String>,
    pub choices: Vec<ChoiceDecl>,
    pub show_all_choices: bool,
    /// Shape of a `nested` field
    pub shape: Option<String>,
    /// Item of a `list` or value of a `dict` field
    pub child: Option<Box<FieldDecl>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDecl {
    pub value: Value,
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to the value itself
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDecl {
    pub fields: Vec<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub required_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    #[serde(flatten)]
    pub options: ResourceOptions,
    #[serde(default)]
    pub registrations: Vec<RegistrationDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDecl {
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub role: Option<ShapeRole>,
    /// Status the registration is keyed on
    #[serde(default)]
    pub status: Option<u16>,
    /// Omitted for a description-only response
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Catalog errors documented for this registration
    #[serde(default)]
    pub errors: Vec<String>,
    /// Documented success status; defaults to `status`, then 200
    #[serde(default)]
    pub success_status: Option<u16>,
    #[serde(default)]
    pub is_bulk: bool,
    #[serde(default)]
    pub exclude_from_schema: bool,
    #[serde(default)]
    pub response_status_override: Option<u16>,
    /// Replace an earlier registration under the same key
    #[serde(default, rename = "override")]
    pub replace: bool,
}

fn default_true() -> bool {
    true
}

impl Declaration {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading declaration file: {:?}", path);
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Merges another declaration into this one. Info and settings of `self` win.
    pub fn merge(&mut self, other: Declaration) -> Result<()> {
        for (name, shape) in other.shapes {
            if self.shapes.contains_key(&name) {
                return Err(Error::InvalidDeclaration(format!("shape `{}` is declared twice", name)));
            }
            self.shapes.insert(name, shape);
        }
        for resource in other.resources {
            if self.resources.iter().any(|r| r.name == resource.name) {
                return Err(Error::InvalidDeclaration(format!(
                    "resource `{}` is declared twice",
                    resource.name
                )));
            }
            self.resources.push(resource);
        }
        Ok(())
    }

    /// Builds every declared shape.
    pub fn build_shapes(&self) -> Result<IndexMap<String, Arc<ShapeDescriptor>>> {
        let mut compiler = ShapeCompiler::new(&self.shapes);
        for name in self.shapes.keys() {
            compiler.shape(name)?;
        }
        Ok(compiler.built)
    }

    /// Builds and freezes the registry.
    pub fn build_registry(&self) -> Result<ShapeRegistry> {
        let shapes = self.build_shapes()?;
        let mut builder = ShapeRegistryBuilder::new();

        for resource in &self.resources {
            builder.resource_options(resource.name.clone(), resource.options.clone());
            for registration in &resource.registrations {
                let (key, config) = registration.to_entry(&resource.name, &shapes)?;
                if registration.replace {
                    builder.override_shape(key, config)?;
                } else {
                    builder.register(key, config)?;
                }
            }
        }

        let registry = builder.build()?;
        info!(
            "Declared {} shape(s) across {} resource(s)",
            shapes.len(),
            self.resources.len()
        );
        Ok(registry)
    }
}

impl RegistrationDecl {
    fn to_entry(
        &self,
        resource: &str,
        shapes: &IndexMap<String, Arc<ShapeDescriptor>>,
    ) -> Result<(ShapeKey, RegistrationConfig)> {
        let key = ShapeKey {
            resource: resource.to_string(),
            method: self.method,
            action: self.action.clone(),
            role: self.role,
            status: self.status,
        };
        let mut config = match (&self.shape, &self.description) {
            (Some(name), _) => {
                let shape = shapes.get(name).ok_or_else(|| {
                    Error::InvalidDeclaration(format!(
                        "resource `{}` registers unknown shape `{}`",
                        resource, name
                    ))
                })?;
                RegistrationConfig::new(Arc::clone(shape))
            }
            (None, Some(description)) => RegistrationConfig::message(description.clone()),
            (None, None) => {
                return Err(Error::InvalidDeclaration(format!(
                    "registration `{}` needs a shape or a description",
                    key
                )))
            }
        };
        config.status = self.success_status.or(self.status).unwrap_or(200);
        config.is_bulk = self.is_bulk;
        config.exclude_from_schema = self.exclude_from_schema;
        config.response_status_override = self.response_status_override;
        config.description = self.description.clone();
        config.errors = self.errors.clone();
        Ok((key, config))
    }
}

/// Builds shapes in dependency order.
struct ShapeCompiler<'a> {
    decls: &'a IndexMap<String, ShapeDecl>,
    built: IndexMap<String, Arc<ShapeDescriptor>>,
    visiting: Vec<String>,
}

impl<'a> ShapeCompiler<'a> {
    fn new(decls: &'a IndexMap<String, ShapeDecl>) -> Self {
        Self {
            decls,
            built: IndexMap::new(),
            visiting: Vec::new(),
        }
    }

    fn shape(&mut self, name: &str) -> Result<Arc<ShapeDescriptor>> {
        if let Some(shape) = self.built.get(name) {
            return Ok(Arc::clone(shape));
        }
        if self.visiting.iter().any(|n| n == name) {
            return Err(Error::InvalidDeclaration(format!(
                "shape `{}` depends on itself ({} -> {})",
                name,
                self.visiting.join(" -> "),
                name
            )));
        }
        let decls = self.decls;
        let decl = decls
            .get(name)
            .ok_or_else(|| Error::InvalidDeclaration(format!("unknown shape `{}`", name)))?;

        self.visiting.push(name.to_string());
        let mut builder = ShapeDescriptor::builder(name);
        if let Some(description) = &decl.description {
            builder = builder.description(description.clone());
        }
        if let Some(parent) = &decl.extends {
            builder = builder.extends(self.shape(parent)?);
        }
        for field in &decl.fields {
            builder = builder.field(self.field(field, name)?);
        }
        for group in &decl.exclusive {
            builder = builder.group(group_from_decl(group));
        }
        for set in &decl.example_sets {
            builder = builder.example_set(set.clone());
        }
        self.visiting.pop();

        let shape = Arc::new(builder.build()?);
        self.built.insert(name.to_string(), Arc::clone(&shape));
        Ok(shape)
    }

    fn field(&mut self, decl: &FieldDecl, owner: &str) -> Result<FieldDescriptor> {
        if decl.name.is_empty() {
            return Err(Error::InvalidDeclaration(format!(
                "shape `{}` declares a field without a name",
                owner
            )));
        }
        let kind = match decl.kind.as_str() {
            "boolean" | "bool" => FieldKind::Boolean,
            "integer" | "int" => FieldKind::Integer,
            "float" | "number" => FieldKind::Float,
            "decimal" => FieldKind::Decimal,
            "string" | "char" | "" => FieldKind::String,
            "email" => FieldKind::Email,
            "url" => FieldKind::Url,
            "slug" => FieldKind::Slug,
            "ip_address" | "ip" => FieldKind::IpAddress,
            "mac_address" => FieldKind::Regex,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            "datetime" | "date_time" => FieldKind::DateTime,
            "duration" => FieldKind::Duration,
            "choice" => FieldKind::Choice,
            "multiple_choice" => FieldKind::MultipleChoice,
            "regex" => FieldKind::Regex,
            "file" | "image" => FieldKind::File,
            "uuid" | "identifier" => FieldKind::Identifier,
            "nested" => {
                let shape_name = decl.shape.as_deref().ok_or_else(|| {
                    Error::InvalidDeclaration(format!("nested field `{}` names no shape", decl.name))
                })?;
                let shape = self.shape(shape_name)?;
                FieldKind::Nested(Box::new(shape.as_ref().clone()))
            }
            "list" | "dict" => {
                let child = decl.child.as_deref().ok_or_else(|| {
                    Error::InvalidDeclaration(format!("field `{}` declares no child", decl.name))
                })?;
                let mut child = child.clone();
                if child.name.is_empty() {
                    child.name = decl.name.clone();
                }
                let child = Box::new(self.field(&child, owner)?);
                if decl.kind == "list" {
                    FieldKind::ListOf(child)
                } else {
                    FieldKind::Dictionary(child)
                }
            }
            other => FieldKind::Custom(other.to_string()),
        };

        let mut field = FieldDescriptor::new(decl.name.clone(), kind);
        field.required = decl.required;
        field.nullable = decl.nullable;
        field.help_text = decl.help_text.clone();
        field.example = decl.example.clone();
        field.show_all_choices = decl.show_all_choices;
        field.access = match (decl.read_only, decl.write_only) {
            (true, true) => {
                return Err(Error::InvalidDeclaration(format!(
                    "field `{}` cannot be both read-only and write-only",
                    decl.name
                )))
            }
            (true, false) => Access::ReadOnly,
            (false, true) => Access::WriteOnly,
            (false, false) => Access::ReadWrite,
        };

        let constraints = &mut field.constraints;
        constraints.min_value = decl.min_value;
        constraints.max_value = decl.max_value;
        constraints.min_length = decl.min_length;
        constraints.max_length = decl.max_length;
        constraints.max_digits = decl.max_digits;
        constraints.decimal_places = decl.decimal_places;
        constraints.pattern = match decl.kind.as_str() {
            "mac_address" => Some(MAC_ADDRESS_PATTERN.to_string()),
            _ => decl.pattern.clone(),
        };
        if !decl.choices.is_empty() {
            let mut choices = ChoiceSet::new();
            for choice in &decl.choices {
                let label = choice.label.clone().unwrap_or_else(|| value_key(&choice.value));
                choices.push(choice.value.clone(), choice.name.clone(), label);
            }
            constraints.choices = Some(choices);
        }
        Ok(field)
    }
}

fn group_from_decl(decl: &GroupDecl) -> ExclusiveGroup {
    let mut group = ExclusiveGroup::at_most_one(decl.fields.iter().cloned()).with_required(decl.required);
    if let Some(message) = &decl.message {
        group = group.with_message(message.clone());
    }
    if let Some(message) = &decl.required_message {
        group = group.with_required_message(message.clone());
    }
    group
}
