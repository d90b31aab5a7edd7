//! Shape registrations keyed by resource, method, action, role and status.
//!
//! Registrations go through [`ShapeRegistryBuilder`], which checks every key as it arrives
//! and checks the registry as a whole in [`ShapeRegistryBuilder::build`]. The resulting
//! [`ShapeRegistry`] is immutable and can be shared across threads behind an `Arc`.

use crate::error::{Error, Result};
use crate::shape::ShapeDescriptor;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Shape bound by description-only registrations.
pub const EMPTY_SHAPE_NAME: &str = "Empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Methods that never carry a request body.
    pub fn is_safe(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            "head" => Ok(HttpMethod::Head),
            "options" => Ok(HttpMethod::Options),
            other => Err(Error::InvalidDeclaration(format!("unknown HTTP method `{}`", other))),
        }
    }
}

/// Which side of an exchange a shape describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeRole {
    /// Request payload
    Collect,
    /// Response payload
    Result,
}

/// Lookup key of a registration. Unset parts act as wildcards for the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    pub resource: String,
    pub method: Option<HttpMethod>,
    pub action: Option<String>,
    pub role: Option<ShapeRole>,
    pub status: Option<u16>,
}

impl ShapeKey {
    /// Resource-level default key.
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            method: None,
            action: None,
            role: None,
            status: None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn role(mut self, role: ShapeRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_resource_default(&self) -> bool {
        self.method.is_none() && self.action.is_none() && self.status.is_none()
    }

    fn check(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidRegistration {
            key: self.to_string(),
            reason: reason.to_string(),
        };

        if self.resource.is_empty() {
            return Err(invalid("resource name is empty"));
        }
        if self.method.is_some() && self.action.is_none() {
            return Err(invalid("a method-specific registration needs an action"));
        }
        if self.status.is_some() {
            if self.action.is_none() {
                return Err(invalid("a status-specific registration needs an action"));
            }
            if self.role != Some(ShapeRole::Result) {
                return Err(invalid("a status-specific registration must use the result role"));
            }
        }
        if let (Some(method), Some(ShapeRole::Collect)) = (self.method, self.role) {
            if method.is_safe() {
                return Err(invalid("safe methods do not collect a request payload"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(method) = self.method {
            write!(f, " {}", method)?;
        }
        if let Some(action) = &self.action {
            write!(f, " {}", action)?;
        }
        if let Some(role) = self.role {
            write!(f, " [{:?}]", role)?;
        }
        if let Some(status) = self.status {
            write!(f, " {}", status)?;
        }
        Ok(())
    }
}

/// What a registration binds to its key.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationConfig {
    /// Documented success status
    pub status: u16,
    pub serializer_shape: Arc<ShapeDescriptor>,
    /// Payload may be a list of shape instances
    pub is_bulk: bool,
    pub exclude_from_schema: bool,
    /// Status documented instead of `status`
    pub response_status_override: Option<u16>,
    /// Response description; alone it documents a response without a body
    pub description: Option<String>,
    /// Names of catalog errors documented for this registration only
    pub errors: Vec<String>,
}

impl RegistrationConfig {
    pub fn new(shape: Arc<ShapeDescriptor>) -> Self {
        Self {
            status: 200,
            serializer_shape: shape,
            is_bulk: false,
            exclude_from_schema: false,
            response_status_override: None,
            description: None,
            errors: Vec::new(),
        }
    }

    /// Registration documenting a response by its description alone.
    pub fn message(description: impl Into<String>) -> Self {
        Self::new(Arc::new(ShapeDescriptor::empty(EMPTY_SHAPE_NAME))).with_description(description)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.into_iter().map(Into::into).collect();
        self
    }

    /// A description with no shape fields behind it.
    pub fn is_message_only(&self) -> bool {
        self.description.is_some() && self.serializer_shape.is_empty()
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn bulk(mut self) -> Self {
        self.is_bulk = true;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.exclude_from_schema = true;
        self
    }

    pub fn with_response_status_override(mut self, status: u16) -> Self {
        self.response_status_override = Some(status);
        self
    }

    /// Status shown in documentation.
    pub fn documented_status(&self) -> u16 {
        self.response_status_override.unwrap_or(self.status)
    }
}

/// Per-resource documentation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOptions {
    pub generate_examples: bool,
    /// Names of catalog errors documented for this resource
    pub errors: Vec<String>,
    pub description: Option<String>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            generate_examples: true,
            errors: Vec::new(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeRegistryBuilder {
    entries: IndexMap<ShapeKey, RegistrationConfig>,
    resources: IndexMap<String, ResourceOptions>,
}

impl ShapeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_options(&mut self, resource: impl Into<String>, options: ResourceOptions) -> &mut Self {
        self.resources.insert(resource.into(), options);
        self
    }

    /// Adds a registration; a key that is already registered is rejected.
    pub fn register(&mut self, key: ShapeKey, config: RegistrationConfig) -> Result<&mut Self> {
        key.check()?;
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateRegistration(key.to_string()));
        }
        debug!("Registering {} -> {}", key, config.serializer_shape.name());
        self.entries.insert(key, config);
        Ok(self)
    }

    /// Registers the resource-level default shape.
    pub fn register_default(&mut self, resource: &str, shape: Arc<ShapeDescriptor>) -> Result<&mut Self> {
        self.register(ShapeKey::resource(resource), RegistrationConfig::new(shape))
    }

    /// Replaces (or adds) the registration under `key`.
    pub fn override_shape(&mut self, key: ShapeKey, config: RegistrationConfig) -> Result<&mut Self> {
        key.check()?;
        debug!("Overriding {} -> {}", key, config.serializer_shape.name());
        self.entries.insert(key, config);
        Ok(self)
    }

    /// Freezes the registry. Every resource must have a resource-level default.
    pub fn build(self) -> Result<ShapeRegistry> {
        for resource in self.entries.keys().map(|k| &k.resource) {
            let has_default = self
                .entries
                .keys()
                .any(|k| &k.resource == resource && k.is_resource_default());
            if !has_default {
                return Err(Error::MissingDefault(resource.clone()));
            }
        }
        info!("Shape registry built with {} registration(s)", self.entries.len());
        Ok(ShapeRegistry {
            entries: self.entries,
            resources: self.resources,
        })
    }
}

/// Frozen set of registrations.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    entries: IndexMap<ShapeKey, RegistrationConfig>,
    resources: IndexMap<String, ResourceOptions>,
}

impl ShapeRegistry {
    pub fn builder() -> ShapeRegistryBuilder {
        ShapeRegistryBuilder::new()
    }

    pub fn get(&self, key: &ShapeKey) -> Option<&RegistrationConfig> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ShapeKey, &RegistrationConfig)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resources in registration order.
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for key in self.entries.keys() {
            if !names.contains(&key.resource.as_str()) {
                names.push(&key.resource);
            }
        }
        names
    }

    pub fn contains_resource(&self, resource: &str) -> bool {
        self.entries.keys().any(|k| k.resource == resource)
    }

    pub fn options(&self, resource: &str) -> ResourceOptions {
        self.resources.get(resource).cloned().unwrap_or_default()
    }
}
