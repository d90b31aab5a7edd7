use crate::error::Result;
use crate::error_catalog::{ErrorResponse, ErrorSection};
use crate::registry::{HttpMethod, ShapeRole};
use crate::resolver::ShapeResolver;
use crate::schema::SchemaNode;
use crate::schema_mapper::{bulk_wrap, MapContext, SchemaMapper};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const OPENAPI_VERSION: &str = "3.0.3";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Global switch on top of each resource's own setting
    generate_examples: bool,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Shape schemas keyed by shape name
    pub schemas: IndexMap<String, SchemaNode>,
    /// Error responses keyed by error name
    pub responses: IndexMap<String, ErrorResponse>,
}

/// One documented registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ShapeRole>,
    /// Status the registration is keyed on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_status: Option<u16>,
    /// Documented success status
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absent for description-only responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    #[serde(default, skip_serializing_if = "ErrorSection::is_empty")]
    pub errors: ErrorSection,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// Routing is owned by the host framework; always empty
    pub paths: IndexMap<String, Value>,
    pub components: Components,
    #[serde(rename = "x-shape-registrations")]
    pub registrations: Vec<RegistrationEntry>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            generate_examples: true,
        }
    }

    /// Set custom info for the API
    ///
    /// # Arguments
    ///
    /// * `title` - API title
    /// * `version` - API version
    /// * `description` - Optional lead text; the error catalog is appended after it
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Turns example generation on or off for every resource.
    ///
    /// A resource that disables examples stays disabled when this is `true`.
    pub fn with_examples(mut self, enabled: bool) -> Self {
        self.generate_examples = enabled;
        self
    }

    /// Build the document from every registration the resolver knows.
    ///
    /// Each registration not excluded from the schema becomes one entry in
    /// `x-shape-registrations`. Shapes are mapped once into `components.schemas`
    /// and referenced from their entries. Description-only registrations carry
    /// no schema.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolver over the shape registry to document
    /// * `mapper` - Schema mapper holding the error catalog and example generator
    ///
    /// # Returns
    ///
    /// The complete [`OpenApiDocument`], ready for serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if a shape cannot be mapped, an example cannot be
    /// generated, or an error name is missing from the catalog.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use shapedoc::openapi_builder::OpenApiBuilder;
    ///
    /// let doc = OpenApiBuilder::new()
    ///     .with_info("Cars".to_string(), "2.0.0".to_string(), None)
    ///     .with_examples(false)
    ///     .build(&resolver, &mapper)?;
    /// assert_eq!(doc.openapi, "3.0.3");
    /// ```
    pub fn build(self, resolver: &ShapeResolver, mapper: &SchemaMapper) -> Result<OpenApiDocument> {
        debug!("Building final OpenAPI document");
        let registry = resolver.registry();
        let catalog = mapper.catalog();

        let mut components = Components::default();
        let mut registrations = Vec::new();

        for (key, config) in registry.entries() {
            if config.exclude_from_schema {
                debug!("Skipping registration excluded from schema: {}", key);
                continue;
            }

            if config.is_message_only() {
                debug!("Documenting description-only response: {}", key);
                registrations.push(RegistrationEntry {
                    resource: key.resource.clone(),
                    method: key.method,
                    action: key.action.clone(),
                    role: key.role,
                    match_status: key.status,
                    status: config.documented_status(),
                    description: config.description.clone(),
                    schema: None,
                    errors: ErrorSection::default(),
                });
                continue;
            }

            let options = registry.options(&key.resource);
            let mut error_names = options.errors.clone();
            error_names.extend(config.errors.iter().cloned());
            let ctx = MapContext::new()
                .with_error_statuses(catalog.common_statuses())
                .with_errors(error_names)
                .with_examples(self.generate_examples && options.generate_examples);

            let shape = match key.role {
                Some(role) if resolver.wraps(role, key.action.as_deref()) => {
                    Arc::new(config.serializer_shape.wrapped())
                }
                _ => Arc::clone(&config.serializer_shape),
            };
            let fragment = mapper.map(&shape, &ctx)?;

            let name = shape.name().to_string();
            match components.schemas.get(&name) {
                Some(existing) if existing != &fragment.schema => {
                    warn!("Shape {} maps differently across resources; keeping the first", name);
                }
                Some(_) => {}
                None => {
                    components.schemas.insert(name.clone(), fragment.schema);
                }
            }

            let mut schema = SchemaNode::reference(format!("#/components/schemas/{}", name));
            if config.is_bulk && key.role != Some(ShapeRole::Result) {
                if let Some(method) = key.method {
                    schema = bulk_wrap(schema, method);
                }
            }

            registrations.push(RegistrationEntry {
                resource: key.resource.clone(),
                method: key.method,
                action: key.action.clone(),
                role: key.role,
                match_status: key.status,
                status: config.documented_status(),
                description: config.description.clone(),
                schema: Some(schema),
                errors: fragment.errors,
            });
        }

        components.responses = catalog.components();

        let errors_markdown = catalog.description()?;
        let mut info = self.info;
        info.description = Some(match info.description.take() {
            Some(description) => format!("{}\n\n{}", description, errors_markdown),
            None => errors_markdown,
        });

        debug!(
            "Document holds {} schema(s) and {} registration(s)",
            components.schemas.len(),
            registrations.len()
        );
        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            paths: IndexMap::new(),
            components,
            registrations,
        })
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
