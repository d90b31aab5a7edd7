//! shapedoc - Shape resolution, example synthesis and OpenAPI schema mapping for REST resources.
//!
//! Resources register the data shapes ("serializers") they collect and return, per HTTP
//! method, action and response status. This library resolves which shape applies to a
//! request, validates mutually exclusive field groups, generates representative example
//! values from field metadata, and maps shapes to OpenAPI schema fragments with error
//! response references.
//!
//! # Architecture
//!
//! 1. [`field`], [`choices`], [`shape`] - Immutable field and shape descriptors
//! 2. [`exclusivity`] - "At most one" / "exactly one" field group validation
//! 3. [`kinds`] - Per-kind example producers and schema mappings
//! 4. [`examples`] - Seeded, thread-safe example generation
//! 5. [`registry`] and [`resolver`] - Frozen shape registrations and their lookup
//! 6. [`schema_mapper`] and [`error_catalog`] - Schema fragments and error sections
//! 7. [`declaration`], [`scanner`], [`openapi_builder`], [`serializer`] - File-driven document generation
//!
//! # Example Usage
//!
//! ```no_run
//! use shapedoc::{
//!     field::{FieldDescriptor, FieldKind},
//!     registry::{HttpMethod, ShapeRegistryBuilder},
//!     resolver::ShapeResolver,
//!     schema_mapper::{MapContext, SchemaMapper},
//!     settings::Settings,
//!     shape::ShapeDescriptor,
//! };
//! use std::sync::Arc;
//!
//! let car = ShapeDescriptor::builder("Car")
//!     .field(FieldDescriptor::new("id", FieldKind::Identifier).read_only())
//!     .field(FieldDescriptor::new("name", FieldKind::String).required().max_length(40))
//!     .build()
//!     .unwrap();
//!
//! let mut registry = ShapeRegistryBuilder::new();
//! registry.register_default("cars", Arc::new(car)).unwrap();
//! let resolver = ShapeResolver::new(Arc::new(registry.build().unwrap()));
//!
//! let resolved = resolver.resolve("cars", HttpMethod::Get, "retrieve", Some(200)).unwrap();
//! let mapper = SchemaMapper::new(&Settings::default()).unwrap();
//! let fragment = mapper
//!     .map(&resolved.shape, &MapContext::new().with_error_statuses(vec![404]))
//!     .unwrap();
//! println!("{}", serde_json::to_string_pretty(&fragment.schema).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod choices;
pub mod cli;
pub mod declaration;
pub mod error;
pub mod error_catalog;
pub mod examples;
pub mod exclusivity;
pub mod field;
pub mod kinds;
pub mod openapi_builder;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod schema;
pub mod schema_mapper;
pub mod serializer;
pub mod settings;
pub mod shape;

pub use error::{Error, Result};
pub use examples::{Example, ExampleValue, FieldExampleGenerator};
pub use exclusivity::{ExclusiveGroup, ExclusivityValidator, ValidationFailure, Violation};
pub use resolver::{ResolvedShape, ShapeResolver};
pub use schema_mapper::{MapContext, SchemaMapper};
