use crate::choices::value_key;
use crate::error::Result;
use crate::error_catalog::ErrorCatalog;
use crate::examples::{Example, FieldExampleGenerator};
use crate::exclusivity::ExclusiveGroup;
use crate::field::{Access, FieldDescriptor, FieldKind};
use crate::kinds::{self, KindRules, MappingContext};
use crate::registry::HttpMethod;
use crate::schema::{SchemaFragment, SchemaNode};
use crate::settings::Settings;
use crate::shape::ShapeDescriptor;
use indexmap::IndexMap;
use log::debug;

/// Heading of the exclusive group notes appended to a shape description.
pub const EXCLUSIVE_FIELDS_HEADING: &str = "**Exclusive fields:**";

/// Per-call mapping options.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContext {
    /// Statuses whose error responses the fragment references
    pub known_error_statuses: Vec<u16>,
    /// Catalog errors referenced by name, on top of the statuses
    pub error_names: Vec<String>,
    pub generate_examples: bool,
    /// Example seed; falls back to the generator's seed, then to the shape name
    pub seed: Option<String>,
    /// Method of a bulk request, wrapping the schema in its list form
    pub bulk: Option<HttpMethod>,
}

impl Default for MapContext {
    fn default() -> Self {
        Self {
            known_error_statuses: Vec::new(),
            error_names: Vec::new(),
            generate_examples: true,
            seed: None,
            bulk: None,
        }
    }
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.known_error_statuses = statuses;
        self
    }

    pub fn with_errors(mut self, names: Vec<String>) -> Self {
        self.error_names = names;
        self
    }

    pub fn with_examples(mut self, enabled: bool) -> Self {
        self.generate_examples = enabled;
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_bulk(mut self, method: HttpMethod) -> Self {
        self.bulk = Some(method);
        self
    }
}

/// Schema mapper - turns shapes into OpenAPI schema fragments
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    decimal_as_string: bool,
    generator: FieldExampleGenerator,
    catalog: ErrorCatalog,
    rules: KindRules,
}

impl SchemaMapper {
    pub fn new(settings: &Settings) -> Result<Self> {
        debug!("Initializing SchemaMapper");
        Ok(Self {
            decimal_as_string: settings.coerce_decimal_to_string,
            generator: FieldExampleGenerator::from_settings(settings),
            catalog: ErrorCatalog::from_settings(settings)?,
            rules: KindRules::default(),
        })
    }

    /// Rules for custom kinds, shared with the example generator.
    pub fn with_rules(mut self, rules: KindRules) -> Self {
        self.generator = self.generator.with_rules(rules.clone());
        self.rules = rules;
        self
    }

    pub fn with_generator(mut self, generator: FieldExampleGenerator) -> Self {
        self.rules = generator.rules().clone();
        self.generator = generator;
        self
    }

    pub fn catalog(&self) -> &ErrorCatalog {
        &self.catalog
    }

    pub fn generator(&self) -> &FieldExampleGenerator {
        &self.generator
    }

    pub fn decimal_as_string(&self) -> bool {
        self.decimal_as_string
    }

    /// Maps a shape to its schema and error section.
    pub fn map(&self, shape: &ShapeDescriptor, ctx: &MapContext) -> Result<SchemaFragment> {
        let mut schema = self.object_node(shape, ctx)?;
        if let Some(method) = ctx.bulk {
            schema = bulk_wrap(schema, method);
        }
        Ok(SchemaFragment {
            schema,
            errors: self
                .catalog
                .section_with(&ctx.known_error_statuses, &ctx.error_names)?,
        })
    }

    /// Maps a single field, examples included.
    pub fn map_field(&self, field: &FieldDescriptor, ctx: &MapContext) -> Result<SchemaNode> {
        let mut node = self.field_node(field, ctx)?;
        if ctx.generate_examples {
            self.attach_examples(&mut node, field, &[], &field.name, ctx)?;
        }
        Ok(node)
    }

    pub(crate) fn object_node(&self, shape: &ShapeDescriptor, ctx: &MapContext) -> Result<SchemaNode> {
        debug!("Mapping shape: {}", shape.name());
        let mut node = SchemaNode::object();
        node.description = shape.description().map(str::to_string);

        let mut properties = IndexMap::new();
        for field in shape.fields() {
            let mut property = self.field_node(field, ctx)?;
            if ctx.generate_examples {
                self.attach_examples(&mut property, field, shape.example_sets(), shape.name(), ctx)?;
            }
            properties.insert(field.name.clone(), property);
        }
        node.properties = Some(properties);

        let required = shape.required_fields();
        if !required.is_empty() {
            node.required = Some(required);
        }

        apply_groups(&mut node, shape.groups());
        Ok(node)
    }

    /// Kind schema plus the attributes shared by every kind.
    pub(crate) fn field_node(&self, field: &FieldDescriptor, ctx: &MapContext) -> Result<SchemaNode> {
        let rule = kinds::rule_for(field, &self.rules)?;
        let mut node = rule.map_schema(field, &MappingContext { mapper: self, map: ctx })?;

        if node.description.is_none() {
            node.description = field.help_text.clone();
        }
        if field.nullable {
            node.nullable = Some(true);
        }
        match field.access {
            Access::ReadOnly => node.read_only = Some(true),
            Access::WriteOnly => node.write_only = Some(true),
            Access::ReadWrite => {}
        }
        Ok(node)
    }

    fn attach_examples(
        &self,
        node: &mut SchemaNode,
        field: &FieldDescriptor,
        example_sets: &[String],
        fallback_seed: &str,
        ctx: &MapContext,
    ) -> Result<()> {
        // Nested objects carry examples on their own properties.
        if matches!(field.kind, FieldKind::Nested(_)) {
            return Ok(());
        }
        let seed = ctx
            .seed
            .as_deref()
            .or(self.generator.default_seed())
            .unwrap_or(fallback_seed);

        if !example_sets.is_empty() {
            let mut examples = IndexMap::new();
            for set in example_sets {
                let value = self.generator.generate_in_set(field, set, Some(seed))?;
                examples.insert(set.clone(), value.value);
            }
            node.examples = Some(examples);
            return Ok(());
        }

        match self.generator.generate(field, Some(seed))? {
            Example::Single(value) => node.example = Some(value.value),
            Example::Labelled(values) => {
                node.examples = Some(
                    values
                        .into_iter()
                        .map(|v| (v.label.unwrap_or_else(|| value_key(&v.value)), v.value))
                        .collect(),
                );
            }
        }
        Ok(())
    }
}

/// List form of a request schema: POST accepts one object or a list, PUT and PATCH a list.
pub fn bulk_wrap(node: SchemaNode, method: HttpMethod) -> SchemaNode {
    match method {
        HttpMethod::Post => SchemaNode {
            one_of: Some(vec![node.clone(), SchemaNode::array(node)]),
            ..Default::default()
        },
        HttpMethod::Put | HttpMethod::Patch => SchemaNode::array(node),
        _ => node,
    }
}

fn apply_groups(node: &mut SchemaNode, groups: &[ExclusiveGroup]) {
    if groups.is_empty() {
        return;
    }

    let mut compositions: Vec<SchemaNode> = groups.iter().filter_map(group_composition).collect();
    if compositions.len() == 1 {
        let composition = compositions.remove(0);
        node.one_of = composition.one_of;
        node.not = composition.not;
    } else if !compositions.is_empty() {
        node.all_of = Some(compositions);
    }

    let mut notes = format!("{}\n", EXCLUSIVE_FIELDS_HEADING);
    for group in groups {
        if group.is_required() {
            notes.push_str(&format!("+ {} {}\n", group.message(), group.required_message()));
        } else {
            notes.push_str(&format!("+ {}\n", group.message()));
        }
    }
    node.description = Some(match node.description.take() {
        Some(description) => format!("{}\n\n{}", description, notes),
        None => notes,
    });
}

/// `oneOf` over members for required groups, `not anyOf` over member pairs otherwise.
fn group_composition(group: &ExclusiveGroup) -> Option<SchemaNode> {
    let members = group.fields();
    if group.is_required() {
        return Some(SchemaNode {
            one_of: Some(members.iter().map(|m| SchemaNode::requiring([m.clone()])).collect()),
            ..Default::default()
        });
    }

    let mut pairs = Vec::new();
    for (i, first) in members.iter().enumerate() {
        for second in &members[i + 1..] {
            pairs.push(SchemaNode::requiring([first.clone(), second.clone()]));
        }
    }
    if pairs.is_empty() {
        return None;
    }
    Some(SchemaNode {
        not: Some(Box::new(SchemaNode {
            any_of: Some(pairs),
            ..Default::default()
        })),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::ChoiceSet;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mapper() -> SchemaMapper {
        SchemaMapper::new(&Settings::default()).unwrap()
    }

    fn car() -> ShapeDescriptor {
        ShapeDescriptor::builder("Car")
            .description("A car")
            .field(FieldDescriptor::new("id", FieldKind::Identifier).required().read_only())
            .field(FieldDescriptor::new("name", FieldKind::String).required().max_length(40))
            .field(FieldDescriptor::new("electric", FieldKind::Boolean))
            .field(FieldDescriptor::decimal("price", 8, 2).required())
            .field(FieldDescriptor::choice("body", ChoiceSet::from_pairs([(1, "Sedan"), (2, "Coupe")])))
            .field(FieldDescriptor::regex("plate", "^[A-Z]{2}[0-9]{4}$"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_kind_table() {
        let schema = mapper().map(&car(), &MapContext::new().with_examples(false)).unwrap().schema;

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.property("electric").unwrap().schema_type.as_deref(), Some("boolean"));

        let id = schema.property("id").unwrap();
        assert_eq!(id.format.as_deref(), Some("uuid"));
        assert_eq!(id.read_only, Some(true));

        let price = schema.property("price").unwrap();
        assert_eq!(price.schema_type.as_deref(), Some("string"));
        assert_eq!(price.format.as_deref(), Some("decimal"));
        assert_eq!(price.pattern.as_deref(), Some(r"^-?\d{0,6}(?:\.\d{0,2})?$"));

        let body = schema.property("body").unwrap();
        assert_eq!(body.schema_type.as_deref(), Some("integer"));
        assert_eq!(body.enum_values, Some(vec![json!(1), json!(2)]));
        assert_eq!(
            serde_json::to_value(body.x_choices.as_ref().unwrap()).unwrap(),
            json!({"choices": {"1": "Sedan", "2": "Coupe"}})
        );

        let plate = schema.property("plate").unwrap();
        assert_eq!(plate.pattern.as_deref(), Some("^[A-Z]{2}[0-9]{4}$"));
        assert_eq!(schema.property("name").unwrap().max_length, Some(40));
    }

    #[test]
    fn test_required_excludes_read_only_and_keeps_order() {
        let schema = mapper().map(&car(), &MapContext::new()).unwrap().schema;
        assert_eq!(schema.required, Some(vec!["name".to_string(), "price".to_string()]));
    }

    #[test]
    fn test_decimal_as_number() {
        let settings = Settings {
            coerce_decimal_to_string: false,
            ..Settings::default()
        };
        let shape = ShapeDescriptor::builder("P")
            .field(FieldDescriptor::decimal("price", 5, 2).min_value(0.0).max_value(10.0))
            .build()
            .unwrap();
        let schema = SchemaMapper::new(&settings).unwrap().map(&shape, &MapContext::new()).unwrap().schema;
        let price = schema.property("price").unwrap();
        assert_eq!(price.schema_type.as_deref(), Some("number"));
        assert_eq!(price.maximum, Some(10.0));
        assert!(price.example.as_ref().unwrap().is_number());
    }

    #[test]
    fn test_examples_are_deterministic() {
        let m = mapper();
        let first = m.map(&car(), &MapContext::new()).unwrap();
        let second = m.map(&car(), &MapContext::new()).unwrap();
        assert_eq!(first, second);
        assert!(first.schema.property("plate").unwrap().example.is_some());
    }

    #[test]
    fn test_examples_can_be_disabled() {
        let schema = mapper().map(&car(), &MapContext::new().with_examples(false)).unwrap().schema;
        assert!(schema.properties.unwrap().values().all(|p| p.example.is_none()));
    }

    #[test]
    fn test_example_sets_emit_examples_map() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::new("n", FieldKind::Integer))
            .example_set("minimal")
            .example_set("full")
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;
        let n = schema.property("n").unwrap();
        assert!(n.example.is_none());
        let keys: Vec<&String> = n.examples.as_ref().unwrap().keys().collect();
        assert_eq!(keys, vec!["minimal", "full"]);
    }

    #[test]
    fn test_labelled_choices_keyed_by_label() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::choice("size", ChoiceSet::from_pairs([("s", "Small"), ("l", "Large")])).show_all_choices())
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;
        let examples = schema.property("size").unwrap().examples.clone().unwrap();
        assert_eq!(examples.get("Small"), Some(&json!("s")));
        assert_eq!(examples.get("Large"), Some(&json!("l")));
    }

    #[test]
    fn test_required_group_becomes_one_of() {
        let shape = ShapeDescriptor::builder("Contact")
            .field(FieldDescriptor::new("email", FieldKind::Email))
            .field(FieldDescriptor::new("phone", FieldKind::String))
            .group(ExclusiveGroup::exactly_one(["email", "phone"]))
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;

        assert_eq!(
            schema.one_of,
            Some(vec![SchemaNode::requiring(["email"]), SchemaNode::requiring(["phone"])])
        );
        assert_eq!(
            schema.description.as_deref(),
            Some("**Exclusive fields:**\n+ The fields email, phone are mutually exclusive arguments. One of the fields email, phone is required.\n")
        );
    }

    #[test]
    fn test_optional_group_becomes_not_any_of() {
        let shape = ShapeDescriptor::builder("S")
            .description("Search")
            .field(FieldDescriptor::new("a", FieldKind::String))
            .field(FieldDescriptor::new("b", FieldKind::String))
            .field(FieldDescriptor::new("c", FieldKind::String))
            .group(ExclusiveGroup::at_most_one(["a", "b", "c"]).with_message("Only one filter."))
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;

        let not = schema.not.unwrap();
        assert_eq!(
            not.any_of,
            Some(vec![
                SchemaNode::requiring(["a", "b"]),
                SchemaNode::requiring(["a", "c"]),
                SchemaNode::requiring(["b", "c"]),
            ])
        );
        assert_eq!(
            schema.description.as_deref(),
            Some("Search\n\n**Exclusive fields:**\n+ Only one filter.\n")
        );
    }

    #[test]
    fn test_multiple_groups_use_all_of() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::new("a", FieldKind::String))
            .field(FieldDescriptor::new("b", FieldKind::String))
            .field(FieldDescriptor::new("c", FieldKind::String))
            .field(FieldDescriptor::new("d", FieldKind::String))
            .group(ExclusiveGroup::at_most_one(["a", "b"]))
            .group(ExclusiveGroup::exactly_one(["c", "d"]))
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;
        assert_eq!(schema.all_of.map(|v| v.len()), Some(2));
        assert!(schema.one_of.is_none());
    }

    #[test]
    fn test_nested_and_list_recurse() {
        let engine = ShapeDescriptor::builder("Engine")
            .field(FieldDescriptor::new("power", FieldKind::Integer).required())
            .build()
            .unwrap();
        let shape = ShapeDescriptor::builder("Car")
            .field(FieldDescriptor::nested("engine", engine))
            .field(FieldDescriptor::list_of("tags", FieldDescriptor::new("tag", FieldKind::Slug)))
            .field(FieldDescriptor::dictionary("extras", FieldDescriptor::new("v", FieldKind::Integer)))
            .build()
            .unwrap();
        let schema = mapper().map(&shape, &MapContext::new()).unwrap().schema;

        let engine = schema.property("engine").unwrap();
        assert_eq!(engine.required, Some(vec!["power".to_string()]));
        assert!(engine.example.is_none());
        assert!(engine.property("power").unwrap().example.is_some());

        let tags = schema.property("tags").unwrap();
        assert_eq!(tags.schema_type.as_deref(), Some("array"));
        assert_eq!(tags.items.as_ref().unwrap().pattern.as_deref(), Some(crate::kinds::text::SLUG_PATTERN));
        assert!(tags.example.as_ref().unwrap().is_array());

        let extras = schema.property("extras").unwrap();
        assert_eq!(
            extras.additional_properties.as_ref().unwrap().schema_type.as_deref(),
            Some("integer")
        );
    }

    #[test]
    fn test_error_section_references_known_statuses() {
        let ctx = MapContext::new().with_error_statuses(vec![404, 400]);
        let fragment = mapper().map(&car(), &ctx).unwrap();
        let keys: Vec<&String> = fragment.errors.responses.keys().collect();
        assert_eq!(keys, vec!["400", "404"]);
    }

    #[test]
    fn test_bulk_post_and_put() {
        let post = mapper().map(&car(), &MapContext::new().with_bulk(HttpMethod::Post)).unwrap().schema;
        let variants = post.one_of.unwrap();
        assert_eq!(variants[0].schema_type.as_deref(), Some("object"));
        assert_eq!(variants[1].schema_type.as_deref(), Some("array"));

        let put = mapper().map(&car(), &MapContext::new().with_bulk(HttpMethod::Put)).unwrap().schema;
        assert_eq!(put.schema_type.as_deref(), Some("array"));
    }

    #[test]
    fn test_unsupported_kind() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::new("geo", FieldKind::Custom("point".into())))
            .build()
            .unwrap();
        let err = mapper().map(&shape, &MapContext::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFieldKind { field, .. } if field == "geo"));
    }

    #[test]
    fn test_generation_failure_propagates() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::regex("bad", r"^a\bb$"))
            .build()
            .unwrap();
        assert!(matches!(
            mapper().map(&shape, &MapContext::new()),
            Err(Error::ExampleGeneration { .. })
        ));
        assert!(mapper().map(&shape, &MapContext::new().with_examples(false)).is_ok());
    }

    #[test]
    fn test_mapping_leaves_shape_untouched() {
        let shape = car();
        let before = shape.clone();
        mapper().map(&shape, &MapContext::new()).unwrap();
        assert_eq!(shape, before);
    }
}
