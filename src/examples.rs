//! Example value synthesis for field descriptors.
//!
//! [`FieldExampleGenerator`] dispatches each field to the rule for its kind (see
//! [`crate::kinds`]). Every call draws from its own RNG: seeded calls derive the RNG from
//! the seed and the field name, so the same field and seed always reproduce the same
//! value, while unseeded calls use fresh entropy.

use crate::error::{Error, Result};
use crate::field::{FieldDescriptor, FieldKind};
use crate::kinds::{self, KindRules};
use crate::settings::Settings;
use crate::shape::ShapeDescriptor;
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A generated (or literal) example for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleValue {
    /// Name of the field the value belongs to
    pub field: String,
    pub value: Value,
    /// Display label, set for choice values
    pub label: Option<String>,
    /// Example set the value was generated for
    pub example_set: Option<String>,
}

/// Output of [`FieldExampleGenerator::generate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Example {
    Single(ExampleValue),
    /// One value per labelled choice
    Labelled(Vec<ExampleValue>),
}

impl Example {
    /// The first value, which is the only one for [`Example::Single`].
    pub fn primary(&self) -> Option<&ExampleValue> {
        match self {
            Example::Single(value) => Some(value),
            Example::Labelled(values) => values.first(),
        }
    }
}

/// Produces representative example values from field metadata.
#[derive(Debug, Clone)]
pub struct FieldExampleGenerator {
    default_seed: Option<String>,
    decimal_as_string: bool,
    reference_time: NaiveDateTime,
    rules: KindRules,
}

impl Default for FieldExampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExampleGenerator {
    pub fn new() -> Self {
        Self {
            default_seed: None,
            decimal_as_string: true,
            reference_time: default_reference_time(),
            rules: KindRules::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_default_seed(settings.example_seed.clone())
            .with_decimal_as_string(settings.coerce_decimal_to_string)
    }

    /// Seed used when a call does not pass its own.
    pub fn with_default_seed(mut self, seed: Option<String>) -> Self {
        self.default_seed = seed;
        self
    }

    pub fn with_decimal_as_string(mut self, enabled: bool) -> Self {
        self.decimal_as_string = enabled;
        self
    }

    /// Instant that date and time examples are offset from.
    pub fn with_reference_time(mut self, reference_time: NaiveDateTime) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn with_rules(mut self, rules: KindRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn default_seed(&self) -> Option<&str> {
        self.default_seed.as_deref()
    }

    pub fn rules(&self) -> &KindRules {
        &self.rules
    }

    /// Generates the example(s) for `field`.
    ///
    /// A literal example on the field always wins. A choice field in "show all" mode yields
    /// one labelled value per choice; every other field yields a single value.
    pub fn generate(&self, field: &FieldDescriptor, seed: Option<&str>) -> Result<Example> {
        if let Some(literal) = &field.example {
            return Ok(Example::Single(ExampleValue {
                field: field.name.clone(),
                value: literal.clone(),
                label: None,
                example_set: None,
            }));
        }

        if field.kind == FieldKind::Choice && field.show_all_choices {
            let choices = field.choice_set();
            if choices.is_empty() {
                return Err(Error::example(&field.name, "choice field declares no choices"));
            }
            return Ok(Example::Labelled(
                choices
                    .iter()
                    .map(|choice| ExampleValue {
                        field: field.name.clone(),
                        value: choice.value.clone(),
                        label: Some(choice.label.clone()),
                        example_set: None,
                    })
                    .collect(),
            ));
        }

        let seed = seed.or(self.default_seed.as_deref());
        let mut rng = self.rng_for(field, seed, None);
        let value = self.produce(field, &mut rng)?;
        Ok(Example::Single(self.labelled(field, value, None)))
    }

    /// Generates one value for `field` as part of the named example set.
    pub fn generate_in_set(
        &self,
        field: &FieldDescriptor,
        example_set: &str,
        seed: Option<&str>,
    ) -> Result<ExampleValue> {
        let seed = seed.or(self.default_seed.as_deref());
        let mut rng = self.rng_for(field, seed, Some(example_set));
        let value = self.produce(field, &mut rng)?;
        Ok(self.labelled(field, value, Some(example_set)))
    }

    /// Generates a full object example for a shape.
    pub fn generate_shape(&self, shape: &ShapeDescriptor, seed: Option<&str>) -> Result<Value> {
        let mut object = Map::new();
        for field in shape.fields() {
            let example = self.generate(field, seed)?;
            if let Some(primary) = example.primary() {
                object.insert(field.name.clone(), primary.value.clone());
            }
        }
        Ok(Value::Object(object))
    }

    /// Produces a value for `field` from an existing RNG. Used for nested children.
    pub(crate) fn produce(&self, field: &FieldDescriptor, rng: &mut StdRng) -> Result<Value> {
        if let Some(literal) = &field.example {
            return Ok(literal.clone());
        }
        let rule = kinds::rule_for(field, &self.rules)?;
        let mut ctx = ExampleContext {
            rng,
            generator: self,
        };
        rule.produce(field, &mut ctx)
    }

    fn labelled(&self, field: &FieldDescriptor, value: Value, example_set: Option<&str>) -> ExampleValue {
        let label = match field.kind {
            FieldKind::Choice => field
                .constraints
                .choices
                .as_ref()
                .and_then(|c| c.get_display(&value))
                .map(str::to_string),
            _ => None,
        };
        ExampleValue {
            field: field.name.clone(),
            value,
            label,
            example_set: example_set.map(str::to_string),
        }
    }

    fn rng_for(&self, field: &FieldDescriptor, seed: Option<&str>, example_set: Option<&str>) -> StdRng {
        match seed {
            Some(seed) => {
                debug!("Seeding example for field {} with {:?}", field.name, seed);
                StdRng::seed_from_u64(derive_seed(seed, &field.name, example_set))
            }
            None => StdRng::from_entropy(),
        }
    }
}

/// State handed to an [`ExampleProducer`](crate::kinds::ExampleProducer).
pub struct ExampleContext<'a> {
    rng: &'a mut StdRng,
    generator: &'a FieldExampleGenerator,
}

impl<'a> ExampleContext<'a> {
    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    /// Produces a value for a child field with the same RNG stream.
    pub fn child(&mut self, field: &FieldDescriptor) -> Result<Value> {
        self.generator.produce(field, self.rng)
    }

    pub fn decimal_as_string(&self) -> bool {
        self.generator.decimal_as_string
    }

    pub fn reference_time(&self) -> NaiveDateTime {
        self.generator.reference_time
    }
}

fn derive_seed(seed: &str, field: &str, example_set: Option<&str>) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update([0u8]);
    hasher.update(field.as_bytes());
    if let Some(set) = example_set {
        hasher.update([0u8]);
        hasher.update(set.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn default_reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::ChoiceSet;
    use serde_json::json;

    fn digits(s: &str) -> (usize, usize) {
        let unsigned = s.trim_start_matches('-');
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let whole = whole.trim_start_matches('0');
        (whole.len() + frac.len(), frac.len())
    }

    fn single(example: Example) -> ExampleValue {
        match example {
            Example::Single(value) => value,
            other => panic!("expected a single example, got {:?}", other),
        }
    }

    #[test]
    fn test_same_seed_reproduces_value() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("count", FieldKind::Integer).min_value(0.0).max_value(1_000_000.0);

        let first = generator.generate(&field, Some("x")).unwrap();
        let second = generator.generate(&field, Some("x")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_seed_used_when_call_has_none() {
        let generator = FieldExampleGenerator::new().with_default_seed(Some("docs".into()));
        let field = FieldDescriptor::new("title", FieldKind::String);
        assert_eq!(
            generator.generate(&field, None).unwrap(),
            generator.generate(&field, Some("docs")).unwrap()
        );
    }

    #[test]
    fn test_integer_within_bounds() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("age", FieldKind::Integer).min_value(18.0).max_value(21.0);
        for _ in 0..200 {
            let value = single(generator.generate(&field, None).unwrap()).value;
            let n = value.as_i64().unwrap();
            assert!((18..=21).contains(&n), "{} out of bounds", n);
        }
    }

    #[test]
    fn test_float_within_bounds() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("ratio", FieldKind::Float).min_value(0.5).max_value(0.75);
        for _ in 0..200 {
            let n = single(generator.generate(&field, None).unwrap()).value.as_f64().unwrap();
            assert!((0.5..=0.75).contains(&n), "{} out of bounds", n);
        }
    }

    #[test]
    fn test_decimal_respects_precision() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::decimal("price", 5, 2);
        for _ in 0..200 {
            let value = single(generator.generate(&field, None).unwrap()).value;
            let text = value.as_str().unwrap().to_string();
            let (total, fraction) = digits(&text);
            assert!(total <= 5, "{} has too many digits", text);
            assert!(fraction <= 2, "{} has too many decimal places", text);
        }
    }

    #[test]
    fn test_decimal_as_number() {
        let generator = FieldExampleGenerator::new().with_decimal_as_string(false);
        let field = FieldDescriptor::decimal("price", 4, 1).min_value(10.0).max_value(20.0);
        let n = single(generator.generate(&field, Some("s")).unwrap()).value.as_f64().unwrap();
        assert!((10.0..=20.0).contains(&n));
    }

    #[test]
    fn test_decimal_unsatisfiable_bounds() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::decimal("price", 3, 2).min_value(50.0);
        let err = generator.generate(&field, None).unwrap_err();
        assert!(matches!(err, Error::ExampleGeneration { field, .. } if field == "price"));
    }

    #[test]
    fn test_inverted_bounds_fail() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("n", FieldKind::Integer).min_value(10.0).max_value(5.0);
        assert!(generator.generate(&field, None).is_err());
    }

    #[test]
    fn test_regex_example_matches() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::regex("code", r"^[A-Z]{3}-\d{4}$");
        let pattern = regex::Regex::new(r"^[A-Z]{3}-\d{4}$").unwrap();
        for _ in 0..50 {
            let value = single(generator.generate(&field, None).unwrap()).value;
            assert!(pattern.is_match(value.as_str().unwrap()), "{:?}", value);
        }
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::regex("code", "([a-z]");
        assert!(matches!(
            generator.generate(&field, None),
            Err(Error::ExampleGeneration { .. })
        ));
    }

    #[test]
    fn test_choice_example_carries_label() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::choice("currency", ChoiceSet::from_pairs([("USD", "Dollar"), ("EUR", "Euro")]));
        let example = single(generator.generate(&field, Some("seed")).unwrap());
        let expected = if example.value == json!("USD") { "Dollar" } else { "Euro" };
        assert_eq!(example.label.as_deref(), Some(expected));
    }

    #[test]
    fn test_show_all_choices_yields_every_label() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::choice("size", ChoiceSet::from_pairs([(1, "Small"), (2, "Large")])).show_all_choices();
        match generator.generate(&field, None).unwrap() {
            Example::Labelled(values) => {
                let labels: Vec<_> = values.iter().map(|v| v.label.clone().unwrap()).collect();
                assert_eq!(labels, vec!["Small", "Large"]);
                assert_eq!(values[1].value, json!(2));
            }
            other => panic!("expected labelled examples, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_example_bypasses_generation() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::regex("code", "([a-z]").example("fixed");
        assert_eq!(single(generator.generate(&field, None).unwrap()).value, json!("fixed"));
    }

    #[test]
    fn test_nested_example_is_structured() {
        let inner = ShapeDescriptor::builder("Engine")
            .field(FieldDescriptor::new("power", FieldKind::Integer).min_value(50.0).max_value(60.0))
            .field(FieldDescriptor::new("fuel", FieldKind::String).example("diesel"))
            .build()
            .unwrap();
        let field = FieldDescriptor::nested("engine", inner);

        let value = single(FieldExampleGenerator::new().generate(&field, Some("s")).unwrap()).value;

        assert_eq!(value["fuel"], json!("diesel"));
        let power = value["power"].as_i64().unwrap();
        assert!((50..=60).contains(&power));
    }

    #[test]
    fn test_example_sets_differ_but_are_stable() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("n", FieldKind::Integer).min_value(0.0).max_value(1e12);
        let a = generator.generate_in_set(&field, "minimal", Some("s")).unwrap();
        let again = generator.generate_in_set(&field, "minimal", Some("s")).unwrap();
        assert_eq!(a, again);
        assert_eq!(a.example_set.as_deref(), Some("minimal"));
    }

    #[test]
    fn test_unknown_custom_kind_is_unsupported() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("amount", FieldKind::Custom("money".into()));
        assert!(matches!(
            generator.generate(&field, None),
            Err(Error::UnsupportedFieldKind { kind, .. }) if kind == "money"
        ));
    }

    #[test]
    fn test_generate_shape_object() {
        let shape = ShapeDescriptor::builder("S")
            .field(FieldDescriptor::new("flag", FieldKind::Boolean))
            .field(FieldDescriptor::new("id", FieldKind::Identifier))
            .build()
            .unwrap();
        let value = FieldExampleGenerator::new().generate_shape(&shape, Some("s")).unwrap();
        assert!(value["flag"].is_boolean());
        assert!(uuid::Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_generation_is_thread_safe() {
        let generator = FieldExampleGenerator::new();
        let field = FieldDescriptor::new("n", FieldKind::Integer).min_value(1.0).max_value(9.0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let n = single(generator.generate(&field, None).unwrap()).value.as_i64().unwrap();
                        assert!((1..=9).contains(&n));
                    }
                });
            }
        });
    }
}
