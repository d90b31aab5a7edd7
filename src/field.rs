//! Field descriptors: the per-field metadata every other component consumes.

use crate::choices::ChoiceSet;
use crate::shape::ShapeDescriptor;
use serde_json::Value;

/// Pattern accepted for MAC address fields.
pub const MAC_ADDRESS_PATTERN: &str =
    "^([0-9A-F]{2}:){5}([0-9A-F]{2})|([0-9A-F]{2}-){5}([0-9A-F]{2})$";

/// Semantic kind of a field, already normalized from the framework's native field types.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Email,
    Url,
    Slug,
    IpAddress,
    Date,
    Time,
    DateTime,
    Duration,
    Choice,
    MultipleChoice,
    Regex,
    File,
    Identifier,
    /// Structured value described by another shape
    Nested(Box<ShapeDescriptor>),
    /// Homogeneous list whose items are described by `child`
    ListOf(Box<FieldDescriptor>),
    /// String-keyed map whose values are described by `child`
    Dictionary(Box<FieldDescriptor>),
    /// Kind declared by the collaborator layer; needs a registered rule
    Custom(String),
}

impl FieldKind {
    pub fn name(&self) -> &str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Decimal => "decimal",
            FieldKind::String => "string",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Slug => "slug",
            FieldKind::IpAddress => "ip_address",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
            FieldKind::Duration => "duration",
            FieldKind::Choice => "choice",
            FieldKind::MultipleChoice => "multiple_choice",
            FieldKind::Regex => "regex",
            FieldKind::File => "file",
            FieldKind::Identifier => "uuid",
            FieldKind::Nested(_) => "nested",
            FieldKind::ListOf(_) => "list",
            FieldKind::Dictionary(_) => "dict",
            FieldKind::Custom(name) => name,
        }
    }
}

/// Read/write direction of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Value constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
    pub pattern: Option<String>,
    pub choices: Option<ChoiceSet>,
}

/// Metadata for one field of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub constraints: Constraints,
    pub required: bool,
    pub access: Access,
    pub nullable: bool,
    pub help_text: Option<String>,
    /// Literal example that bypasses generation
    pub example: Option<Value>,
    /// Document every labelled choice instead of a single pick
    pub show_all_choices: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constraints: Constraints::default(),
            required: false,
            access: Access::ReadWrite,
            nullable: false,
            help_text: None,
            example: None,
            show_all_choices: false,
        }
    }

    pub fn decimal(name: impl Into<String>, max_digits: u32, decimal_places: u32) -> Self {
        Self::new(name, FieldKind::Decimal).digits(max_digits, decimal_places)
    }

    pub fn choice(name: impl Into<String>, choices: ChoiceSet) -> Self {
        Self::new(name, FieldKind::Choice).choices(choices)
    }

    pub fn regex(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Regex).pattern(pattern)
    }

    pub fn mac_address(name: impl Into<String>) -> Self {
        Self::regex(name, MAC_ADDRESS_PATTERN)
    }

    pub fn nested(name: impl Into<String>, shape: ShapeDescriptor) -> Self {
        Self::new(name, FieldKind::Nested(Box::new(shape)))
    }

    pub fn list_of(name: impl Into<String>, child: FieldDescriptor) -> Self {
        Self::new(name, FieldKind::ListOf(Box::new(child)))
    }

    pub fn dictionary(name: impl Into<String>, child: FieldDescriptor) -> Self {
        Self::new(name, FieldKind::Dictionary(Box::new(child)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.access = Access::WriteOnly;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.constraints.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.constraints.max_value = Some(max);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.constraints.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.constraints.max_length = Some(max);
        self
    }

    pub fn digits(mut self, max_digits: u32, decimal_places: u32) -> Self {
        self.constraints.max_digits = Some(max_digits);
        self.constraints.decimal_places = Some(decimal_places);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    pub fn choices(mut self, choices: ChoiceSet) -> Self {
        self.constraints.choices = Some(choices);
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn show_all_choices(mut self) -> Self {
        self.show_all_choices = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    pub fn is_write_only(&self) -> bool {
        self.access == Access::WriteOnly
    }

    /// Whether the field belongs to a request's required set.
    pub fn is_required_input(&self) -> bool {
        self.required && !self.is_read_only()
    }

    /// The choice set, or an empty one when none was declared.
    pub fn choice_set(&self) -> ChoiceSet {
        self.constraints.choices.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_field_is_not_required_input() {
        let field = FieldDescriptor::new("id", FieldKind::Identifier).required().read_only();
        assert!(field.required);
        assert!(!field.is_required_input());
    }

    #[test]
    fn test_decimal_constructor_sets_digits() {
        let field = FieldDescriptor::decimal("amount", 6, 2);
        assert_eq!(field.kind, FieldKind::Decimal);
        assert_eq!(field.constraints.max_digits, Some(6));
        assert_eq!(field.constraints.decimal_places, Some(2));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FieldKind::IpAddress.name(), "ip_address");
        assert_eq!(FieldKind::Custom("money".into()).name(), "money");
        let list = FieldKind::ListOf(Box::new(FieldDescriptor::new("x", FieldKind::Integer)));
        assert_eq!(list.name(), "list");
    }
}
