//! Ordered choice sets with human-readable labels.
//!
//! A [`ChoiceSet`] keeps the declaration order of its entries, which is also the order
//! they appear in a schema's `enum` list and in the `x-choices` label map.

use indexmap::IndexMap;
use serde_json::Value;

/// A single allowed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// The value sent over the wire
    pub value: Value,
    /// Optional symbolic name (e.g. `BLACK` for value `0`)
    pub name: Option<String>,
    /// Human-readable label
    pub label: String,
}

/// Ordered set of allowed values for a choice field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `(value, label)` pairs.
    pub fn from_pairs<V, L, I>(pairs: I) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
        I: IntoIterator<Item = (V, L)>,
    {
        let mut set = Self::new();
        for (value, label) in pairs {
            set.push(value, None, label);
        }
        set
    }

    /// Builds a set from `(value, name, label)` triples.
    pub fn from_named<V, N, L, I>(triples: I) -> Self
    where
        V: Into<Value>,
        N: Into<String>,
        L: Into<String>,
        I: IntoIterator<Item = (V, N, L)>,
    {
        let mut set = Self::new();
        for (value, name, label) in triples {
            set.push(value, Some(name.into()), label);
        }
        set
    }

    pub fn push(&mut self, value: impl Into<Value>, name: Option<String>, label: impl Into<String>) {
        self.choices.push(Choice {
            value: value.into(),
            name,
            label: label.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Choice> {
        self.choices.iter()
    }

    pub fn values(&self) -> Vec<Value> {
        self.choices.iter().map(|c| c.value.clone()).collect()
    }

    /// Label shown for `value`, if it is part of the set.
    pub fn get_display(&self, value: &Value) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| &c.value == value)
            .map(|c| c.label.as_str())
    }

    /// Value declared under the symbolic `name`.
    pub fn value_by_name(&self, name: &str) -> Option<&Value> {
        self.choices
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
            .map(|c| &c.value)
    }

    /// Value → label map keyed by the value's display string.
    pub fn labels(&self) -> IndexMap<String, String> {
        self.choices
            .iter()
            .map(|c| (value_key(&c.value), c.label.clone()))
            .collect()
    }

    /// OpenAPI type shared by every value, or `None` for mixed sets.
    pub fn value_type(&self) -> Option<&'static str> {
        let mut types = self.choices.iter().map(|c| json_type(&c.value));
        let first = types.next()??;
        if types.all(|t| t == Some(first)) {
            Some(first)
        } else {
            None
        }
    }

    /// Markdown list describing each value, used in parameter and field descriptions.
    pub fn describe(&self, field_name: &str) -> String {
        let mut out = format!("Filter by {} \n", field_name);
        for choice in &self.choices {
            out.push_str(&format!(" * `{}` - {}\n", value_key(&choice.value), choice.label));
        }
        out
    }
}

/// String form used as a map key for a choice value.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        _ => None,
    }
}
