//! Single and multiple choice fields.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::{Error, Result};
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::{SchemaNode, XChoices};
use rand::seq::index;
use rand::Rng;
use serde_json::Value;

pub struct ChoiceRule;

impl ExampleProducer for ChoiceRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let choices = field.choice_set();
        if choices.is_empty() {
            return Err(Error::example(&field.name, "choice field declares no choices"));
        }
        let values = choices.values();
        let rng = ctx.rng();

        if field.kind == FieldKind::MultipleChoice {
            let amount = rng.gen_range(1..=values.len());
            let mut picked = index::sample(rng, values.len(), amount).into_vec();
            picked.sort_unstable();
            return Ok(Value::Array(picked.into_iter().map(|i| values[i].clone()).collect()));
        }
        Ok(values[rng.gen_range(0..values.len())].clone())
    }
}

impl SchemaMappable for ChoiceRule {
    fn map_schema(&self, field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        let choices = field.choice_set();
        let mut item = SchemaNode::default();
        item.schema_type = choices.value_type().map(str::to_string);
        item.enum_values = Some(choices.values());

        let x_choices = Some(XChoices {
            choices: choices.labels(),
        });
        let description = Some(match &field.help_text {
            Some(help) => format!("{}<br/>{}", help, choices.describe(&field.name)),
            None => choices.describe(&field.name),
        });
        if field.kind == FieldKind::MultipleChoice {
            let mut node = SchemaNode::array(item);
            node.x_choices = x_choices;
            node.description = description;
            Ok(node)
        } else {
            item.x_choices = x_choices;
            item.description = description;
            Ok(item)
        }
    }
}
