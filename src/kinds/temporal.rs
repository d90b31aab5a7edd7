//! Date, time, datetime and duration fields.
//!
//! Examples sit shortly before the generator's reference instant: up to 20 days,
//! 10 hours and 40 minutes earlier.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::Result;
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::SchemaNode;
use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use serde_json::Value;

const MAX_DAYS_BACK: i64 = 20;
const MAX_HOURS_BACK: i64 = 10;
const MAX_MINUTES_BACK: i64 = 40;

pub struct TemporalRule;

impl ExampleProducer for TemporalRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let anchor = ctx.reference_time();
        let rng = ctx.rng();
        let text = match field.kind {
            FieldKind::Duration => {
                let days = rng.gen_range(0..=MAX_DAYS_BACK);
                let hours = rng.gen_range(0..24);
                let minutes = rng.gen_range(0..60);
                let seconds = rng.gen_range(0..60);
                format!("{} {:02}:{:02}:{:02}", days, hours, minutes, seconds)
            }
            FieldKind::Date => earlier(anchor, rng).format("%Y-%m-%d").to_string(),
            FieldKind::Time => earlier(anchor, rng).format("%H:%M:%S").to_string(),
            _ => earlier(anchor, rng).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };
        Ok(Value::String(text))
    }
}

impl SchemaMappable for TemporalRule {
    fn map_schema(&self, field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        let node = SchemaNode::typed("string");
        Ok(match field.kind {
            FieldKind::Date => node.with_format("date"),
            FieldKind::Time => node.with_format("time"),
            FieldKind::Duration => node,
            _ => node.with_format("date-time"),
        })
    }
}

fn earlier<R: Rng + ?Sized>(anchor: NaiveDateTime, rng: &mut R) -> NaiveDateTime {
    let offset = Duration::days(rng.gen_range(0..=MAX_DAYS_BACK))
        + Duration::hours(rng.gen_range(0..=MAX_HOURS_BACK))
        + Duration::minutes(rng.gen_range(0..=MAX_MINUTES_BACK));
    anchor - offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_earlier_stays_within_window() {
        let anchor = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let value = earlier(anchor, &mut rng);
            assert!(value <= anchor);
            assert!(anchor - value <= Duration::days(20) + Duration::hours(10) + Duration::minutes(40));
        }
    }
}
