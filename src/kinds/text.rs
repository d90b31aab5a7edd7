//! Free text and the string formats built on it.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::{Error, Result};
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::SchemaNode;
use rand::Rng;
use serde_json::Value;

/// Shortest text produced when the field allows it.
pub const MIN_TEXT_LENGTH: usize = 20;
/// Longest text produced regardless of `max_length`.
pub const MAX_TEXT_LENGTH: usize = 80;

pub const SLUG_PATTERN: &str = "^[-a-zA-Z0-9_]+$";

const LOREM: &str = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua Ut enim ad minim veniam quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat Duis aute irure dolor \
in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur";

pub struct TextRule;

impl ExampleProducer for TextRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let (min_length, max_length) = (field.constraints.min_length, field.constraints.max_length);
        if let (Some(min), Some(max)) = (min_length, max_length) {
            if min > max {
                return Err(Error::example(
                    &field.name,
                    format!("min_length {} is greater than max_length {}", min, max),
                ));
            }
        }

        let rng = ctx.rng();
        let text = match field.kind {
            FieldKind::Email => {
                let local = format!("{}.{}", word(rng), word(rng));
                fit(field, "", local, "@example.com", rng)?
            }
            FieldKind::Url => {
                let path = word(rng);
                fit(field, "https://www.example.com/", path, "/", rng)?
            }
            FieldKind::Slug => {
                let slug = format!("{}-{}-{}", word(rng), word(rng), word(rng));
                fit(field, "", slug, "", rng)?
            }
            FieldKind::IpAddress => ipv4(field, rng)?,
            _ => lorem(min_length, max_length, rng),
        };
        Ok(Value::String(text))
    }
}

impl SchemaMappable for TextRule {
    fn map_schema(&self, field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        let mut node = SchemaNode::typed("string");
        match field.kind {
            FieldKind::Email => node.format = Some("email".to_string()),
            FieldKind::Url => node.format = Some("uri".to_string()),
            FieldKind::IpAddress => node.format = Some("ipv4".to_string()),
            FieldKind::Slug => node.pattern = Some(SLUG_PATTERN.to_string()),
            _ => {}
        }
        node.min_length = field.constraints.min_length;
        node.max_length = field.constraints.max_length;
        Ok(node)
    }
}

/// Lorem text whose length lies in the length window clamped to `20..=80`.
///
/// A `max_length` below the window is honoured as-is, and so is a `min_length` above it.
pub fn lorem<R: Rng + ?Sized>(min_length: Option<usize>, max_length: Option<usize>, rng: &mut R) -> String {
    let declared_min = min_length.unwrap_or(0);
    let max = match max_length {
        Some(max) if max < MIN_TEXT_LENGTH => max,
        Some(max) => max.min(MAX_TEXT_LENGTH).max(declared_min.min(max)),
        None => MAX_TEXT_LENGTH.max(declared_min),
    };
    let min = declared_min.max(MIN_TEXT_LENGTH).min(max);
    let length = rng.gen_range(min..=max);

    let offset = rng.gen_range(0..LOREM.len());
    let start = LOREM[offset..].find(' ').map(|i| offset + i + 1).unwrap_or(0);
    let text: String = LOREM[start..]
        .chars()
        .chain(" ".chars())
        .chain(LOREM.chars().cycle())
        .take(length)
        .collect();
    // Keep the declared length while avoiding a dangling space.
    if text.ends_with(' ') {
        format!("{}a", &text[..text.len() - 1])
    } else {
        text
    }
}

/// `prefix + body + suffix`, with the body rebuilt from letters when the whole falls
/// outside the field's length window.
fn fit<R: Rng + ?Sized>(
    field: &FieldDescriptor,
    prefix: &str,
    body: String,
    suffix: &str,
    rng: &mut R,
) -> Result<String> {
    let fixed = prefix.len() + suffix.len();
    let min = field.constraints.min_length.unwrap_or(0);
    let max = field.constraints.max_length.unwrap_or(usize::MAX);
    let total = fixed + body.len();
    if (min..=max).contains(&total) {
        return Ok(format!("{}{}{}", prefix, body, suffix));
    }

    let shortest = min.saturating_sub(fixed).max(1);
    let longest = max.saturating_sub(fixed);
    if longest < shortest {
        return Err(Error::example(
            &field.name,
            format!("no {} fits within {} characters", field.kind.name(), max),
        ));
    }
    let target = if total < min { shortest } else { longest };
    Ok(format!("{}{}{}", prefix, letters(target, rng), suffix))
}

/// Dotted quad whose length lies in the field's length window.
fn ipv4<R: Rng + ?Sized>(field: &FieldDescriptor, rng: &mut R) -> Result<String> {
    let min = field.constraints.min_length.unwrap_or(0).max(7);
    let max = field.constraints.max_length.unwrap_or(15).min(15);
    if min > max {
        return Err(Error::example(&field.name, "no IPv4 address fits the length window"));
    }

    let mut digits = [1usize; 4];
    let mut extra = rng.gen_range(min..=max) - 7;
    while extra > 0 {
        let octet = rng.gen_range(0..4);
        if digits[octet] < 3 {
            digits[octet] += 1;
            extra -= 1;
        }
    }
    let octets: Vec<String> = digits
        .iter()
        .map(|&width| match width {
            1 => rng.gen_range(1..=9u8),
            2 => rng.gen_range(10..=99u8),
            _ => rng.gen_range(100..=254u8),
        })
        .map(|octet| octet.to_string())
        .collect();
    Ok(octets.join("."))
}

/// `count` lowercase letters taken from the lorem text.
fn letters<R: Rng + ?Sized>(count: usize, rng: &mut R) -> String {
    let offset = rng.gen_range(0..LOREM.len());
    LOREM[offset..]
        .chars()
        .chain(LOREM.chars().cycle())
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .take(count)
        .collect()
}

fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words: Vec<&str> = LOREM.split_whitespace().collect();
    words[rng.gen_range(0..words.len())].to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use crate::examples::FieldExampleGenerator;
    use rand::SeedableRng;

    fn example(field: &FieldDescriptor, seed: &str) -> Result<String> {
        let generated = FieldExampleGenerator::new().generate(field, Some(seed))?;
        Ok(generated.primary().unwrap().value.as_str().unwrap().to_string())
    }

    #[test]
    fn test_lorem_default_window() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let text = lorem(None, None, &mut rng);
            assert!((20..=80).contains(&text.chars().count()), "{:?}", text);
        }
    }

    #[test]
    fn test_lorem_respects_short_max() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(lorem(None, Some(5), &mut rng).chars().count(), 5);
        }
    }

    #[test]
    fn test_lorem_respects_declared_window() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let count = lorem(Some(30), Some(40), &mut rng).chars().count();
            assert!((30..=40).contains(&count), "{}", count);
        }
    }

    #[test]
    fn test_lorem_caps_long_max() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert!(lorem(None, Some(500), &mut rng).chars().count() <= 80);
        }
    }

    #[test]
    fn test_zero_length() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(lorem(None, Some(0), &mut rng), "");
    }

    #[test]
    fn test_lorem_honours_min_above_window() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            assert!(lorem(Some(100), None, &mut rng).chars().count() >= 100);
        }
        let field = FieldDescriptor::new("bio", FieldKind::String).min_length(100);
        assert!(example(&field, "bio").unwrap().len() >= 100);
    }

    #[test]
    fn test_inverted_length_window_fails() {
        let field = FieldDescriptor::new("title", FieldKind::String).min_length(50).max_length(30);
        let err = example(&field, "title").unwrap_err();
        assert!(matches!(err, Error::ExampleGeneration { .. }));
    }

    #[test]
    fn test_formats_fit_length_window() {
        for seed in ["a", "b", "c", "d"] {
            let email = example(&FieldDescriptor::new("email", FieldKind::Email).max_length(16), seed).unwrap();
            assert!(email.len() <= 16 && email.ends_with("@example.com"), "{}", email);

            let email = example(&FieldDescriptor::new("email", FieldKind::Email).min_length(40), seed).unwrap();
            assert!(email.len() >= 40, "{}", email);

            let slug = example(&FieldDescriptor::new("slug", FieldKind::Slug).max_length(4), seed).unwrap();
            assert!(!slug.is_empty() && slug.len() <= 4, "{}", slug);

            let url = example(&FieldDescriptor::new("url", FieldKind::Url).max_length(28), seed).unwrap();
            assert!(url.len() <= 28 && url.starts_with("https://"), "{}", url);

            let ip = example(&FieldDescriptor::new("ip", FieldKind::IpAddress).max_length(8), seed).unwrap();
            assert!(ip.len() <= 8 && ip.split('.').count() == 4, "{}", ip);
        }
    }

    #[test]
    fn test_format_too_long_for_window_fails() {
        let field = FieldDescriptor::new("email", FieldKind::Email).max_length(12);
        assert!(matches!(example(&field, "x"), Err(Error::ExampleGeneration { .. })));

        let field = FieldDescriptor::new("ip", FieldKind::IpAddress).max_length(6);
        assert!(example(&field, "x").is_err());
    }
}
