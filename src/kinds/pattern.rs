//! Regex-constrained strings.
//!
//! Examples are synthesized by walking the pattern's HIR, then checked against the
//! compiled pattern. Constructs the walk cannot honour (word boundaries, for instance)
//! get a few more attempts before generation gives up.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::{Error, Result};
use crate::examples::ExampleContext;
use crate::field::FieldDescriptor;
use crate::schema::SchemaNode;
use rand::Rng;
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind};
use serde_json::Value;

const MAX_ATTEMPTS: usize = 16;
/// Extra repetitions allowed beyond a quantifier's minimum.
const MAX_EXTRA_REPEAT: u32 = 8;
const UNBOUNDED_EXTRA_REPEAT: u32 = 3;

pub struct PatternRule;

impl ExampleProducer for PatternRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        let pattern = field
            .constraints
            .pattern
            .as_deref()
            .ok_or_else(|| Error::example(&field.name, "regex field declares no pattern"))?;
        synthesize(&field.name, pattern, ctx.rng()).map(Value::String)
    }
}

impl SchemaMappable for PatternRule {
    fn map_schema(&self, field: &FieldDescriptor, _ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        let mut node = SchemaNode::typed("string");
        node.pattern = field.constraints.pattern.clone();
        node.min_length = field.constraints.min_length;
        node.max_length = field.constraints.max_length;
        Ok(node)
    }
}

/// Generates a string fully matched by `pattern`.
pub fn synthesize<R: Rng + ?Sized>(field: &str, pattern: &str, rng: &mut R) -> Result<String> {
    let compiled = Regex::new(pattern)
        .map_err(|e| Error::example(field, format!("invalid pattern `{}`: {}", pattern, e)))?;
    let hir = regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|e| Error::example(field, format!("invalid pattern `{}`: {}", pattern, e)))?;

    for _ in 0..MAX_ATTEMPTS {
        let mut out = String::new();
        if emit(&hir, rng, &mut out) && compiled.is_match(&out) {
            return Ok(out);
        }
    }
    Err(Error::example(
        field,
        format!("could not produce a string matching `{}`", pattern),
    ))
}

fn emit<R: Rng + ?Sized>(hir: &Hir, rng: &mut R, out: &mut String) -> bool {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => true,
        HirKind::Literal(literal) => {
            out.push_str(&String::from_utf8_lossy(&literal.0));
            true
        }
        HirKind::Class(Class::Unicode(class)) => {
            let ranges: Vec<(char, char)> = class.ranges().iter().map(|r| (r.start(), r.end())).collect();
            push_from(&ranges, rng, out)
        }
        HirKind::Class(Class::Bytes(class)) => {
            let ranges: Vec<(char, char)> = class
                .ranges()
                .iter()
                .map(|r| (char::from(r.start()), char::from(r.end())))
                .collect();
            push_from(&ranges, rng, out)
        }
        HirKind::Repetition(repetition) => {
            let min = repetition.min;
            let max = match repetition.max {
                Some(max) => max.min(min.saturating_add(MAX_EXTRA_REPEAT)),
                None => min.saturating_add(UNBOUNDED_EXTRA_REPEAT),
            };
            let count = rng.gen_range(min..=max.max(min));
            (0..count).all(|_| emit(&repetition.sub, rng, out))
        }
        HirKind::Capture(capture) => emit(&capture.sub, rng, out),
        HirKind::Concat(parts) => parts.iter().all(|part| emit(part, rng, out)),
        HirKind::Alternation(branches) => {
            if branches.is_empty() {
                return false;
            }
            let branch = &branches[rng.gen_range(0..branches.len())];
            emit(branch, rng, out)
        }
    }
}

fn push_from<R: Rng + ?Sized>(ranges: &[(char, char)], rng: &mut R, out: &mut String) -> bool {
    match pick_char(ranges, rng) {
        Some(c) => {
            out.push(c);
            true
        }
        None => false,
    }
}

/// Prefers ASCII alphanumerics, then printable ASCII, then anything in the class.
fn pick_char<R: Rng + ?Sized>(ranges: &[(char, char)], rng: &mut R) -> Option<char> {
    let printable: Vec<char> = ranges
        .iter()
        .flat_map(|&(start, end)| start..=end.min('~'))
        .filter(|c| *c == ' ' || c.is_ascii_graphic())
        .collect();
    let alphanumeric: Vec<char> = printable.iter().copied().filter(char::is_ascii_alphanumeric).collect();

    for pool in [&alphanumeric, &printable] {
        if !pool.is_empty() {
            return Some(pool[rng.gen_range(0..pool.len())]);
        }
    }

    let &(start, end) = ranges.first()?;
    let code = rng.gen_range(u32::from(start)..=u32::from(end));
    char::from_u32(code).or(Some(start))
}
