//! Template engine orchestration.
//!
//! The engine scans literal text for unescaped `${…}` placeholders, hands
//! each interior span to the dispatcher, and splices the results back in.
//! Expansion is one-shot: evaluated values are never re-scanned, so a
//! value containing `${` stays inert in the output.

use smallvec::SmallVec;

use vigil_core::context::DebugContext;
use vigil_core::error::Result as CoreResult;
use vigil_core::value::{maybe_number, Value};

use crate::error::EngineError;
use crate::expr;
use crate::scan::{escape_only, find_separator};

/// Engine behavior knobs.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig
{
    /// Maximum placeholder nesting depth before the whole call fails.
    pub max_depth: usize,
}

impl Default for EngineConfig
{
    fn default() -> Self
    {
        Self { max_depth: 64 }
    }
}

/// One expanded span of a template.
pub(crate) enum Segment
{
    /// Literal text, already escape-substituted.
    Literal(String),
    /// An evaluated placeholder.
    Placeholder(Value),
}

/// Prompt template engine bound to one read-only debugging context.
///
/// The borrowed context must stay stable for the duration of each call;
/// the engine itself keeps no state between calls.
pub struct Engine<'a>
{
    pub(crate) ctx: &'a dyn DebugContext,
    config: EngineConfig,
}

impl<'a> Engine<'a>
{
    /// Engine with default configuration.
    pub fn new(ctx: &'a dyn DebugContext) -> Self
    {
        Self { ctx, config: EngineConfig::default() }
    }

    /// Engine with explicit configuration.
    pub fn with_config(ctx: &'a dyn DebugContext, config: EngineConfig) -> Self
    {
        Self { ctx, config }
    }

    /// Expand `template` and stringify the result.
    ///
    /// Never fails on template content; the only error is the recursion
    /// guard.
    pub fn substitute(&self, template: &str) -> Result<String, EngineError>
    {
        Ok(self.substitute_value(template, 0, false)?.render())
    }

    /// Expand `template`, preserving the native type when the whole
    /// template is a single placeholder with no literal text.
    pub fn substitute_typed(&self, template: &str) -> Result<Value, EngineError>
    {
        self.substitute_value(template, 0, false)
    }

    /// Core recursive substitution.
    ///
    /// `numbers` requests literal-to-number promotion for an expansion
    /// that contains no placeholders (ternary branches want `5` back as
    /// an integer).
    pub(crate) fn substitute_value(
        &self,
        text: &str,
        depth: usize,
        numbers: bool,
    ) -> Result<Value, EngineError>
    {
        let mut segments = self.scan(text, depth, numbers)?;
        if segments.len() > 1 {
            let mut out = String::new();
            for segment in &segments {
                match segment {
                    Segment::Literal(s) => out.push_str(s),
                    Segment::Placeholder(v) => out.push_str(&v.render()),
                }
            }
            return Ok(Value::Text(out));
        }
        match segments.pop() {
            None => Ok(Value::Absent),
            Some(Segment::Placeholder(value)) => Ok(value),
            Some(Segment::Literal(s)) => {
                if numbers {
                    Ok(maybe_number(&s))
                } else {
                    Ok(Value::Text(s))
                }
            }
        }
    }

    /// Evaluate-mode substitution: bind each top-level placeholder's value
    /// positionally, rewrite the template into an expression over
    /// `arg[N]`, and run the sandboxed evaluator once.
    ///
    /// The inner `Result` carries soft failures for the caller to turn
    /// into inline markers.
    pub(crate) fn substitute_eval(
        &self,
        text: &str,
        depth: usize,
    ) -> Result<CoreResult<Value>, EngineError>
    {
        let segments = self.scan(text, depth, true)?;
        let mut bindings: Vec<Value> = Vec::new();
        let mut expression = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(s) => expression.push_str(&s),
                Segment::Placeholder(value) => {
                    expression.push_str(&format!("arg[{}]", bindings.len()));
                    bindings.push(value);
                }
            }
        }
        if expression.is_empty() {
            return Ok(Ok(Value::Absent));
        }
        Ok(expr::evaluate(&expression, &bindings))
    }

    /// Split `text` into literal runs and evaluated placeholders.
    ///
    /// A `${` without a matching `}` is not an error: the remainder,
    /// dangling `${` included, is treated as literal text.
    fn scan(
        &self,
        text: &str,
        depth: usize,
        numbers: bool,
    ) -> Result<SmallVec<[Segment; 4]>, EngineError>
    {
        if depth > self.config.max_depth {
            return Err(EngineError::RecursionLimit(self.config.max_depth));
        }

        let bytes = text.as_bytes();
        let mut segments: SmallVec<[Segment; 4]> = SmallVec::new();
        let mut part_start = 0;
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if bytes[i] != b'$' || bytes[i + 1] != b'{' {
                i += 1;
                continue;
            }
            let Some(ket) = find_separator(text, i + 2, b'}') else {
                break;
            };
            if i != part_start {
                segments.push(Segment::Literal(escape_only(&text[part_start..i])));
            }
            let value = self.substitute_expression(&text[i + 2..ket], depth, numbers)?;
            segments.push(Segment::Placeholder(value));
            part_start = ket + 1;
            i = part_start;
        }
        if part_start < bytes.len() {
            segments.push(Segment::Literal(escape_only(&text[part_start..])));
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use vigil_core::snapshot::SnapshotContext;

    #[test]
    fn test_literal_only_equals_escape_only()
    {
        let ctx = SnapshotContext::new();
        let engine = Engine::new(&ctx);
        for template in ["plain text", "a\\:b", "\\${x}", "tail\\"] {
            assert_eq!(engine.substitute(template).unwrap(), escape_only(template));
        }
    }

    #[test]
    fn test_unterminated_placeholder_passes_through()
    {
        let ctx = SnapshotContext::new();
        let engine = Engine::new(&ctx);
        assert_eq!(engine.substitute("${r:eax").unwrap(), "${r:eax");
        assert_eq!(engine.substitute("x${").unwrap(), "x${");
    }

    #[test]
    fn test_recursion_guard()
    {
        let ctx = SnapshotContext::new();
        let engine = Engine::with_config(&ctx, EngineConfig { max_depth: 4 });
        // Each nested placeholder adds a level; eight is past the limit.
        let template = "${:${:${:${:${:${:${:${:x}}}}}}}}";
        assert_eq!(engine.substitute(template), Err(EngineError::RecursionLimit(4)));
    }
}
