//! Function dispatch: the closed tag set behind `${tag:...}`.
//!
//! Every branch expands its argument recursively before use, and no
//! failure propagates past this boundary; anything that goes wrong turns
//! into an inline `?{...}` / `?${...}` marker embedded in the output. The
//! only hard error is the recursion guard, which rides the outer `Result`.

use tracing::debug;

use vigil_core::context::{
    is_forbidden_frame_attr, is_forbidden_thread_attr, FrameAttr, FrameView, ThreadAttr, ThreadView,
};
use vigil_core::error::VigilError;
use vigil_core::value::Value;

use crate::cast::try_cast;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::format::apply_format;
use crate::scan::escape_only;
use crate::split::{parse_placeholder, ArgSpec};

/// `?${rawExpr}`: unknown function or malformed argument count.
fn raw_marker(expr: &str) -> Value
{
    Value::ErrorMarker(format!("?${{{expr}}}"))
}

/// `?{tag:detail}`: evaluation, cast, or format failure.
fn fail_marker(tag: &str, detail: &str) -> Value
{
    Value::ErrorMarker(format!("?{{{tag}:{detail}}}"))
}

impl Engine<'_>
{
    /// Evaluate one placeholder interior.
    pub(crate) fn substitute_expression(
        &self,
        expr: &str,
        depth: usize,
        numbers: bool,
    ) -> Result<Value, EngineError>
    {
        // ANSI escape wrapper: the rest of the span is the SGR code.
        if let Some(code) = expr.strip_prefix('[') {
            let expanded = self.substitute_value(code, depth + 1, false)?;
            return Ok(Value::Text(self.ctx.renderer().ansi_wrap(&expanded.render())));
        }

        let placeholder = match parse_placeholder(expr) {
            Ok(placeholder) => placeholder,
            Err(err) => {
                debug!(?err, expr, "malformed placeholder");
                return Ok(raw_marker(expr));
            }
        };
        let tag = placeholder.tag;
        let arg = placeholder.arg;

        // Chosen argument body and specifiers; conditionals reassign these
        // to the branch actually taken.
        let mut marker_arg = arg.body;
        let mut format_spec = arg.format;
        let mut cast_spec = arg.cast;

        let mut result = if let Some(condition) = tag.strip_prefix('?') {
            let right = placeholder.arg_right.unwrap_or_default();
            match self.conditional(condition, arg, right, depth, numbers)? {
                Ok((value, chosen)) => {
                    marker_arg = chosen.body;
                    // A specifier trailing the whole conditional composes
                    // onto a chosen branch that lacks its own.
                    format_spec = chosen.format.or(right.format);
                    cast_spec = chosen.cast.or(right.cast);
                    value
                }
                Err(marker) => return Ok(marker),
            }
        } else {
            match self.dispatch_tag(tag, arg.body, expr, depth)? {
                Ok(value) => value,
                Err(marker) => return Ok(marker),
            }
        };

        // Cast, then format; neither applies to an empty result, and a
        // failure marker is never re-cast or re-formatted.
        if let Some(spec) = cast_spec {
            if !result.is_empty() && !matches!(result, Value::ErrorMarker(_)) {
                let spec_text = self.substitute_value(spec, depth + 1, false)?.render();
                match try_cast(result.clone(), &spec_text, self.ctx) {
                    Ok(value) => result = value,
                    Err(err) => {
                        debug!(%err, spec = %spec_text, "cast failed");
                        let msg = err.to_string();
                        let detail = if msg.is_empty() {
                            format!("{marker_arg}#?{spec_text}")
                        } else {
                            format!("{marker_arg}#?{spec_text}!{msg}")
                        };
                        result = fail_marker(tag, &detail);
                    }
                }
            }
        }
        if let Some(spec) = format_spec {
            if !result.is_empty() && !matches!(result, Value::ErrorMarker(_)) {
                let pattern = escape_only(spec);
                match apply_format(&pattern, &result) {
                    Ok(text) => result = Value::Text(text),
                    Err(err) => {
                        debug!(%err, pattern = %pattern, "format failed");
                        result = fail_marker(tag, &format!("{marker_arg}|?{pattern}!{err}"));
                    }
                }
            }
        }
        Ok(result)
    }

    /// Non-conditional tags. The inner `Err` is a finished marker that
    /// skips the cast/format stages.
    fn dispatch_tag(
        &self,
        tag: &str,
        arg: &str,
        expr: &str,
        depth: usize,
    ) -> Result<Result<Value, Value>, EngineError>
    {
        let value = match tag {
            // Plain recursive substitution / concatenation.
            "" => self.substitute_value(arg, depth + 1, false)?,

            // Debuggee-context expression evaluation.
            "g" => {
                let expanded = self.substitute_value(arg, depth + 1, false)?.render();
                match self.ctx.evaluate_runtime(&expanded) {
                    Ok(value) => value,
                    Err(err) => return Ok(Err(fail_marker(tag, &format!("?{expanded}!{err}")))),
                }
            }

            // Host evaluation over bound placeholder values.
            "e" => match self.substitute_eval(arg, depth + 1)? {
                Ok(value) => value,
                Err(err) => return Ok(Err(fail_marker(tag, &format!("?{arg}!{err}")))),
            },

            // Configuration parameter lookup.
            "p" => {
                let name = self.substitute_value(arg, depth + 1, false)?.render();
                match self.ctx.parameter(&name) {
                    Ok(value) => value,
                    Err(err) => return Ok(Err(fail_marker(tag, &format!("?{arg}!{err}")))),
                }
            }

            "f" | "v" | "r" | "fn" | "n" | "nv" | "nr" => {
                let attr = self.substitute_value(arg, depth + 1, false)?.render();
                return Ok(self.frame_query(tag, &attr));
            }

            "t" | "tn" => {
                let attr = self.substitute_value(arg, depth + 1, false)?.render();
                return Ok(self.thread_query(tag, &attr));
            }

            _ => {
                debug!(err = %VigilError::UnknownFunction(tag.to_string()), "dispatch failed");
                return Ok(Err(raw_marker(expr)));
            }
        };
        Ok(Ok(value))
    }

    /// Ternary / coalesce evaluation. Returns the branch value and the
    /// branch's own specifiers, or a finished marker.
    fn conditional<'t>(
        &self,
        condition: &str,
        first: ArgSpec<'t>,
        right: ArgSpec<'t>,
        depth: usize,
        numbers: bool,
    ) -> Result<Result<(Value, ArgSpec<'t>), Value>, EngineError>
    {
        if condition.is_empty() {
            // Coalesce: use the substitution unless it comes up empty.
            let value = self.substitute_value(first.body, depth + 1, numbers)?;
            if !value.is_empty() {
                return Ok(Ok((value, first)));
            }
            let fallback = self.substitute_value(right.body, depth + 1, numbers)?;
            return Ok(Ok((fallback, right)));
        }

        // Ternary: the condition evaluates under the host evaluator, then
        // smart-bool picks the branch.
        let tag = format!("?{condition}");
        match self.substitute_eval(condition, depth + 1)? {
            Err(err) => {
                let shown = if right.body.is_empty() {
                    first.body.to_string()
                } else {
                    format!("{}:{}", first.body, right.body)
                };
                Ok(Err(fail_marker(&tag, &format!("{shown}!{err}"))))
            }
            Ok(cond_value) => {
                let chosen = if cond_value.truthy() { first } else { right };
                let value = self.substitute_value(chosen.body, depth + 1, numbers)?;
                Ok(Ok((value, chosen)))
            }
        }
    }

    /// Frame-scoped access: `f*` reads the selected frame, `n*` the
    /// newest; `v`/`r` read variables/registers, bare tags read frame
    /// attributes, `fn` is the frame number.
    fn frame_query(&self, tag: &str, attr: &str) -> Result<Value, Value>
    {
        // No frame without a valid thread. Validity probes coalesce to a
        // typed false; everything else is absent.
        let thread_valid = self.ctx.selected_thread().is_some_and(ThreadView::is_valid);
        if !thread_valid {
            if tag == "fn" || (attr != "is_valid" && !attr.is_empty()) {
                return Ok(Value::Absent);
            }
            return Ok(Value::Bool(false));
        }

        let frame = if tag.starts_with('n') {
            self.ctx.newest_frame()
        } else {
            self.ctx.selected_frame()
        };
        let Some(frame) = frame.filter(|f| f.is_valid()) else {
            let probe = (tag == "f" || tag == "n") && (attr == "is_valid" || attr.is_empty());
            return Ok(if probe { Value::Bool(false) } else { Value::Absent });
        };

        match tag {
            "v" | "nv" => {
                // Missing variables resolve silently to nothing.
                Ok(frame.read_variable(attr).unwrap_or(Value::Absent))
            }
            "r" | "nr" => match frame.read_register(attr) {
                Ok(value) => Ok(value),
                Err(err) => Err(fail_marker(tag, &format!("?{attr}!{err}"))),
            },
            _ => self.frame_attr(tag, attr, frame),
        }
    }

    fn frame_attr(&self, tag: &str, attr: &str, frame: &dyn FrameView) -> Result<Value, Value>
    {
        if tag == "fn" || attr == "num" {
            return Ok(frame.number().map_or(Value::Absent, |n| Value::Int(i128::from(n))));
        }
        if attr.is_empty() {
            return Ok(Value::Bool(true));
        }
        if is_forbidden_frame_attr(attr) {
            let err = VigilError::ForbiddenAttribute(attr.to_string());
            return Err(fail_marker(tag, &format!("?{attr}!{err}")));
        }
        match FrameAttr::from_name(attr) {
            Some(FrameAttr::IsValid) => Ok(Value::Bool(frame.is_valid())),
            Some(FrameAttr::Num) => {
                Ok(frame.number().map_or(Value::Absent, |n| Value::Int(i128::from(n))))
            }
            Some(FrameAttr::Name) => Ok(frame.name().map_or(Value::Absent, Value::Text)),
            Some(FrameAttr::Architecture) => Ok(frame.architecture().map_or(Value::Absent, Value::Text)),
            Some(FrameAttr::Pc) => Ok(frame.pc().map_or(Value::Absent, |pc| Value::Int(i128::from(pc)))),
            Some(FrameAttr::Type) => Ok(frame.frame_type().map_or(Value::Absent, Value::Text)),
            Some(FrameAttr::UnwindStopReason) => {
                Ok(frame.unwind_stop_reason().map_or(Value::Absent, Value::Text))
            }
            None => Err(fail_marker(tag, &format!("?{attr}"))),
        }
    }

    /// Thread attribute access; `tn` forces the `num` attribute.
    fn thread_query(&self, tag: &str, attr: &str) -> Result<Value, Value>
    {
        let thread = self.ctx.selected_thread().filter(|t| t.is_valid());
        let Some(thread) = thread else {
            // `tn` cannot coalesce to false; it is a number or nothing.
            if tag == "tn" || (attr != "is_valid" && !attr.is_empty()) {
                return Ok(Value::Absent);
            }
            return Ok(Value::Bool(false));
        };

        let attr = if tag == "tn" { "num" } else { attr };

        match attr {
            "pid" | "lwpid" | "tid" => {
                let (pid, lwpid, tid) = thread.ptid();
                let component = match attr {
                    "pid" => pid,
                    "lwpid" => lwpid,
                    _ => tid,
                };
                Ok(Value::Int(i128::from(component)))
            }
            "" => Ok(Value::Bool(true)),
            _ if is_forbidden_thread_attr(attr) => {
                let err = VigilError::ForbiddenAttribute(attr.to_string());
                Err(fail_marker(tag, &format!("?{attr}!{err}")))
            }
            _ => match ThreadAttr::from_name(attr) {
                Some(ThreadAttr::IsValid) => Ok(Value::Bool(thread.is_valid())),
                Some(ThreadAttr::Num) => {
                    Ok(thread.num().map_or(Value::Absent, |n| Value::Int(i128::from(n))))
                }
                Some(ThreadAttr::GlobalNum) => {
                    Ok(thread.global_num().map_or(Value::Absent, |n| Value::Int(i128::from(n))))
                }
                Some(ThreadAttr::Name) => Ok(thread.name().map_or(Value::Absent, Value::Text)),
                Some(ThreadAttr::IsStopped) => Ok(Value::Bool(thread.is_stopped())),
                Some(ThreadAttr::IsRunning) => Ok(Value::Bool(thread.is_running())),
                Some(ThreadAttr::IsExited) => Ok(Value::Bool(thread.is_exited())),
                Some(ThreadAttr::Pid | ThreadAttr::Lwpid | ThreadAttr::Tid) | None => {
                    Err(fail_marker(tag, &format!("?{attr}")))
                }
            },
        }
    }
}
