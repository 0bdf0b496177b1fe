//! In-memory debugging session snapshot.
//!
//! [`SnapshotContext`] implements every collaborator trait over plain maps
//! and vectors. The CLI uses it to demo template expansion without a live
//! target, and the engine's tests drive all of their scenarios through it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::context::{DebugContext, FrameView, LineRenderer, ThreadView};
use crate::error::{Result, VigilError};
use crate::runtime::RuntimeValue;
use crate::types::{PrimitiveResolver, TypeCache, TypeHandle};
use crate::value::Value;

/// A captured stack frame.
///
/// `number` is the distance to the newest frame; the context keeps frames
/// ordered newest-first, so it normally equals the frame's index.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot
{
    /// Distance to the newest frame (0 = newest).
    pub number: u64,
    /// Function name.
    pub name: Option<String>,
    /// Architecture name.
    pub architecture: Option<String>,
    /// Program counter.
    pub pc: Option<u64>,
    /// Frame kind.
    pub frame_type: Option<String>,
    /// Unwind stop reason.
    pub unwind_stop_reason: Option<String>,
    /// Registers by name.
    pub registers: HashMap<String, RuntimeValue>,
    /// Variables visible in the frame, by name.
    pub variables: HashMap<String, Value>,
    /// Validity flag; an invalidated frame answers like a missing one.
    pub valid: bool,
}

impl FrameSnapshot
{
    /// A valid, empty frame at the given stack distance.
    pub fn new(number: u64) -> Self
    {
        Self { number, valid: true, ..Self::default() }
    }

    /// Set the function name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self
    {
        self.name = Some(name.into());
        self
    }

    /// Set the program counter.
    #[must_use]
    pub fn with_pc(mut self, pc: u64) -> Self
    {
        self.pc = Some(pc);
        self
    }

    /// Add a register value.
    #[must_use]
    pub fn with_register(mut self, name: impl Into<String>, value: RuntimeValue) -> Self
    {
        self.registers.insert(name.into(), value);
        self
    }

    /// Add a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self
    {
        self.variables.insert(name.into(), value);
        self
    }
}

impl FrameView for FrameSnapshot
{
    fn is_valid(&self) -> bool
    {
        self.valid
    }

    fn number(&self) -> Option<u64>
    {
        Some(self.number)
    }

    fn name(&self) -> Option<String>
    {
        self.name.clone()
    }

    fn architecture(&self) -> Option<String>
    {
        self.architecture.clone()
    }

    fn pc(&self) -> Option<u64>
    {
        self.pc
    }

    fn frame_type(&self) -> Option<String>
    {
        self.frame_type.clone()
    }

    fn unwind_stop_reason(&self) -> Option<String>
    {
        self.unwind_stop_reason.clone()
    }

    fn read_register(&self, name: &str) -> Result<Value>
    {
        self.registers
            .get(name)
            .map(|rv| Value::Runtime(rv.clone()))
            .ok_or_else(|| VigilError::Evaluation(format!("no register named {name:?}")))
    }

    fn read_variable(&self, name: &str) -> Result<Value>
    {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| VigilError::Evaluation(format!("no symbol {name:?} in current context")))
    }
}

/// A captured thread.
#[derive(Debug, Clone)]
pub struct ThreadSnapshot
{
    /// Per-inferior thread number.
    pub num: i64,
    /// Debugger-global thread number.
    pub global_num: i64,
    /// Thread name.
    pub name: Option<String>,
    /// `(pid, lwpid, tid)` identifier triple.
    pub ptid: (i64, i64, i64),
    /// Stopped flag.
    pub stopped: bool,
    /// Exited flag.
    pub exited: bool,
    /// Validity flag.
    pub valid: bool,
}

impl ThreadSnapshot
{
    /// A valid, stopped thread with the given number.
    pub fn new(num: i64) -> Self
    {
        Self {
            num,
            global_num: num,
            name: None,
            ptid: (0, 0, 0),
            stopped: true,
            exited: false,
            valid: true,
        }
    }

    /// Set the thread name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self
    {
        self.name = Some(name.into());
        self
    }

    /// Set the identifier triple.
    #[must_use]
    pub fn with_ptid(mut self, pid: i64, lwpid: i64, tid: i64) -> Self
    {
        self.ptid = (pid, lwpid, tid);
        self
    }
}

impl ThreadView for ThreadSnapshot
{
    fn is_valid(&self) -> bool
    {
        self.valid
    }

    fn num(&self) -> Option<i64>
    {
        Some(self.num)
    }

    fn global_num(&self) -> Option<i64>
    {
        Some(self.global_num)
    }

    fn name(&self) -> Option<String>
    {
        self.name.clone()
    }

    fn ptid(&self) -> (i64, i64, i64)
    {
        self.ptid
    }

    fn is_stopped(&self) -> bool
    {
        self.stopped && !self.exited
    }

    fn is_running(&self) -> bool
    {
        !self.stopped && !self.exited
    }

    fn is_exited(&self) -> bool
    {
        self.exited
    }
}

/// Minimal [`LineRenderer`]: bare SGR wrapping, printable-or-dot dumps.
#[derive(Debug, Clone, Copy)]
pub struct PlainRenderer
{
    /// Whether ANSI sequences are emitted at all.
    pub ansi_enabled: bool,
}

impl Default for PlainRenderer
{
    fn default() -> Self
    {
        Self { ansi_enabled: true }
    }
}

impl LineRenderer for PlainRenderer
{
    fn ansi_wrap(&self, code: &str) -> String
    {
        if !self.ansi_enabled {
            return String::new();
        }
        format!("\x1b[{code}m")
    }

    fn highlight_dump(&self, bytes: &[u8]) -> String
    {
        bytes
            .iter()
            .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
            .collect()
    }
}

/// In-memory implementation of [`DebugContext`].
///
/// Frames are stored newest-first. Runtime expression results for tag `g`
/// come from a canned table keyed by the exact expression text.
pub struct SnapshotContext
{
    threads: Vec<ThreadSnapshot>,
    selected_thread: Option<usize>,
    frames: Vec<FrameSnapshot>,
    selected_frame: Option<usize>,
    parameters: HashMap<String, Value>,
    runtime_results: HashMap<String, Value>,
    type_cache: RefCell<TypeCache>,
    resolver: PrimitiveResolver,
    renderer: PlainRenderer,
}

impl Default for SnapshotContext
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl SnapshotContext
{
    /// An empty session: no threads, no frames, no parameters.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            threads: Vec::new(),
            selected_thread: None,
            frames: Vec::new(),
            selected_frame: None,
            parameters: HashMap::new(),
            runtime_results: HashMap::new(),
            type_cache: RefCell::new(TypeCache::new()),
            resolver: PrimitiveResolver,
            renderer: PlainRenderer::default(),
        }
    }

    /// Append a thread; the first one becomes the selected thread.
    #[must_use]
    pub fn with_thread(mut self, thread: ThreadSnapshot) -> Self
    {
        self.threads.push(thread);
        if self.selected_thread.is_none() {
            self.selected_thread = Some(0);
        }
        self
    }

    /// Append a frame (newest-first); the first one becomes selected.
    #[must_use]
    pub fn with_frame(mut self, frame: FrameSnapshot) -> Self
    {
        self.frames.push(frame);
        if self.selected_frame.is_none() {
            self.selected_frame = Some(0);
        }
        self
    }

    /// Select a frame by index into the newest-first list.
    #[must_use]
    pub fn select_frame(mut self, index: usize) -> Self
    {
        self.selected_frame = Some(index);
        self
    }

    /// Set a configuration parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self
    {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Can a runtime-expression result for tag `g`.
    #[must_use]
    pub fn with_runtime_result(mut self, expression: impl Into<String>, value: Value) -> Self
    {
        self.runtime_results.insert(expression.into(), value);
        self
    }

    /// Replace the renderer configuration.
    #[must_use]
    pub fn with_renderer(mut self, renderer: PlainRenderer) -> Self
    {
        self.renderer = renderer;
        self
    }

    /// Clear the type cache, as a "target objects reloaded" handler would.
    pub fn invalidate_types(&self)
    {
        self.type_cache.borrow_mut().invalidate();
    }
}

impl DebugContext for SnapshotContext
{
    fn selected_thread(&self) -> Option<&dyn ThreadView>
    {
        self.selected_thread
            .and_then(|i| self.threads.get(i))
            .map(|t| t as &dyn ThreadView)
    }

    fn selected_frame(&self) -> Option<&dyn FrameView>
    {
        self.selected_frame
            .and_then(|i| self.frames.get(i))
            .map(|f| f as &dyn FrameView)
    }

    fn newest_frame(&self) -> Option<&dyn FrameView>
    {
        self.frames.first().map(|f| f as &dyn FrameView)
    }

    fn parameter(&self, name: &str) -> Result<Value>
    {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| VigilError::Evaluation(format!("no parameter named {name:?}")))
    }

    fn evaluate_runtime(&self, expression: &str) -> Result<Value>
    {
        self.runtime_results
            .get(expression)
            .cloned()
            .ok_or_else(|| VigilError::Evaluation(format!("cannot evaluate {expression:?}")))
    }

    fn resolve_type(&self, name: &str) -> Option<TypeHandle>
    {
        self.type_cache.borrow_mut().resolve_with(&self.resolver, name)
    }

    fn renderer(&self) -> &dyn LineRenderer
    {
        &self.renderer
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_snapshot_selection()
    {
        let ctx = SnapshotContext::new()
            .with_thread(ThreadSnapshot::new(1))
            .with_frame(FrameSnapshot::new(0).with_name("inner"))
            .with_frame(FrameSnapshot::new(1).with_name("outer"))
            .select_frame(1);

        assert_eq!(ctx.newest_frame().unwrap().name().as_deref(), Some("inner"));
        assert_eq!(ctx.selected_frame().unwrap().name().as_deref(), Some("outer"));
        assert_eq!(ctx.selected_frame().unwrap().number(), Some(1));
    }

    #[test]
    fn test_register_and_variable_lookup()
    {
        let frame = FrameSnapshot::new(0)
            .with_register("eax", RuntimeValue::from_int(255))
            .with_variable("x", Value::Int(7));

        assert!(frame.read_register("eax").is_ok());
        assert!(frame.read_register("ebx").is_err());
        assert_eq!(frame.read_variable("x").unwrap(), Value::Int(7));
        assert!(frame.read_variable("y").is_err());
    }

    #[test]
    fn test_type_resolution_and_invalidation()
    {
        let ctx = SnapshotContext::new();
        assert!(ctx.resolve_type("unsigned long").is_some());
        assert!(ctx.resolve_type("no such type").is_none());
        // Reload notification clears the cache; lookups still work after.
        ctx.invalidate_types();
        assert!(ctx.resolve_type("unsigned long").is_some());
    }

    #[test]
    fn test_plain_renderer()
    {
        let on = PlainRenderer { ansi_enabled: true };
        let off = PlainRenderer { ansi_enabled: false };
        assert_eq!(on.ansi_wrap("1;32"), "\x1b[1;32m");
        assert_eq!(off.ansi_wrap("1;32"), "");
        assert_eq!(on.highlight_dump(b"a\x01b"), "a.b");
    }
}
