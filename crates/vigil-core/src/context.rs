//! # Context Traits
//!
//! The collaborator seam between the template engine and a live debugging
//! session.
//!
//! The engine never talks to a debugger directly: everything it can observe
//! goes through these traits, which makes the engine trivially testable
//! against the in-memory [`crate::snapshot::SnapshotContext`] and keeps the
//! real frontend free to back them with whatever session object it owns.
//!
//! Attribute access is a closed enumeration resolved by explicit matching,
//! not open reflection. The two attribute names that would mutate global
//! debugger state as a side effect (`select` on frames, `switch` on
//! threads) are recognized and rejected up front; they are not legitimate
//! read-only queries.

use crate::error::Result;
use crate::types::TypeHandle;
use crate::value::Value;

/// One activation record in a call-stack snapshot.
///
/// All queries are read-only. `number` is the frame's distance to the
/// newest frame (0 = newest), mirroring how a stack listing counts.
pub trait FrameView
{
    /// Whether the frame handle is still valid.
    fn is_valid(&self) -> bool;

    /// Frame number: distance to the newest frame.
    fn number(&self) -> Option<u64>;

    /// Function name, if known.
    fn name(&self) -> Option<String>;

    /// Architecture name of the frame, if known.
    fn architecture(&self) -> Option<String>;

    /// Program counter.
    fn pc(&self) -> Option<u64>;

    /// Frame kind (normal, inline, signal trampoline, ...).
    fn frame_type(&self) -> Option<String>;

    /// Why unwinding stopped at this frame, if it did.
    fn unwind_stop_reason(&self) -> Option<String>;

    /// Read a register by name.
    fn read_register(&self, name: &str) -> Result<Value>;

    /// Read a variable visible in this frame by name.
    fn read_variable(&self, name: &str) -> Result<Value>;
}

/// An execution context with numeric and OS-level identifiers.
pub trait ThreadView
{
    /// Whether the thread handle is still valid.
    fn is_valid(&self) -> bool;

    /// Per-inferior thread number.
    fn num(&self) -> Option<i64>;

    /// Debugger-global thread number.
    fn global_num(&self) -> Option<i64>;

    /// Thread name, if the target assigned one.
    fn name(&self) -> Option<String>;

    /// The `(pid, lwpid, tid)` identifier triple.
    fn ptid(&self) -> (i64, i64, i64);

    /// Whether the thread is currently stopped.
    fn is_stopped(&self) -> bool;

    /// Whether the thread is currently running.
    fn is_running(&self) -> bool;

    /// Whether the thread has exited.
    fn is_exited(&self) -> bool;
}

/// Rendering primitive for ANSI output.
///
/// The engine only ever wraps SGR codes and delegates byte dumps; the
/// actual color bookkeeping (minimal-diff sequences and so on) lives with
/// the implementor.
pub trait LineRenderer
{
    /// Wrap an SGR code sequence, or return empty text when ANSI output is
    /// disabled.
    fn ansi_wrap(&self, code: &str) -> String;

    /// Render bytes as a highlighted dump string.
    fn highlight_dump(&self, bytes: &[u8]) -> String;
}

/// Read-only view of a debugging session.
///
/// One instance is handed to the engine per top-level substitution call
/// and must stay stable for its duration; every method is a synchronous,
/// side-effect-free read.
pub trait DebugContext
{
    /// Currently selected thread, if any.
    fn selected_thread(&self) -> Option<&dyn ThreadView>;

    /// Currently selected frame, if any.
    fn selected_frame(&self) -> Option<&dyn FrameView>;

    /// Newest (innermost) frame, if any.
    fn newest_frame(&self) -> Option<&dyn FrameView>;

    /// Look up a named configuration parameter.
    fn parameter(&self, name: &str) -> Result<Value>;

    /// Evaluate an expression in the debuggee context (tag `g`).
    fn evaluate_runtime(&self, expression: &str) -> Result<Value>;

    /// Resolve a type name, through the session's type cache.
    fn resolve_type(&self, name: &str) -> Option<TypeHandle>;

    /// The session's rendering primitive.
    fn renderer(&self) -> &dyn LineRenderer;
}

/// Closed set of frame attributes reachable from a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAttr
{
    /// Frame validity probe.
    IsValid,
    /// Frame number (distance to newest).
    Num,
    /// Function name.
    Name,
    /// Architecture name.
    Architecture,
    /// Program counter.
    Pc,
    /// Frame kind.
    Type,
    /// Unwind stop reason.
    UnwindStopReason,
}

impl FrameAttr
{
    /// Explicit name matching. `None` for anything outside the closed set.
    pub fn from_name(name: &str) -> Option<Self>
    {
        match name {
            "is_valid" => Some(FrameAttr::IsValid),
            "num" => Some(FrameAttr::Num),
            "name" => Some(FrameAttr::Name),
            "architecture" => Some(FrameAttr::Architecture),
            "pc" => Some(FrameAttr::Pc),
            "type" => Some(FrameAttr::Type),
            "unwind_stop_reason" => Some(FrameAttr::UnwindStopReason),
            _ => None,
        }
    }
}

/// Closed set of thread attributes reachable from a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAttr
{
    /// Thread validity probe.
    IsValid,
    /// Per-inferior thread number.
    Num,
    /// Thread name.
    Name,
    /// Debugger-global thread number.
    GlobalNum,
    /// Process id component of the identifier triple.
    Pid,
    /// Light-weight process id component of the identifier triple.
    Lwpid,
    /// Thread id component of the identifier triple.
    Tid,
    /// Stopped state probe.
    IsStopped,
    /// Running state probe.
    IsRunning,
    /// Exited state probe.
    IsExited,
}

impl ThreadAttr
{
    /// Explicit name matching. `None` for anything outside the closed set.
    pub fn from_name(name: &str) -> Option<Self>
    {
        match name {
            "is_valid" => Some(ThreadAttr::IsValid),
            "num" => Some(ThreadAttr::Num),
            "name" => Some(ThreadAttr::Name),
            "global_num" => Some(ThreadAttr::GlobalNum),
            "pid" => Some(ThreadAttr::Pid),
            "lwpid" => Some(ThreadAttr::Lwpid),
            "tid" => Some(ThreadAttr::Tid),
            "is_stopped" => Some(ThreadAttr::IsStopped),
            "is_running" => Some(ThreadAttr::IsRunning),
            "is_exited" => Some(ThreadAttr::IsExited),
            _ => None,
        }
    }
}

/// Whether a frame attribute name is the state-mutating `select`.
pub fn is_forbidden_frame_attr(name: &str) -> bool
{
    name == "select"
}

/// Whether a thread attribute name is the state-mutating `switch`.
pub fn is_forbidden_thread_attr(name: &str) -> bool
{
    name == "switch"
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_frame_attr_closed_set()
    {
        assert_eq!(FrameAttr::from_name("pc"), Some(FrameAttr::Pc));
        assert_eq!(FrameAttr::from_name("num"), Some(FrameAttr::Num));
        // Mutators and unknowns are simply absent from the enumeration.
        assert_eq!(FrameAttr::from_name("select"), None);
        assert_eq!(FrameAttr::from_name("older"), None);
        assert!(is_forbidden_frame_attr("select"));
    }

    #[test]
    fn test_thread_attr_closed_set()
    {
        assert_eq!(ThreadAttr::from_name("lwpid"), Some(ThreadAttr::Lwpid));
        assert_eq!(ThreadAttr::from_name("switch"), None);
        assert!(is_forbidden_thread_attr("switch"));
    }
}
