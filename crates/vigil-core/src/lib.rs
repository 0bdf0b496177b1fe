//! # vigil-core
//!
//! Debug-context value model and collaborator traits for Vigil.
//!
//! This crate provides everything the template engine consumes but does
//! not own, including:
//! - The evaluated-value model (`Value`, `RuntimeValue`)
//! - Target type descriptions and cached type-name resolution
//! - The read-only session traits (threads, frames, parameters, rendering)
//! - An in-memory snapshot implementation for tests and the CLI
//!
//! The engine itself lives in `vigil-engine`; a real debugger frontend
//! implements [`context::DebugContext`] over its own session state and
//! hands it to the engine per substitution call.

pub mod context;
pub mod error;
pub mod runtime;
pub mod snapshot;
pub mod types;
pub mod value;

pub use context::{DebugContext, FrameView, LineRenderer, ThreadView};
// Re-export commonly used types
pub use error::{Result, VigilError};
pub use runtime::{RuntimeData, RuntimeValue};
pub use snapshot::{FrameSnapshot, PlainRenderer, SnapshotContext, ThreadSnapshot};
pub use types::{TypeCache, TypeHandle, TypeKind, TypeResolver};
pub use value::Value;
