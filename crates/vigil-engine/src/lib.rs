//! # vigil-engine
//!
//! Prompt template substitution and expression evaluation for Vigil.
//!
//! Templates are plain text with `${…}` placeholders that query the live
//! debugging session: registers, variables, frame and thread metadata,
//! configuration parameters. Placeholders nest, carry optional `#cast`
//! and `|format` specifiers, and support conditional selection. The error
//! model is deliberately fault-tolerant: a failing sub-expression turns
//! into a visible inline marker instead of aborting the expansion.
//!
//! ## Example
//!
//! ```rust
//! use vigil_core::{FrameSnapshot, RuntimeValue, SnapshotContext, ThreadSnapshot};
//! use vigil_engine::Engine;
//!
//! let ctx = SnapshotContext::new()
//!     .with_thread(ThreadSnapshot::new(1))
//!     .with_frame(FrameSnapshot::new(0).with_register("eax", RuntimeValue::from_int(255)));
//! let engine = Engine::new(&ctx);
//! let out = engine.substitute("eax=${r:eax|%08X}")?;
//! assert_eq!(out, "eax=000000FF");
//! # Ok::<(), vigil_engine::EngineError>(())
//! ```

pub mod cast;
mod dispatch;
pub mod engine;
pub mod error;
pub mod expr;
pub mod format;
pub mod scan;
pub mod split;

pub use engine::{Engine, EngineConfig};
// Re-export commonly used items
pub use error::EngineError;
pub use scan::escape_only;
