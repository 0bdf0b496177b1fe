//! Engine-level errors.
//!
//! Almost nothing at this level is an error in the `Result` sense: parse
//! problems recover as literal text and evaluation problems become inline
//! markers. The one exception is the recursion guard: blowing past it
//! fails the whole substitution call rather than silently truncating.

use thiserror::Error;

/// Non-recoverable engine failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError
{
    /// Placeholder nesting exceeded the configured depth limit.
    ///
    /// The limit exists to bound stack growth on malformed or adversarial
    /// input; legitimate prompts sit nowhere near it.
    #[error("placeholder nesting exceeded the depth limit of {0}")]
    RecursionLimit(usize),
}
