//! # Error Types
//!
//! Failure taxonomy shared by the engine and the context collaborators.
//!
//! We use `thiserror` to generate `Error` impls and display messages. Note
//! that almost none of these errors escape the engine: the dispatcher
//! converts every failure into an inline `?{...}` / `?${...}` marker in
//! the expansion output. Only the recursion guard aborts a whole call.
use thiserror::Error;

/// Main error type for prompt evaluation and context queries.
///
/// The message text is what ends up after the `!` in an inline error
/// marker, so variants keep their wording short and self-contained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VigilError
{
    /// Malformed placeholder text (unterminated bracket or escape).
    ///
    /// Recovered by copying the remainder through as literal text; this
    /// variant exists for collaborators and tests that want to observe the
    /// condition directly.
    #[error("unterminated expression")]
    Parse,

    /// The function tag is not in the closed tag set.
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    /// The attribute would mutate global debugger state (`select`/`switch`).
    #[error("attribute '{0}' would change debugger state")]
    ForbiddenAttribute(String),

    /// A collaborator query or sub-evaluation failed.
    #[error("{0}")]
    Evaluation(String),

    /// The cast specifier could not be applied to the value.
    #[error("{0}")]
    Cast(String),

    /// The format specifier could not be applied to the value.
    #[error("{0}")]
    Format(String),

    /// A conditional received more than two branch arguments.
    #[error("too many arguments")]
    TooManyArguments,
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, VigilError>;
