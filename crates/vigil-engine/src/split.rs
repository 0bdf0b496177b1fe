//! Placeholder decomposition.
//!
//! Interior placeholder text has the shape `tag:arg[:arg2]`, where each
//! argument may carry trailing `|format` and `#cast` specifiers. All
//! splitting is depth-aware, so separators inside nested `${…}` spans are
//! protected without manual escaping.

use crate::scan::split_on_separator;

/// Tags that may appear with no argument at all (`${f}`, `${tn}`, ...).
/// They are validity or number probes; every other tag needs a `:`.
fn allows_missing_argument(tag: &str) -> bool
{
    matches!(tag, "f" | "n" | "t" | "fn" | "tn")
}

/// One argument with its trailing specifiers stripped off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArgSpec<'a>
{
    /// The argument text itself (still unexpanded).
    pub body: &'a str,
    /// Trailing `|format` specifier, if present.
    pub format: Option<&'a str>,
    /// Trailing `#cast` specifier, if present.
    pub cast: Option<&'a str>,
}

impl<'a> ArgSpec<'a>
{
    /// Split `arg` into body, `|format`, and `#cast`.
    ///
    /// The format split runs first, so the syntax reads
    /// `body#cast|format`; both separators only count at depth zero.
    pub fn parse(arg: &'a str) -> Self
    {
        let (rest, format) = split_on_separator(arg, b'|');
        let (body, cast) = split_on_separator(rest, b'#');
        Self { body, format, cast }
    }
}

/// A decomposed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a>
{
    /// Function tag (may be empty, or start with `?` for conditionals).
    pub tag: &'a str,
    /// First argument.
    pub arg: ArgSpec<'a>,
    /// Second argument; only conditionals may have one. For a conditional
    /// with a single branch this is an empty `ArgSpec`, so the else-branch
    /// expands to nothing.
    pub arg_right: Option<ArgSpec<'a>>,
}

/// Why a placeholder failed to decompose.
///
/// Every variant surfaces as a `?${rawExpr}` marker; the distinctions
/// exist for tests and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitError
{
    /// A tag that requires an argument had none.
    MissingArgument,
    /// `fn`/`tn` take no argument.
    ArgumentNotAllowed,
    /// A non-conditional tag received a second argument.
    ExtraArgument,
    /// A conditional received a third argument.
    TooManyArguments,
}

/// Decompose placeholder interior text.
///
/// Specifier splits happen per argument, which is what lets each branch of
/// a conditional carry its own cast and format.
pub fn parse_placeholder(expr: &str) -> Result<Placeholder<'_>, SplitError>
{
    let (tag, rest) = split_on_separator(expr, b':');

    let Some(rest) = rest else {
        if !allows_missing_argument(tag) {
            return Err(SplitError::MissingArgument);
        }
        return Ok(Placeholder { tag, arg: ArgSpec::default(), arg_right: None });
    };
    if tag == "fn" || tag == "tn" {
        return Err(SplitError::ArgumentNotAllowed);
    }

    let (first, second) = split_on_separator(rest, b':');

    if tag.starts_with('?') {
        let arg_right = match second {
            Some(second) => {
                let (second, extra) = split_on_separator(second, b':');
                if extra.is_some() {
                    return Err(SplitError::TooManyArguments);
                }
                ArgSpec::parse(second)
            }
            None => ArgSpec::default(),
        };
        return Ok(Placeholder { tag, arg: ArgSpec::parse(first), arg_right: Some(arg_right) });
    }

    if second.is_some() {
        return Err(SplitError::ExtraArgument);
    }
    Ok(Placeholder { tag, arg: ArgSpec::parse(first), arg_right: None })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_simple_call()
    {
        let p = parse_placeholder("r:eax").unwrap();
        assert_eq!(p.tag, "r");
        assert_eq!(p.arg.body, "eax");
        assert_eq!(p.arg.format, None);
        assert_eq!(p.arg.cast, None);
        assert_eq!(p.arg_right, None);
    }

    #[test]
    fn test_specifier_stripping()
    {
        let p = parse_placeholder("r:eax|%08X").unwrap();
        assert_eq!(p.arg.body, "eax");
        assert_eq!(p.arg.format, Some("%08X"));

        let p = parse_placeholder("v:x#ul|%d").unwrap();
        assert_eq!(p.arg.body, "x");
        assert_eq!(p.arg.cast, Some("ul"));
        assert_eq!(p.arg.format, Some("%d"));
    }

    #[test]
    fn test_probe_tags_without_argument()
    {
        for tag in ["f", "n", "t", "fn", "tn"] {
            let p = parse_placeholder(tag).unwrap();
            assert_eq!(p.tag, tag);
            assert_eq!(p.arg.body, "");
        }
        assert_eq!(parse_placeholder("v"), Err(SplitError::MissingArgument));
        assert_eq!(parse_placeholder("zz"), Err(SplitError::MissingArgument));
    }

    #[test]
    fn test_probe_tags_reject_argument()
    {
        assert_eq!(parse_placeholder("fn:0"), Err(SplitError::ArgumentNotAllowed));
        assert_eq!(parse_placeholder("tn:0"), Err(SplitError::ArgumentNotAllowed));
    }

    #[test]
    fn test_conditional_arity()
    {
        let p = parse_placeholder("?c:a:b").unwrap();
        assert_eq!(p.tag, "?c");
        assert_eq!(p.arg.body, "a");
        assert_eq!(p.arg_right.unwrap().body, "b");

        let p = parse_placeholder("?c:a").unwrap();
        assert_eq!(p.arg_right.unwrap().body, "");

        assert_eq!(parse_placeholder("?c:a:b:c"), Err(SplitError::TooManyArguments));
        assert_eq!(parse_placeholder("r:eax:ebx"), Err(SplitError::ExtraArgument));
    }

    #[test]
    fn test_nested_placeholder_protects_separators()
    {
        let p = parse_placeholder("?${f:num}!=0:[${f:num}]").unwrap();
        assert_eq!(p.tag, "?${f:num}!=0");
        assert_eq!(p.arg.body, "[${f:num}]");
        assert_eq!(p.arg_right.unwrap().body, "");
    }

    #[test]
    fn test_branch_specifiers_stay_per_branch()
    {
        let p = parse_placeholder("?c:a|%x:b|%d").unwrap();
        assert_eq!(p.arg.format, Some("%x"));
        assert_eq!(p.arg_right.unwrap().format, Some("%d"));
    }
}
