//! End-to-end template expansion tests against a snapshot session.

use vigil_core::value::Value;
use vigil_core::{FrameSnapshot, PlainRenderer, RuntimeValue, SnapshotContext, ThreadSnapshot};
use vigil_engine::Engine;

/// One stopped thread, three frames (newest first), a few registers,
/// variables, and parameters.
fn session() -> SnapshotContext
{
    SnapshotContext::new()
        .with_thread(ThreadSnapshot::new(2).with_name("worker").with_ptid(1234, 1234, 7))
        .with_frame(
            FrameSnapshot::new(0)
                .with_name("inner")
                .with_pc(0x4000)
                .with_register("eax", RuntimeValue::from_int(255))
                .with_register("ebx", RuntimeValue::from_int(-1))
                .with_variable("x", Value::Runtime(RuntimeValue::from_int(42)))
                .with_variable("tricky", Value::text("${t:num}")),
        )
        .with_frame(FrameSnapshot::new(1).with_name("middle").with_pc(0x4100))
        .with_frame(FrameSnapshot::new(2).with_name("outer").with_pc(0x4200))
        .with_parameter("listsize", Value::Int(10))
        .with_parameter("cast-abbrev", Value::text("ul"))
        .with_runtime_result("1+1", Value::Runtime(RuntimeValue::from_int(2)))
}

fn expand(ctx: &SnapshotContext, template: &str) -> String
{
    Engine::new(ctx).substitute(template).unwrap()
}

#[test]
fn test_literal_passthrough()
{
    let ctx = session();
    assert_eq!(expand(&ctx, ""), "");
    assert_eq!(expand(&ctx, "no placeholders here"), "no placeholders here");
    assert_eq!(expand(&ctx, "escaped \\${t:num} stays"), "escaped ${t:num} stays");
}

#[test]
fn test_backslash_consumes_one_character()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "\\${not a placeholder}"), "${not a placeholder}");
    assert_eq!(expand(&ctx, "a\\\\b"), "a\\b");
}

#[test]
fn test_unterminated_placeholder_is_literal()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${r:eax"), "${r:eax");
    assert_eq!(expand(&ctx, "pc=${f:pc and then ${t:num}"), "pc=${f:pc and then ${t:num}");
}

#[test]
fn test_register_with_format()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${r:eax|%08X}"), "000000FF");
    assert_eq!(expand(&ctx, "eax=${r:eax}"), "eax=255");
}

#[test]
fn test_register_read_failure_marker()
{
    let ctx = session();
    let out = expand(&ctx, "${r:xyz}");
    assert!(out.starts_with("?{r:?xyz!"), "unexpected marker: {out}");
}

#[test]
fn test_variable_cast_to_unsigned_long()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${v:x#ul}"), "42");
    // A negative value wraps the way a C cast would.
    assert_eq!(expand(&ctx, "${r:ebx#ul}"), "18446744073709551615");
}

#[test]
fn test_missing_variable_is_silent()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "[${v:no_such}]"), "[]");
}

#[test]
fn test_unknown_function_marker()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${zz:arg}"), "?${zz:arg}");
    assert_eq!(expand(&ctx, "${v}"), "?${v}");
}

#[test]
fn test_argument_arity_markers()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${r:eax:ebx}"), "?${r:eax:ebx}");
    assert_eq!(expand(&ctx, "${fn:0}"), "?${fn:0}");
    assert_eq!(expand(&ctx, "${?1:a:b:c}"), "?${?1:a:b:c}");
}

#[test]
fn test_frame_attributes()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${f:name}"), "inner");
    assert_eq!(expand(&ctx, "${f:num}"), "0");
    assert_eq!(expand(&ctx, "${fn}"), "0");
    assert_eq!(expand(&ctx, "${f:pc|0x%x}"), "0x4000");
    assert_eq!(expand(&ctx, "${f}"), "True");
    assert_eq!(expand(&ctx, "${f:is_valid}"), "True");
}

#[test]
fn test_selected_vs_newest_frame()
{
    let ctx = session().select_frame(2);
    assert_eq!(expand(&ctx, "${f:name}"), "outer");
    assert_eq!(expand(&ctx, "${f:num}"), "2");
    assert_eq!(expand(&ctx, "${n:name}"), "inner");
    assert_eq!(expand(&ctx, "${n:num}"), "0");
}

#[test]
fn test_forbidden_and_unknown_attributes()
{
    let ctx = session();
    let out = expand(&ctx, "${f:select}");
    assert!(out.starts_with("?{f:?select!"), "unexpected marker: {out}");
    assert_eq!(expand(&ctx, "${f:older}"), "?{f:?older}");

    let out = expand(&ctx, "${t:switch}");
    assert!(out.starts_with("?{t:?switch!"), "unexpected marker: {out}");
    assert_eq!(expand(&ctx, "${t:bogus}"), "?{t:?bogus}");
}

#[test]
fn test_thread_attributes()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${t:num}"), "2");
    assert_eq!(expand(&ctx, "${tn}"), "2");
    assert_eq!(expand(&ctx, "${t:name}"), "worker");
    assert_eq!(expand(&ctx, "${t:pid}"), "1234");
    assert_eq!(expand(&ctx, "${t:lwpid}"), "1234");
    assert_eq!(expand(&ctx, "${t:tid}"), "7");
    assert_eq!(expand(&ctx, "${t:is_stopped}"), "True");
    assert_eq!(expand(&ctx, "${t}"), "True");
}

#[test]
fn test_no_thread_validity_split()
{
    let ctx = SnapshotContext::new();
    // Validity probes coalesce to a typed false...
    assert_eq!(expand(&ctx, "${t:is_valid}"), "False");
    assert_eq!(expand(&ctx, "${t}"), "False");
    assert_eq!(expand(&ctx, "${f:is_valid}"), "False");
    // ...while everything else is absent.
    assert_eq!(expand(&ctx, "${t:num}"), "");
    assert_eq!(expand(&ctx, "${tn}"), "");
    assert_eq!(expand(&ctx, "${fn}"), "");
    assert_eq!(expand(&ctx, "${f:num}"), "");
    assert_eq!(expand(&ctx, "${r:eax}"), "");
}

#[test]
fn test_no_frame_validity_split()
{
    let ctx = SnapshotContext::new().with_thread(ThreadSnapshot::new(1));
    assert_eq!(expand(&ctx, "${f:is_valid}"), "False");
    assert_eq!(expand(&ctx, "${f}"), "False");
    assert_eq!(expand(&ctx, "${fn}"), "");
    assert_eq!(expand(&ctx, "${v:x}"), "");
    assert_eq!(expand(&ctx, "${f:name}"), "");
}

#[test]
fn test_parameter_lookup()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${p:listsize}"), "10");
    let out = expand(&ctx, "${p:no-such}");
    assert!(out.starts_with("?{p:?no-such!"), "unexpected marker: {out}");
}

#[test]
fn test_runtime_evaluation()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${g:1+1}"), "2");
    let out = expand(&ctx, "${g:bogus}");
    assert!(out.starts_with("?{g:?bogus!"), "unexpected marker: {out}");
}

#[test]
fn test_host_evaluation()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${e:1+2*3}"), "7");
    assert_eq!(expand(&ctx, "${e:${f:num}+1}"), "1");
    assert_eq!(expand(&ctx, "${e:${r:eax}!=0}"), "True");
    let out = expand(&ctx, "${e:1+}");
    assert!(out.starts_with("?{e:?1+!"), "unexpected marker: {out}");
}

#[test]
fn test_conditional_scenario()
{
    // Selected frame number 2: condition holds.
    let ctx = session().select_frame(2);
    assert_eq!(expand(&ctx, "${?${f:num}!=0:[${f:num}]}"), "[2]");

    // Selected frame number 0: condition fails, empty else-branch.
    let ctx = session();
    assert_eq!(expand(&ctx, "${?${f:num}!=0:[${f:num}]}"), "");
}

#[test]
fn test_ternary_branch_selection()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${?1:yes:no}"), "yes");
    assert_eq!(expand(&ctx, "${?0:yes:no}"), "no");
    // Smart-bool: the literal string "False" and numeric strings convert.
    assert_eq!(expand(&ctx, "${?'False':yes:no}"), "no");
    assert_eq!(expand(&ctx, "${?'0':yes:no}"), "no");
    assert_eq!(expand(&ctx, "${?'2':yes:no}"), "yes");
}

#[test]
fn test_ternary_per_branch_specifiers()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${?1:255|%x:0|%d}"), "ff");
    assert_eq!(expand(&ctx, "${?0:255|%x:10|%d}"), "10");
}

#[test]
fn test_trailing_specifier_composes()
{
    let ctx = session();
    // The trailing %x belongs to the whole conditional: it formats the
    // true branch too, because that branch has no specifier of its own.
    assert_eq!(expand(&ctx, "${?1:255:10|%x}"), "ff");
    assert_eq!(expand(&ctx, "${?0:255:10|%x}"), "a");
    // A branch's own specifier wins over the trailing one.
    assert_eq!(expand(&ctx, "${?1:255|%d:10|%x}"), "255");
}

#[test]
fn test_coalesce()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${?:${v:no_such}:fallback}"), "fallback");
    assert_eq!(expand(&ctx, "${?:${v:x}:fallback}"), "42");
    // Empty text coalesces like absence.
    assert_eq!(expand(&ctx, "${?::fallback}"), "fallback");
    // No default at all expands to nothing.
    assert_eq!(expand(&ctx, "${?:${v:no_such}}"), "");
}

#[test]
fn test_coalesce_specifiers()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${?:${v:no_such}:255|%x}"), "ff");
    assert_eq!(expand(&ctx, "${?:${v:x}:255|%x}"), "2a");
}

#[test]
fn test_cast_specifier_is_substituted()
{
    let ctx = session();
    // The cast specifier itself goes through placeholder substitution.
    assert_eq!(expand(&ctx, "${v:x#${p:cast-abbrev}}"), "42");
}

#[test]
fn test_cast_failure_marker()
{
    let ctx = session();
    let out = expand(&ctx, "${v:x#zz}");
    assert!(out.starts_with("?{v:x#?zz"), "unexpected marker: {out}");
}

#[test]
fn test_format_failure_marker()
{
    let ctx = session();
    let out = expand(&ctx, "${v:x|%d %d}");
    assert!(out.starts_with("?{v:x|?%d %d!"), "unexpected marker: {out}");
}

#[test]
fn test_format_specifier_escapes()
{
    let ctx = session();
    // Escaped pipes survive the argument split, then the escape-only pass
    // turns them back into plain characters.
    assert_eq!(expand(&ctx, "${r:eax|=\\|%d\\|=}"), "=|255|=");
}

#[test]
fn test_ansi_wrapper()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "${[1;32}"), "\x1b[1;32m");
    assert_eq!(expand(&ctx, "${[${p:no-ansi-param"), "${[${p:no-ansi-param");

    let ctx = session().with_renderer(PlainRenderer { ansi_enabled: false });
    assert_eq!(expand(&ctx, "${[1;32}"), "");
}

#[test]
fn test_expansion_is_one_shot()
{
    let ctx = session();
    // The variable's value contains placeholder syntax; it must not be
    // expanded again.
    assert_eq!(expand(&ctx, "${v:tricky}"), "${t:num}");
}

#[test]
fn test_typed_entry_point()
{
    let ctx = session();
    let engine = Engine::new(&ctx);
    assert_eq!(engine.substitute_typed("${t:num}").unwrap(), Value::Int(2));
    assert_eq!(engine.substitute_typed("${t:is_valid}").unwrap(), Value::Bool(true));
    assert_eq!(engine.substitute_typed("${e:1+2}").unwrap(), Value::Int(3));
    assert_eq!(engine.substitute_typed("").unwrap(), Value::Absent);
    // Any literal text forces stringification.
    assert_eq!(engine.substitute_typed("${t:num} ").unwrap(), Value::text("2 "));
    assert_eq!(engine.substitute_typed("n=${t:num}").unwrap(), Value::text("n=2"));
}

#[test]
fn test_multi_segment_concatenation()
{
    let ctx = session();
    assert_eq!(expand(&ctx, "[${t:num}] ${f:name} @${f:pc|0x%x}"), "[2] inner @0x4000");
}
