//! Value casting and string conversion.
//!
//! A cast specifier has the shape `type[%conversion]`. The type part is a
//! primitive abbreviation (optionally prefixed by `p`s for pointer
//! levels) or a full `(type name)`; the conversion part turns the
//! (possibly retyped) value's character data into text in one of four
//! ways. Plain (non-runtime) values only support cross-casts inside their
//! own family of types.

use vigil_core::context::DebugContext;
use vigil_core::error::{Result, VigilError};
use vigil_core::types::{is_float_abbrev, is_int_abbrev, is_string_abbrev, known_type, TypeHandle};
use vigil_core::value::Value;

/// Apply a cast specifier to an evaluated value.
///
/// Casting `Absent` is a no-op so templates can cast values that
/// sometimes resolve to nothing.
pub fn try_cast(value: Value, spec: &str, ctx: &dyn DebugContext) -> Result<Value>
{
    if spec.is_empty() {
        return Err(VigilError::Cast("empty cast specifier".to_string()));
    }
    if matches!(value, Value::Absent) {
        return Ok(value);
    }

    let (type_part, conversion) = match spec.find('%') {
        Some(at) => (spec[..at].trim(), Some(spec[at + 1..].trim())),
        None => (spec.trim(), None),
    };

    let rv = match value {
        Value::Runtime(rv) => rv,
        other => return cast_plain(other, type_part),
    };

    let rv = if type_part.is_empty() {
        rv
    } else {
        let target = resolve_target(type_part, ctx)?;
        rv.retype(target)?
    };

    let Some(mode) = conversion else {
        return Ok(Value::Runtime(rv));
    };
    let decoded = rv.decode_string()?;
    match mode {
        "s" => Ok(Value::Text(decoded)),
        "e" => Ok(Value::Text(escape_string(&decoded))),
        "r" => Ok(Value::Text(strip_nonprintable(&decoded))),
        "t" => {
            let bytes: Vec<u8> = decoded.chars().map(|c| c as u8).collect();
            Ok(Value::Text(ctx.renderer().highlight_dump(&bytes)))
        }
        other => Err(VigilError::Cast(format!("unknown string conversion {other:?}"))),
    }
}

/// Cross-cast a plain value inside its type family.
fn cast_plain(value: Value, type_part: &str) -> Result<Value>
{
    if is_string_abbrev(type_part) {
        return Ok(Value::Text(value.render()));
    }
    if is_int_abbrev(type_part) {
        return value
            .as_int()
            .map(Value::Int)
            .ok_or_else(|| VigilError::Cast(format!("a number is required for cast to {type_part:?}")));
    }
    if is_float_abbrev(type_part) {
        return value
            .as_float()
            .map(Value::Float)
            .ok_or_else(|| VigilError::Cast(format!("a number is required for cast to {type_part:?}")));
    }
    Err(VigilError::Cast(format!("invalid cast to {type_part:?}")))
}

/// Resolve the target type of a cast specifier.
///
/// `(full name)` goes to the resolver verbatim; an abbreviation is looked
/// up in the primitive table with each leading `p` adding one pointer
/// level, and the resulting display name still goes through the resolver
/// so the session's type cache stays authoritative.
fn resolve_target(type_part: &str, ctx: &dyn DebugContext) -> Result<TypeHandle>
{
    let name = if let Some(stripped) = type_part.strip_prefix('(') {
        let Some(inner) = stripped.strip_suffix(')') else {
            return Err(VigilError::Cast(format!("unbalanced type name {type_part:?}")));
        };
        inner.trim().to_string()
    } else {
        let mut rest = type_part;
        let mut pointers = 0usize;
        while let Some(stripped) = rest.strip_prefix('p') {
            pointers += 1;
            rest = stripped;
        }
        let Some(base) = known_type(rest) else {
            return Err(VigilError::Cast(format!("unknown type abbreviation {type_part:?}")));
        };
        let mut name = base.name;
        name.push_str(&"*".repeat(pointers));
        name
    };

    ctx.resolve_type(&name)
        .ok_or_else(|| VigilError::Cast(format!("no type named {name:?}")))
}

/// Short escape sequences for the classic control characters.
fn short_escape(byte: u8) -> Option<&'static str>
{
    Some(match byte {
        7 => "\\a",
        8 => "\\b",
        9 => "\\t",
        10 => "\\n",
        11 => "\\v",
        12 => "\\f",
        13 => "\\r",
        0x5c => "\\\\",
        0x22 => "\\\"",
        0x27 => "\\'",
        _ => return None,
    })
}

/// C-style escape encoding of non-printable, quote, and backslash
/// characters.
///
/// Characters without a short escape become `\xNN`, unless the following
/// character is a hex digit (which would extend the escape); those fall
/// back to three-digit octal.
pub fn escape_string(s: &str) -> String
{
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if (32..127).contains(&code) && code != 0x5c && code != 0x22 && code != 0x27 {
            out.push(c);
            continue;
        }
        let byte = code as u8;
        if let Some(esc) = short_escape(byte) {
            out.push_str(esc);
        } else {
            let hex_allowed = chars.get(i + 1).is_none_or(|next| !next.is_ascii_hexdigit());
            if hex_allowed {
                out.push_str(&format!("\\x{byte:02x}"));
            } else {
                out.push_str(&format!("\\{byte:03o}"));
            }
        }
    }
    out
}

/// Drop every non-printable character.
pub fn strip_nonprintable(s: &str) -> String
{
    s.chars().filter(|&c| (32..127).contains(&(c as u32))).collect()
}
