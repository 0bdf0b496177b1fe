//! Single-value printf-style formatting.
//!
//! Format specifiers use the classic `%[flags][width][.precision]conv`
//! syntax applied to exactly one value. `%%` is a literal percent; a
//! pattern with zero or more than one value-consuming directive is an
//! arity error, matching how a `%` operator with one operand behaves.

use vigil_core::error::{Result, VigilError};
use vigil_core::value::Value;

#[derive(Debug, Clone, Copy, Default)]
struct Flags
{
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    alternate: bool,
}

#[derive(Debug, Clone, Copy)]
struct Directive
{
    flags: Flags,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

/// Apply `pattern` to `value`, producing the formatted text.
pub fn apply_format(pattern: &str, value: &Value) -> Result<String>
{
    let mut directive: Option<(usize, usize, Directive)> = None;

    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            // Multi-byte chars never contain an ASCII '%'.
            i += 1;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i + 1] == b'%' {
            i += 2;
            continue;
        }
        let (dir, end) = parse_directive(pattern, i)?;
        if directive.is_some() {
            return Err(VigilError::Format("not enough arguments for format string".to_string()));
        }
        directive = Some((i, end, dir));
        i = end;
    }

    let Some((start, end, dir)) = directive else {
        return Err(VigilError::Format("not all arguments converted during formatting".to_string()));
    };

    let rendered = render_directive(dir, value)?;
    let mut out = String::with_capacity(pattern.len() + rendered.len());
    out.push_str(&pattern[..start].replace("%%", "%"));
    out.push_str(&rendered);
    out.push_str(&pattern[end..].replace("%%", "%"));
    Ok(out)
}

fn parse_directive(pattern: &str, start: usize) -> Result<(Directive, usize)>
{
    let bytes = pattern.as_bytes();
    let mut i = start + 1;
    let mut flags = Flags::default();
    while i < bytes.len() {
        match bytes[i] {
            b'-' => flags.minus = true,
            b'+' => flags.plus = true,
            b'0' => flags.zero = true,
            b'#' => flags.alternate = true,
            b' ' => flags.space = true,
            _ => break,
        }
        i += 1;
    }
    let mut width = 0usize;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        width = width * 10 + usize::from(bytes[i] - b'0');
        i += 1;
    }
    let mut precision = None;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let mut p = 0usize;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            p = p * 10 + usize::from(bytes[i] - b'0');
            i += 1;
        }
        precision = Some(p);
    }
    let Some(&conv) = bytes.get(i) else {
        return Err(VigilError::Format("incomplete format".to_string()));
    };
    let conv = conv as char;
    if !"diuoxXeEfFgGcs".contains(conv) {
        return Err(VigilError::Format(format!("unsupported format character {conv:?}")));
    }
    Ok((Directive { flags, width, precision, conv }, i + 1))
}

fn render_directive(dir: Directive, value: &Value) -> Result<String>
{
    match dir.conv {
        'd' | 'i' | 'u' | 'o' | 'x' | 'X' => {
            let Some(int) = value.as_int() else {
                return Err(VigilError::Format(format!("{} format: a number is required", dir.conv)));
            };
            Ok(pad_integer(dir, int))
        }
        'c' => {
            let ch = match value {
                Value::Text(s) if s.chars().count() == 1 => s.chars().next().unwrap_or(' '),
                other => match other.as_int() {
                    Some(i) => char::from_u32(i as u32)
                        .ok_or_else(|| VigilError::Format("c format: invalid character".to_string()))?,
                    None => {
                        return Err(VigilError::Format(
                            "c format: an integer or a single character is required".to_string(),
                        ));
                    }
                },
            };
            Ok(pad_text(dir, &ch.to_string()))
        }
        'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
            let Some(float) = value.as_float() else {
                return Err(VigilError::Format(format!("{} format: a number is required", dir.conv)));
            };
            Ok(pad_float(dir, float))
        }
        's' => {
            let mut text = value.render();
            if let Some(prec) = dir.precision {
                text = text.chars().take(prec).collect();
            }
            Ok(pad_text(dir, &text))
        }
        other => Err(VigilError::Format(format!("unsupported format character {other:?}"))),
    }
}

fn pad_integer(dir: Directive, int: i128) -> String
{
    let mut dir = dir;
    if dir.precision.is_some() {
        // Explicit digit counts disable zero padding, as in C.
        dir.flags.zero = false;
    }
    let negative = int < 0;
    let magnitude = int.unsigned_abs();
    let mut digits = match dir.conv {
        'o' => format!("{magnitude:o}"),
        'x' => format!("{magnitude:x}"),
        'X' => format!("{magnitude:X}"),
        _ => format!("{magnitude}"),
    };
    if let Some(prec) = dir.precision {
        while digits.len() < prec {
            digits.insert(0, '0');
        }
    }
    let prefix = if dir.flags.alternate {
        match dir.conv {
            'x' => "0x",
            'X' => "0X",
            'o' => "0",
            _ => "",
        }
    } else {
        ""
    };
    let sign = if negative {
        "-"
    } else if dir.flags.plus {
        "+"
    } else if dir.flags.space {
        " "
    } else {
        ""
    };
    finish_number(dir, format!("{sign}{prefix}"), digits)
}

fn pad_float(dir: Directive, float: f64) -> String
{
    let prec = dir.precision.unwrap_or(6);
    let magnitude = float.abs();
    let body = match dir.conv {
        'f' | 'F' => format!("{magnitude:.prec$}"),
        'e' | 'E' => exponential(magnitude, prec, dir.conv == 'E'),
        _ => general(magnitude, prec.max(1), dir.conv == 'G'),
    };
    let sign = if float.is_sign_negative() {
        "-"
    } else if dir.flags.plus {
        "+"
    } else if dir.flags.space {
        " "
    } else {
        ""
    };
    finish_number(dir, sign.to_string(), body)
}

/// C-style exponential form: mantissa with `prec` decimals and a signed,
/// at-least-two-digit exponent.
fn exponential(magnitude: f64, prec: usize, upper: bool) -> String
{
    let formatted = format!("{magnitude:.prec$e}");
    let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{:+03}", exp)
}

/// `%g`: exponential for very small or very large magnitudes, plain
/// otherwise, trailing zeros trimmed.
fn general(magnitude: f64, prec: usize, upper: bool) -> String
{
    let exp = if magnitude == 0.0 { 0 } else { magnitude.abs().log10().floor() as i32 };
    let mut body = if exp < -4 || exp >= prec as i32 {
        let s = exponential(magnitude, prec.saturating_sub(1), upper);
        let (mantissa, suffix) = s.split_once(if upper { 'E' } else { 'e' }).unwrap_or((s.as_str(), ""));
        let mantissa = trim_fraction(mantissa);
        if suffix.is_empty() {
            mantissa
        } else {
            format!("{mantissa}{}{suffix}", if upper { 'E' } else { 'e' })
        }
    } else {
        let decimals = (prec as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{magnitude:.decimals$}"))
    };
    if upper {
        body = body.to_uppercase();
    }
    body
}

fn trim_fraction(s: &str) -> String
{
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Shared width/zero/left-justify handling for numeric output.
fn finish_number(dir: Directive, prefix: String, body: String) -> String
{
    let content_len = prefix.len() + body.len();
    if content_len >= dir.width {
        return format!("{prefix}{body}");
    }
    let pad = dir.width - content_len;
    if dir.flags.minus {
        format!("{prefix}{body}{}", " ".repeat(pad))
    } else if dir.flags.zero {
        format!("{prefix}{}{body}", "0".repeat(pad))
    } else {
        format!("{}{prefix}{body}", " ".repeat(pad))
    }
}

fn pad_text(dir: Directive, text: &str) -> String
{
    let len = text.chars().count();
    if len >= dir.width {
        return text.to_string();
    }
    let pad = " ".repeat(dir.width - len);
    if dir.flags.minus {
        format!("{text}{pad}")
    } else {
        format!("{pad}{text}")
    }
}
