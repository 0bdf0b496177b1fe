//! Sandboxed expression evaluation over bound values.
//!
//! Evaluate-mode substitution rewrites a template into an expression
//! string whose placeholders have become positional references
//! (`arg[0]`, `arg[1]`, ...), then hands it here together with the bound
//! values. The grammar is deliberately small: boolean, comparison,
//! arithmetic and string operations over literals and bindings. There is
//! no name lookup beyond `arg`, no calls, and no way to reach the host
//! process. That is the whole sandbox.
//!
//! Precedence, loosest first: `or`/`||`, `and`/`&&`, `not`/`!`,
//! comparisons, `+ -`, `* / %`, unary `-`, indexing, parentheses.

use std::cmp::Ordering;

use vigil_core::error::{Result, VigilError};
use vigil_core::runtime::RuntimeData;
use vigil_core::value::Value;

/// Evaluate `expression` against positional `bindings`.
pub fn evaluate(expression: &str, bindings: &[Value]) -> Result<Value>
{
    let tokens = lex(expression)?;
    let mut parser = Parser { tokens, pos: 0, bindings };
    let value = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(VigilError::Evaluation(format!(
            "unexpected {} in expression",
            parser.describe_current()
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token
{
    Int(i128),
    Float(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

fn lex(text: &str) -> Result<Vec<Token>>
{
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b'[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            b']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            b'=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(VigilError::Evaluation("assignment is not allowed".to_string()));
                }
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            b'&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token::And);
                    i += 2;
                } else {
                    return Err(VigilError::Evaluation("bitwise '&' is not supported".to_string()));
                }
            }
            b'|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token::Or);
                    i += 2;
                } else {
                    return Err(VigilError::Evaluation("bitwise '|' is not supported".to_string()));
                }
            }
            b'\'' | b'"' => {
                let (s, next) = lex_string(text, i)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            b'0'..=b'9' | b'.' => {
                let (token, next) = lex_number(text, i)?;
                tokens.push(token);
                i = next;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let word = &text[start..i];
                tokens.push(match word {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word.to_string()),
                });
            }
            other => {
                return Err(VigilError::Evaluation(format!(
                    "unexpected character {:?} in expression",
                    other as char
                )));
            }
        }
    }
    Ok(tokens)
}

fn lex_string(text: &str, start: usize) -> Result<(String, usize)>
{
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                let escaped = bytes[i + 1];
                out.push(match escaped {
                    b'n' => '\n',
                    b't' => '\t',
                    b'r' => '\r',
                    b'0' => '\0',
                    other => other as char,
                });
                i += 2;
            }
            b if b == quote => return Ok((out, i + 1)),
            _ => {
                // Multi-byte chars pass through whole.
                let c = text[i..].chars().next().unwrap_or('\u{fffd}');
                out.push(c);
                i += c.len_utf8();
            }
        }
    }
    Err(VigilError::Evaluation("unterminated string literal".to_string()))
}

fn lex_number(text: &str, start: usize) -> Result<(Token, usize)>
{
    let bytes = text.as_bytes();
    let mut i = start;
    if bytes[i] == b'0' && bytes.get(i + 1).is_some_and(|&b| (b | 0x20) == b'x') {
        i += 2;
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
            i += 1;
        }
        let value = i128::from_str_radix(&text[digits_start..i], 16)
            .map_err(|_| VigilError::Evaluation("invalid hex literal".to_string()))?;
        return Ok((Token::Int(value), i));
    }
    let mut is_float = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => i += 1,
            b'.' => {
                is_float = true;
                i += 1;
            }
            b'e' | b'E' => {
                is_float = true;
                i += 1;
                if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                    i += 1;
                }
            }
            _ => break,
        }
    }
    let literal = &text[start..i];
    if is_float {
        literal
            .parse::<f64>()
            .map(|f| (Token::Float(f), i))
            .map_err(|_| VigilError::Evaluation(format!("invalid number {literal:?}")))
    } else {
        literal
            .parse::<i128>()
            .map(|v| (Token::Int(v), i))
            .map_err(|_| VigilError::Evaluation(format!("invalid number {literal:?}")))
    }
}

struct Parser<'a>
{
    tokens: Vec<Token>,
    pos: usize,
    bindings: &'a [Value],
}

impl Parser<'_>
{
    fn peek(&self) -> Option<&Token>
    {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token>
    {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()>
    {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(VigilError::Evaluation(format!("expected {what}")))
        }
    }

    fn describe_current(&self) -> String
    {
        match self.peek() {
            Some(token) => format!("{token:?}"),
            None => "end of expression".to_string(),
        }
    }

    fn or_expr(&mut self) -> Result<Value>
    {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and_expr()?;
            left = Value::Bool(left.truthy() || right.truthy());
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Value>
    {
        let mut left = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.not_expr()?;
            left = Value::Bool(left.truthy() && right.truthy());
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Value>
    {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.not_expr()?;
            return Ok(Value::Bool(!inner.truthy()));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Value>
    {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::Ne,
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive()?;
            left = Value::Bool(compare(&left, &right, op)?);
        }
    }

    fn additive(&mut self) -> Result<Value>
    {
        let mut left = self.multiplicative()?;
        loop {
            let plus = match self.peek() {
                Some(Token::Plus) => true,
                Some(Token::Minus) => false,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = if plus { add(&left, &right)? } else { numeric_op(&left, &right, "-")? };
        }
    }

    fn multiplicative(&mut self) -> Result<Value>
    {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => "*",
                Some(Token::Slash) => "/",
                Some(Token::Percent) => "%",
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = numeric_op(&left, &right, op)?;
        }
    }

    fn unary(&mut self) -> Result<Value>
    {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let inner = self.unary()?;
            return match operand(&inner) {
                Operand::Int(i) => Ok(Value::Int(-i)),
                Operand::Float(f) => Ok(Value::Float(-f)),
                _ => Err(VigilError::Evaluation("cannot negate a non-number".to_string())),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value>
    {
        match self.bump() {
            Some(Token::Int(i)) => Ok(Value::Int(i)),
            Some(Token::Float(f)) => Ok(Value::Float(f)),
            Some(Token::Str(s)) => Ok(Value::Text(s)),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::Absent),
                "arg" => {
                    self.expect(&Token::LBracket, "'[' after 'arg'")?;
                    let index = self.or_expr()?;
                    self.expect(&Token::RBracket, "']'")?;
                    let Some(idx) = index.as_int().filter(|i| *i >= 0) else {
                        return Err(VigilError::Evaluation("argument index must be an integer".to_string()));
                    };
                    self.bindings
                        .get(idx as usize)
                        .cloned()
                        .ok_or_else(|| VigilError::Evaluation(format!("argument index {idx} out of range")))
                }
                other => Err(VigilError::Evaluation(format!("name {other:?} is not defined"))),
            },
            Some(token) => Err(VigilError::Evaluation(format!("unexpected {token:?} in expression"))),
            None => Err(VigilError::Evaluation("empty expression".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CompareOp
{
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Common ground for binary operators.
enum Operand
{
    Int(i128),
    Float(f64),
    Text(String),
    Absent,
}

fn operand(value: &Value) -> Operand
{
    match value {
        Value::Absent => Operand::Absent,
        Value::Bool(b) => Operand::Int(i128::from(*b)),
        Value::Int(i) => Operand::Int(*i),
        Value::Float(f) => Operand::Float(*f),
        Value::Text(s) => Operand::Text(s.clone()),
        Value::Runtime(rv) => match rv.data() {
            RuntimeData::Int(i) => Operand::Int(*i),
            RuntimeData::Float(f) => Operand::Float(*f),
            RuntimeData::Bytes(_) => Operand::Text(rv.render()),
        },
        Value::ErrorMarker(m) => Operand::Text(m.clone()),
    }
}

fn compare(left: &Value, right: &Value, op: CompareOp) -> Result<bool>
{
    let ordering = match (operand(left), operand(right)) {
        (Operand::Int(a), Operand::Int(b)) => Some(a.cmp(&b)),
        (Operand::Int(a), Operand::Float(b)) => (a as f64).partial_cmp(&b),
        (Operand::Float(a), Operand::Int(b)) => a.partial_cmp(&(b as f64)),
        (Operand::Float(a), Operand::Float(b)) => a.partial_cmp(&b),
        (Operand::Text(a), Operand::Text(b)) => Some(a.cmp(&b)),
        (Operand::Absent, Operand::Absent) => Some(Ordering::Equal),
        _ => None,
    };
    match (ordering, op) {
        (None, CompareOp::Eq) => Ok(false),
        (None, CompareOp::Ne) => Ok(true),
        (None, _) => Err(VigilError::Evaluation("unorderable operand types".to_string())),
        (Some(ord), op) => Ok(match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value>
{
    match (operand(left), operand(right)) {
        (Operand::Text(a), Operand::Text(b)) => Ok(Value::Text(a + &b)),
        _ => numeric_op(left, right, "+"),
    }
}

fn numeric_op(left: &Value, right: &Value, op: &str) -> Result<Value>
{
    let error = || VigilError::Evaluation(format!("unsupported operand types for '{op}'"));
    match (operand(left), operand(right)) {
        (Operand::Int(a), Operand::Int(b)) => match op {
            "+" => Ok(Value::Int(a.wrapping_add(b))),
            "-" => Ok(Value::Int(a.wrapping_sub(b))),
            "*" => Ok(Value::Int(a.wrapping_mul(b))),
            "/" => a
                .checked_div(b)
                .map(Value::Int)
                .ok_or_else(|| VigilError::Evaluation("division by zero".to_string())),
            "%" => {
                if b == 0 {
                    Err(VigilError::Evaluation("division by zero".to_string()))
                } else {
                    Ok(Value::Int(a.rem_euclid(b)))
                }
            }
            _ => Err(error()),
        },
        (a, b) => {
            let (Some(a), Some(b)) = (operand_float(&a), operand_float(&b)) else {
                return Err(error());
            };
            match op {
                "+" => Ok(Value::Float(a + b)),
                "-" => Ok(Value::Float(a - b)),
                "*" => Ok(Value::Float(a * b)),
                "/" => {
                    if b == 0.0 {
                        Err(VigilError::Evaluation("division by zero".to_string()))
                    } else {
                        Ok(Value::Float(a / b))
                    }
                }
                "%" => {
                    if b == 0.0 {
                        Err(VigilError::Evaluation("division by zero".to_string()))
                    } else {
                        Ok(Value::Float(a.rem_euclid(b)))
                    }
                }
                _ => Err(error()),
            }
        }
    }
}

fn operand_float(op: &Operand) -> Option<f64>
{
    match op {
        Operand::Int(i) => Some(*i as f64),
        Operand::Float(f) => Some(*f),
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn eval(expr: &str) -> Value
    {
        evaluate(expr, &[]).unwrap()
    }

    #[test]
    fn test_arithmetic()
    {
        assert_eq!(eval("1+2*3"), Value::Int(7));
        assert_eq!(eval("(1+2)*3"), Value::Int(9));
        assert_eq!(eval("7/2"), Value::Int(3));
        assert_eq!(eval("7.0/2"), Value::Float(3.5));
        assert_eq!(eval("-3+1"), Value::Int(-2));
        assert_eq!(eval("0x10+1"), Value::Int(17));
    }

    #[test]
    fn test_comparisons_and_logic()
    {
        assert_eq!(eval("2!=0"), Value::Bool(true));
        assert_eq!(eval("1<2 and 2<3"), Value::Bool(true));
        assert_eq!(eval("1>2 || 3>2"), Value::Bool(true));
        assert_eq!(eval("not 0"), Value::Bool(true));
        assert_eq!(eval("'abc'=='abc'"), Value::Bool(true));
        assert_eq!(eval("'abc'<'abd'"), Value::Bool(true));
        // Cross-kind equality is false, not an error.
        assert_eq!(eval("'2'==2"), Value::Bool(false));
    }

    #[test]
    fn test_bindings()
    {
        let bindings = [Value::Int(2), Value::text("main")];
        assert_eq!(evaluate("arg[0]!=0", &bindings).unwrap(), Value::Bool(true));
        assert_eq!(evaluate("arg[1]+'()'", &bindings).unwrap(), Value::text("main()"));
        assert!(evaluate("arg[5]", &bindings).is_err());
    }

    #[test]
    fn test_absent_and_keywords()
    {
        assert_eq!(eval("None==None"), Value::Bool(true));
        assert_eq!(eval("True and True"), Value::Bool(true));
        let absent = [Value::Absent];
        assert_eq!(evaluate("arg[0]==None", &absent).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_errors()
    {
        assert!(evaluate("1/0", &[]).is_err());
        assert!(evaluate("foo", &[]).is_err());
        assert!(evaluate("1 +", &[]).is_err());
        assert!(evaluate("'a' - 1", &[]).is_err());
        assert!(evaluate("x = 1", &[]).is_err());
        assert!(evaluate("1 2", &[]).is_err());
    }
}
