use std::fmt::Write as _;

use crate::{Params, PsdbError, Result, Value};

/// Combines query text and arguments into the SQL sent to the service.
///
/// Only called when arguments were supplied; otherwise the text is sent
/// verbatim.
pub trait Format: Send + Sync {
    fn format(&self, query: &str, params: &Params) -> Result<String>;
}

impl<F> Format for F
where
    F: Fn(&str, &Params) -> Result<String> + Send + Sync,
{
    fn format(&self, query: &str, params: &Params) -> Result<String> {
        self(query, params)
    }
}

/// Placeholder substitution with MySQL literal escaping.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFormat;

impl Format for DefaultFormat {
    fn format(&self, query: &str, params: &Params) -> Result<String> {
        format(query, params)
    }
}

/// Replaces `?` (positional) or `:name` (named) placeholders with escaped
/// literals. Placeholders inside quoted literals and comments are left alone.
///
/// Positional arguments must match the placeholder count exactly. Named
/// placeholders without a supplied value are kept as written.
pub fn format(query: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(query.len());
    let mut state = State::Normal;
    let mut copied = 0;
    let mut next_positional = 0;
    let bytes = query.as_bytes();
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::Quoted(b'\''),
                b'"' => state = State::Quoted(b'"'),
                b'`' => state = State::Quoted(b'`'),
                b'#' => state = State::LineComment,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b'?' => {
                    if let Params::Positional(values) = params {
                        let value = values.get(next_positional).ok_or_else(|| {
                            PsdbError::Format(format!(
                                "missing value for placeholder {}",
                                next_positional + 1
                            ))
                        })?;
                        out.push_str(&query[copied..idx]);
                        out.push_str(&sanitize(value)?);
                        copied = idx + 1;
                        next_positional += 1;
                    }
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => idx += 1,
                b':' => {
                    let end = scan_identifier(bytes, idx + 1);
                    if end > idx + 1 {
                        if let Some(value) = params.named_value(&query[idx + 1..end]) {
                            out.push_str(&query[copied..idx]);
                            out.push_str(&sanitize(value)?);
                            copied = end;
                        }
                        idx = end - 1;
                    }
                }
                _ => {}
            },
            State::Quoted(quote) => {
                if b == b'\\' && quote != b'`' {
                    idx += 1;
                } else if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    if let Params::Positional(values) = params {
        if next_positional < values.len() {
            return Err(PsdbError::Format(format!(
                "{} placeholders but {} values supplied",
                next_positional,
                values.len()
            )));
        }
    }

    out.push_str(&query[copied..]);
    Ok(out)
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    Quoted(u8),
    LineComment,
    BlockComment,
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
        idx += 1;
    }
    idx
}

/// Renders a value as a SQL literal.
pub fn sanitize(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_owned()),
        Value::Integer(value) => Ok(value.to_string()),
        Value::Float(value) => {
            if !value.is_finite() {
                return Err(PsdbError::Format(format!(
                    "non-finite float value '{value}' is unsupported"
                )));
            }
            Ok(value.to_string())
        }
        Value::Text(value) => Ok(quote(value)),
        Value::Bytes(value) => {
            let mut out = String::with_capacity(value.len() * 2 + 3);
            out.push_str("x'");
            push_hex(&mut out, value);
            out.push('\'');
            Ok(out)
        }
        Value::Json(value) => Ok(quote(&value.to_string())),
    }
}

/// Renders bytes as a `0x`-prefixed hex literal.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push_str("0x");
    push_hex(&mut out, bytes);
    out
}

fn push_hex(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
