//! Identifier glob patterns: `*` matches any run of characters, `?` exactly
//! one, `\` makes the next character literal. Everything else is literal.

use std::borrow::Cow;

use regex::Regex;

use crate::error::{CacheError, CacheResult};

pub(crate) fn compile(pattern: &str) -> CacheResult<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut literal = [0u8; 4];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                expr.push_str(&regex::escape(escaped.encode_utf8(&mut literal)));
            }
            _ => expr.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|e| CacheError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Escape glob metacharacters so `value` matches only itself.
pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['*', '?', '\\']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}
