//! Escaping text for single-quoted script string literals.
//!
//! Escaped: backslash, both quote characters, CR, LF, U+2028, U+2029 and the
//! `</` pair (written `<\/` so an enclosing `script` element cannot be
//! closed early). Nothing else is touched; this is not markup escaping.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

/// Lead byte of U+2028 / U+2029 in UTF-8.
const LS_PS_LEAD: u8 = 0xE2;

pub fn escape_for_script(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = first_candidate(bytes) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + 8);
    out.push_str(&text[..first]);
    let mut prev = None;
    for ch in text[first..].chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '/' if prev == Some('<') => out.push_str("\\/"),
            _ => out.push(ch),
        }
        prev = Some(ch);
    }
    // Every escape lengthens the output.
    if out.len() == text.len() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(out)
}

/// Offset of the first byte that might need escaping.
fn first_candidate(bytes: &[u8]) -> Option<usize> {
    [
        memchr3(b'\\', b'\'', b'"', bytes),
        memchr3(b'\n', b'\r', b'<', bytes),
        memchr(LS_PS_LEAD, bytes),
    ]
    .into_iter()
    .flatten()
    .min()
}
