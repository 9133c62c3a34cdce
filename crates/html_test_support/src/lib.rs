//! Shared helpers for writer-pipeline tests: recording writers, shared sinks
//! and line-snapshot comparison.

mod recording;

pub use recording::{RecordingWriter, SharedBuffer};

use std::fmt::Write;

/// Make a value safe to embed in a one-line snapshot.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{{{:04X}}}", ch as u32);
            }
            ch if ch < ' ' => {
                let _ = write!(out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Describe the first difference between two snapshots, with two lines of
/// context on either side.
pub fn diff_lines<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> String {
    fn line<'a>(lines: &[&'a str], i: usize) -> &'a str {
        lines.get(i).copied().unwrap_or("<missing>")
    }
    let expected: Vec<&str> = expected.iter().map(AsRef::as_ref).collect();
    let actual: Vec<&str> = actual.iter().map(AsRef::as_ref).collect();
    let total = expected.len().max(actual.len());

    let mut out = String::new();
    match (0..total).find(|&i| line(&expected, i) != line(&actual, i)) {
        Some(first) => {
            let from = first.saturating_sub(2);
            let to = (first + 3).min(total);
            let _ = writeln!(out, "snapshots diverge at line {}:", first + 1);
            for i in from..to {
                let marker = if i == first { '>' } else { ' ' };
                let _ = writeln!(out, "{marker} {:>4}  expected: {}", i + 1, line(&expected, i));
                let _ = writeln!(out, "{marker} {:>4}    actual: {}", i + 1, line(&actual, i));
            }
        }
        None => {
            let _ = writeln!(out, "snapshots match ({total} lines)");
        }
    }
    out
}

/// Panic with a readable diff when two snapshots differ.
#[track_caller]
pub fn assert_lines<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) {
    let same = expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| e.as_ref() == a.as_ref());
    if !same {
        panic!("{}", diff_lines(expected, actual));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_keeps_snapshots_single_line() {
        assert_eq!(escape_text("a\"b\\c\nd\u{1}"), "a\\\"b\\\\c\\nd\\u{01}");
        assert_eq!(escape_text("x\u{2028}"), "x\\u{2028}");
    }

    #[test]
    fn diff_points_at_first_divergence() {
        let expected = ["a", "b", "c"];
        let actual = ["a", "x"];
        let diff = diff_lines(&expected, &actual);
        assert!(diff.starts_with("snapshots diverge at line 2:"), "{diff}");
        assert!(diff.contains(">    2  expected: b"), "{diff}");
        assert!(diff.contains("3    actual: <missing>"), "{diff}");
    }

    #[test]
    #[should_panic(expected = "snapshots diverge at line 1")]
    fn assert_lines_panics_on_mismatch() {
        assert_lines(&["a"], &["b".to_string()]);
    }
}
