#![no_main]

use csp::escape_for_script;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let escaped = escape_for_script(input);
    assert!(!escaped.contains('\n'));
    assert!(!escaped.contains('\r'));
    assert!(!escaped.contains('\u{2028}'));
    assert!(!escaped.contains('\u{2029}'));
    assert!(!escaped.contains("</"));

    // Every quote must be preceded by an odd run of backslashes.
    let bytes = escaped.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\'' || b == b'"' {
            let run = bytes[..i].iter().rev().take_while(|&&c| c == b'\\').count();
            assert!(run % 2 == 1, "unescaped quote at {i} in {escaped:?}");
        }
    }
});
