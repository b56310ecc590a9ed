//! Logging helpers for user-supplied text (player names, dialog input) so
//! log lines stay single-line and free of control characters.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///   Long strings are truncated with an ellipsis to cap log noise.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_newlines() {
        assert_eq!(escape_log("Alice\nBob\r\tEnd"), "Alice\\nBob\\r\\tEnd");
    }

    #[test]
    fn truncates_long_input() {
        let s = "x".repeat(500);
        let esc = escape_log(&s);
        assert!(esc.ends_with('…'));
        assert!(esc.chars().count() <= 201);
    }
}
