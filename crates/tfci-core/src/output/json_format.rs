//! JSON and escape formatting utilities

use crate::types::{Diagnostic, TestTarget};

/// Escape for GitHub Actions safe output (percent-encoding special chars)
pub fn safe_output_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format test targets as a compact JSON array
///
/// `[{"path":"configurations/a","name":"a"}]`, field order fixed.
pub fn format_targets(targets: &[TestTarget]) -> String {
    let mut buf = String::with_capacity(targets.len() * 48 + 2);
    buf.push('[');
    for (i, t) in targets.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        buf.push_str(r#"{"path":""#);
        escape_json_into(&t.path, &mut buf);
        buf.push_str(r#"","name":""#);
        escape_json_into(&t.name, &mut buf);
        buf.push_str(r#""}"#);
    }
    buf.push(']');
    buf
}

/// Format diagnostics as a JSON array
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    serde_json::to_string(diagnostics).unwrap_or_else(|_| "[]".to_string())
}

/// Write a JSON-escaped string directly into a buffer
pub fn escape_json_into(s: &str, buf: &mut String) {
    for ch in s.chars() {
        match ch {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => buf.push(c),
        }
    }
}
