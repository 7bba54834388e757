//! Input sanitization.
//!
//! First stage of the admission pipeline: normalizes raw text and rejects
//! structurally dangerous input before any semantic analysis runs. The
//! function is pure and idempotent; signature details are kept on the error
//! for server-side logging but are never echoed back to the caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// A single character repeating this many times is treated as a flood.
pub const REPEATED_RUN_LIMIT: usize = 100;

/// Why input was structurally invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedKind {
    /// Nothing left after cleaning.
    Empty,
    /// Contains a null byte.
    NullByte,
    /// Exceeds [`MAX_MESSAGE_CHARS`].
    TooLong,
    /// A single character repeated beyond [`REPEATED_RUN_LIMIT`].
    RepeatedCharacterFlood,
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MalformedKind::Empty => "empty after cleaning",
            MalformedKind::NullByte => "null byte",
            MalformedKind::TooLong => "exceeds length limit",
            MalformedKind::RepeatedCharacterFlood => "repeated character flood",
        };
        write!(f, "{s}")
    }
}

/// Which injection signature family matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionKind {
    Sql,
    Script,
    ShellCommand,
}

impl std::fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InjectionKind::Sql => "sql",
            InjectionKind::Script => "script",
            InjectionKind::ShellCommand => "shell-command",
        };
        write!(f, "{s}")
    }
}

/// Errors raised by [`sanitize`].
///
/// Both variants map to a 400-class rejection; the kind is for server-side
/// logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("malformed input: {0}")]
    MalformedInput(MalformedKind),

    #[error("injection signature detected: {0}")]
    InjectionDetected(InjectionKind),
}

/// Text that passed sanitization.
///
/// Invariants: no null bytes, no control characters, no HTML tags, no
/// matched injection signature, whitespace collapsed, non-empty, at most
/// [`MAX_MESSAGE_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Obvious SQL-injection shapes. The parser-grade detection of the original
// stack is approximated with signature patterns: auth-bypass quoting,
// UNION SELECT chains, destructive DML/DDL wired to real query structure,
// and block comments used to truncate queries.
static SQL_INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)'\s*or\s+'",
        r"(?i)'\s*or\s+\d+\s*=\s*\d+",
        r"(?i)\bunion\b.*\bselect\b",
        r"(?i)\bselect\b.+\b(from|where|join)\b",
        r"(?i)\b(delete|insert|update)\s+(from|into)\b",
        r"(?i)\b(drop|alter|truncate)\s+(table|database|index)\b",
        r"/\*.*\*/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static sql pattern"))
    .collect()
});

static COMMAND_INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i);\s*rm\s+-rf",
        r"(?i)\|\s*(bash|sh)\b",
        r"(?i)&&\s*rm\s+",
        r"\$\([^)]*\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static command pattern"))
    .collect()
});

static SCRIPT_XSS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)javascript\s*:",
        r"(?i)\bon\w+\s*=",
        r"(?i)<\s*/?\s*script",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static xss pattern"))
    .collect()
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));

/// Sanitizes raw user input.
///
/// Strips control characters and HTML tags, collapses whitespace, then
/// rejects injection signatures and repetition floods. Deterministic and
/// idempotent: `sanitize(sanitize(x)) == sanitize(x)` for any accepted `x`.
pub fn sanitize(text: &str) -> Result<SanitizedText, SanitizeError> {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(SanitizeError::MalformedInput(MalformedKind::TooLong));
    }

    if text.contains('\0') {
        return Err(SanitizeError::MalformedInput(MalformedKind::NullByte));
    }

    // Keep newlines, carriage returns and tabs; the whitespace collapse
    // below folds them into single spaces anyway.
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    // XSS signatures are checked before tag stripping so `<script>` is
    // rejected rather than silently flattened into its inner text.
    for pattern in SCRIPT_XSS_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            return Err(SanitizeError::InjectionDetected(InjectionKind::Script));
        }
    }

    let without_tags = strip_html_tags(&cleaned);

    let collapsed = WHITESPACE_RUN.replace_all(&without_tags, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        return Err(SanitizeError::MalformedInput(MalformedKind::Empty));
    }

    // Re-check after tag stripping: removing a tag can splice the
    // surrounding text into a signature (`on<x>load=` becomes `onload=`).
    for pattern in SCRIPT_XSS_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Err(SanitizeError::InjectionDetected(InjectionKind::Script));
        }
    }

    for pattern in SQL_INJECTION_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Err(SanitizeError::InjectionDetected(InjectionKind::Sql));
        }
    }

    for pattern in COMMAND_INJECTION_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Err(SanitizeError::InjectionDetected(InjectionKind::ShellCommand));
        }
    }

    if has_repeated_run(trimmed, REPEATED_RUN_LIMIT) {
        return Err(SanitizeError::MalformedInput(
            MalformedKind::RepeatedCharacterFlood,
        ));
    }

    Ok(SanitizedText(trimmed.to_string()))
}

/// Basic HTML tag stripping; anything between `<` and `>` is dropped.
fn strip_html_tags(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// True if any single character repeats `limit` or more times in a row.
///
/// The regex crate has no backreferences, so the run scan is done by hand.
fn has_repeated_run(s: &str, limit: usize) -> bool {
    let mut run = 0usize;
    let mut prev: Option<char> = None;

    for c in s.chars() {
        if Some(c) == prev {
            run += 1;
            if run >= limit {
                return true;
            }
        } else {
            prev = Some(c);
            run = 1;
            if run >= limit {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cleaning {
        use super::*;

        #[test]
        fn passes_plain_repair_question() {
            let result = sanitize("Como consertar a torneira da cozinha?").unwrap();
            assert_eq!(result.as_str(), "Como consertar a torneira da cozinha?");
        }

        #[test]
        fn strips_control_characters() {
            let result = sanitize("torneira\x07 vazando\x1b").unwrap();
            assert_eq!(result.as_str(), "torneira vazando");
        }

        #[test]
        fn collapses_whitespace_runs() {
            let result = sanitize("  a   porta \t está \n emperrada  ").unwrap();
            assert_eq!(result.as_str(), "a porta está emperrada");
        }

        #[test]
        fn strips_html_tags_but_keeps_text() {
            let result = sanitize("a <b>torneira</b> pinga").unwrap();
            assert_eq!(result.as_str(), "a torneira pinga");
        }

        #[test]
        fn rejects_null_bytes() {
            let err = sanitize("torneira\0vazando").unwrap_err();
            assert_eq!(err, SanitizeError::MalformedInput(MalformedKind::NullByte));
        }

        #[test]
        fn rejects_empty_and_whitespace_only() {
            assert_eq!(
                sanitize("").unwrap_err(),
                SanitizeError::MalformedInput(MalformedKind::Empty)
            );
            assert_eq!(
                sanitize("   \t\n ").unwrap_err(),
                SanitizeError::MalformedInput(MalformedKind::Empty)
            );
        }

        #[test]
        fn rejects_over_length_input() {
            let long = "a ".repeat(MAX_MESSAGE_CHARS);
            assert_eq!(
                sanitize(&long).unwrap_err(),
                SanitizeError::MalformedInput(MalformedKind::TooLong)
            );
        }
    }

    mod injection {
        use super::*;

        #[test]
        fn rejects_sql_auth_bypass() {
            let err = sanitize("' OR 1=1 --").unwrap_err();
            assert_eq!(err, SanitizeError::InjectionDetected(InjectionKind::Sql));
        }

        #[test]
        fn rejects_union_select() {
            let err = sanitize("x UNION SELECT senha FROM usuarios").unwrap_err();
            assert_eq!(err, SanitizeError::InjectionDetected(InjectionKind::Sql));
        }

        #[test]
        fn rejects_destructive_dml() {
            let err = sanitize("DELETE FROM sessions").unwrap_err();
            assert_eq!(err, SanitizeError::InjectionDetected(InjectionKind::Sql));
        }

        #[test]
        fn allows_select_as_ordinary_word() {
            // "select" without query structure must pass: it shows up in
            // normal text about window latches.
            assert!(sanitize("o select da janela travou").is_ok());
        }

        #[test]
        fn rejects_script_tags() {
            let err = sanitize("<script>alert('x')</script>").unwrap_err();
            assert_eq!(err, SanitizeError::InjectionDetected(InjectionKind::Script));
        }

        #[test]
        fn rejects_event_handler_attributes() {
            let err = sanitize("clique onload=hack() aqui").unwrap_err();
            assert_eq!(err, SanitizeError::InjectionDetected(InjectionKind::Script));
        }

        #[test]
        fn rejects_shell_command_chains() {
            let err = sanitize("; rm -rf /").unwrap_err();
            assert_eq!(
                err,
                SanitizeError::InjectionDetected(InjectionKind::ShellCommand)
            );
            let err = sanitize("echo $(cat /etc/passwd)").unwrap_err();
            assert_eq!(
                err,
                SanitizeError::InjectionDetected(InjectionKind::ShellCommand)
            );
        }
    }

    mod floods {
        use super::*;

        #[test]
        fn rejects_150_repeated_characters() {
            let flood = "a".repeat(150);
            assert_eq!(
                sanitize(&flood).unwrap_err(),
                SanitizeError::MalformedInput(MalformedKind::RepeatedCharacterFlood)
            );
        }

        #[test]
        fn rejects_flood_embedded_in_normal_text() {
            let text = format!("torneira {} vazando", "x".repeat(120));
            assert_eq!(
                sanitize(&text).unwrap_err(),
                SanitizeError::MalformedInput(MalformedKind::RepeatedCharacterFlood)
            );
        }

        #[test]
        fn allows_short_repetition() {
            assert!(sanitize(&"a".repeat(99)).is_ok());
        }
    }

    mod idempotence {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn sanitize_twice_equals_sanitize_once() {
            let inputs = [
                "Como   consertar <b>a</b> torneira?",
                "porta\temperrada\r\nno quarto",
                "chuveiro elétrico não esquenta",
            ];
            for input in inputs {
                let once = sanitize(input).unwrap();
                let twice = sanitize(once.as_str()).unwrap();
                assert_eq!(once, twice);
            }
        }

        proptest! {
            #[test]
            fn accepted_output_is_a_fixed_point(input in ".{0,300}") {
                if let Ok(once) = sanitize(&input) {
                    let twice = sanitize(once.as_str()).unwrap();
                    prop_assert_eq!(once, twice);
                }
            }

            #[test]
            fn accepted_output_has_no_null_or_control(input in ".{0,300}") {
                if let Ok(out) = sanitize(&input) {
                    prop_assert!(!out.as_str().contains('\0'));
                    prop_assert!(out.as_str().chars().all(|c| !c.is_control()));
                }
            }
        }
    }
}
