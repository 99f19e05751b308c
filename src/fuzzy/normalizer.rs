//! Message normalization: volatile substrings become stable placeholders

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    /// Ordered (pattern, placeholder) pairs. Specific shapes run before the
    /// generic number pattern so their digits are not tagged as `<NUM>`.
    /// Digit and word classes are ASCII only.
    static ref PATTERNS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
            )
            .expect("uuid pattern"),
            "<UUID>",
        ),
        (
            Regex::new(r"\b[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}(:[0-9]+)?\b")
                .expect("ip pattern"),
            "<IP>",
        ),
        (
            Regex::new(r"\b[0-9a-fA-F]{24,}\b").expect("hex pattern"),
            "<HEX>",
        ),
        (
            Regex::new(concat!(
                r"[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}:[0-9]{2}",
                r"(\.[0-9]+)?(Z|[+-][0-9]{2}:?[0-9]{2})?",
            ))
            .expect("timestamp pattern"),
            "<TIMESTAMP>",
        ),
        (
            Regex::new(r"/[A-Za-z0-9_./]+(:[0-9]+)?").expect("path pattern"),
            "<PATH>",
        ),
        (
            Regex::new(r"\b[0-9]+(\.[0-9]+)?\b").expect("number pattern"),
            "<NUM>",
        ),
    ];
}

/// Rewrite a raw log message into its template form
pub fn normalize(message: &str) -> String {
    let mut normalized = message.to_string();
    for (pattern, placeholder) in PATTERNS.iter() {
        let replaced = match pattern.replace_all(&normalized, *placeholder) {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };
        if let Some(replaced) = replaced {
            normalized = replaced;
        }
    }
    normalized
}
