//! Line formatters: combining a message with key/value pairs into one line.
//!
//! The formatter is the pluggable piece of the pipeline that decides the
//! output style. The default, [`Logfmt`], produces
//!
//! ```text
//! bad thing 7 x="1" y="2"
//! ```
//!
//! and, with the `json` feature, `Json` produces one JSON object per line.
//!
//! # Custom Formatters
//!
//! Anything implementing [`LineFormatter`] can be installed, including plain
//! closures:
//!
//! ```rust
//! use dotlog::{KeyValuePair, formatter::LineFormatter};
//!
//! let upper = |message: &str, pairs: &[KeyValuePair]| {
//!     Some(format!("{} ({} fields)", message.to_uppercase(), pairs.len()))
//! };
//! assert_eq!(upper.format_line("oops", &[]).as_deref(), Some("OOPS (0 fields)"));
//! ```

use crate::kv::KeyValuePair;

/// Formats a rendered message and its key/value pairs into a single line.
///
/// Returning `None` signals that formatting failed; the pipeline then falls
/// back to writing the raw message with a warning.
pub trait LineFormatter: 'static + Send + Sync {
    /// Formats one line. The line must not end in a newline; the sink adds
    /// it.
    fn format_line(&self, message: &str, pairs: &[KeyValuePair]) -> Option<String>;
}

impl<F> LineFormatter for F
where
    F: Fn(&str, &[KeyValuePair]) -> Option<String> + 'static + Send + Sync,
{
    fn format_line(&self, message: &str, pairs: &[KeyValuePair]) -> Option<String> {
        self(message, pairs)
    }
}

/// The default, logfmt-style formatter.
///
/// The message is copied verbatim and followed by `key="value"` tokens
/// separated by single spaces. A space separates the message from the first
/// token when the message is non-empty and does not already end in one.
/// Inside values `"` becomes `\"` and `\` becomes `\\`; every other byte,
/// whitespace and newlines included, is copied as is.
///
/// The output size is computed up front and allocated once.
///
/// # Examples
///
/// ```rust
/// use dotlog::{KeyValuePair, formatter::{LineFormatter, Logfmt}};
///
/// let pairs = [
///     KeyValuePair::new("path", r"C:\tmp"),
///     KeyValuePair::new("reason", r#"said "no""#),
/// ];
/// assert_eq!(
///     Logfmt.format_line("open failed", &pairs).unwrap(),
///     r#"open failed path="C:\\tmp" reason="said \"no\"""#
/// );
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Logfmt;

impl Logfmt {
    fn escaped_len(value: &str) -> usize {
        value.len() + value.bytes().filter(|b| matches!(b, b'"' | b'\\')).count()
    }

    fn push_escaped(line: &mut String, value: &str) {
        for c in value.chars() {
            match c {
                '"' => line.push_str("\\\""),
                '\\' => line.push_str("\\\\"),
                c => line.push(c),
            }
        }
    }
}

impl LineFormatter for Logfmt {
    fn format_line(&self, message: &str, pairs: &[KeyValuePair]) -> Option<String> {
        let lead_separator = !pairs.is_empty() && !message.is_empty() && !message.ends_with(' ');

        // key="value" per pair, plus one space before every pair but the first
        let required = message.len()
            + usize::from(lead_separator)
            + pairs
                .iter()
                .map(|pair| pair.key().len() + Self::escaped_len(pair.value()) + 3)
                .sum::<usize>()
            + pairs.len().saturating_sub(1);

        let mut line = String::new();
        if line.try_reserve_exact(required).is_err() {
            tracing::debug!(target: "dotlog", required, "logfmt formatter could not allocate");
            return None;
        }

        line.push_str(message);
        for (i, pair) in pairs.iter().enumerate() {
            if i > 0 || lead_separator {
                line.push(' ');
            }
            line.push_str(pair.key());
            line.push_str("=\"");
            Self::push_escaped(&mut line, pair.value());
            line.push('"');
        }
        debug_assert_eq!(line.len(), required);
        Some(line)
    }
}

/// A formatter producing one JSON object per line.
///
/// ```text
/// {"message":"bad thing 7","fields":{"x":"1","y":"2"}}
/// ```
///
/// Fields keep their extraction order.
#[cfg(feature = "json")]
#[derive(Copy, Clone, Debug, Default)]
pub struct Json;

#[cfg(feature = "json")]
impl LineFormatter for Json {
    fn format_line(&self, message: &str, pairs: &[KeyValuePair]) -> Option<String> {
        let mut fields = serde_json::Map::with_capacity(pairs.len());
        for pair in pairs {
            fields.insert(
                pair.key().to_owned(),
                serde_json::Value::String(pair.value().to_owned()),
            );
        }
        let line = serde_json::json!({
            "message": message,
            "fields": fields,
        });
        match serde_json::to_string(&line) {
            Ok(line) => Some(line),
            Err(error) => {
                tracing::debug!(target: "dotlog", %error, "json formatter failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<KeyValuePair> {
        items
            .iter()
            .map(|(key, value)| KeyValuePair::new(*key, *value))
            .collect()
    }

    #[test]
    fn test_logfmt_message_and_pairs() {
        let line = Logfmt
            .format_line("bad thing 7", &pairs(&[("x", "1"), ("y", "2")]))
            .unwrap();
        assert_eq!(line, r#"bad thing 7 x="1" y="2""#);
    }

    #[test]
    fn test_logfmt_message_only() {
        assert_eq!(Logfmt.format_line("just text", &[]).unwrap(), "just text");
        assert_eq!(Logfmt.format_line("", &[]).unwrap(), "");
    }

    #[test]
    fn test_logfmt_empty_message_has_no_leading_space() {
        let line = Logfmt.format_line("", &pairs(&[("a", "b")])).unwrap();
        assert_eq!(line, r#"a="b""#);
    }

    #[test]
    fn test_logfmt_message_ending_in_space() {
        let line = Logfmt.format_line("trailing ", &pairs(&[("a", "b")])).unwrap();
        assert_eq!(line, r#"trailing a="b""#);
    }

    #[test]
    fn test_logfmt_escapes_only_quote_and_backslash() {
        let line = Logfmt
            .format_line("m", &pairs(&[("v", "a\"b\\c\nd\te f")]))
            .unwrap();
        assert_eq!(line, "m v=\"a\\\"b\\\\c\nd\te f\"");
    }

    #[test]
    fn test_logfmt_plain_values_are_quoted_verbatim() {
        for value in ["", "plain", "with space", "ünïcödé", "tab\there"] {
            let line = Logfmt.format_line("", &pairs(&[("key", value)])).unwrap();
            assert_eq!(line, format!("key=\"{value}\""));
        }
    }

    #[test]
    fn test_closure_formatter() {
        let formatter = |message: &str, pairs: &[KeyValuePair]| -> Option<String> {
            (!pairs.is_empty()).then(|| format!("{message}|{}", pairs[0].value()))
        };
        assert_eq!(
            formatter.format_line("m", &pairs(&[("k", "v")])).as_deref(),
            Some("m|v")
        );
        assert_eq!(formatter.format_line("m", &[]), None);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_formatter_keeps_order() {
        let line = Json
            .format_line("bad \"thing\"", &pairs(&[("y", "2"), ("x", "1")]))
            .unwrap();
        assert_eq!(
            line,
            r#"{"message":"bad \"thing\"","fields":{"y":"2","x":"1"}}"#
        );
    }
}
