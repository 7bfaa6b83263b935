//! Structured error types for the Folio layout engine.
//!
//! Three variants cover the real error sources: JSON parsing, font loading,
//! and irrecoverable layout inconsistencies. Overflow is never an error.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// JSON input failed to parse as a valid Folio document.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A registered font could not be decoded or parsed.
    #[error("Font error: {0}")]
    Font(String),
    /// The layout pass reached an inconsistent state and was aborted.
    #[error("Layout error: {0}")]
    Layout(String),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Folio document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let message = err.to_string();
        assert!(message.starts_with("Failed to parse document"));
        assert!(message.contains("trailing commas"));
    }

    #[test]
    fn eof_errors_mention_truncation() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn layout_errors_display_their_message() {
        let err = FolioError::Layout("no open block".to_string());
        assert_eq!(err.to_string(), "Layout error: no open block");
    }
}
