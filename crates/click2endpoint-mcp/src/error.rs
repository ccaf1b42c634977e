//! Error types shared across the wizard, the parameter engine and the service clients.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while driving the question wizard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("unknown question '{0}'")]
    UnknownQuestion(String),
    #[error("'{value}' is not an option for {question}")]
    InvalidOption { question: String, value: String },
    #[error("no selection to confirm")]
    NothingSelected,
    #[error("no answered question to go back to")]
    NothingToUndo,
    #[error("all questions are answered")]
    Complete,
}

/// Errors raised while editing a parameter form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is not a oneOf field")]
    NotOneOf(String),
    #[error("unknown variant '{variant}' for field '{field}'")]
    UnknownVariant { field: String, variant: String },
    #[error("field '{0}' is not an array")]
    NotArray(String),
    #[error("index {index} out of range for '{field}' (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("invalid field path '{0}'")]
    InvalidPath(String),
    #[error("payload blocked by {0} validation error(s)")]
    Blocked(usize),
}

/// Failures from the external collaborators (auth, LLM, mock discovery, script runner).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("No input provided")]
    EmptyInput,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{context} failed with status {status}: {body}")]
    Status {
        context: &'static str,
        status: u16,
        body: String,
    },
    /// Error message reported by the upstream API itself.
    #[error("{0}")]
    Upstream(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_wording() {
        assert_eq!(
            ServiceError::NotConfigured("OpenAI API key").to_string(),
            "OpenAI API key not configured"
        );
        assert_eq!(ServiceError::EmptyInput.to_string(), "No input provided");
        let e = FormError::UnknownVariant {
            field: "paymentDetails".into(),
            variant: "cash".into(),
        };
        assert_eq!(
            e.to_string(),
            "unknown variant 'cash' for field 'paymentDetails'"
        );
    }
}
