use thiserror::Error;

/// Core error types for firewalle
#[derive(Debug, Error)]
pub enum Error {
    /// An answer or lookup names a question the registry does not declare
    #[error("Unknown question id: {0}")]
    UnknownQuestionId(String),

    /// Two registry entries share the same id
    #[error("Duplicate question id in registry: {0}")]
    DuplicateQuestionId(&'static str),

    /// An address answer is not a syntactically valid IP address or network
    #[error("Malformed address for '{id}': {value}")]
    MalformedAddress { id: String, value: String },

    /// A composite selection names an option that does not exist
    #[error("Invalid selection for '{id}': option {option} does not exist")]
    InvalidSelection { id: String, option: u32 },

    /// The persisted answers record is not a well-formed id → value map
    #[error("Persisted answers record is malformed: {0}")]
    PersistedRecordMalformed(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl Error {
    /// Maps an error to a message and follow-up suggestions for the terminal.
    pub fn translate(&self) -> ErrorTranslation {
        match self {
            Error::UnknownQuestionId(id) => {
                ErrorTranslation::new(format!("The answers mention an unknown question '{id}'"))
                    .with_suggestion("The answers file may come from a different version")
                    .with_suggestion("Run with --action create to start from scratch")
            }
            Error::DuplicateQuestionId(id) => {
                ErrorTranslation::new(format!("Question '{id}' is declared twice"))
                    .with_suggestion("Every registry entry needs a unique id")
            }
            Error::MalformedAddress { id, value } => ErrorTranslation::new(format!(
                "'{value}' is not a valid IP address (question '{id}')"
            ))
            .with_suggestion("Use proper IP format: 192.168.1.1 or 192.168.1.0/24")
            .with_suggestion("For IPv6: 2001:db8::1 or 2001:db8::/32"),
            Error::InvalidSelection { id, option } => ErrorTranslation::new(format!(
                "Option {option} is not available for question '{id}'"
            ))
            .with_suggestion("Pick one of the numbers listed in the question"),
            Error::PersistedRecordMalformed(reason) => {
                ErrorTranslation::new(format!("Cannot load previous answers: {reason}"))
                    .with_suggestion("Pass the questions_*.json file written by an earlier run")
                    .with_suggestion("The file must contain a single JSON object")
            }
            Error::Io(e) => ErrorTranslation::new(format!("File operation failed: {e}"))
                .with_suggestion("Check that the target directory exists and is writable"),
            Error::Serialization(e) => ErrorTranslation::new(format!("Invalid JSON: {e}"))
                .with_suggestion("Check for missing quotes, brackets, or commas"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
