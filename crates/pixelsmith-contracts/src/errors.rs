use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    RateLimit,
    ModelLoading,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ModelLoading => "model_loading",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// The model was cold; resubmitting shortly is expected to work.
    pub fn is_transient(self) -> bool {
        self == ErrorKind::ModelLoading
    }

    /// Classifies a failed inference call.
    ///
    /// The HTTP status, when known, is prefixed to the message and the
    /// combined text is searched case-insensitively: authentication first,
    /// then rate limiting, then model loading.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lowered = match status {
            Some(code) => format!("{code} {message}").to_lowercase(),
            None => message.to_lowercase(),
        };
        if lowered.contains("401") || lowered.contains("unauthorized") {
            ErrorKind::Authentication
        } else if lowered.contains("429") || lowered.contains("rate") {
            ErrorKind::RateLimit
        } else if lowered.contains("503") || lowered.contains("loading") {
            ErrorKind::ModelLoading
        } else {
            ErrorKind::Unknown
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed submission, already classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationError {
    kind: ErrorKind,
    message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn from_provider(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorKind::classify(status, &message), message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The raw message as produced by validation or the remote API.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status line shown to the user.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation => format!("Please fix the request: {}", self.message),
            ErrorKind::Authentication => "Authentication Error: Invalid API token.".to_string(),
            ErrorKind::RateLimit => {
                "Rate Limit Reached. Please wait a moment and try again.".to_string()
            }
            ErrorKind::ModelLoading => {
                "Model is loading... Please try again in a few seconds.".to_string()
            }
            ErrorKind::Unknown => format!("Error: {}", self.message),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for GenerationError {}
