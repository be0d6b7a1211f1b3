//! Error types for AyurSutra.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Assessment error: {0}")]
    Assessment(#[from] AssessmentError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the question catalog, normalizer, and scoring engine.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("Unknown question: {id}")]
    UnknownQuestion { id: String },

    /// The submitted text is not among the current question's options.
    /// Recoverable: the caller re-prompts with the same question.
    #[error("Invalid option {selected:?} for question {question_id}")]
    InvalidOption {
        question_id: String,
        selected: String,
    },

    /// Scoring was invoked without one answer per catalog question.
    /// Contract violation: the state machine only scores at completion.
    #[error("Incomplete answer set: expected {expected} answers, got {actual}")]
    IncompleteAnswerSet { expected: usize, actual: usize },

    /// An answer was submitted to an already-complete session.
    /// Contract violation: the dispatcher routes complete sessions to
    /// free-text handling instead.
    #[error("Session {session_id} already completed its assessment")]
    AlreadyComplete { session_id: String },
}

/// Errors from the conversation dispatcher and session registry.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No registry entry for the session identifier. Recoverable: the
    /// dispatcher treats the message as coming from a fresh session.
    #[error("Unknown session: {session_id}")]
    UnknownSession { session_id: String },

    /// An outbound send failed (connection already closed). The send is
    /// discarded and the session deregistered; never retried.
    #[error("Delivery failed for session {session_id}: {reason}")]
    DeliveryFailure { session_id: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
