//! Error types for the onboarding core.
//!
//! The taxonomy mirrors the flow's recovery paths: local validation
//! failures are always recoverable inline, while the three remote failure
//! points of account finalization (credential, session, profile write) are
//! distinct variants because each one requires a different recovery.

use uuid::Uuid;

/// Top-level error type for the onboarding core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("Signup error: {0}")]
    Signup(#[from] SignupError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A field failed its static validator.
///
/// The `Display` text is the inline copy the signup screens show, so the
/// messages are user-facing, not diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at least 2 characters")]
    NameTooShort,

    #[error("Email is required")]
    EmailRequired,

    #[error("Please enter a valid email")]
    EmailInvalid,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Must be at least 6 characters")]
    PasswordTooShort,

    #[error("Username must be at least 3 characters")]
    HandleTooShort,

    #[error("Only lowercase letters, numbers, and underscores")]
    HandleInvalidChars,
}

/// Step sequencer errors — a gated transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Step {step} does not accept this input")]
    WrongInput { step: String },

    #[error("Role can only be changed by restarting the flow")]
    RoleLocked,

    #[error("Username is not confirmed available (status: {status})")]
    HandleNotConfirmed { status: String },
}

/// Account finalization errors.
///
/// `Credential`, `SessionNotEstablished`, and `ProfileWrite` map to the
/// three remote steps of the two-phase write and must stay distinct: a
/// credential failure creates nothing, while the other two leave an
/// orphaned credential the user recovers by retrying or signing in, not by
/// re-registering.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    /// The identity provider refused to create the credential. The
    /// provider's message is surfaced verbatim.
    #[error("{0}")]
    Credential(String),

    /// The credential was created but no usable session followed.
    #[error("No session established. Please try logging in.")]
    SessionNotEstablished,

    /// The session lookup itself failed after credential creation.
    #[error("Could not confirm session: {0}")]
    SessionCheck(String),

    /// The credential exists but the profile row could not be written.
    #[error("Account {user_id} was created but the profile could not be saved: {message}")]
    ProfileWrite { user_id: Uuid, message: String },

    /// A finalization attempt is already running.
    #[error("Signup already in progress")]
    AlreadyInFlight,

    /// The record was submitted before every field passed validation.
    #[error("Record not ready for signup: {0}")]
    Incomplete(#[from] ValidationError),

    #[error("No role selected")]
    MissingRole,
}

/// Identity/profile backend errors.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

/// Result type alias for the onboarding core.
pub type Result<T> = std::result::Result<T, Error>;
