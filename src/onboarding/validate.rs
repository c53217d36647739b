//! Pure field validators.
//!
//! Each validator takes a candidate string and returns either `Ok(())` or
//! the specific user-facing reason it fails. They are synchronous,
//! deterministic, and side-effect-free, so the screens call them on every
//! keystroke.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::onboarding::record::Field;

/// `local@domain.tld` shape: no whitespace, one `@`, a `.` after the `@`.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Lowercase letters, digits, and underscores only.
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("handle regex is valid"));

const MIN_NAME_LEN: usize = 2;
const MIN_HANDLE_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Display name: non-empty after trimming, at least 2 characters.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Email shape check. Not a deliverability check.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Password: at least 6 characters, no other constraint. Inclusive at 6.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Username: at least 3 characters of lowercase letters, digits, underscore.
pub fn validate_handle(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_HANDLE_LEN {
        return Err(ValidationError::HandleTooShort);
    }
    if !HANDLE_RE.is_match(value) {
        return Err(ValidationError::HandleInvalidChars);
    }
    Ok(())
}

/// Run the validator for a given record field.
pub fn validate_field(field: Field, value: &str) -> Result<(), ValidationError> {
    match field {
        Field::Name => validate_name(value),
        Field::Handle => validate_handle(value),
        Field::Email => validate_email(value),
        Field::Password => validate_password(value),
    }
}

/// Local draft of the field currently being edited, with touched-state
/// feedback: an untouched or still-empty field shows no error, and once
/// touched every edit revalidates.
///
/// The draft is reconciled into the shared record only when the step
/// advances; until then it is the screen's private state.
#[derive(Debug, Clone)]
pub struct FieldDraft {
    field: Field,
    value: String,
    touched: bool,
}

impl FieldDraft {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            value: String::new(),
            touched: false,
        }
    }

    /// Start from a previously committed value (revisiting a step).
    pub fn with_value(field: Field, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
            touched: false,
        }
    }

    /// Record a keystroke. Marks the field touched.
    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.touched = true;
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the current value would pass its validator.
    pub fn is_valid(&self) -> bool {
        validate_field(self.field, &self.value).is_ok()
    }

    /// Inline error to display, if any. Untouched and empty fields show
    /// nothing even when invalid.
    pub fn error(&self) -> Option<ValidationError> {
        if !self.touched || self.value.is_empty() {
            return None;
        }
        validate_field(self.field, &self.value).err()
    }
}
