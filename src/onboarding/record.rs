//! The onboarding record and its shared store.
//!
//! The store is the single source of truth for the in-progress
//! registration. It performs no validation — that belongs to the
//! validators and the step sequencer — it is a fixed-schema merge that
//! every step screen reads from and writes into. It is explicitly
//! constructed and cloned into collaborators so tests can run independent
//! flows side by side.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// How the new user intends to use the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Listener,
    Performer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listener => write!(f, "listener"),
            Self::Performer => write!(f, "performer"),
        }
    }
}

/// A text field of the onboarding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Handle,
    Email,
    Password,
}

/// The accumulating draft of a new user's registration data.
#[derive(Debug, Clone)]
pub struct OnboardingRecord {
    /// Set once at role selection; cleared only by restarting the flow.
    pub role: Option<Role>,
    pub name: String,
    /// Unique public username. Uniqueness is verified remotely.
    pub handle: String,
    pub email: String,
    pub password: SecretString,
}

impl Default for OnboardingRecord {
    fn default() -> Self {
        Self {
            role: None,
            name: String::new(),
            handle: String::new(),
            email: String::new(),
            password: SecretString::from(""),
        }
    }
}

impl OnboardingRecord {
    /// True if every field is back to its initial empty state.
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.name.is_empty()
            && self.handle.is_empty()
            && self.email.is_empty()
            && self.password.expose_secret().is_empty()
    }
}

/// Shared, mutable onboarding record.
///
/// Updates are applied in the order issued; `get` returns a snapshot.
#[derive(Clone, Default)]
pub struct OnboardingStore {
    inner: Arc<RwLock<OnboardingRecord>>,
}

impl OnboardingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current record.
    pub async fn get(&self) -> OnboardingRecord {
        self.inner.read().await.clone()
    }

    /// Merge one field, preserving the others.
    ///
    /// Values are normalized at write time the way the screens submit
    /// them: name and email trimmed, email and handle lowercased.
    /// Passwords are stored verbatim.
    pub async fn update(&self, field: Field, value: &str) {
        let mut record = self.inner.write().await;
        match field {
            Field::Name => record.name = value.trim().to_string(),
            Field::Handle => record.handle = value.trim().to_lowercase(),
            Field::Email => record.email = value.trim().to_lowercase(),
            Field::Password => record.password = SecretString::from(value),
        }
    }

    /// Set the role. Crate-internal: only the step sequencer writes the
    /// role, so its immutability rule cannot be sidestepped through a
    /// store clone.
    pub(crate) async fn set_role(&self, role: Role) {
        self.inner.write().await.role = Some(role);
    }

    /// Restore the all-empty initial record. Used when the flow is
    /// abandoned or restarted.
    pub async fn reset(&self) {
        *self.inner.write().await = OnboardingRecord::default();
    }
}
