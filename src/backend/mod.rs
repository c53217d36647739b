//! Identity/profile backend interface.
//!
//! The flow talks to the external identity provider through one
//! backend-agnostic trait so tests can swap in an in-memory double and
//! the finalization saga stays free of HTTP concerns.

pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use uuid::Uuid;

use crate::error::BackendError;
use crate::onboarding::record::Role;

pub use rest::RestBackend;

/// Payload for credential creation. Name and role ride along as auxiliary
/// metadata on the credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
    pub role: Role,
}

/// A usable authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A row of the `profiles` table, keyed by the credential's user id.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub handle: String,
    pub display_name: String,
    pub role: Role,
    /// Performer-only fields, unset at signup.
    pub artist_name: Option<String>,
    pub genre_tags: Option<Vec<String>>,
    pub location_tags: Option<Vec<String>>,
    pub profile_completed: bool,
}

/// Backend-agnostic interface to the identity/profile service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Create the credential. Returns the new user id.
    async fn create_credential(&self, cred: &NewCredential) -> Result<Uuid, BackendError>;

    /// The current session, if one is established. `Ok(None)` means the
    /// credential may exist without a usable session yet.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Insert the profile row keyed by the credential's user id.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BackendError>;

    /// Whether a profile with this handle already exists.
    async fn handle_exists(&self, handle: &str) -> Result<bool, BackendError>;
}
