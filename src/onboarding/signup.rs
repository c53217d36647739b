//! Account finalization — the two-phase credential-then-profile write.
//!
//! This is a manual saga with no automatic compensation: the credential
//! write, the session check, and the profile write happen in order, each
//! failure aborting the rest. The phases are modeled explicitly so the
//! orphaned-credential states (credential without session, credential
//! without profile) are first-class and testable rather than buried in
//! error-handling nesting.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::backend::{AuthBackend, NewCredential, NewProfile};
use crate::error::SignupError;
use crate::nav::Route;
use crate::onboarding::record::{OnboardingRecord, Role};
use crate::onboarding::validate::{
    validate_email, validate_handle, validate_name, validate_password,
};

/// What finalization failed on, kept on the `Failed` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider refused the credential; nothing was created.
    Credential,
    /// The credential exists but no usable session followed.
    Session,
    /// The credential exists but the profile row was not written.
    ProfileWrite,
}

/// Progress of a finalization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupPhase {
    NotStarted,
    CredentialCreated,
    SessionConfirmed,
    ProfileWritten,
    Failed(FailureKind),
}

/// Runs account finalization for a fully validated record.
///
/// At most one attempt is in flight at a time; a second call while the
/// first is still running is rejected, not queued.
pub struct SignupFlow {
    backend: Arc<dyn AuthBackend>,
    phase: RwLock<SignupPhase>,
    in_flight: Mutex<()>,
}

impl SignupFlow {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            phase: RwLock::new(SignupPhase::NotStarted),
            in_flight: Mutex::new(()),
        }
    }

    /// The phase the most recent attempt reached.
    pub async fn phase(&self) -> SignupPhase {
        *self.phase.read().await
    }

    /// Submit the assembled record and route by role on success.
    ///
    /// No automatic retry: every failure is surfaced so the user can
    /// re-attempt the gesture, and the error variant tells them whether a
    /// credential already exists.
    pub async fn finalize(&self, record: &OnboardingRecord) -> Result<Route, SignupError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SignupError::AlreadyInFlight)?;

        let role = ensure_ready(record)?;
        *self.phase.write().await = SignupPhase::NotStarted;

        // Step 1: create the credential. Terminal on failure — nothing
        // was created.
        let credential = NewCredential {
            email: record.email.clone(),
            password: record.password.clone(),
            full_name: record.name.clone(),
            role,
        };
        let user_id = match self.backend.create_credential(&credential).await {
            Ok(id) => id,
            Err(e) => {
                *self.phase.write().await = SignupPhase::Failed(FailureKind::Credential);
                warn!(error = %e, "Credential creation failed");
                return Err(SignupError::Credential(e.to_string()));
            }
        };
        *self.phase.write().await = SignupPhase::CredentialCreated;

        // Step 2: the provider may create the credential without an
        // immediately usable session.
        match self.backend.get_session().await {
            Ok(Some(_)) => {
                *self.phase.write().await = SignupPhase::SessionConfirmed;
            }
            Ok(None) => {
                *self.phase.write().await = SignupPhase::Failed(FailureKind::Session);
                warn!(%user_id, "Credential created but no session established");
                return Err(SignupError::SessionNotEstablished);
            }
            Err(e) => {
                *self.phase.write().await = SignupPhase::Failed(FailureKind::Session);
                warn!(%user_id, error = %e, "Session check failed after credential creation");
                return Err(SignupError::SessionCheck(e.to_string()));
            }
        }

        // Step 3: profile row keyed by the new user id. A failure here
        // leaves an orphaned credential — reported as its own kind so
        // recovery (retry under the existing credential) is not confused
        // with a step-1 failure.
        let profile = NewProfile {
            id: user_id,
            full_name: record.name.clone(),
            handle: record.handle.clone(),
            display_name: record.name.clone(),
            role,
            artist_name: None,
            genre_tags: None,
            location_tags: None,
            profile_completed: role == Role::Listener,
        };
        if let Err(e) = self.backend.insert_profile(&profile).await {
            *self.phase.write().await = SignupPhase::Failed(FailureKind::ProfileWrite);
            error!(%user_id, error = %e, "Profile write failed; credential is orphaned");
            return Err(SignupError::ProfileWrite {
                user_id,
                message: e.to_string(),
            });
        }
        *self.phase.write().await = SignupPhase::ProfileWritten;

        // Step 4: branch by role.
        let route = match role {
            Role::Performer => Route::CompleteProfile,
            Role::Listener => Route::Tabs,
        };
        info!(%user_id, %role, destination = %route, "Account created");
        Ok(route)
    }
}

/// The record must never reach the backend unless every required field
/// satisfies its validator.
fn ensure_ready(record: &OnboardingRecord) -> Result<Role, SignupError> {
    let role = record.role.ok_or(SignupError::MissingRole)?;
    validate_name(&record.name)?;
    validate_handle(&record.handle)?;
    validate_email(&record.email)?;
    validate_password(record.password.expose_secret())?;
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::SecretString;

    fn valid_record(role: Role) -> OnboardingRecord {
        OnboardingRecord {
            role: Some(role),
            name: "Ana".to_string(),
            handle: "ana_b".to_string(),
            email: "ana@x.com".to_string(),
            password: SecretString::from("secret1"),
        }
    }

    #[test]
    fn readiness_requires_role() {
        let record = OnboardingRecord {
            role: None,
            ..valid_record(Role::Listener)
        };
        assert!(matches!(
            ensure_ready(&record),
            Err(SignupError::MissingRole)
        ));
    }

    #[test]
    fn readiness_requires_every_validator() {
        let mut record = valid_record(Role::Listener);
        record.password = SecretString::from("abc12");
        assert!(matches!(
            ensure_ready(&record),
            Err(SignupError::Incomplete(_))
        ));

        let mut record = valid_record(Role::Listener);
        record.email = "not-an-email".to_string();
        assert!(matches!(
            ensure_ready(&record),
            Err(SignupError::Incomplete(_))
        ));
    }

    #[test]
    fn readiness_passes_for_complete_record() {
        assert!(matches!(
            ensure_ready(&valid_record(Role::Performer)),
            Ok(Role::Performer)
        ));
    }
}
