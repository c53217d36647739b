//! Step sequencer — the fixed linear order of signup steps.
//!
//! The sequencer owns the position in the flow and gates forward
//! progress: an advance validates the step's field, writes it into the
//! shared store, and only then moves the index, so a revisited screen can
//! never observe a transition without the matching field write.

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::onboarding::availability::HandleStatus;
use crate::onboarding::record::{Field, OnboardingRecord, OnboardingStore, Role};
use crate::onboarding::validate::{
    validate_email, validate_field, validate_handle, validate_name, validate_password,
};
use crate::nav::Route;

use secrecy::ExposeSecret;

/// One screen of the signup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupStep {
    RoleSelection,
    Name,
    Handle,
    Email,
    Password,
    /// Performer-only post-signup step.
    CompleteProfile,
}

const LISTENER_STEPS: &[SignupStep] = &[
    SignupStep::RoleSelection,
    SignupStep::Name,
    SignupStep::Handle,
    SignupStep::Email,
    SignupStep::Password,
];

const PERFORMER_STEPS: &[SignupStep] = &[
    SignupStep::RoleSelection,
    SignupStep::Name,
    SignupStep::Handle,
    SignupStep::Email,
    SignupStep::Password,
    SignupStep::CompleteProfile,
];

impl SignupStep {
    /// The navigation target for this step.
    pub fn route(&self) -> Route {
        match self {
            Self::RoleSelection => Route::RoleSelection,
            Self::Name => Route::SignupName,
            Self::Handle => Route::SignupHandle,
            Self::Email => Route::SignupEmail,
            Self::Password => Route::SignupPassword,
            Self::CompleteProfile => Route::CompleteProfile,
        }
    }

    /// Whether the field(s) this step touches satisfy their validators.
    ///
    /// For the handle step this is the local format check only; remote
    /// uniqueness is the availability checker's verdict and is gated at
    /// `advance_handle`.
    pub fn is_satisfied_by(&self, record: &OnboardingRecord) -> bool {
        match self {
            Self::RoleSelection => record.role.is_some(),
            Self::Name => validate_name(&record.name).is_ok(),
            Self::Handle => validate_handle(&record.handle).is_ok(),
            Self::Email => validate_email(&record.email).is_ok(),
            Self::Password => validate_password(record.password.expose_secret()).is_ok(),
            Self::CompleteProfile => true,
        }
    }
}

impl std::fmt::Display for SignupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RoleSelection => "role_selection",
            Self::Name => "name",
            Self::Handle => "handle",
            Self::Email => "email",
            Self::Password => "password",
            Self::CompleteProfile => "complete_profile",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a successful advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to the next step.
    Moved(SignupStep),
    /// The sequence is exhausted; the record is ready for finalization.
    Finished,
}

/// The role-dependent step sequence. Until a role is chosen the base
/// (listener-length) sequence applies; performers gain a trailing
/// profile-completion step.
pub fn sequence_for(role: Option<Role>) -> &'static [SignupStep] {
    match role {
        Some(Role::Performer) => PERFORMER_STEPS,
        _ => LISTENER_STEPS,
    }
}

/// Tracks the current step and gates transitions.
pub struct StepSequencer {
    store: OnboardingStore,
    index: usize,
}

impl StepSequencer {
    /// Start at the first step of a fresh or existing flow.
    pub fn new(store: OnboardingStore) -> Self {
        Self { store, index: 0 }
    }

    pub fn store(&self) -> &OnboardingStore {
        &self.store
    }

    /// The live sequence and the stored index forced back into its bounds.
    ///
    /// Other holders of the store clone can clear the record out from under
    /// us (sign-out resets the record, not the sequencer), which shrinks the
    /// role-dependent sequence. A role-less record always maps back to the
    /// first step; otherwise the index is clamped to the last valid one.
    async fn slot(&self) -> (&'static [SignupStep], usize) {
        let role = self.store.get().await.role;
        let sequence = sequence_for(role);
        let index = if role.is_none() {
            0
        } else {
            self.index.min(sequence.len() - 1)
        };
        (sequence, index)
    }

    pub async fn current(&self) -> SignupStep {
        let (sequence, index) = self.slot().await;
        sequence[index]
    }

    /// 1-based position and total, for the step header.
    pub async fn position(&self) -> (usize, usize) {
        let (sequence, index) = self.slot().await;
        (index + 1, sequence.len())
    }

    /// Whether the current step's field already satisfies its validator.
    pub async fn can_advance(&self) -> bool {
        let record = self.store.get().await;
        let sequence = sequence_for(record.role);
        let index = if record.role.is_none() {
            0
        } else {
            self.index.min(sequence.len() - 1)
        };
        sequence[index].is_satisfied_by(&record)
    }

    /// Choose the role at the role-selection step.
    ///
    /// Once a role is set, revisiting this step can only re-confirm the
    /// same role; changing it requires `reset`.
    pub async fn choose_role(&mut self, role: Role) -> Result<StepOutcome, StepError> {
        self.index = self.slot().await.1;
        let step = self.current().await;
        if step != SignupStep::RoleSelection {
            return Err(StepError::WrongInput {
                step: step.to_string(),
            });
        }
        if let Some(existing) = self.store.get().await.role {
            if existing != role {
                return Err(StepError::RoleLocked);
            }
        }
        self.store.set_role(role).await;
        tracing::info!(%role, "Role chosen");
        self.advance_index().await
    }

    /// Validate and commit the current step's field, then advance.
    ///
    /// Not valid for the handle step, which needs a remote-availability
    /// verdict — use [`advance_handle`](Self::advance_handle).
    pub async fn advance_with(&mut self, value: &str) -> Result<StepOutcome, StepError> {
        self.index = self.slot().await.1;
        let step = self.current().await;
        let field = match step {
            SignupStep::Name => Field::Name,
            SignupStep::Email => Field::Email,
            SignupStep::Password => Field::Password,
            SignupStep::RoleSelection
            | SignupStep::Handle
            | SignupStep::CompleteProfile => {
                return Err(StepError::WrongInput {
                    step: step.to_string(),
                });
            }
        };
        validate_field(field, value)?;
        // Field write happens before the index moves; the two are never
        // observably separated.
        self.store.update(field, value).await;
        self.advance_index().await
    }

    /// Commit the handle and advance. Requires the availability checker's
    /// current verdict for this exact value to be `Available`.
    pub async fn advance_handle(
        &mut self,
        value: &str,
        status: &HandleStatus,
    ) -> Result<StepOutcome, StepError> {
        self.index = self.slot().await.1;
        let step = self.current().await;
        if step != SignupStep::Handle {
            return Err(StepError::WrongInput {
                step: step.to_string(),
            });
        }
        validate_handle(value)?;
        if *status != HandleStatus::Available {
            return Err(StepError::HandleNotConfirmed {
                status: status.to_string(),
            });
        }
        self.store.update(Field::Handle, value).await;
        self.advance_index().await
    }

    /// Go back one step. Always succeeds; clamps at the first step.
    pub async fn retreat(&mut self) -> SignupStep {
        self.index = self.slot().await.1;
        if self.index > 0 {
            self.index -= 1;
        }
        self.current().await
    }

    /// Restart the flow: empty record, first step.
    pub async fn reset(&mut self) {
        self.store.reset().await;
        self.index = 0;
        tracing::info!("Onboarding flow reset");
    }

    async fn advance_index(&mut self) -> Result<StepOutcome, StepError> {
        let (sequence, index) = self.slot().await;
        self.index = index;
        if self.index + 1 < sequence.len() {
            self.index += 1;
            let next = sequence[self.index];
            tracing::info!(step = %next, "Advanced to step");
            Ok(StepOutcome::Moved(next))
        } else {
            tracing::info!("Signup sequence finished");
            Ok(StepOutcome::Finished)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sequencer() -> StepSequencer {
        StepSequencer::new(OnboardingStore::new())
    }

    #[tokio::test]
    async fn listener_walks_five_steps() {
        let mut seq = sequencer().await;
        assert_eq!(seq.current().await, SignupStep::RoleSelection);
        assert_eq!(seq.position().await, (1, 5));

        assert_eq!(
            seq.choose_role(Role::Listener).await.unwrap(),
            StepOutcome::Moved(SignupStep::Name)
        );
        assert_eq!(
            seq.advance_with("Ana").await.unwrap(),
            StepOutcome::Moved(SignupStep::Handle)
        );
        assert_eq!(
            seq.advance_handle("ana_b", &HandleStatus::Available)
                .await
                .unwrap(),
            StepOutcome::Moved(SignupStep::Email)
        );
        assert_eq!(
            seq.advance_with("ana@x.com").await.unwrap(),
            StepOutcome::Moved(SignupStep::Password)
        );
        assert_eq!(
            seq.advance_with("secret1").await.unwrap(),
            StepOutcome::Finished
        );

        let record = seq.store().get().await;
        assert_eq!(record.role, Some(Role::Listener));
        assert_eq!(record.name, "Ana");
        assert_eq!(record.handle, "ana_b");
        assert_eq!(record.email, "ana@x.com");
    }

    #[tokio::test]
    async fn performer_gains_profile_completion_step() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Performer).await.unwrap();
        assert_eq!(seq.position().await, (2, 6));

        seq.advance_with("Ana").await.unwrap();
        seq.advance_handle("ana_b", &HandleStatus::Available)
            .await
            .unwrap();
        seq.advance_with("ana@x.com").await.unwrap();
        assert_eq!(
            seq.advance_with("secret1").await.unwrap(),
            StepOutcome::Moved(SignupStep::CompleteProfile)
        );
        assert_eq!(seq.position().await, (6, 6));
    }

    #[tokio::test]
    async fn advance_refuses_invalid_field() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();

        let err = seq.advance_with("A").await.unwrap_err();
        assert_eq!(
            err,
            StepError::Validation(crate::error::ValidationError::NameTooShort)
        );
        // Failed advance leaves both position and record untouched
        assert_eq!(seq.current().await, SignupStep::Name);
        assert_eq!(seq.store().get().await.name, "");
    }

    #[tokio::test]
    async fn password_boundary_gates_advancement() {
        let store = OnboardingStore::new();
        store.update(Field::Password, "abc12").await;
        assert!(!SignupStep::Password.is_satisfied_by(&store.get().await));

        store.update(Field::Password, "abc123").await;
        assert!(SignupStep::Password.is_satisfied_by(&store.get().await));
    }

    #[tokio::test]
    async fn handle_requires_available_verdict() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();
        seq.advance_with("Ana").await.unwrap();

        for status in [
            HandleStatus::Unknown,
            HandleStatus::Checking,
            HandleStatus::Taken,
            HandleStatus::Error {
                message: "boom".into(),
            },
        ] {
            let err = seq.advance_handle("ana_b", &status).await.unwrap_err();
            assert!(matches!(err, StepError::HandleNotConfirmed { .. }));
        }
        assert_eq!(seq.current().await, SignupStep::Handle);

        seq.advance_handle("ana_b", &HandleStatus::Available)
            .await
            .unwrap();
        assert_eq!(seq.current().await, SignupStep::Email);
    }

    #[tokio::test]
    async fn handle_format_checked_before_availability() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();
        seq.advance_with("Ana").await.unwrap();

        // Even a (stale) Available verdict cannot push through a bad format
        let err = seq
            .advance_handle("Ana!", &HandleStatus::Available)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StepError::Validation(crate::error::ValidationError::HandleInvalidChars)
        );
    }

    #[tokio::test]
    async fn retreat_clamps_at_first_step() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();
        assert_eq!(seq.retreat().await, SignupStep::RoleSelection);
        assert_eq!(seq.retreat().await, SignupStep::RoleSelection);
    }

    #[tokio::test]
    async fn role_locked_after_advancing() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();
        seq.retreat().await;

        // Re-confirming the same role is fine
        assert_eq!(
            seq.choose_role(Role::Listener).await.unwrap(),
            StepOutcome::Moved(SignupStep::Name)
        );
        seq.retreat().await;

        // Switching roles requires a reset
        assert_eq!(
            seq.choose_role(Role::Performer).await.unwrap_err(),
            StepError::RoleLocked
        );

        seq.reset().await;
        assert_eq!(seq.current().await, SignupStep::RoleSelection);
        seq.choose_role(Role::Performer).await.unwrap();
        assert_eq!(seq.store().get().await.role, Some(Role::Performer));
    }

    #[tokio::test]
    async fn choose_role_rejected_off_step() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Listener).await.unwrap();
        let err = seq.choose_role(Role::Listener).await.unwrap_err();
        assert!(matches!(err, StepError::WrongInput { .. }));
    }

    #[tokio::test]
    async fn reset_restores_first_step_and_empty_record() {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Performer).await.unwrap();
        seq.advance_with("Ana").await.unwrap();

        seq.reset().await;
        assert_eq!(seq.current().await, SignupStep::RoleSelection);
        assert_eq!(seq.position().await, (1, 5));
        assert!(seq.store().get().await.is_empty());
    }

    #[tokio::test]
    async fn can_advance_tracks_record_state() {
        let mut seq = sequencer().await;
        assert!(!seq.can_advance().await);
        seq.choose_role(Role::Listener).await.unwrap();

        assert!(!seq.can_advance().await);
        seq.store().update(Field::Name, "Ana").await;
        assert!(seq.can_advance().await);
    }

    async fn performer_at_last_step() -> StepSequencer {
        let mut seq = sequencer().await;
        seq.choose_role(Role::Performer).await.unwrap();
        seq.advance_with("Ana").await.unwrap();
        seq.advance_handle("ana_b", &HandleStatus::Available)
            .await
            .unwrap();
        seq.advance_with("ana@x.com").await.unwrap();
        seq.advance_with("secret1").await.unwrap();
        assert_eq!(seq.current().await, SignupStep::CompleteProfile);
        seq
    }

    #[tokio::test]
    async fn external_store_reset_returns_flow_to_first_step() {
        let seq = performer_at_last_step().await;
        let store = seq.store().clone();

        // Another holder of the store clone wipes the record (sign-out)
        // without touching the sequencer.
        store.reset().await;

        assert_eq!(seq.current().await, SignupStep::RoleSelection);
        assert_eq!(seq.position().await, (1, 5));
        assert!(!seq.can_advance().await);

        // And the flow restarts cleanly from there.
        let mut seq = seq;
        assert_eq!(
            seq.choose_role(Role::Listener).await.unwrap(),
            StepOutcome::Moved(SignupStep::Name)
        );
    }

    #[tokio::test]
    async fn role_change_that_shrinks_sequence_clamps_position() {
        let seq = performer_at_last_step().await;

        // A crate-internal writer drops the performer-only tail out from
        // under the stored position.
        seq.store().set_role(Role::Listener).await;

        assert_eq!(seq.current().await, SignupStep::Password);
        assert_eq!(seq.position().await, (5, 5));
    }

    #[test]
    fn step_display_matches_serde() {
        for step in [
            SignupStep::RoleSelection,
            SignupStep::Name,
            SignupStep::Handle,
            SignupStep::Email,
            SignupStep::Password,
            SignupStep::CompleteProfile,
        ] {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
