//! Onboarding core — the multi-step sign-up flow.
//!
//! A fixed linear sequence of steps (role, name, username, email,
//! password) accumulates an [`OnboardingRecord`] in a shared store. Each
//! step validates locally before the sequencer lets it advance; the
//! username step additionally consults a debounced remote availability
//! check. The final step hands the assembled record to [`SignupFlow`],
//! which performs the two-phase credential-then-profile write and routes
//! by role.

pub mod availability;
pub mod record;
pub mod signup;
pub mod step;
pub mod validate;

pub use availability::{HandleChecker, HandleStatus};
pub use record::{Field, OnboardingRecord, OnboardingStore, Role};
pub use signup::{FailureKind, SignupFlow, SignupPhase};
pub use step::{SignupStep, StepOutcome, StepSequencer, sequence_for};
pub use validate::{
    FieldDraft, validate_email, validate_field, validate_handle, validate_name,
    validate_password,
};
