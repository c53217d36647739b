//! Interactive terminal wizard driving the signup flow end to end
//! against the configured backend.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use kewit_onboard::backend::{AuthBackend, RestBackend};
use kewit_onboard::config::{BackendConfig, OnboardingConfig};
use kewit_onboard::nav::Route;
use kewit_onboard::onboarding::{
    HandleChecker, HandleStatus, OnboardingStore, Role, SignupFlow, SignupStep, StepOutcome,
    StepSequencer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let backend_config = BackendConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export KEWIT_BACKEND_URL=https://<project>.supabase.co");
        eprintln!("  export KEWIT_BACKEND_KEY=<publishable key>");
        std::process::exit(1);
    });
    let config = OnboardingConfig::default();

    eprintln!("🥝 Kewit signup v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", backend_config.base_url);
    eprintln!("   Debounce: {:?}\n", config.handle_debounce);

    let backend: Arc<dyn AuthBackend> = Arc::new(RestBackend::new(backend_config));
    let store = OnboardingStore::new();
    let mut sequencer = StepSequencer::new(store.clone());
    let checker = HandleChecker::new(Arc::clone(&backend), config.handle_debounce);
    let flow = SignupFlow::new(Arc::clone(&backend));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let step = sequencer.current().await;
        let (position, total) = sequencer.position().await;
        eprintln!("── Step {position}/{total}: {step} ──");

        let outcome = match step {
            SignupStep::RoleSelection => {
                eprintln!("How will you use Kewit?");
                eprintln!("  1) Listener — discover live music and support artists");
                eprintln!("  2) Performer — share your music and post events");
                let role = loop {
                    match prompt(&mut lines, "role [1/2]").await?.as_str() {
                        "1" => break Role::Listener,
                        "2" => break Role::Performer,
                        other => eprintln!("Unrecognized choice: {other}"),
                    }
                };
                sequencer.choose_role(role).await
            }
            SignupStep::Name => {
                let name = prompt(&mut lines, "your name").await?;
                sequencer.advance_with(&name).await
            }
            SignupStep::Handle => {
                let handle = prompt(&mut lines, "username").await?.to_lowercase();
                checker.submit(&handle);
                let status = settled_status(&checker).await;
                match &status {
                    HandleStatus::Available => eprintln!("✓ Username is available"),
                    HandleStatus::Invalid { reason } => eprintln!("✗ {reason}"),
                    HandleStatus::Taken => eprintln!("✗ Username is already taken"),
                    HandleStatus::Error { message } => eprintln!("✗ {message}"),
                    HandleStatus::Unknown | HandleStatus::Checking => {}
                }
                sequencer.advance_handle(&handle, &status).await
            }
            SignupStep::Email => {
                let email = prompt(&mut lines, "email").await?;
                sequencer.advance_with(&email).await
            }
            SignupStep::Password => {
                let password = prompt(&mut lines, "password (6+ chars)").await?;
                sequencer.advance_with(&password).await
            }
            SignupStep::CompleteProfile => {
                // Performer profile completion is its own flow; stop here.
                eprintln!("Continue at {}", Route::CompleteProfile);
                break;
            }
        };

        match outcome {
            Ok(StepOutcome::Moved(_)) => {
                // Password accepted mid-sequence means performer flow:
                // finalize before the profile-completion step.
                if step == SignupStep::Password {
                    if let Err(e) = finalize(&flow, &store).await {
                        eprintln!("✗ {e}");
                        sequencer.retreat().await;
                    }
                }
            }
            Ok(StepOutcome::Finished) => match finalize(&flow, &store).await {
                Ok(route) => {
                    eprintln!("Welcome to Kewit → {route}");
                    break;
                }
                // Re-prompts the password step; no partial state is
                // retried automatically.
                Err(e) => eprintln!("✗ {e}"),
            },
            Err(e) => eprintln!("✗ {e}"),
        }
    }

    Ok(())
}

async fn finalize(
    flow: &SignupFlow,
    store: &OnboardingStore,
) -> Result<Route, kewit_onboard::error::SignupError> {
    eprintln!("Creating account...");
    let record = store.get().await;
    flow.finalize(&record).await
}

/// Wait for the checker to publish everything but `Checking`.
async fn settled_status(checker: &HandleChecker) -> HandleStatus {
    let mut rx = checker.subscribe();
    loop {
        let status = rx.borrow_and_update().clone();
        if status != HandleStatus::Checking {
            return status;
        }
        if rx.changed().await.is_err() {
            return HandleStatus::Unknown;
        }
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<String> {
    eprint!("{label}> ");
    let line = lines
        .next_line()
        .await
        .context("failed to read stdin")?
        .context("stdin closed")?;
    Ok(line.trim().to_string())
}
