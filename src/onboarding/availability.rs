//! Debounced username-availability checker.
//!
//! Confirms a syntactically valid handle is not already registered
//! without querying the backend on every keystroke. Each submission bumps
//! a generation counter that acts as a cancellation token: the delayed
//! lookup re-checks the counter before and after the remote call, so a
//! result for anything but the latest candidate is discarded regardless
//! of completion order.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::AuthBackend;
use crate::onboarding::validate::validate_handle;

/// Verdict for the current handle candidate. Ephemeral — invalidated the
/// moment the candidate changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleStatus {
    /// No candidate, or no verdict yet.
    Unknown,
    /// The candidate fails local format validation; no remote lookup ran.
    Invalid { reason: String },
    /// Waiting for the debounce window or the remote lookup.
    Checking,
    Available,
    Taken,
    /// The lookup itself failed. Editing the field retries.
    Error { message: String },
}

impl std::fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Invalid { .. } => "invalid",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::Taken => "taken",
            Self::Error { .. } => "error",
        };
        write!(f, "{s}")
    }
}

/// Debounced remote-availability checker for the username step.
///
/// Observers subscribe to a watch channel; the screen renders whatever
/// the latest published status is. Dropping the checker aborts any
/// pending lookup.
pub struct HandleChecker {
    backend: Arc<dyn AuthBackend>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    tx: Arc<watch::Sender<HandleStatus>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl HandleChecker {
    pub fn new(backend: Arc<dyn AuthBackend>, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(HandleStatus::Unknown);
        Self {
            backend,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
            pending: Mutex::new(None),
        }
    }

    /// Subscribe to status updates.
    pub fn subscribe(&self) -> watch::Receiver<HandleStatus> {
        self.tx.subscribe()
    }

    /// The latest published status.
    pub fn status(&self) -> HandleStatus {
        self.tx.borrow().clone()
    }

    /// Submit the current candidate.
    ///
    /// Any previous verdict is cleared immediately. A format failure is
    /// reported at once and never reaches the backend; otherwise a lookup
    /// for this exact value fires after the debounce window, unless a
    /// newer submission supersedes it first.
    pub fn submit(&self, candidate: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_pending();

        let candidate = candidate.to_string();
        if candidate.is_empty() {
            self.tx.send_replace(HandleStatus::Unknown);
            return;
        }
        if let Err(reason) = validate_handle(&candidate) {
            self.tx.send_replace(HandleStatus::Invalid {
                reason: reason.to_string(),
            });
            return;
        }

        self.tx.send_replace(HandleStatus::Checking);

        let backend = Arc::clone(&self.backend);
        let tx = Arc::clone(&self.tx);
        let counter = Arc::clone(&self.generation);
        let debounce = self.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if counter.load(Ordering::SeqCst) != generation {
                return;
            }

            debug!(handle = %candidate, "Checking handle availability");
            let result = backend.handle_exists(&candidate).await;

            // Last-write-wins by candidate value: a result for a
            // superseded candidate is dropped even if it resolves later.
            if counter.load(Ordering::SeqCst) != generation {
                debug!(handle = %candidate, "Discarding stale availability result");
                return;
            }

            let status = match result {
                Ok(true) => HandleStatus::Taken,
                Ok(false) => HandleStatus::Available,
                Err(e) => {
                    warn!(handle = %candidate, error = %e, "Handle availability lookup failed");
                    HandleStatus::Error {
                        message: "Could not check availability".to_string(),
                    }
                }
            };
            tx.send_replace(status);
        });

        if let Some(old) = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task)
        {
            old.abort();
        }
    }

    fn cancel_pending(&self) {
        if let Some(task) = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for HandleChecker {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::backend::{NewCredential, NewProfile, Session};
    use crate::error::BackendError;

    /// Counts lookups; never finds a handle.
    struct CountingBackend {
        lookups: Mutex<Vec<String>>,
    }

    impl CountingBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                lookups: Mutex::new(Vec::new()),
            })
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthBackend for CountingBackend {
        async fn create_credential(
            &self,
            _cred: &NewCredential,
        ) -> Result<uuid::Uuid, BackendError> {
            unimplemented!("not used by the checker")
        }

        async fn get_session(&self) -> Result<Option<Session>, BackendError> {
            unimplemented!("not used by the checker")
        }

        async fn insert_profile(&self, _profile: &NewProfile) -> Result<(), BackendError> {
            unimplemented!("not used by the checker")
        }

        async fn handle_exists(&self, handle: &str) -> Result<bool, BackendError> {
            self.lookups.lock().unwrap().push(handle.to_string());
            Ok(false)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn format_error_short_circuits_without_lookup() {
        let backend = CountingBackend::new();
        let checker = HandleChecker::new(backend.clone(), Duration::from_millis(300));

        checker.submit("ab");
        assert!(matches!(checker.status(), HandleStatus::Invalid { .. }));

        checker.submit("Bad!");
        assert!(matches!(checker.status(), HandleStatus::Invalid { .. }));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(backend.lookups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_candidate_resets_to_unknown() {
        let backend = CountingBackend::new();
        let checker = HandleChecker::new(backend.clone(), Duration::from_millis(300));

        checker.submit("ana_b");
        assert_eq!(checker.status(), HandleStatus::Checking);

        checker.submit("");
        assert_eq!(checker.status(), HandleStatus::Unknown);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(backend.lookups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_to_one_lookup() {
        let backend = CountingBackend::new();
        let checker = HandleChecker::new(backend.clone(), Duration::from_millis(300));
        let mut rx = checker.subscribe();

        // "ab" is invalid, then two valid candidates inside the window
        checker.submit("ab");
        checker.submit("abc");
        tokio::time::sleep(Duration::from_millis(100)).await;
        checker.submit("abcd");

        // Wait for the settled verdict
        while *rx.borrow_and_update() != HandleStatus::Available {
            rx.changed().await.unwrap();
        }
        assert_eq!(backend.lookups(), vec!["abcd".to_string()]);
    }
}
