//! Modal sequencing: at most one step dialog visible, with the outgoing one
//! fully torn down before the next is shown.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Result, WizardError};

/// The document hosting the step dialogs.
pub trait ModalHost: Send + Sync {
    fn exists(&self, id: &str) -> bool;

    fn is_active(&self, id: &str) -> bool;

    fn any_visible(&self) -> bool;

    /// Starts hiding `id`; the receiver resolves once the hide has finished.
    fn request_hide(&self, id: &str) -> oneshot::Receiver<()>;

    /// Removes every overlay backdrop left in the document, returning how many.
    fn remove_backdrops(&self) -> usize;

    fn restore_body_scroll(&self);

    fn show(&self, id: &str);
}

pub struct ModalSequencer {
    host: Arc<dyn ModalHost>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ModalSequencer {
    pub fn new(host: Arc<dyn ModalHost>) -> Self {
        Self {
            host,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Idempotent overlay cleanup. Returns the number of backdrops removed.
    pub fn cleanup(&self) -> usize {
        let removed = self.host.remove_backdrops();
        self.host.restore_body_scroll();
        debug!("Modal cleanup removed {} backdrop(s)", removed);
        removed
    }

    /// Hide `from` (when it is showing), show `to`, then run `on_ready`.
    /// `Ok(None)` when another transition is already in flight.
    pub async fn transition<F, Fut, R>(
        &self,
        from: Option<&str>,
        to: &str,
        on_ready: F,
    ) -> Result<Option<R>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            warn!("Modal transition to {} ignored: another is in flight", to);
            return Ok(None);
        };

        if !self.host.exists(to) {
            if !self.host.any_visible() {
                self.cleanup();
            }
            return Err(WizardError::ModalNotFound(to.to_string()));
        }

        match from.filter(|id| self.host.is_active(id)) {
            Some(from) => {
                let hidden = self.host.request_hide(from);
                // A dropped sender means the dialog went away without signalling.
                if hidden.await.is_err() {
                    warn!("Hide signal for {} dropped", from);
                }
                self.cleanup();
            }
            None => debug!("No active {:?}; skipping teardown", from),
        }

        self.host.show(to);
        debug!("Showing {}", to);
        Ok(Some(on_ready().await))
    }
}
