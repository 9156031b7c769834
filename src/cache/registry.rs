//! In-flight transfer bookkeeping.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use futures_util::future::{AbortHandle, AbortRegistration};
use tokio::sync::mpsc::UnboundedSender;

use super::models::FetchReport;

/// One active transfer: its abort handle plus everyone waiting for the
/// outcome.
struct InFlightTransfer {
    abort: AbortHandle,
    waiters: Vec<UnboundedSender<FetchReport>>,
}

/// Authoritative record of which URLs currently have an active transfer.
///
/// At most one transfer exists per URL. Entries are removed exactly once,
/// from the completion path, never from the cancel path.
#[derive(Default)]
pub(crate) struct InFlightRegistry {
    transfers: Mutex<HashMap<String, InFlightTransfer>>,
}

/// Result of trying to schedule a URL.
pub(crate) enum Admission {
    /// No transfer was active; the caller owns the new one and drives it
    /// under this abort registration.
    Started(AbortRegistration),
    /// A transfer for the URL is already running; the caller was attached
    /// as a waiter and will receive its outcome.
    Joined,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `url`: starts a new transfer entry if none is
    /// active, otherwise fans the caller in to the existing one.
    pub fn admit(&self, url: &str, waiter: &UnboundedSender<FetchReport>) -> Admission {
        let mut transfers = self.lock();
        if let Some(active) = transfers.get_mut(url) {
            active.waiters.push(waiter.clone());
            return Admission::Joined;
        }
        let (abort, registration) = AbortHandle::new_pair();
        transfers.insert(
            url.to_string(),
            InFlightTransfer {
                abort,
                waiters: vec![waiter.clone()],
            },
        );
        Admission::Started(registration)
    }

    /// Removes the entry for `url` and returns its waiters for
    /// notification.
    pub fn finish(&self, url: &str) -> Vec<UnboundedSender<FetchReport>> {
        self.lock()
            .remove(url)
            .map(|transfer| transfer.waiters)
            .unwrap_or_default()
    }

    /// Aborts the transfer for `url` if one is active.
    pub fn cancel(&self, url: &str) -> bool {
        match self.lock().get(url) {
            Some(active) => {
                active.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every active transfer, returning how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let transfers = self.lock();
        for active in transfers.values() {
            active.abort.abort();
        }
        transfers.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, InFlightTransfer>> {
        match self.transfers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
