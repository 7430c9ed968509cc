//! Latest-request-wins bookkeeping for async page handlers.
//!
//! Every outgoing call takes a [`RequestTicket`]. When the call resolves, the
//! handler asks the tracker whether the ticket is still current; a newer call
//! or a disposed owner makes it stale and the response is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Sequence number handed out for one outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
    disposed: Arc<AtomicBool>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket newer than every ticket issued before it.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True while `ticket` is the newest one and the owner is alive.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        !self.is_disposed() && self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Mark the owner as gone. All outstanding and future tickets become stale.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
