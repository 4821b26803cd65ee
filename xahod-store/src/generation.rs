//! Request generations for overlapping loads
//!
//! Every load takes a ticket. Only the holder of the most recently issued
//! ticket may commit its response.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic ticket counter
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    /// Create a counter with no tickets issued
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding all earlier ones
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is still the latest issued
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Latest issued ticket (0 before the first)
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}
