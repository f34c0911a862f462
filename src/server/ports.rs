//! Port allocation for dedicated listeners.
//!
//! A process-wide monotonic cursor over a fixed range, wrapping, so
//! concurrently running scenarios do not collide on bind.

use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const PORT_RANGE_START: u16 = 29000;
pub(crate) const PORT_RANGE_LEN: usize = 1000;

static CURSOR: AtomicUsize = AtomicUsize::new(0);

/// Next port in the range; wraps after `PORT_RANGE_LEN` allocations.
pub fn next_port() -> u16 {
    let offset = CURSOR.fetch_add(1, Ordering::Relaxed) % PORT_RANGE_LEN;
    PORT_RANGE_START + offset as u16
}
