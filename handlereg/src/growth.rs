//! Amortized table growth
//!
//! Tables grow by pages rather than one slot at a time. A fresh table gets
//! [`DEFAULT_PAGE`] slots, every later step adds roughly half of the current
//! capacity. The allocator may grant more than was asked for, so [`grow`]
//! reports the capacity it actually got.
//!
//! Callers that keep several vectors side by side must grow each of them and
//! then agree on [`reconcile`]: no vector may claim a slot that another one
//! cannot back.

/// Number of slots in a freshly allocated table.
pub const DEFAULT_PAGE: usize = 4;

/// Capacity to request when a table of `current` slots is full.
///
/// Always strictly greater than `current`.
#[must_use]
pub fn next_capacity(current: usize) -> usize {
    if current == 0 {
        DEFAULT_PAGE
    } else {
        current + current / 2 + 1
    }
}

/// Grow `table` so it can hold at least `next_capacity(*capacity)` entries.
///
/// The capacity actually granted is written back through `capacity`; it may
/// exceed the request. Allocation failure aborts the process.
pub fn grow<T>(table: &mut Vec<T>, capacity: &mut usize) {
    let requested = next_capacity(*capacity);
    table.reserve_exact(requested.saturating_sub(table.len()));
    let granted = table.capacity();
    log::debug!("growth: requested {requested} slots, granted {granted} (was {capacity})");
    *capacity = granted;
}

/// Authoritative capacity of a set of parallel tables.
///
/// Returns 0 for an empty set.
#[must_use]
pub fn reconcile(capacities: &[usize]) -> usize {
    capacities.iter().copied().min().unwrap_or(0)
}
