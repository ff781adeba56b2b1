//! Shared test fixture for the `http` handler tests. Not part of the
//! public crate surface — `#[cfg(test)]`-only.

use journal_core::Journal;

use crate::state::AppState;

/// A fresh in-memory journal plus the `AppState` handlers run against.
/// The returned `Journal` shares the same backing store as the one
/// inside `AppState` (see `Journal::handle`), so tests can `append` to
/// it and then drive the router to observe the new entries.
pub async fn test_state() -> (AppState, Journal) {
    let journal = Journal::open_in_memory().await.expect("open in-memory journal");
    let docroot = std::env::temp_dir().join("journal-gatewayd-test-docroot-missing");
    let state = AppState::new(journal.handle(), docroot);
    (state, journal)
}
