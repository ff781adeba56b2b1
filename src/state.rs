use std::path::PathBuf;
use std::sync::Arc;

use journal_core::Journal;

/// Process-global, read-only after startup: the journal handle and the
/// `/browse` document root. Each request takes its own
/// [`Journal::handle`] — cheap, since it only clones an `Arc` and resets
/// per-connection cursor state.
#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<Journal>,
    pub docroot: PathBuf,
}

impl AppState {
    pub fn new(journal: Journal, docroot: PathBuf) -> Self {
        Self {
            journal: Arc::new(journal),
            docroot,
        }
    }
}
