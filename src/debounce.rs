//! Search query debouncing
//!
//! Every keystroke updates the query, but the search screen should only act
//! once typing pauses. [`QueryDebouncer::new`] returns the two ends of that
//! pipe: a [`QueryInput`] for the text field and a [`SettledQueries`] stream
//! that yields a query once it has stayed unchanged for the quiet period.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Default quiet period
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Constructor for a debounced query pipe
pub struct QueryDebouncer;

impl QueryDebouncer {
    /// Create an input handle and the stream of settled queries
    #[must_use]
    pub fn new(quiet_period: Duration) -> (QueryInput, SettledQueries) {
        let (tx, rx) = watch::channel(String::new());
        (
            QueryInput { tx },
            SettledQueries {
                rx,
                quiet_period,
            },
        )
    }
}

/// Writing end, owned by the text field
#[derive(Debug)]
pub struct QueryInput {
    tx: watch::Sender<String>,
}

impl QueryInput {
    /// Record the latest text of the field
    pub fn set(&self, query: impl Into<String>) {
        self.tx.send_replace(query.into());
    }
}

/// Reading end, yields queries once typing pauses
#[derive(Debug)]
pub struct SettledQueries {
    rx: watch::Receiver<String>,
    quiet_period: Duration,
}

impl SettledQueries {
    /// Wait for the next edit, then for the input to stay unchanged for the
    /// quiet period, and return the value at that point
    ///
    /// Edits made during the wait restart it; only the last one is returned.
    /// Returns `None` once the input is dropped and every edit was consumed.
    pub async fn next_settled(&mut self) -> Option<String> {
        self.rx.changed().await.ok()?;

        let mut deadline = Instant::now() + self.quiet_period;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                changed = self.rx.changed() => match changed {
                    Ok(()) => deadline = Instant::now() + self.quiet_period,
                    Err(_) => {
                        tokio::time::sleep_until(deadline).await;
                        break;
                    }
                },
            }
        }

        let settled = self.rx.borrow_and_update().clone();
        tracing::debug!(query = %settled, "query settled");
        Some(settled)
    }
}

/// What the search screen should do with a settled query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchIntent {
    /// Blank query, go back to the home feed
    Clear,
    /// Run a search for the trimmed query
    Search(String),
}

impl SearchIntent {
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            Self::Clear
        } else {
            Self::Search(trimmed.to_string())
        }
    }
}
