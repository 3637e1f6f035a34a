//! Debounced catalogue search with stale-response protection.
//!
//! [`SearchBox`] is driven by explicit timestamps: `set_query` records a
//! keystroke, `poll` hands out a [`SearchTicket`] once the quiet period
//! has elapsed, and `complete` accepts only the most recently issued ticket.

use chrono::{DateTime, Duration, Utc};
use mediaid_domain::{SearchHit, SearchKind};
use tracing::{debug, warn};

use crate::api::ApiError;

pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_QUIET_PERIOD_MS: i64 = 300;
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Remote catalogue lookup.
pub trait SearchProvider {
    fn search(&self, kind: SearchKind, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSettings {
    pub quiet_period_ms: i64,
    pub limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

/// A lookup that is allowed to run. Only the latest one may land.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    pub sequence: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct SearchBox {
    kind: SearchKind,
    settings: SearchSettings,
    query: String,
    results: Vec<SearchHit>,
    due_at: Option<DateTime<Utc>>,
    next_sequence: u64,
    awaiting: Option<u64>,
}

impl SearchBox {
    pub fn new(kind: SearchKind, settings: SearchSettings) -> Self {
        Self {
            kind,
            settings,
            query: String::new(),
            results: Vec::new(),
            due_at: None,
            next_sequence: 0,
            awaiting: None,
        }
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    /// True while a ticket is out and not yet completed.
    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    /// Records a keystroke. Restarts the quiet period and orphans any
    /// lookup still in flight.
    pub fn set_query(&mut self, query: &str, now: DateTime<Utc>) {
        self.query = query.to_string();
        self.awaiting = None;
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            self.due_at = None;
            self.results.clear();
        } else {
            self.due_at = Some(now + Duration::milliseconds(self.settings.quiet_period_ms));
        }
    }

    /// Issues the pending lookup once its quiet period has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<SearchTicket> {
        match self.due_at {
            Some(due) if due <= now => {
                self.due_at = None;
                self.next_sequence += 1;
                self.awaiting = Some(self.next_sequence);
                Some(SearchTicket {
                    sequence: self.next_sequence,
                    query: self.query.trim().to_string(),
                })
            }
            _ => None,
        }
    }

    /// Lands a lookup result. Returns false when the ticket is stale.
    pub fn complete(&mut self, sequence: u64, outcome: Result<Vec<SearchHit>, ApiError>) -> bool {
        if self.awaiting != Some(sequence) {
            debug!(kind = %self.kind, sequence, "discarding stale search response");
            return false;
        }
        self.awaiting = None;
        match outcome {
            Ok(hits) => self.results = hits,
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "search failed");
                self.results.clear();
            }
        }
        true
    }

    /// Polls and, if a lookup is due, runs it synchronously against `provider`.
    pub fn run_due<P: SearchProvider + ?Sized>(&mut self, provider: &P, now: DateTime<Utc>) -> bool {
        match self.poll(now) {
            Some(ticket) => {
                let outcome = provider.search(self.kind, &ticket.query, self.settings.limit);
                self.complete(ticket.sequence, outcome)
            }
            None => false,
        }
    }

    /// Forgets the query, the results and anything pending.
    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.due_at = None;
        self.awaiting = None;
    }
}
