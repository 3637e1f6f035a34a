use mediaid_domain::LocalId;

use crate::time::Clock;

/// Issues timestamp-based local ids that never repeat within a session,
/// even when two entries are added in the same millisecond.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: u64,
}

impl LocalIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues after ids already handed out, e.g. entries loaded from a draft.
    pub fn starting_after(last: Option<LocalId>) -> Self {
        Self {
            last: last.map_or(0, |id| id.0),
        }
    }

    pub fn next(&mut self, clock: &dyn Clock) -> LocalId {
        let millis = u64::try_from(clock.now().timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last + 1);
        self.last = id;
        LocalId(id)
    }
}
