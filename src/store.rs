//! store.rs — thread-safe holder of the current survey announcements.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::announcement::Announcement;

/// Current set of survey announcements.
///
/// `replace` and `snapshot` serialize on one mutex. The held list is always
/// swapped wholesale, so a snapshot sees either the old or the new list.
#[derive(Debug, Default)]
pub struct AnnouncementStore {
    inner: Mutex<Vec<Announcement>>,
}

impl AnnouncementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held announcements with the surveys in `list`, keeping their order.
    pub fn replace(&self, list: Vec<Announcement>) {
        let total = list.len();
        let surveys: Vec<Announcement> = list.into_iter().filter(Announcement::is_survey).collect();
        debug!(total, kept = surveys.len(), "replacing survey announcements");

        let mut v = self.lock();
        *v = surveys;
    }

    /// Copy of the held announcements; the lock is released before returning.
    pub fn snapshot(&self) -> Vec<Announcement> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The list is never left half-written, so a poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<Announcement>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcement::AnnouncementType;

    #[test]
    fn keeps_only_surveys_in_order() {
        let store = AnnouncementStore::new();
        store.replace(vec![
            Announcement::survey("a"),
            Announcement::new(AnnouncementType::Fundraising).with_identifier("f"),
            Announcement::survey("b"),
            Announcement::new(AnnouncementType::Other).with_identifier("o"),
            Announcement::survey("c"),
        ]);

        let ids: Vec<_> = store
            .snapshot()
            .into_iter()
            .filter_map(|a| a.identifier)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn replace_discards_previous_set() {
        let store = AnnouncementStore::new();
        store.replace(vec![Announcement::survey("old")]);
        store.replace(vec![]);
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let store = AnnouncementStore::new();
        store.replace(vec![Announcement::survey("a")]);
        let snap = store.snapshot();
        store.replace(vec![Announcement::survey("b"), Announcement::survey("c")]);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].identifier.as_deref(), Some("a"));
    }
}
