//! Per-kind "is this value new since the last run" flags.
//!
//! Jobs write their own kind; the event job also reads the latest-block flag.
//! A flag is only ever a single boolean, there is no history.

use dashmap::DashMap;

use crate::types::DataKind;

/// Concurrent table of freshness flags, safe to share between job tasks.
#[derive(Debug, Default)]
pub struct FreshnessStore {
    flags: DashMap<DataKind, bool>,
}

impl FreshnessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fresh(&self, kind: DataKind, fresh: bool) {
        self.flags.insert(kind, fresh);
    }

    /// Returns `false` for a kind that was never set.
    pub fn is_fresh(&self, kind: DataKind) -> bool {
        self.flags.get(&kind).map(|f| *f).unwrap_or(false)
    }

    /// Flags for every kind, in [`DataKind::ALL`] order.
    pub fn snapshot(&self) -> Vec<(DataKind, bool)> {
        DataKind::ALL
            .into_iter()
            .map(|k| (k, self.is_fresh(k)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unset_kind_reads_false() {
        let store = FreshnessStore::new();
        for kind in DataKind::ALL {
            assert!(!store.is_fresh(kind));
        }
    }

    #[test]
    fn latest_write_wins() {
        let store = FreshnessStore::new();
        store.set_fresh(DataKind::Rates, true);
        assert!(store.is_fresh(DataKind::Rates));
        store.set_fresh(DataKind::Rates, false);
        assert!(!store.is_fresh(DataKind::Rates));
        assert!(!store.is_fresh(DataKind::Events));
    }

    #[test]
    fn snapshot_covers_all_kinds() {
        let store = FreshnessStore::new();
        store.set_fresh(DataKind::LatestBlock, true);
        let snap = store.snapshot();
        assert_eq!(snap.len(), DataKind::ALL.len());
        assert!(snap.contains(&(DataKind::LatestBlock, true)));
        assert!(snap.contains(&(DataKind::Events, false)));
    }

    #[test]
    fn concurrent_writers_do_not_lose_kinds() {
        let store = Arc::new(FreshnessStore::new());
        let threads: Vec<_> = DataKind::ALL
            .into_iter()
            .map(|kind| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set_fresh(kind, i % 2 == 0);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        // last write per kind was i = 99 -> false
        assert!(store.snapshot().iter().all(|(_, fresh)| !fresh));
    }
}
