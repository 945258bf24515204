use std::collections::BTreeSet;

use tracing::warn;

use crate::keys;
use crate::kv::KvStore;
use crate::FeatureSnapshot;

/// Lifecycle of the watcher. The baseline cycle and the one cycle after it
/// never emit signals, so a freshly loaded feed cannot notify about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Uninitialized,
    Seeded,
    Watching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    Created,
    Completed,
}

impl ChangeSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSignal::Created => "created",
            ChangeSignal::Completed => "completed",
        }
    }
}

/// Detects newly created and newly completed features between poll cycles.
///
/// Seen-sets grow monotonically and are mirrored into the session store as
/// JSON arrays so a re-mounted watcher in the same run picks up where the
/// previous one left off. Every storage failure is swallowed; a broken
/// store means the watcher re-seeds on each construction and over-notifies
/// rather than erroring.
pub struct ChangeWatcher<S> {
    store: S,
    phase: WatchPhase,
    seen_ids: BTreeSet<String>,
    seen_completed: BTreeSet<String>,
}

impl<S: KvStore> ChangeWatcher<S> {
    pub fn new(store: S) -> Self {
        let initialized = read_flag(&store, keys::SESSION_INIT);
        let (phase, seen_ids, seen_completed) = if initialized {
            (
                WatchPhase::Seeded,
                read_id_set(&store, keys::SEEN_FEATURE_IDS),
                read_id_set(&store, keys::SEEN_COMPLETED_IDS),
            )
        } else {
            (WatchPhase::Uninitialized, BTreeSet::new(), BTreeSet::new())
        };

        Self {
            store,
            phase,
            seen_ids,
            seen_completed,
        }
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    /// Feed one poll cycle of snapshots through the state machine.
    ///
    /// Returns at most one signal per cycle; completion outranks creation.
    pub fn observe(&mut self, snapshots: &[FeatureSnapshot]) -> Option<ChangeSignal> {
        let current_ids: BTreeSet<String> =
            snapshots.iter().map(|snap| snap.id.clone()).collect();
        let current_completed: BTreeSet<String> = snapshots
            .iter()
            .filter(|snap| snap.status.is_completed())
            .map(|snap| snap.id.clone())
            .collect();

        match self.phase {
            WatchPhase::Uninitialized => {
                self.seen_ids = current_ids;
                self.seen_completed = current_completed;
                self.persist_seen_sets();
                self.write_init_marker();
                self.phase = WatchPhase::Seeded;
                None
            }
            WatchPhase::Seeded => {
                self.seen_ids.extend(current_ids);
                self.seen_completed.extend(current_completed);
                self.persist_seen_sets();
                self.phase = WatchPhase::Watching;
                None
            }
            WatchPhase::Watching => {
                let has_new_ids = current_ids
                    .iter()
                    .any(|id| !self.seen_ids.contains(id));
                let has_new_completed = current_completed
                    .iter()
                    .any(|id| !self.seen_completed.contains(id));

                self.seen_ids.extend(current_ids);
                self.seen_completed.extend(current_completed);
                self.persist_seen_sets();

                if has_new_completed {
                    Some(ChangeSignal::Completed)
                } else if has_new_ids {
                    Some(ChangeSignal::Created)
                } else {
                    None
                }
            }
        }
    }

    fn persist_seen_sets(&mut self) {
        write_id_set(&mut self.store, keys::SEEN_FEATURE_IDS, &self.seen_ids);
        write_id_set(
            &mut self.store,
            keys::SEEN_COMPLETED_IDS,
            &self.seen_completed,
        );
    }

    fn write_init_marker(&mut self) {
        if let Err(err) = self.store.set(keys::SESSION_INIT, "true") {
            warn!(error = %err, key = keys::SESSION_INIT, "Failed to write session marker");
        }
    }
}

fn read_flag<S: KvStore>(store: &S, key: &str) -> bool {
    match store.get(key) {
        Ok(value) => value.as_deref() == Some("true"),
        Err(err) => {
            warn!(error = %err, key, "Failed to read session marker");
            false
        }
    }
}

fn read_id_set<S: KvStore>(store: &S, key: &str) -> BTreeSet<String> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeSet::new(),
        Err(err) => {
            warn!(error = %err, key, "Failed to read seen set");
            return BTreeSet::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(err) => {
            warn!(error = %err, key, "Discarding malformed seen set");
            BTreeSet::new()
        }
    }
}

fn write_id_set<S: KvStore>(store: &mut S, key: &str, ids: &BTreeSet<String>) {
    let payload = match serde_json::to_string(&ids.iter().collect::<Vec<_>>()) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, key, "Failed to serialize seen set");
            return;
        }
    };
    if let Err(err) = store.set(key, &payload) {
        warn!(error = %err, key, "Failed to persist seen set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvError;
    use crate::FeatureStatus;
    use std::collections::HashMap;

    #[derive(Clone, Default)]
    struct MemStore {
        entries: std::rc::Rc<std::cell::RefCell<HashMap<String, String>>>,
    }

    impl KvStore for MemStore {
        fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
            self.entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Backend("storage unavailable".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), KvError> {
            Err(KvError::Backend("storage unavailable".to_string()))
        }
    }

    fn open(id: &str) -> FeatureSnapshot {
        FeatureSnapshot::new(id, FeatureStatus::Open)
    }

    fn completed(id: &str) -> FeatureSnapshot {
        FeatureSnapshot::new(id, FeatureStatus::Completed)
    }

    #[test]
    fn first_cycle_seeds_silently_regardless_of_size() {
        let mut watcher = ChangeWatcher::new(MemStore::default());
        let snaps = vec![open("F1"), open("F2"), completed("F3")];

        assert_eq!(watcher.observe(&snaps), None);
        assert_eq!(watcher.phase(), WatchPhase::Seeded);
        assert_eq!(watcher.seen_count(), 3);
    }

    #[test]
    fn second_cycle_is_skipped_even_for_identical_input() {
        let mut watcher = ChangeWatcher::new(MemStore::default());
        let snaps = vec![open("F1")];

        assert_eq!(watcher.observe(&snaps), None);
        assert_eq!(watcher.observe(&snaps), None);
        assert_eq!(watcher.phase(), WatchPhase::Watching);
    }

    #[test]
    fn multiple_new_ids_emit_a_single_created_signal() {
        let mut watcher = ChangeWatcher::new(MemStore::default());
        watcher.observe(&[open("F1")]);
        watcher.observe(&[open("F1")]);

        let signal = watcher.observe(&[open("F1"), open("F2"), open("F3")]);
        assert_eq!(signal, Some(ChangeSignal::Created));

        // Already merged into the seen set, so nothing re-fires.
        let again = watcher.observe(&[open("F1"), open("F2"), open("F3")]);
        assert_eq!(again, None);
    }

    #[test]
    fn completion_outranks_creation_in_the_same_cycle() {
        let mut watcher = ChangeWatcher::new(MemStore::default());
        watcher.observe(&[open("F1")]);
        watcher.observe(&[open("F1")]);

        let signal = watcher.observe(&[completed("F1"), open("F2")]);
        assert_eq!(signal, Some(ChangeSignal::Completed));

        // F2 was merged during the completed cycle and never fires created.
        assert_eq!(watcher.observe(&[completed("F1"), open("F2")]), None);
    }

    #[test]
    fn seen_sets_are_monotonic_when_ids_disappear() {
        let mut watcher = ChangeWatcher::new(MemStore::default());
        watcher.observe(&[open("F1"), completed("F2")]);
        watcher.observe(&[open("F1"), completed("F2")]);

        // F2 vanishes from the feed and then returns, still completed.
        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(watcher.observe(&[open("F1"), completed("F2")]), None);
        assert_eq!(watcher.seen_count(), 2);
    }

    #[test]
    fn dashboard_scenario_f1_f2() {
        let mut watcher = ChangeWatcher::new(MemStore::default());

        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(
            watcher.observe(&[open("F1"), open("F2")]),
            Some(ChangeSignal::Created)
        );
        assert_eq!(
            watcher.observe(&[completed("F1"), open("F2")]),
            Some(ChangeSignal::Completed)
        );
        assert_eq!(watcher.observe(&[completed("F1"), open("F2")]), None);
    }

    #[test]
    fn rebuilt_watcher_resumes_from_persisted_session_state() {
        let store = MemStore::default();
        {
            let mut watcher = ChangeWatcher::new(store.clone());
            watcher.observe(&[open("F1")]);
            watcher.observe(&[open("F1")]);
        }

        // Same session: marker present, so the rebuilt watcher starts
        // seeded, skips one cycle, then diffs against the stored sets.
        let mut watcher = ChangeWatcher::new(store);
        assert_eq!(watcher.phase(), WatchPhase::Seeded);
        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(
            watcher.observe(&[open("F1"), open("F2")]),
            Some(ChangeSignal::Created)
        );
    }

    #[test]
    fn broken_store_degrades_to_fresh_session_without_errors() {
        let mut watcher = ChangeWatcher::new(BrokenStore);
        assert_eq!(watcher.phase(), WatchPhase::Uninitialized);

        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(watcher.observe(&[open("F1")]), None);
        assert_eq!(
            watcher.observe(&[open("F1"), open("F2")]),
            Some(ChangeSignal::Created)
        );
    }

    #[test]
    fn malformed_persisted_set_is_discarded() {
        let mut store = MemStore::default();
        store.set(keys::SESSION_INIT, "true").unwrap();
        store.set(keys::SEEN_FEATURE_IDS, "not json").unwrap();

        let watcher = ChangeWatcher::new(store);
        assert_eq!(watcher.phase(), WatchPhase::Seeded);
        assert_eq!(watcher.seen_count(), 0);
    }
}
