//! The ordered history of captured changes

use std::collections::VecDeque;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, trace, warn};

use crate::change::{ChangeRecord, ChangeSummary};
use crate::config::HistoryConfig;
use crate::error::{UndoError, UndoResult};
use crate::policy::DuplicatePolicy;
use crate::target::TargetHandle;
use crate::value::FieldValue;

/// Ordered store of captured changes, undone newest first.
///
/// A `History` is an ordinary value: share it with `Arc` to capture and undo
/// from several threads, or keep one per document for independent histories.
pub struct History {
    config: HistoryConfig,
    records: Mutex<VecDeque<ChangeRecord>>,
    // Held shared by tracked assignments and exclusively by undo, so an undo
    // never interleaves with an assignment. Always taken before any target lock.
    undo_gate: RwLock<()>,
}

impl History {
    /// Create an empty history with the default configuration
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create an empty history
    pub fn with_config(config: HistoryConfig) -> Self {
        History {
            config,
            records: Mutex::new(VecDeque::new()),
            undo_gate: RwLock::new(()),
        }
    }

    /// Configuration of this history
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Shared side of the undo gate, held by [`Tracked::assign`](crate::Tracked::assign)
    /// across its read, write and capture
    pub(crate) fn assignment_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.undo_gate.read()
    }

    /// Capture an assignment of `new` to `field` of `target`, whose value was
    /// `previous`.
    ///
    /// Called by the interception layer once per approved assignment; the
    /// field and instance have already been checked for trackability. Returns
    /// whether a record was pushed.
    pub fn capture(
        &self,
        target: &TargetHandle,
        field: impl Into<String>,
        previous: FieldValue,
        new: &FieldValue,
        suppress_duplicates: bool,
    ) -> bool {
        let field = field.into();

        if !DuplicatePolicy::from_flag(suppress_duplicates).should_record(&previous, new) {
            trace!(
                "Suppressed duplicate assignment to {}.{}",
                target.type_name(),
                field
            );
            return false;
        }

        let record = ChangeRecord::new(target, field, previous, self.config.retention);
        debug!(
            record_id = %record.id(),
            "Captured change to {}.{}",
            record.target_type(),
            record.field()
        );
        self.push(record);
        true
    }

    fn push(&self, record: ChangeRecord) {
        let mut records = self.records.lock();
        records.push_back(record);

        if let Some(max) = self.config.max_records {
            while records.len() > max {
                if let Some(evicted) = records.pop_front() {
                    debug!(record_id = %evicted.id(), "Evicted oldest change");
                }
            }
        }
    }

    /// Undo the most recent change.
    ///
    /// Returns false when the history is empty or the previous value could
    /// not be written back. A record whose write-back fails is discarded.
    pub fn undo(&self) -> bool {
        match self.try_undo() {
            Ok(summary) => {
                debug!("Undid change {}", summary);
                true
            }
            Err(UndoError::NoMoreUndos) => false,
            Err(err) => {
                warn!("Undo failed, change discarded: {}", err);
                false
            }
        }
    }

    /// Undo the most recent change, reporting why it failed.
    ///
    /// The record is removed before the write-back is attempted and is not
    /// restored if the write-back fails.
    pub fn try_undo(&self) -> UndoResult<ChangeSummary> {
        let _gate = self.undo_gate.write();
        let record = self
            .records
            .lock()
            .pop_back()
            .ok_or(UndoError::NoMoreUndos)?;
        record.restore()
    }

    /// Number of changes that can be undone
    pub fn size(&self) -> usize {
        self.records.lock().len()
    }

    /// Alias of [`History::size`]
    pub fn history_size(&self) -> usize {
        self.size()
    }

    /// Whether there is nothing to undo
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// The change the next undo would revert
    pub fn peek(&self) -> Option<ChangeSummary> {
        self.records.lock().back().map(ChangeRecord::summary)
    }

    /// Paginated view of the history, oldest first
    pub fn entries(&self, limit: usize, offset: usize) -> Vec<ChangeSummary> {
        self.records
            .lock()
            .iter()
            .skip(offset)
            .take(limit)
            .map(ChangeRecord::summary)
            .collect()
    }

    /// All changes captured on one object, oldest first
    pub fn entries_for(&self, target: &TargetHandle) -> Vec<ChangeSummary> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.target_id() == target.id())
            .map(ChangeRecord::summary)
            .collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetentionMode, Undoable};
    use crate::error::AccessError;
    use crate::target::Tracked;
    use crate::FieldAccessor;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug)]
    struct Slider {
        position: i32,
        label: Option<String>,
    }

    crate::field_accessor!(Slider {
        position: value,
        label: optional,
    });

    impl Undoable for Slider {}

    /// Accepts reads, refuses every write
    struct Frozen;

    impl FieldAccessor for Frozen {
        fn get_field(&self, _field: &str) -> Result<FieldValue, AccessError> {
            Ok(FieldValue::of(0i32))
        }

        fn set_field(&mut self, field: &str, _value: FieldValue) -> Result<(), AccessError> {
            Err(AccessError::denied(field, "frozen"))
        }
    }

    impl Undoable for Frozen {}

    /// Stalls reads while `level` is 1, widening the window between an
    /// assignment's read and its write
    #[derive(Debug)]
    struct Sluggish {
        level: i32,
    }

    impl FieldAccessor for Sluggish {
        fn get_field(&self, field: &str) -> Result<FieldValue, AccessError> {
            match field {
                "level" => {
                    if self.level == 1 {
                        thread::sleep(Duration::from_millis(300));
                    }
                    Ok(FieldValue::of(self.level))
                }
                _ => Err(AccessError::unknown_field("Sluggish", field)),
            }
        }

        fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), AccessError> {
            match field {
                "level" => {
                    self.level = value.into_required(field)?;
                    Ok(())
                }
                _ => Err(AccessError::unknown_field("Sluggish", field)),
            }
        }
    }

    impl Undoable for Sluggish {}

    fn slider() -> Tracked<Slider> {
        Tracked::new(Slider {
            position: 0,
            label: None,
        })
    }

    fn capture_position(history: &History, slider: &Tracked<Slider>, from: i32, to: i32) -> bool {
        history.capture(
            &slider.handle(),
            "position",
            FieldValue::of(from),
            &FieldValue::of(to),
            false,
        )
    }

    #[test]
    fn test_capture_pushes_previous_value() {
        let history = History::new();
        let slider = slider();

        assert!(capture_position(&history, &slider, 0, 5));
        assert_eq!(history.size(), 1);
        assert_eq!(history.peek().unwrap().previous.as_deref(), Some("0"));
    }

    #[test]
    fn test_capture_with_suppression() {
        let history = History::new();
        let handle = slider().handle();

        assert!(!history.capture(&handle, "position", FieldValue::of(1), &FieldValue::of(1), true));
        assert!(history.is_empty());
        assert!(history.capture(&handle, "position", FieldValue::of(1), &FieldValue::of(2), true));
        assert_eq!(history.size(), 1);
    }

    #[test]
    fn test_undo_empty_history() {
        let history = History::new();
        assert!(!history.undo());
        assert!(matches!(history.try_undo(), Err(UndoError::NoMoreUndos)));
        assert_eq!(history.size(), 0);
    }

    #[test]
    fn test_history_size_alias() {
        let history = History::new();
        let slider = slider();
        slider.set(&history, "position", 4).unwrap();
        assert_eq!(history.history_size(), history.size());
        assert_eq!(history.history_size(), 1);
    }

    #[test]
    fn test_undo_is_lifo() {
        let history = History::new();
        let slider = slider();

        for step in 1..=3 {
            slider.set(&history, "position", step).unwrap();
        }
        assert_eq!(slider.read(|s| s.position), 3);

        assert!(history.undo());
        assert_eq!(slider.read(|s| s.position), 2);
        assert!(history.undo());
        assert_eq!(slider.read(|s| s.position), 1);
        assert!(history.undo());
        assert_eq!(slider.read(|s| s.position), 0);
        assert!(!history.undo());
    }

    #[test]
    fn test_failed_write_back_discards_record() {
        let history = History::new();
        let slider = slider();
        let frozen = Tracked::new(Frozen);

        capture_position(&history, &slider, 0, 1);
        history.capture(&frozen.handle(), "anything", FieldValue::of(0i32), &FieldValue::of(1i32), false);
        assert_eq!(history.size(), 2);

        let err = history.try_undo().unwrap_err();
        assert!(matches!(err, UndoError::Access(AccessError::Denied { .. })));
        assert_eq!(history.size(), 1);

        // The stale record does not block the next undo
        assert!(history.undo());
        assert!(history.is_empty());
    }

    #[test]
    fn test_unknown_field_on_undo_discards_record() {
        let history = History::new();
        let slider = slider();

        history.capture(&slider.handle(), "velocity", FieldValue::of(1), &FieldValue::of(2), false);
        assert!(!history.undo());
        assert!(history.is_empty());
    }

    #[test]
    fn test_weak_retention_fails_after_target_dropped() {
        let history = History::with_config(HistoryConfig {
            retention: RetentionMode::Weak,
            ..HistoryConfig::default()
        });
        let slider = slider();
        slider.set(&history, "position", 9).unwrap();
        drop(slider);

        assert_eq!(history.size(), 1);
        assert!(matches!(history.try_undo(), Err(UndoError::TargetDropped(_))));
        assert_eq!(history.size(), 0);
    }

    #[test]
    fn test_strong_retention_survives_scope() {
        let history = History::new();
        let observer;
        {
            let slider = slider();
            observer = slider.clone();
            slider.set_option(&history, "label", Some("volume".to_string())).unwrap();
        }
        assert!(history.undo());
        assert_eq!(observer.read(|s| s.label.clone()), None);
    }

    #[test]
    fn test_max_records_evicts_oldest() {
        let history = History::with_config(HistoryConfig {
            max_records: Some(2),
            ..HistoryConfig::default()
        });
        let slider = slider();
        for step in 1..=4 {
            slider.set(&history, "position", step).unwrap();
        }
        assert_eq!(history.size(), 2);

        assert!(history.undo());
        assert!(history.undo());
        assert_eq!(slider.read(|s| s.position), 2);
        assert!(!history.undo());
    }

    #[test]
    fn test_entries_pagination() {
        let history = History::new();
        let slider = slider();
        for step in 1..=5 {
            slider.set(&history, "position", step).unwrap();
        }

        let page = history.entries(2, 1);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].previous.as_deref(), Some("1"));
        assert_eq!(page[1].previous.as_deref(), Some("2"));
        assert!(history.entries(10, 5).is_empty());
    }

    #[test]
    fn test_entries_for_target() {
        let history = History::new();
        let first = slider();
        let second = slider();

        first.set(&history, "position", 1).unwrap();
        second.set(&history, "position", 1).unwrap();
        first.set_option(&history, "label", Some("a".to_string())).unwrap();

        let entries = history.entries_for(&first.handle());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.target_id == first.id()));
        assert_eq!(history.entries_for(&second.handle()).len(), 1);
    }

    #[test]
    fn test_concurrent_captures_and_undos() {
        let history = Arc::new(History::new());
        let slider = slider();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let history = Arc::clone(&history);
                let slider = slider.clone();
                thread::spawn(move || {
                    for step in 0..50 {
                        slider
                            .set(&history, "position", worker * 100 + step)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.size(), 200);

        let undoers: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || (0..50).filter(|_| history.undo()).count())
            })
            .collect();
        let undone: usize = undoers.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(undone, 200);
        assert!(history.is_empty());
        assert_eq!(slider.read(|s| s.position), 0);
    }

    #[test]
    fn test_undo_waits_for_assignment_in_flight() {
        let history = Arc::new(History::new());
        let sluggish = Tracked::new(Sluggish { level: 0 });
        sluggish.set(&history, "level", 1).unwrap();

        let writer = {
            let history = Arc::clone(&history);
            let sluggish = sluggish.clone();
            thread::spawn(move || sluggish.set(&history, "level", 2).unwrap())
        };

        // Lands while the writer is still reading the previous value
        thread::sleep(Duration::from_millis(100));
        assert!(history.undo());
        writer.join().unwrap();

        // The assignment of 2 completed first, so the undo reverted it
        assert_eq!(sluggish.read(|s| s.level), 1);
        assert_eq!(history.size(), 1);

        assert!(history.undo());
        assert_eq!(sluggish.read(|s| s.level), 0);
        assert!(history.is_empty());
    }
}
