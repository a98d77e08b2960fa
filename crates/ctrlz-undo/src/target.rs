//! Tracked objects and the interception layer
//!
//! A [`Tracked`] handle owns an object behind shared, lockable storage and is
//! the only way an assignment reaches the history: [`Tracked::assign`] reads
//! the previous value through the object's [`FieldAccessor`], applies the new
//! one and hands both to [`History::capture`] when the field and the instance
//! are tracked.
//!
//! Writes made through [`Tracked::lock`], or to the interior of a value read
//! out of a field, are not observed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;
use uuid::Uuid;

use crate::accessor::FieldAccessor;
use crate::config::{ClassConfig, RetentionMode, Undoable};
use crate::error::{AccessError, UndoResult};
use crate::history::History;
use crate::value::{FieldValue, TrackedValue};

/// Type-erased, lockable object a record can write back to
pub type SharedTarget = Arc<Mutex<dyn FieldAccessor>>;

/// Identity of a tracked object, passed to [`History::capture`]
#[derive(Clone)]
pub struct TargetHandle {
    target: SharedTarget,
    id: Uuid,
    type_name: &'static str,
}

impl TargetHandle {
    /// Identity shared by every clone of the originating [`Tracked`]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Type name of the tracked object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn retain(&self, retention: RetentionMode) -> TargetRef {
        match retention {
            RetentionMode::Strong => TargetRef::Strong(Arc::clone(&self.target)),
            RetentionMode::Weak => TargetRef::Weak(Arc::downgrade(&self.target)),
        }
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// How a record refers to its target
pub(crate) enum TargetRef {
    Strong(SharedTarget),
    Weak(Weak<Mutex<dyn FieldAccessor>>),
}

impl TargetRef {
    pub(crate) fn upgrade(&self) -> Option<SharedTarget> {
        match self {
            TargetRef::Strong(target) => Some(Arc::clone(target)),
            TargetRef::Weak(target) => target.upgrade(),
        }
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Strong(_) => write!(f, "Strong"),
            TargetRef::Weak(target) => write!(f, "Weak(alive: {})", target.strong_count() > 0),
        }
    }
}

/// Shared handle to an object whose field assignments can be undone.
///
/// Clones refer to the same object and share its identity, its class
/// configuration and its tracking switch.
pub struct Tracked<T: Undoable> {
    value: Arc<Mutex<T>>,
    id: Uuid,
    config: Arc<ClassConfig>,
    tracking: Arc<AtomicBool>,
}

impl<T: Undoable> Tracked<T> {
    /// Track `value` with the configuration declared by `T`
    pub fn new(value: T) -> Self {
        Self::with_config(value, ClassConfig::of::<T>())
    }

    /// Track `value` with an explicit configuration
    pub fn with_config(value: T, config: ClassConfig) -> Self {
        Tracked {
            value: Arc::new(Mutex::new(value)),
            id: Uuid::new_v4(),
            config: Arc::new(config),
            tracking: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Wrap `value` with tracking switched off for this instance
    pub fn untracked(value: T) -> Self {
        let tracked = Self::new(value);
        tracked.set_tracking(false);
        tracked
    }

    /// Identity of the object
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration resolved for the object
    pub fn config(&self) -> &ClassConfig {
        &self.config
    }

    /// Whether assignments to this instance are captured
    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::Acquire)
    }

    /// Switch capture on or off for this instance and all its clones
    pub fn set_tracking(&self, enabled: bool) {
        self.tracking.store(enabled, Ordering::Release);
    }

    /// Handle for [`History::capture`]
    pub fn handle(&self) -> TargetHandle {
        let target: SharedTarget = self.value.clone();
        TargetHandle {
            target,
            id: self.id,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Read the object.
    ///
    /// The object stays locked while `f` runs: undoing a change on this
    /// object, or assigning to it, from inside `f` deadlocks.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock())
    }

    /// Lock the object for direct, untracked access.
    ///
    /// Undoing a change on this object, or assigning to it, while the guard
    /// is held on the same thread deadlocks.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock()
    }

    /// Current value of `field`
    pub fn get(&self, field: &str) -> Result<FieldValue, AccessError> {
        self.value.lock().get_field(field)
    }

    /// Assign `value` to `field`, capturing the previous value when the
    /// field and this instance are tracked.
    ///
    /// Returns whether a record was pushed. An unknown field or a rejected
    /// value is returned as an error and leaves the object and the history
    /// untouched.
    pub fn assign(&self, history: &History, field: &str, value: FieldValue) -> UndoResult<bool> {
        let _gate = history.assignment_guard();
        let mut target = self.value.lock();

        if !self.is_tracking() || !self.config.tracks_field(field) {
            target.set_field(field, value)?;
            trace!("Untracked assignment to {}.{}", std::any::type_name::<T>(), field);
            return Ok(false);
        }

        let previous = target.get_field(field)?;
        let new_value = value.clone();
        target.set_field(field, value)?;

        Ok(history.capture(
            &self.handle(),
            field,
            previous,
            &new_value,
            self.config.suppress_duplicates,
        ))
    }

    /// Assign a present value
    pub fn set<V: TrackedValue>(&self, history: &History, field: &str, value: V) -> UndoResult<bool> {
        self.assign(history, field, FieldValue::of(value))
    }

    /// Assign to an optional field; `None` assigns the absent value
    pub fn set_option<V: TrackedValue>(
        &self,
        history: &History,
        field: &str,
        value: Option<V>,
    ) -> UndoResult<bool> {
        self.assign(history, field, FieldValue::from_option(value))
    }
}

impl<T: Undoable> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Tracked {
            value: Arc::clone(&self.value),
            id: self.id,
            config: Arc::clone(&self.config),
            tracking: Arc::clone(&self.tracking),
        }
    }
}

impl<T: Undoable + fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("id", &self.id)
            .field("value", &*self.value.lock())
            .field("tracking", &self.is_tracking())
            .finish()
    }
}
