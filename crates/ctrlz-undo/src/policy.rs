//! Duplicate suppression
//!
//! Decides whether an approved assignment is worth a history entry. Sameness
//! is value equality of the field's concrete type. Hashes are never consulted,
//! so a value that hashes like "no value" (for example `0` in a type that
//! hashes `None` to `0`) still counts as a change.

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Whether assignments of an unchanged value are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Record every assignment, including re-assigning the current value
    #[default]
    RecordAll,
    /// Skip assignments whose new value equals the previous value
    SuppressEqual,
}

impl DuplicatePolicy {
    /// Policy for a class-level `suppress_duplicates` flag
    pub fn from_flag(suppress_duplicates: bool) -> Self {
        if suppress_duplicates {
            DuplicatePolicy::SuppressEqual
        } else {
            DuplicatePolicy::RecordAll
        }
    }

    /// Whether an assignment from `previous` to `new` is recorded
    pub fn should_record(self, previous: &FieldValue, new: &FieldValue) -> bool {
        match self {
            DuplicatePolicy::RecordAll => true,
            DuplicatePolicy::SuppressEqual => !values_equal(previous, new),
        }
    }
}

/// Shorthand for `DuplicatePolicy::from_flag(flag).should_record(..)`
pub fn should_record(suppress_duplicates: bool, previous: &FieldValue, new: &FieldValue) -> bool {
    DuplicatePolicy::from_flag(suppress_duplicates).should_record(previous, new)
}

/// Value equality of two field values.
///
/// Absent equals absent. Absent never equals a present value, whatever the
/// present value's own `PartialEq` would say. Present values compare with
/// their concrete type's `PartialEq` and differ when their types differ.
pub fn values_equal(previous: &FieldValue, new: &FieldValue) -> bool {
    match (previous.get(), new.get()) {
        (None, None) => true,
        (Some(previous), Some(new)) => previous.value_eq(new),
        (None, Some(_)) | (Some(_), None) => false,
    }
}
