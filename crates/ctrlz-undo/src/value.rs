//! Type-erased field values

use std::any::{self, Any};
use std::fmt;

use crate::error::AccessError;

/// A value that can be stored in a change record.
///
/// Implemented for every `Clone + PartialEq + Debug + Send + Sync` type, so
/// field types never implement it by hand.
pub trait TrackedValue: Any + fmt::Debug + Send + Sync {
    /// Borrow as [`Any`] for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed [`Any`] for by-value downcasting
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Compare with another value using the concrete type's `PartialEq`.
    ///
    /// Values of different concrete types are never equal.
    fn value_eq(&self, other: &dyn TrackedValue) -> bool;

    /// Clone into a new box
    fn clone_boxed(&self) -> Box<dyn TrackedValue>;

    /// Name of the concrete type
    fn value_type_name(&self) -> &'static str;
}

impl<T> TrackedValue for T
where
    T: Any + Clone + PartialEq + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn value_eq(&self, other: &dyn TrackedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_boxed(&self) -> Box<dyn TrackedValue> {
        Box::new(self.clone())
    }

    fn value_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// The content of a field at one point in time: either absent or a value.
///
/// Absence is its own state and is never confused with a zero, `false` or
/// empty value of the field's type.
pub struct FieldValue(Option<Box<dyn TrackedValue>>);

impl FieldValue {
    /// The absent value
    pub fn absent() -> Self {
        FieldValue(None)
    }

    /// Wrap a present value
    pub fn of<T: TrackedValue>(value: T) -> Self {
        FieldValue(Some(Box::new(value)))
    }

    /// `None` becomes absent, `Some(v)` becomes `v`
    pub fn from_option<T: TrackedValue>(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::of(value),
            None => Self::absent(),
        }
    }

    /// Whether this is the absent value
    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the present value, if any
    pub fn get(&self) -> Option<&dyn TrackedValue> {
        self.0.as_deref()
    }

    /// Borrow the present value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.get().and_then(|value| value.as_any().downcast_ref::<T>())
    }

    /// Name of the held type, `None` when absent
    pub fn type_name(&self) -> Option<&'static str> {
        self.get().map(|value| value.value_type_name())
    }

    /// Extract a value for a field that cannot be absent
    pub fn into_required<T: Any>(self, field: &str) -> Result<T, AccessError> {
        self.into_optional(field)?
            .ok_or_else(|| AccessError::missing_value(field))
    }

    /// Extract a value for an `Option<T>` field
    pub fn into_optional<T: Any>(self, field: &str) -> Result<Option<T>, AccessError> {
        let Some(boxed) = self.0 else {
            return Ok(None);
        };
        let found = boxed.value_type_name();
        boxed
            .into_any()
            .downcast::<T>()
            .map(|value| Some(*value))
            .map_err(|_| AccessError::type_mismatch(field, any::type_name::<T>(), found))
    }
}

impl Clone for FieldValue {
    fn clone(&self) -> Self {
        FieldValue(self.get().map(|value| value.clone_boxed()))
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "{:?}", value),
            None => write!(f, "<absent>"),
        }
    }
}

impl<T: TrackedValue> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}
