//! Pluggable field access
//!
//! The engine never inspects objects itself. Everything it needs to read a
//! field before a mutation and to write it back on undo goes through
//! [`FieldAccessor`], which a type implements by hand or generates with
//! [`field_accessor!`](crate::field_accessor).

use crate::error::AccessError;
use crate::value::FieldValue;

/// Reads and writes fields of an object by name
pub trait FieldAccessor: Send + 'static {
    /// Current value of `field`
    fn get_field(&self, field: &str) -> Result<FieldValue, AccessError>;

    /// Replace the value of `field`
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), AccessError>;
}

/// Generate a [`FieldAccessor`] implementation from a list of fields.
///
/// Each field is marked `value` when it always holds a value, or `optional`
/// when it is an `Option<T>` whose `None` is the absent value.
///
/// ```
/// use ctrlz_undo::{field_accessor, FieldAccessor, FieldValue};
///
/// struct Event {
///     name: String,
///     venue: Option<String>,
///     duration: f32,
/// }
///
/// field_accessor!(Event {
///     name: value,
///     venue: optional,
///     duration: value,
/// });
///
/// let mut event = Event { name: "standup".into(), venue: None, duration: 0.25 };
/// assert!(event.get_field("venue").unwrap().is_absent());
/// event.set_field("duration", FieldValue::of(0.5f32)).unwrap();
/// assert_eq!(event.duration, 0.5);
/// ```
#[macro_export]
macro_rules! field_accessor {
    (@get value, $place:expr) => {
        $crate::FieldValue::of(::std::clone::Clone::clone(&$place))
    };
    (@get optional, $place:expr) => {
        $crate::FieldValue::from_option(::std::clone::Clone::clone(&$place))
    };
    (@set value, $value:expr, $field:expr) => {
        $value.into_required($field)?
    };
    (@set optional, $value:expr, $field:expr) => {
        $value.into_optional($field)?
    };
    ($name:ident { $($field:ident : $kind:ident),* $(,)? }) => {
        impl $crate::FieldAccessor for $name {
            fn get_field(
                &self,
                field: &str,
            ) -> ::std::result::Result<$crate::FieldValue, $crate::AccessError> {
                match field {
                    $(stringify!($field) => {
                        ::std::result::Result::Ok($crate::field_accessor!(@get $kind, self.$field))
                    })*
                    _ => ::std::result::Result::Err($crate::AccessError::unknown_field(
                        ::std::any::type_name::<Self>(),
                        field,
                    )),
                }
            }

            fn set_field(
                &mut self,
                field: &str,
                value: $crate::FieldValue,
            ) -> ::std::result::Result<(), $crate::AccessError> {
                match field {
                    $(stringify!($field) => {
                        self.$field = $crate::field_accessor!(@set $kind, value, field);
                        ::std::result::Result::Ok(())
                    })*
                    _ => ::std::result::Result::Err($crate::AccessError::unknown_field(
                        ::std::any::type_name::<Self>(),
                        field,
                    )),
                }
            }
        }
    };
}
