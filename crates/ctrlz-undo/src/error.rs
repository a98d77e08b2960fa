//! Error types for the change-capture and undo engine

use thiserror::Error;

/// Errors that can occur while undoing or configuring a history
#[derive(Debug, Error)]
pub enum UndoError {
    /// No more undos available
    #[error("No more undos available")]
    NoMoreUndos,

    /// The object a change was captured on has been dropped
    #[error("Target of change {0} is no longer alive")]
    TargetDropped(String),

    /// Reading or writing a field failed
    #[error("Field access error: {0}")]
    Access(#[from] AccessError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Configuration could not be written
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UndoError {
    /// Create a new TargetDropped error with context
    pub fn target_dropped(change_id: impl Into<String>) -> Self {
        Self::TargetDropped(change_id.into())
    }
}

/// Errors raised by a [`FieldAccessor`](crate::FieldAccessor) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The object has no field with this name
    #[error("Unknown field `{field}` on {type_name}")]
    UnknownField {
        /// Type of the accessed object
        type_name: String,
        /// Requested field
        field: String,
    },

    /// The value does not have the field's type
    #[error("Type mismatch for field `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// Accessed field
        field: String,
        /// Type the field holds
        expected: String,
        /// Type of the supplied value
        found: String,
    },

    /// An absent value was written to a field that cannot be absent
    #[error("Field `{0}` cannot hold an absent value")]
    MissingValue(String),

    /// The accessor refused the write
    #[error("Access to field `{field}` denied: {reason}")]
    Denied {
        /// Accessed field
        field: String,
        /// Why the accessor refused
        reason: String,
    },
}

impl AccessError {
    /// Create a new UnknownField error with context
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Create a new TypeMismatch error with context
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new MissingValue error with context
    pub fn missing_value(field: impl Into<String>) -> Self {
        Self::MissingValue(field.into())
    }

    /// Create a new Denied error with context
    pub fn denied(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Denied {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for undo operations
pub type UndoResult<T> = Result<T, UndoError>;
