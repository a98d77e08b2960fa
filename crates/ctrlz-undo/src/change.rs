//! Captured field mutations

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RetentionMode;
use crate::error::{UndoError, UndoResult};
use crate::target::{TargetHandle, TargetRef};
use crate::value::FieldValue;

/// One captured mutation: which object, which field, and the value the field
/// held before the mutation.
///
/// Records are immutable. Undoing one consumes it.
#[derive(Debug)]
pub struct ChangeRecord {
    id: Uuid,
    recorded_at: DateTime<Utc>,
    target: TargetRef,
    target_id: Uuid,
    target_type: &'static str,
    field: String,
    previous: FieldValue,
}

impl ChangeRecord {
    /// Create a record for `field` of `target`, holding `previous` verbatim
    pub fn new(
        target: &TargetHandle,
        field: impl Into<String>,
        previous: FieldValue,
        retention: RetentionMode,
    ) -> Self {
        ChangeRecord {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            target: target.retain(retention),
            target_id: target.id(),
            target_type: target.type_name(),
            field: field.into(),
            previous,
        }
    }

    /// Unique identifier of this record
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the mutation was captured
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Identity of the mutated object
    pub fn target_id(&self) -> Uuid {
        self.target_id
    }

    /// Type name of the mutated object
    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    /// Name of the mutated field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value of the field before the mutation
    pub fn previous(&self) -> &FieldValue {
        &self.previous
    }

    /// Whether the mutated object can still be written to
    pub fn is_target_alive(&self) -> bool {
        self.target.upgrade().is_some()
    }

    /// Serializable description of this record
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            id: self.id,
            recorded_at: self.recorded_at,
            target_id: self.target_id,
            target_type: self.target_type.to_string(),
            field: self.field.clone(),
            previous: self.previous.get().map(|value| format!("{:?}", value)),
        }
    }

    /// Write the previous value back onto the target, consuming the record
    pub(crate) fn restore(self) -> UndoResult<ChangeSummary> {
        let summary = self.summary();
        let target = self
            .target
            .upgrade()
            .ok_or_else(|| UndoError::target_dropped(self.id.to_string()))?;
        target.lock().set_field(&self.field, self.previous)?;
        Ok(summary)
    }
}

/// Inspection view of a [`ChangeRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Record identifier
    pub id: Uuid,
    /// When the mutation was captured
    pub recorded_at: DateTime<Utc>,
    /// Identity of the mutated object
    pub target_id: Uuid,
    /// Type name of the mutated object
    pub target_type: String,
    /// Name of the mutated field
    pub field: String,
    /// Debug rendering of the previous value, `None` when it was absent
    pub previous: Option<String>,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = self
            .target_type
            .rsplit("::")
            .next()
            .unwrap_or(&self.target_type);
        write!(
            f,
            "[{}] {}.{} <- {}",
            self.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            type_name,
            self.field,
            self.previous.as_deref().unwrap_or("<absent>")
        )
    }
}
