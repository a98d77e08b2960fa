#![warn(missing_docs)]

//! Field-level change capture and undo
//!
//! Objects wrapped in a [`Tracked`] handle have their field assignments
//! recorded in a [`History`]. Each record keeps the value the field held
//! before the assignment; [`History::undo`] writes the newest one back.
//!
//! ```
//! use ctrlz_undo::{field_accessor, History, Tracked, Undoable};
//!
//! struct Event {
//!     name: String,
//!     duration: f32,
//! }
//!
//! field_accessor!(Event { name: value, duration: value });
//! impl Undoable for Event {}
//!
//! let history = History::new();
//! let event = Tracked::new(Event { name: "review".into(), duration: 1.0 });
//!
//! event.set(&history, "duration", 2.0f32).unwrap();
//! assert!(history.undo());
//! assert_eq!(event.read(|e| e.duration), 1.0);
//! assert!(!history.undo());
//! ```

pub mod accessor;
pub mod change;
pub mod config;
pub mod error;
pub mod history;
pub mod policy;
pub mod target;
pub mod value;


// Re-export public API
pub use accessor::FieldAccessor;
pub use change::{ChangeRecord, ChangeSummary};
pub use config::{ClassConfig, HistoryConfig, RetentionMode, Undoable};
pub use error::{AccessError, UndoError, UndoResult};
pub use history::History;
pub use policy::{should_record, values_equal, DuplicatePolicy};
pub use target::{SharedTarget, TargetHandle, Tracked};
pub use value::{FieldValue, TrackedValue};
