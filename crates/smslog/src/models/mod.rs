pub mod event;
pub mod summary;

pub use event::{EventKind, LogEvent};
pub use summary::{MessageSummary, Outcome, OutcomeClass, SCHEMA_VERSION, SchemaVersion, json_schema};
