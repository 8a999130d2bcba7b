//! Observability for the wiki store
//!
//! Every noteworthy state change is a typed [`Event`] logged as one JSON
//! line. Logging is best-effort and never fails the operation it reports.
//! Passwords, hashes and the session secret never appear in log fields.
//!
//! ```ignore
//! use wikistore::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::VersionAppended, &[("title", "/Home"), ("version", "2")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log `event` at its own severity with no fields
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log `event` at its own severity with `fields` after the fixed keys
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
