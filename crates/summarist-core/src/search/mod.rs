//! Debounced incremental search over the book catalog.
//!
//! Keystrokes go through `SearchClient::on_query_changed`. A request is only
//! sent once typing pauses, and a newer keystroke always wins over an older
//! request still in flight.

pub mod client;

pub use client::{SearchClient, SearchView, DEFAULT_DEBOUNCE_MS};
