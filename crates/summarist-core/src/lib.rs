//! Summarist core - session, search, book catalog, checkout and player state.
//!
//! The front end owns one [`SessionManager`] and one [`SearchClient`], both
//! constructed at startup and passed by reference to whatever renders them.

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod payment;
pub mod player;
pub mod search;
pub mod store;
pub mod utils;

pub use access::{check_access, Access};
pub use api::{ApiClient, ApiError, BookApi};
pub use auth::{AuthError, CredentialStore, GoogleProfile, Plan, Session, SessionManager};
pub use config::Config;
pub use models::{Book, BookStatus, BookSummary};
pub use search::{SearchClient, SearchView};
pub use store::{FileStore, KeyValueStore, MemoryStore};
