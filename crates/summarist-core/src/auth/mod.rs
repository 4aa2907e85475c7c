//! Authentication and entitlement.
//!
//! This module provides:
//! - `SessionManager`: sign-in, registration, guest and Google sign-in,
//!   logout and upgrade, persisted through a `KeyValueStore`
//! - `CredentialStore`: in-memory accounts with Argon2-hashed passwords
//! - `Session` / `Plan`: who is signed in and on which tier
//!
//! The account store is rebuilt from seed accounts on every start; only the
//! session itself survives a restart.

pub mod credentials;
pub mod error;
pub mod session;

pub use credentials::{CredentialStore, GUEST_EMAIL, PREMIUM_ACCOUNT_EMAIL};
pub use error::AuthError;
pub use session::{GoogleProfile, Plan, Session, SessionManager};
