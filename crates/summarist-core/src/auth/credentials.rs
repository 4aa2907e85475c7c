use std::collections::HashMap;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::{debug, error};

use super::AuthError;

/// Minimum accepted password length, in UTF-16 code units.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Account used by "continue as guest".
pub const GUEST_EMAIL: &str = "guest@gmail.com";

/// The one account that signs in with the premium plan.
pub const PREMIUM_ACCOUNT_EMAIL: &str = "user@example.com";

/// Accounts every fresh credential store starts with.
const SEED_ACCOUNTS: [(&str, &str); 2] = [
    (GUEST_EMAIL, "password123"),
    (PREMIUM_ACCOUNT_EMAIL, "password123"),
];

/// Argon2 memory cost in KiB. The store only lives for one process and
/// holds demo accounts, so it trades hardness for fast startup.
const HASH_MEMORY_KIB: u32 = 8 * 1024;

/// Check the `local@domain.tld` shape: no whitespace, exactly one `@`,
/// a non-empty local part, and a domain with a dot that has text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Length is counted in UTF-16 code units, the unit browsers report for
/// `String.length`, so characters outside the BMP count twice.
pub fn is_valid_password(password: &str) -> bool {
    password.encode_utf16().count() >= MIN_PASSWORD_LENGTH
}

/// Shared input check for every email/password flow.
pub fn validate(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    if !is_valid_password(password) {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// In-memory accounts keyed by email. Grows on registration, never shrinks,
/// and is rebuilt from the seed accounts on every start.
pub struct CredentialStore {
    hasher: Argon2<'static>,
    accounts: HashMap<String, String>,
}

impl CredentialStore {
    /// A store holding only the seed accounts.
    pub fn new() -> Self {
        let params = Params::new(HASH_MEMORY_KIB, 2, 1, None).unwrap_or_default();
        let mut store = Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            accounts: HashMap::new(),
        };
        for (email, password) in SEED_ACCOUNTS {
            // Already logged; the store still works for registered accounts.
            let _ = store.insert(email, password);
        }
        store
    }

    pub fn contains(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Compare `password` against the stored hash for `email`.
    pub fn verify(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let stored = self.accounts.get(email).ok_or(AuthError::UserNotFound)?;
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(email, error = %e, "Stored password hash is unreadable");
            AuthError::InvalidPassword
        })?;
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidPassword)
    }

    /// Add a new account. Existing accounts are never overwritten, and
    /// nothing is stored if the password cannot be hashed.
    pub fn register(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.contains(email) {
            return Err(AuthError::EmailAlreadyRegistered);
        }
        self.insert(email, password)
    }

    fn insert(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.insert_with_salt(email, password, &salt)
    }

    fn insert_with_salt(
        &mut self,
        email: &str,
        password: &str,
        salt: &SaltString,
    ) -> Result<(), AuthError> {
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), salt)
            .map_err(|e| {
                error!(email, error = %e, "Failed to hash password");
                AuthError::AccountNotCreated
            })?;
        self.accounts.insert(email.to_string(), hash.to_string());
        debug!(email, accounts = self.accounts.len(), "Account stored");
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
