use thiserror::Error;

/// Reasons a sign-in or registration attempt is rejected.
/// None of them change the current session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    WeakPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Could not create account")]
    AccountNotCreated,
}
