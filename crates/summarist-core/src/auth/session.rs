use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::KeyValueStore;

use super::credentials::{self, CredentialStore, GUEST_EMAIL, PREMIUM_ACCOUNT_EMAIL};
use super::AuthError;

/// Persisted keys. Written together, removed together.
const EMAIL_KEY: &str = "session.email";
const AUTHENTICATED_KEY: &str = "session.authenticated";
const PLAN_KEY: &str = "session.plan";

/// Display name handed out by the demo Google sign-in.
const DEMO_GOOGLE_NAME: &str = "Google User";

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Premium => "Premium",
        }
    }

    /// Plan granted by a password sign-in for `email`.
    fn for_email(email: &str) -> Self {
        if email == PREMIUM_ACCOUNT_EMAIL {
            Plan::Premium
        } else {
            Plan::Free
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(format!("unknown plan '{}'", other)),
        }
    }
}

/// Who is signed in and on which plan. An anonymous session has no plan of
/// its own and reads as `Plan::Free`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { email: String, plan: Plan },
}

impl Session {
    pub fn identity(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { email, .. } => Some(email),
        }
    }

    pub fn plan(&self) -> Plan {
        match self {
            Session::Anonymous => Plan::Free,
            Session::Authenticated { plan, .. } => *plan,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn is_premium(&self) -> bool {
        self.plan() == Plan::Premium
    }
}

/// Identity asserted by a third-party sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    pub display_name: String,
}

impl GoogleProfile {
    /// A throwaway identity in place of a real provider round trip.
    pub fn demo() -> Self {
        Self {
            email: format!("user-{}@gmail.com", Utc::now().timestamp_millis()),
            display_name: DEMO_GOOGLE_NAME.to_string(),
        }
    }
}

/// Owns the current session, the account store and the persisted copy of
/// the session. Build one at startup and hand it to whatever needs it.
pub struct SessionManager<S: KeyValueStore> {
    store: S,
    credentials: CredentialStore,
    session: Session,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Restore the session persisted in `store`, if any.
    pub fn new(store: S) -> Self {
        Self::with_credentials(store, CredentialStore::new())
    }

    pub fn with_credentials(store: S, credentials: CredentialStore) -> Self {
        let session = Self::restore(&store);
        debug!(authenticated = session.is_authenticated(), plan = %session.plan(), "Session restored");
        Self {
            store,
            credentials,
            session,
        }
    }

    fn restore(store: &S) -> Session {
        let email = store.get(EMAIL_KEY);
        let authenticated = store.get(AUTHENTICATED_KEY).as_deref() == Some("true");

        match email {
            Some(email) if authenticated => {
                let plan = match store.get(PLAN_KEY).map(|p| p.parse::<Plan>()) {
                    Some(Ok(plan)) => plan,
                    Some(Err(e)) => {
                        warn!(error = %e, "Ignoring stored plan");
                        Plan::for_email(&email)
                    }
                    None => Plan::for_email(&email),
                };
                Session::Authenticated { email, plan }
            }
            _ => Session::Anonymous,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Sign in with email and password.
    pub fn login(&mut self, email: &str, password: &str) -> Result<&Session, AuthError> {
        credentials::validate(email, password)?;
        self.credentials.verify(email, password)?;

        self.sign_in(email, Plan::for_email(email));
        Ok(&self.session)
    }

    /// Create an account and sign into it on the free plan.
    pub fn register(&mut self, email: &str, password: &str) -> Result<&Session, AuthError> {
        credentials::validate(email, password)?;
        self.credentials.register(email, password)?;

        self.sign_in(email, Plan::Free);
        Ok(&self.session)
    }

    pub fn login_as_guest(&mut self) -> &Session {
        self.sign_in(GUEST_EMAIL, Plan::Free);
        &self.session
    }

    /// Sign in with an identity asserted by Google. Always the free plan.
    pub fn login_with_google(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<&Session, AuthError> {
        if !credentials::is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        debug!(email, display_name, "Google identity accepted");

        self.sign_in(email, Plan::Free);
        Ok(&self.session)
    }

    pub fn logout(&mut self) -> &Session {
        if self.session.is_authenticated() {
            info!("Signed out");
        }
        self.session = Session::Anonymous;
        if let Err(e) = self
            .store
            .remove_many(&[EMAIL_KEY, AUTHENTICATED_KEY, PLAN_KEY])
        {
            warn!(error = %e, "Failed to clear persisted session");
        }
        &self.session
    }

    /// Switch the signed-in account to premium. Payment is the caller's
    /// business; with nobody signed in there is nothing to upgrade.
    pub fn upgrade_to_premium(&mut self) -> &Session {
        match &mut self.session {
            Session::Authenticated { email, plan } => {
                *plan = Plan::Premium;
                info!(email = %email, "Upgraded to premium");
                self.persist();
            }
            Session::Anonymous => warn!("Upgrade requested without a signed-in user"),
        }
        &self.session
    }

    fn sign_in(&mut self, email: &str, plan: Plan) {
        self.session = Session::Authenticated {
            email: email.to_string(),
            plan,
        };
        info!(email, plan = %plan, "Signed in");
        self.persist();
    }

    /// Write the session as one batch. Failures are logged: the in-memory
    /// transition has already happened and stays in effect for this run.
    fn persist(&mut self) {
        let Session::Authenticated { email, plan } = &self.session else {
            return;
        };
        let result = self.store.set_many(&[
            (EMAIL_KEY, email.as_str()),
            (AUTHENTICATED_KEY, "true"),
            (PLAN_KEY, plan.as_str()),
        ]);
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> SessionManager<MemoryStore> {
        SessionManager::new(MemoryStore::new())
    }

    fn reload(manager: SessionManager<MemoryStore>) -> SessionManager<MemoryStore> {
        SessionManager::new(manager.store)
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[test]
    fn test_starts_anonymous() {
        let m = manager();
        assert_eq!(m.session(), &Session::Anonymous);
        assert_eq!(m.session().plan(), Plan::Free);
        assert!(m.session().identity().is_none());
    }

    #[test]
    fn test_login_premium_account() {
        let mut m = manager();
        let session = m.login(PREMIUM_ACCOUNT_EMAIL, "password123").unwrap();
        assert_eq!(session.identity(), Some(PREMIUM_ACCOUNT_EMAIL));
        assert_eq!(session.plan(), Plan::Premium);
    }

    #[test]
    fn test_login_other_account_is_free() {
        let mut m = manager();
        let session = m.login(GUEST_EMAIL, "password123").unwrap();
        assert_eq!(session.plan(), Plan::Free);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_login_errors_leave_state_untouched() {
        let mut m = manager();
        m.login_as_guest();
        let before = m.session().clone();

        assert_eq!(m.login("not-an-email", "password123"), Err(AuthError::InvalidEmail));
        assert_eq!(m.login(PREMIUM_ACCOUNT_EMAIL, "short"), Err(AuthError::WeakPassword));
        assert_eq!(
            m.login("nobody@example.com", "password123"),
            Err(AuthError::UserNotFound)
        );
        assert_eq!(
            m.login(PREMIUM_ACCOUNT_EMAIL, "wrong-password"),
            Err(AuthError::InvalidPassword)
        );

        assert_eq!(m.session(), &before);
        assert_eq!(reload(m).session(), &before);
    }

    #[test]
    fn test_failed_login_writes_nothing() {
        let mut m = manager();
        let _ = m.login("nobody@example.com", "password123");
        assert!(m.store().is_empty());
    }

    // -------------------------------------------------------------------------
    // Register
    // -------------------------------------------------------------------------

    #[test]
    fn test_register_signs_in_on_free_plan() {
        let mut m = manager();
        let session = m.register("reader@books.io", "secret1").unwrap();
        assert_eq!(session.identity(), Some("reader@books.io"));
        assert_eq!(session.plan(), Plan::Free);

        // The new account can sign in again later in the same run
        m.logout();
        assert!(m.login("reader@books.io", "secret1").is_ok());
    }

    #[test]
    fn test_register_existing_email_fails() {
        let mut m = manager();
        m.login_as_guest();
        let before = m.session().clone();

        assert_eq!(
            m.register(PREMIUM_ACCOUNT_EMAIL, "anything-long"),
            Err(AuthError::EmailAlreadyRegistered)
        );
        assert_eq!(m.session(), &before);

        m.register("first@books.io", "secret1").unwrap();
        let before = m.session().clone();
        assert_eq!(
            m.register("first@books.io", "secret2"),
            Err(AuthError::EmailAlreadyRegistered)
        );
        assert_eq!(m.session(), &before);
    }

    #[test]
    fn test_register_validates_input() {
        let mut m = manager();
        assert_eq!(m.register("nope", "secret1"), Err(AuthError::InvalidEmail));
        assert_eq!(m.register("ok@books.io", "12345"), Err(AuthError::WeakPassword));
        assert!(!m.credentials().contains("ok@books.io"));
        assert_eq!(m.session(), &Session::Anonymous);
    }

    #[test]
    fn test_register_always_lands_on_free() {
        let mut m = manager();
        let session = m.register("premium-ish@example.com", "secret1").unwrap();
        assert_eq!(session.plan(), Plan::Free);
    }

    // -------------------------------------------------------------------------
    // Guest / Google
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_as_guest() {
        let mut m = manager();
        let session = m.login_as_guest();
        assert_eq!(session.identity(), Some(GUEST_EMAIL));
        assert_eq!(session.plan(), Plan::Free);
    }

    #[test]
    fn test_login_with_google() {
        let mut m = manager();
        let session = m.login_with_google("someone@gmail.com", "Someone").unwrap();
        assert_eq!(session.identity(), Some("someone@gmail.com"));
        assert_eq!(session.plan(), Plan::Free);

        // Even the premium account only gets free through Google
        let session = m.login_with_google(PREMIUM_ACCOUNT_EMAIL, "User").unwrap();
        assert_eq!(session.plan(), Plan::Free);
    }

    #[test]
    fn test_login_with_google_invalid_email() {
        let mut m = manager();
        assert_eq!(
            m.login_with_google("not an email", "X"),
            Err(AuthError::InvalidEmail)
        );
        assert_eq!(m.session(), &Session::Anonymous);
    }

    #[test]
    fn test_demo_google_profile() {
        let profile = GoogleProfile::demo();
        assert!(profile.email.starts_with("user-"));
        assert!(profile.email.ends_with("@gmail.com"));
        assert!(credentials::is_valid_email(&profile.email));
        assert_eq!(profile.display_name, "Google User");
    }

    // -------------------------------------------------------------------------
    // Logout / Upgrade
    // -------------------------------------------------------------------------

    #[test]
    fn test_logout_resets_from_any_state() {
        let mut m = manager();
        assert_eq!(m.logout(), &Session::Anonymous);

        m.login(PREMIUM_ACCOUNT_EMAIL, "password123").unwrap();
        let session = m.logout();
        assert!(session.identity().is_none());
        assert_eq!(session.plan(), Plan::Free);
        assert!(m.store().is_empty());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut m = manager();
        m.login_as_guest();
        let once = m.logout().clone();
        let twice = m.logout().clone();
        assert_eq!(once, twice);
        assert!(m.store().is_empty());
    }

    #[test]
    fn test_upgrade_to_premium() {
        let mut m = manager();
        m.register("reader@books.io", "secret1").unwrap();
        let session = m.upgrade_to_premium();
        assert_eq!(session.plan(), Plan::Premium);
        assert_eq!(session.identity(), Some("reader@books.io"));
    }

    #[test]
    fn test_upgrade_without_user_is_noop() {
        let mut m = manager();
        assert_eq!(m.upgrade_to_premium(), &Session::Anonymous);
        assert!(m.store().is_empty());
    }

    #[test]
    fn test_login_after_upgrade_follows_account_rule() {
        // No downgrade transition exists; a fresh password sign-in
        // recomputes the plan from the account.
        let mut m = manager();
        m.login_as_guest();
        m.upgrade_to_premium();
        let session = m.login(GUEST_EMAIL, "password123").unwrap();
        assert_eq!(session.plan(), Plan::Free);
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[test]
    fn test_round_trip_after_every_transition() {
        let mut m = manager();

        m.login(PREMIUM_ACCOUNT_EMAIL, "password123").unwrap();
        let expected = m.session().clone();
        m = reload(m);
        assert_eq!(m.session(), &expected);

        m.register("reader@books.io", "secret1").unwrap();
        let expected = m.session().clone();
        m = reload(m);
        assert_eq!(m.session(), &expected);

        m.upgrade_to_premium();
        let expected = m.session().clone();
        m = reload(m);
        assert_eq!(m.session(), &expected);
        assert_eq!(m.session().plan(), Plan::Premium);

        m.login_as_guest();
        let expected = m.session().clone();
        m = reload(m);
        assert_eq!(m.session(), &expected);

        m.login_with_google("g@gmail.com", "G").unwrap();
        let expected = m.session().clone();
        m = reload(m);
        assert_eq!(m.session(), &expected);

        m.logout();
        m = reload(m);
        assert_eq!(m.session(), &Session::Anonymous);
    }

    #[test]
    fn test_persisted_keys() {
        let mut m = manager();
        m.login(PREMIUM_ACCOUNT_EMAIL, "password123").unwrap();
        assert_eq!(m.store().get(EMAIL_KEY).as_deref(), Some(PREMIUM_ACCOUNT_EMAIL));
        assert_eq!(m.store().get(AUTHENTICATED_KEY).as_deref(), Some("true"));
        assert_eq!(m.store().get(PLAN_KEY).as_deref(), Some("premium"));
    }

    #[test]
    fn test_restore_requires_authenticated_flag() {
        let mut store = MemoryStore::new();
        store.set(EMAIL_KEY, GUEST_EMAIL).unwrap();
        let m = SessionManager::new(store);
        assert_eq!(m.session(), &Session::Anonymous);
    }

    #[test]
    fn test_restore_without_plan_uses_account_rule() {
        let mut store = MemoryStore::new();
        store
            .set_many(&[(EMAIL_KEY, PREMIUM_ACCOUNT_EMAIL), (AUTHENTICATED_KEY, "true")])
            .unwrap();
        let m = SessionManager::new(store);
        assert_eq!(m.session().plan(), Plan::Premium);

        let mut store = MemoryStore::new();
        store
            .set_many(&[
                (EMAIL_KEY, GUEST_EMAIL),
                (AUTHENTICATED_KEY, "true"),
                (PLAN_KEY, "platinum"),
            ])
            .unwrap();
        let m = SessionManager::new(store);
        assert_eq!(m.session().plan(), Plan::Free);
    }

    #[test]
    fn test_borrowed_store_survives_manager() {
        let mut store = MemoryStore::new();
        {
            let mut m = SessionManager::new(&mut store);
            m.login_as_guest();
        }
        let m = SessionManager::new(store);
        assert_eq!(m.session().identity(), Some(GUEST_EMAIL));
    }

    #[test]
    fn test_plan_parse_and_display() {
        assert_eq!("free".parse::<Plan>(), Ok(Plan::Free));
        assert_eq!("premium".parse::<Plan>(), Ok(Plan::Premium));
        assert!("Premium".parse::<Plan>().is_err());
        assert_eq!(Plan::Premium.to_string(), "premium");
        assert_eq!(Plan::Free.display_name(), "Free");
    }
}
