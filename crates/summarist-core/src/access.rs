//! Premium content gating.

use crate::auth::Session;
use crate::models::Book;

/// Outcome of asking to read or listen to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open the player.
    Granted,
    /// Premium book and nobody is signed in: sign in, then pick a plan.
    LoginRequired,
    /// Premium book on a free plan: send the user to plan selection.
    UpgradeRequired,
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

pub fn check_access(book: &Book, session: &Session) -> Access {
    if !book.subscription_required || session.is_premium() {
        Access::Granted
    } else if !session.is_authenticated() {
        Access::LoginRequired
    } else {
        Access::UpgradeRequired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Plan;

    fn book(subscription_required: bool) -> Book {
        let json = format!(
            r#"{{"id":"b1","title":"T","author":"A","subscriptionRequired":{}}}"#,
            subscription_required
        );
        serde_json::from_str(&json).unwrap()
    }

    fn signed_in(plan: Plan) -> Session {
        Session::Authenticated {
            email: "reader@books.io".to_string(),
            plan,
        }
    }

    #[test]
    fn test_free_book_is_open_to_everyone() {
        let free = book(false);
        assert_eq!(check_access(&free, &Session::Anonymous), Access::Granted);
        assert_eq!(check_access(&free, &signed_in(Plan::Free)), Access::Granted);
        assert_eq!(check_access(&free, &signed_in(Plan::Premium)), Access::Granted);
    }

    #[test]
    fn test_premium_book_gating() {
        let premium = book(true);
        assert_eq!(check_access(&premium, &Session::Anonymous), Access::LoginRequired);
        assert_eq!(check_access(&premium, &signed_in(Plan::Free)), Access::UpgradeRequired);
        assert!(check_access(&premium, &signed_in(Plan::Premium)).is_granted());
    }
}
