//! Simulated checkout for the premium plan.
//!
//! No card is ever charged. The form is validated the way a real checkout
//! would reject it, a processing delay is simulated, and then the signed-in
//! account is upgraded.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::auth::SessionManager;
use crate::store::KeyValueStore;

/// Simulated card processing time.
pub const DEFAULT_PROCESSING_DELAY_MS: u64 = 2000;

/// Every plan starts with a free trial of this many days.
pub const TRIAL_DAYS: u32 = 7;

const CARD_NUMBER_DIGITS: usize = 16;
const CVV_DIGITS: usize = 3;
const EXPIRY_DIGITS: usize = 4;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Card number must be 16 digits")]
    CardNumberLength,

    #[error("CVV must be 3 digits")]
    CvvLength,

    #[error("Invalid expiry date")]
    InvalidExpiry,

    #[error("Please log in before choosing a plan")]
    NotSignedIn,
}

/// Billing period for the premium plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingCycle {
    #[default]
    Yearly,
    Monthly,
}

impl BillingCycle {
    pub fn price(&self) -> &'static str {
        match self {
            BillingCycle::Yearly => "$59.99",
            BillingCycle::Monthly => "$5.99",
        }
    }

    pub fn period(&self) -> &'static str {
        match self {
            BillingCycle::Yearly => "year",
            BillingCycle::Monthly => "month",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            BillingCycle::Yearly => "Save 20% compared to monthly",
            BillingCycle::Monthly => "Billed monthly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.price(), self.period())
    }
}

impl FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yearly" | "year" | "annual" => Ok(BillingCycle::Yearly),
            "monthly" | "month" => Ok(BillingCycle::Monthly),
            other => Err(format!("unknown billing cycle '{}'", other)),
        }
    }
}

/// Card form contents as typed, after the input formatters below.
#[derive(Debug, Clone, Default)]
pub struct CardDetails {
    pub number: String,
    pub name: String,
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.number.is_empty()
            || self.name.trim().is_empty()
            || self.expiry.is_empty()
            || self.cvv.is_empty()
        {
            return Err(PaymentError::MissingFields);
        }
        if digits(&self.number).len() != CARD_NUMBER_DIGITS {
            return Err(PaymentError::CardNumberLength);
        }
        if self.cvv.len() != CVV_DIGITS || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::CvvLength);
        }
        if !is_expiry_shape(&self.expiry) {
            return Err(PaymentError::InvalidExpiry);
        }
        Ok(())
    }

    /// Last four digits, for receipts.
    pub fn last4(&self) -> String {
        let d = digits(&self.number);
        d[d.len().saturating_sub(4)..].to_string()
    }
}

/// `MM/YY` with digits on both sides of the slash.
fn is_expiry_shape(expiry: &str) -> bool {
    let bytes = expiry.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit)
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Group card digits in fours, dropping input past 16 digits.
pub fn format_card_number(input: &str) -> String {
    let d: Vec<char> = digits(input).chars().take(CARD_NUMBER_DIGITS).collect();
    d.chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shape expiry input as `MM/YY`, dropping input past four digits.
pub fn format_expiry(input: &str) -> String {
    let d: String = digits(input).chars().take(EXPIRY_DIGITS).collect();
    if d.len() >= 2 {
        format!("{}/{}", &d[..2], &d[2..])
    } else {
        d
    }
}

/// Keep at most three CVV digits.
pub fn format_cvv(input: &str) -> String {
    digits(input).chars().take(CVV_DIGITS).collect()
}

/// Proof of a simulated charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub email: String,
    pub cycle: BillingCycle,
    pub card_last4: String,
    pub paid_at: DateTime<Utc>,
}

/// Validate the card, wait out the simulated processing time, then upgrade
/// the signed-in account. Nothing changes if validation fails.
pub async fn checkout<S: KeyValueStore>(
    manager: &mut SessionManager<S>,
    card: &CardDetails,
    cycle: BillingCycle,
    processing_delay: Duration,
) -> Result<Receipt, PaymentError> {
    let email = manager
        .session()
        .identity()
        .ok_or(PaymentError::NotSignedIn)?
        .to_string();
    card.validate()?;

    info!(email = %email, cycle = %cycle, "Processing payment");
    tokio::time::sleep(processing_delay).await;
    manager.upgrade_to_premium();

    Ok(Receipt {
        email,
        cycle,
        card_last4: card.last4(),
        paid_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Plan;
    use crate::store::MemoryStore;

    fn valid_card() -> CardDetails {
        CardDetails {
            number: format_card_number("4242424242424242"),
            name: "Ada Reader".to_string(),
            expiry: format_expiry("1229"),
            cvv: format_cvv("123"),
        }
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("4242 42"), "4242 42");
        assert_eq!(format_card_number("42424242424242429999"), "4242 4242 4242 4242");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12/");
        assert_eq!(format_expiry("1229"), "12/29");
        assert_eq!(format_expiry("12/2999"), "12/29");
    }

    #[test]
    fn test_format_cvv() {
        assert_eq!(format_cvv("12a34"), "123");
    }

    #[test]
    fn test_card_validation() {
        assert!(valid_card().validate().is_ok());

        let mut card = valid_card();
        card.name = "  ".to_string();
        assert_eq!(card.validate(), Err(PaymentError::MissingFields));

        let mut card = valid_card();
        card.number = "4242 4242".to_string();
        assert_eq!(card.validate(), Err(PaymentError::CardNumberLength));

        let mut card = valid_card();
        card.cvv = "12".to_string();
        assert_eq!(card.validate(), Err(PaymentError::CvvLength));

        let mut card = valid_card();
        card.expiry = "12/".to_string();
        assert_eq!(card.validate(), Err(PaymentError::InvalidExpiry));
    }

    #[test]
    fn test_billing_cycle() {
        assert_eq!(BillingCycle::default(), BillingCycle::Yearly);
        assert_eq!(BillingCycle::Yearly.to_string(), "$59.99/year");
        assert_eq!("Monthly".parse::<BillingCycle>(), Ok(BillingCycle::Monthly));
        assert!("weekly".parse::<BillingCycle>().is_err());
    }

    #[test]
    fn test_last4() {
        assert_eq!(valid_card().last4(), "4242");
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_upgrades_after_delay() {
        let mut manager = SessionManager::new(MemoryStore::new());
        manager.register("reader@books.io", "secret1").unwrap();

        let receipt = checkout(
            &mut manager,
            &valid_card(),
            BillingCycle::Monthly,
            Duration::from_millis(DEFAULT_PROCESSING_DELAY_MS),
        )
        .await
        .unwrap();

        assert_eq!(receipt.email, "reader@books.io");
        assert_eq!(receipt.cycle, BillingCycle::Monthly);
        assert_eq!(manager.session().plan(), Plan::Premium);
    }

    #[tokio::test]
    async fn test_checkout_rejects_without_changes() {
        let mut manager = SessionManager::new(MemoryStore::new());
        let result = checkout(&mut manager, &valid_card(), BillingCycle::Yearly, Duration::ZERO).await;
        assert_eq!(result, Err(PaymentError::NotSignedIn));

        manager.login_as_guest();
        let mut card = valid_card();
        card.cvv.clear();
        let result = checkout(&mut manager, &card, BillingCycle::Yearly, Duration::ZERO).await;
        assert_eq!(result, Err(PaymentError::MissingFields));
        assert_eq!(manager.session().plan(), Plan::Free);
    }
}
