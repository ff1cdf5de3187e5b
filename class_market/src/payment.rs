//! Payment gateway.
//!
//! The backend creates a payment intent and hands out its client secret; the
//! card is confirmed directly with the gateway. Only a `succeeded`
//! confirmation leads to a payment record.

use crate::models::PaymentIntent;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::{fmt, time::Duration};
use thiserror::Error;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1";

/// Payment errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Card details rejected before contacting the gateway
    #[error("Invalid card: {0}")]
    InvalidCard(&'static str),

    /// No gateway key configured
    #[error("Payments are not configured")]
    NotConfigured,

    /// Gateway declined or rejected the confirmation
    #[error("{0}")]
    Declined(String),

    /// Transport failure
    #[error("Payment gateway unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected gateway response
    #[error("Unexpected payment gateway response: {0}")]
    Decode(String),
}

impl PaymentError {
    pub fn client_message(&self) -> String {
        match self {
            PaymentError::Http(_) => "Could not reach the payment gateway".to_string(),
            PaymentError::Decode(_) => "Payment could not be confirmed".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Card entered at checkout.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("**** {}", self.last4()))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

impl CardDetails {
    pub fn new(number: &str, exp_month: u8, exp_year: u16, cvc: &str) -> Self {
        Self {
            number: number.chars().filter(|c| !c.is_whitespace() && *c != '-').collect(),
            exp_month,
            exp_year,
            cvc: cvc.trim().to_string(),
        }
    }

    pub fn last4(&self) -> &str {
        let len = self.number.len();
        self.number.get(len.saturating_sub(4)..).unwrap_or_default()
    }

    /// Shape, checksum and expiry checks; funds are the gateway's call.
    pub fn validate(&self) -> PaymentResult<()> {
        self.validate_on(Utc::now().date_naive())
    }

    /// [`validate`](Self::validate) as of `today`. A card works through the
    /// last day of its expiry month.
    pub fn validate_on(&self, today: NaiveDate) -> PaymentResult<()> {
        if !(12..=19).contains(&self.number.len()) || !self.number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::InvalidCard("card number must be 12 to 19 digits"));
        }
        if !luhn_valid(&self.number) {
            return Err(PaymentError::InvalidCard("card number is not valid"));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(PaymentError::InvalidCard("expiry month must be 1 to 12"));
        }
        if (i32::from(self.exp_year), u32::from(self.exp_month)) < (today.year(), today.month()) {
            return Err(PaymentError::InvalidCard("card has expired"));
        }
        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::InvalidCard("CVC must be 3 or 4 digits"));
        }
        Ok(())
    }
}

fn luhn_valid(number: &str) -> bool {
    let sum: u32 = number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Gateway verdict on a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Gateway transaction (intent) id.
    pub id: String,
    pub status: String,
}

impl PaymentConfirmation {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// External payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn confirm_card_payment(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
        billing_email: &str,
        billing_name: &str,
    ) -> PaymentResult<PaymentConfirmation>;
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Stripe REST confirmation with a publishable key.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_url: String,
    publishable_key: Option<String>,
}

impl StripeGateway {
    pub fn new(publishable_key: Option<String>) -> Self {
        Self::with_api_url(DEFAULT_STRIPE_API_URL, publishable_key)
    }

    pub fn with_api_url(api_url: impl Into<String>, publishable_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn confirm_card_payment(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
        billing_email: &str,
        billing_name: &str,
    ) -> PaymentResult<PaymentConfirmation> {
        card.validate()?;
        let key = self.publishable_key.as_deref().ok_or(PaymentError::NotConfigured)?;

        let url = format!("{}/payment_intents/{}/confirm", self.api_url, intent.intent_id());
        debug!("Confirming payment intent {}", intent.intent_id());

        let exp_month = card.exp_month.to_string();
        let exp_year = card.exp_year.to_string();
        let form = [
            ("key", key),
            ("client_secret", intent.client_secret.as_str()),
            ("payment_method_data[type]", "card"),
            ("payment_method_data[card][number]", card.number.as_str()),
            ("payment_method_data[card][exp_month]", exp_month.as_str()),
            ("payment_method_data[card][exp_year]", exp_year.as_str()),
            ("payment_method_data[card][cvc]", card.cvc.as_str()),
            ("payment_method_data[billing_details][email]", billing_email),
            ("payment_method_data[billing_details][name]", billing_name),
        ];

        let response = self.client.post(url).form(&form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<StripeErrorBody>(&body)
                .map(|b| b.error)
                .map_err(|e| PaymentError::Decode(e.to_string()))?;
            warn!("Payment declined: {:?}", detail.code);
            return Err(PaymentError::Declined(
                detail
                    .message
                    .unwrap_or_else(|| "Your card was declined".to_string()),
            ));
        }

        let confirmed: StripeIntent =
            serde_json::from_slice(&body).map_err(|e| PaymentError::Decode(e.to_string()))?;
        Ok(PaymentConfirmation {
            id: confirmed.id,
            status: confirmed.status,
        })
    }
}
