//! Payment intents and payment records.

use super::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

impl PaymentIntent {
    /// Intent id, the part of the client secret before `_secret_`.
    pub fn intent_id(&self) -> &str {
        self.client_secret
            .split("_secret_")
            .next()
            .unwrap_or(&self.client_secret)
    }
}

/// A confirmed purchase. Only created after the gateway reports success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub transaction_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub user_email: String,
    #[serde(default)]
    pub class_ids: Vec<RecordId>,
    #[serde(default)]
    pub cart_item_ids: Vec<RecordId>,
    pub date: DateTime<Utc>,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_from_client_secret() {
        let intent = PaymentIntent {
            client_secret: "pi_123_secret_abc".to_string(),
        };
        assert_eq!(intent.intent_id(), "pi_123");
    }

    #[test]
    fn test_record_defaults_currency() {
        let record: PaymentRecord = serde_json::from_value(serde_json::json!({
            "transactionId": "pi_1",
            "amount": 30.0,
            "userEmail": "s@example.com",
            "date": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.currency, "usd");
        assert!(record.class_ids.is_empty());
    }
}
