//! Checkout: pay for everything in the cart.

use super::{CheckoutError, CheckoutResult, ViewContext, cart::load_cart};
use crate::{
    fetch::{Loadable, Resource},
    models::{AppProfile, CartEntry, PaymentRecord, cart_total},
    payment::{CardDetails, PaymentGateway},
    routing::Route,
};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

pub struct CheckoutView {
    ctx: ViewContext,
    gateway: Arc<dyn PaymentGateway>,
    viewer: AppProfile,
    entries: Resource<Vec<CartEntry>>,
}

impl CheckoutView {
    /// Where to go once the payment is recorded.
    pub const DONE: Route = Route::PaymentHistory;

    pub fn new(ctx: ViewContext, gateway: Arc<dyn PaymentGateway>, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            gateway,
            viewer: viewer.clone(),
            entries: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.viewer.email.clone();
        self.entries
            .start(async move { load_cart(&ctx, &email).await.map_err(|e| e.client_message()) });
    }

    pub fn state(&self) -> Loadable<Vec<CartEntry>> {
        self.entries.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<CartEntry>> {
        self.entries.settled().await
    }

    /// Entries that can be paid for: their class still exists.
    fn payable(&self) -> Vec<CartEntry> {
        self.entries
            .state()
            .loaded()
            .map(|entries| entries.iter().filter(|e| e.course.is_some()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> f64 {
        cart_total(&self.payable())
    }

    pub fn can_checkout(&self) -> bool {
        !self.payable().is_empty()
    }

    /// Create an intent for the cart total, confirm the card with the gateway
    /// and record the payment.
    ///
    /// Nothing is recorded unless the gateway reports success. Clearing the
    /// cart afterwards is the backend's job.
    pub async fn pay(&self, card: &CardDetails) -> CheckoutResult<PaymentRecord> {
        let entries = self.payable();
        if entries.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if self.ctx.session().current().is_none() {
            return Err(CheckoutError::NotSignedIn);
        }
        card.validate()?;

        let total = cart_total(&entries);
        let intent = self
            .ctx
            .api()
            .create_payment_intent(total)
            .await
            .map_err(|e| self.ctx.observe(e))?;

        let confirmation = self
            .gateway
            .confirm_card_payment(&intent, card, &self.viewer.email, &self.viewer.name)
            .await?;
        if !confirmation.succeeded() {
            warn!("Payment {} ended as {}", confirmation.id, confirmation.status);
            return Err(CheckoutError::NotCompleted(confirmation.status));
        }

        let record = PaymentRecord {
            id: None,
            transaction_id: confirmation.id,
            amount: total,
            currency: "usd".to_string(),
            user_email: self.viewer.email.clone(),
            class_ids: entries.iter().map(|e| e.item.class_id.clone()).collect(),
            cart_item_ids: entries.iter().map(|e| e.item.id.clone()).collect(),
            date: Utc::now(),
        };
        self.ctx
            .api()
            .record_payment(&record)
            .await
            .map_err(|e| self.ctx.observe(e))?;
        info!(
            "Recorded payment {} of {:.2} for {}",
            record.transaction_id, record.amount, record.user_email
        );
        Ok(record)
    }
}
