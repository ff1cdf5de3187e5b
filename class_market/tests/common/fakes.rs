//! In-memory stand-ins for the identity provider, payment gateway and image host.

use async_trait::async_trait;
use class_market::{
    auth::{IdentityProvider, ProviderError, ProviderResult, ProviderSession},
    models::{Identity, PaymentIntent},
    payment::{CardDetails, PaymentConfirmation, PaymentError, PaymentGateway, PaymentResult},
    upload::{ImageHost, UploadResult},
};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Accounts live in a map of email → (password, identity).
#[derive(Default)]
pub struct FakeProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
}

impl FakeProvider {
    pub fn add_account(&self, email: &str, password: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), Identity::new(email)));
    }

    fn session(identity: Identity) -> ProviderSession {
        let email = identity.email().unwrap_or_default().to_string();
        ProviderSession {
            identity,
            id_token: format!("id-{email}"),
            refresh_token: format!("rt-{email}"),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_up(&self, email: &str, password: &str) -> ProviderResult<ProviderSession> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(ProviderError::new("auth/email-already-in-use"));
        }
        let identity = Identity::new(email);
        accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
        Ok(Self::session(identity))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<ProviderSession> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((stored, identity)) if stored == password => Ok(Self::session(identity.clone())),
            Some(_) => Err(ProviderError::new("auth/wrong-password")),
            None => Err(ProviderError::new("auth/user-not-found")),
        }
    }

    async fn sign_in_with_google(&self, google_id_token: &str) -> ProviderResult<ProviderSession> {
        let email = format!("{google_id_token}@gmail.test");
        Ok(Self::session(Identity::new(email).with_display_name("Google User")))
    }

    async fn update_profile(
        &self,
        session: &ProviderSession,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> ProviderResult<ProviderSession> {
        let mut updated = session.clone();
        updated.identity.display_name = Some(display_name.to_string());
        if let Some(photo) = photo_url {
            updated.identity.photo_url = Some(photo.to_string());
        }
        if let Some(email) = updated.identity.email()
            && let Some(account) = self.accounts.lock().unwrap().get_mut(email)
        {
            account.1 = updated.identity.clone();
        }
        Ok(updated)
    }

    async fn refresh(&self, refresh_token: &str) -> ProviderResult<ProviderSession> {
        let email = refresh_token
            .strip_prefix("rt-")
            .ok_or_else(|| ProviderError::new("auth/invalid-user-token"))?;
        let accounts = self.accounts.lock().unwrap();
        accounts
            .get(email)
            .map(|(_, identity)| Self::session(identity.clone()))
            .ok_or_else(|| ProviderError::new("auth/user-not-found"))
    }
}

/// Card number the fake gateway declines.
pub const DECLINED_CARD: &str = "4000000000000002";

/// Succeeds for every valid card except [`DECLINED_CARD`].
#[derive(Default)]
pub struct FakeGateway {
    pub confirmations: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn confirm_card_payment(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
        _billing_email: &str,
        _billing_name: &str,
    ) -> PaymentResult<PaymentConfirmation> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        if card.number == DECLINED_CARD {
            return Err(PaymentError::Declined("Your card was declined.".to_string()));
        }
        Ok(PaymentConfirmation {
            id: intent.intent_id().to_string(),
            status: "succeeded".to_string(),
        })
    }
}

/// Hands back a predictable URL per upload.
#[derive(Default)]
pub struct FakeImageHost {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, file_name: &str, _bytes: &[u8]) -> UploadResult<String> {
        self.uploads.lock().unwrap().push(file_name.to_string());
        Ok(format!("https://img.test/{file_name}"))
    }
}

/// A tiny PNG-looking payload.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}
