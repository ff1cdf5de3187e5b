//! Identity session store.

use super::{
    errors::{SessionError, SessionResult},
    provider::{IdentityProvider, ProviderSession},
};
use crate::{
    models::Identity,
    net::MarketApi,
    store::{ACCESS_TOKEN_KEY, IDENTITY_SESSION_KEY, LocalStore},
};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Owns the current identity and its access token.
///
/// Every identity change, including the one made by [`SessionStore::init`],
/// posts `{email, name}` to `/set-token` and persists the returned token. A
/// missing token or a failed exchange clears the stored token; the session
/// then stays signed in but API-unauthenticated, and the next protected call
/// surfaces that as an authorization failure. Nothing is retried.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    api: MarketApi,
    store: Arc<dyn LocalStore>,
    session: Mutex<Option<ProviderSession>>,
    identity_tx: watch::Sender<Option<Identity>>,
    ready_tx: watch::Sender<bool>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>, api: MarketApi, store: Arc<dyn LocalStore>) -> Self {
        let (identity_tx, _) = watch::channel(None);
        let (ready_tx, _) = watch::channel(false);
        Self {
            provider,
            api,
            store,
            session: Mutex::new(None),
            identity_tx,
            ready_tx,
        }
    }

    /// Restore the persisted session, if any, and exchange it for a token.
    ///
    /// Never fails: an unreadable or rejected session just leaves the store
    /// signed out.
    pub async fn init(&self) -> Option<Identity> {
        let restored = match self.store.get(IDENTITY_SESSION_KEY) {
            Some(raw) => match serde_json::from_str::<ProviderSession>(&raw) {
                Ok(saved) => match self.provider.refresh(&saved.refresh_token).await {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!("Could not restore saved session: {}", e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Discarding unreadable saved session: {}", e);
                    None
                }
            },
            None => None,
        };

        self.set_session(restored).await;
        self.ready_tx.send_replace(true);
        self.current()
    }

    /// Whether [`SessionStore::init`] has completed.
    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    pub fn current(&self) -> Option<Identity> {
        self.identity_tx.borrow().clone()
    }

    /// Watch identity changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity_tx.subscribe()
    }

    pub fn api(&self) -> &MarketApi {
        &self.api
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> SessionResult<Identity> {
        let session = self.provider.sign_up(email.trim(), password).await?;
        info!("Account created for {}", email.trim());
        Ok(self.set_session(Some(session)).await.unwrap_or_default())
    }

    pub async fn login(&self, email: &str, password: &str) -> SessionResult<Identity> {
        let session = self.provider.sign_in(email.trim(), password).await?;
        info!("Signed in as {}", email.trim());
        Ok(self.set_session(Some(session)).await.unwrap_or_default())
    }

    pub async fn google_login(&self, google_id_token: &str) -> SessionResult<Identity> {
        let session = self.provider.sign_in_with_google(google_id_token).await?;
        info!("Signed in with Google");
        Ok(self.set_session(Some(session)).await.unwrap_or_default())
    }

    pub async fn update_user(&self, name: &str, photo_url: Option<&str>) -> SessionResult<Identity> {
        let current = self
            .session
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or(SessionError::NotSignedIn)?;
        let updated = self.provider.update_profile(&current, name, photo_url).await?;
        Ok(self.set_session(Some(updated)).await.unwrap_or_default())
    }

    pub async fn logout(&self) {
        info!("Signing out");
        self.teardown();
    }

    /// Global reaction to a 401/403: drop the token and the identity.
    pub fn handle_auth_failure(&self) {
        warn!("Authorization failure, ending session");
        self.teardown();
    }

    /// Clear identity, persisted session and token without touching the
    /// provider or the backend.
    pub fn teardown(&self) {
        *self.session.lock().unwrap_or_else(|p| p.into_inner()) = None;
        if let Err(e) = self.store.remove(IDENTITY_SESSION_KEY) {
            warn!("Could not clear saved session: {}", e);
        }
        self.clear_token();
        self.identity_tx.send_replace(None);
    }

    async fn set_session(&self, session: Option<ProviderSession>) -> Option<Identity> {
        match &session {
            Some(s) => match serde_json::to_string(s) {
                Ok(raw) => {
                    if let Err(e) = self.store.set(IDENTITY_SESSION_KEY, &raw) {
                        warn!("Could not save session: {}", e);
                    }
                }
                Err(e) => warn!("Could not serialize session: {}", e),
            },
            None => {
                if let Err(e) = self.store.remove(IDENTITY_SESSION_KEY) {
                    warn!("Could not clear saved session: {}", e);
                }
            }
        }

        let identity = session.as_ref().map(|s| s.identity.clone());
        *self.session.lock().unwrap_or_else(|p| p.into_inner()) = session;

        self.sync_token(identity.as_ref()).await;
        self.identity_tx.send_replace(identity.clone());
        identity
    }

    async fn sync_token(&self, identity: Option<&Identity>) {
        let Some(identity) = identity else {
            self.clear_token();
            return;
        };
        let Some(email) = identity.email() else {
            debug!("Identity has no email, no token to request");
            self.clear_token();
            return;
        };

        match self.api.exchange_token(email, &identity.label()).await {
            Ok(Some(token)) => {
                if let Err(e) = self.store.set(ACCESS_TOKEN_KEY, &token) {
                    warn!("Could not save access token: {}", e);
                }
            }
            Ok(None) => {
                debug!("Token exchange returned no token");
                self.clear_token();
            }
            Err(e) => {
                warn!("Token exchange failed: {}", e);
                self.clear_token();
            }
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.store.remove(ACCESS_TOKEN_KEY) {
            warn!("Could not clear access token: {}", e);
        }
    }
}
