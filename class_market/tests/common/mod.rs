//! Shared fixtures for the integration tests.
//!
//! [`Harness::start`] wires a real [`SessionStore`] and [`MarketApi`] to an
//! in-process backend on a random port, with fakes for the identity
//! provider, payment gateway and image host.

#![allow(dead_code)]

pub mod backend;
pub mod fakes;

pub use backend::{MockBackend, class_doc};
pub use fakes::{DECLINED_CARD, FakeGateway, FakeImageHost, FakeProvider, png_bytes};

use class_market::{
    AppProfile, ProfileResolver, SessionStore,
    net::{AuthedClient, MarketApi, PublicClient},
    store::{LocalStore, MemoryStore},
    upload::ImageProbe,
    views::ViewContext,
};
use std::{sync::Arc, time::Duration};

pub const PASSWORD: &str = "Secret!1";

pub struct Harness {
    pub backend: MockBackend,
    pub provider: Arc<FakeProvider>,
    pub store: Arc<MemoryStore>,
    pub session: Arc<SessionStore>,
    pub ctx: ViewContext,
    pub resolver: ProfileResolver,
}

impl Harness {
    pub async fn start() -> Self {
        let backend = MockBackend::spawn().await;
        Self::connect(backend, Arc::new(MemoryStore::new()), Arc::new(FakeProvider::default()))
    }

    /// A fresh client against an existing backend, store and provider, as
    /// after an application restart.
    pub fn connect(backend: MockBackend, store: Arc<MemoryStore>, provider: Arc<FakeProvider>) -> Self {
        let public = PublicClient::new(&backend.url, Duration::from_secs(5)).expect("valid backend url");
        let local: Arc<dyn LocalStore> = store.clone();
        let api = MarketApi::new(AuthedClient::new(public, local.clone()));
        let session = Arc::new(SessionStore::new(provider.clone(), api, local));
        Self {
            backend,
            provider,
            store,
            ctx: ViewContext::with_probe(session.clone(), ImageProbe::new(Duration::from_secs(1))),
            resolver: ProfileResolver::new(session.clone()),
            session,
        }
    }

    /// Register `email` with the provider and the backend under `role`, sign
    /// in, and return the resolved profile.
    pub async fn sign_in_as(&self, email: &str, role: &str) -> AppProfile {
        self.provider.add_account(email, PASSWORD);
        if self.backend.user(email).is_none() {
            self.backend.seed_user(email, email.split('@').next().unwrap_or(email), role);
        }
        self.session.init().await;
        let identity = self.session.login(email, PASSWORD).await.expect("login succeeds");
        self.resolver.resolve(&identity).await
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(class_market::store::ACCESS_TOKEN_KEY)
    }
}
