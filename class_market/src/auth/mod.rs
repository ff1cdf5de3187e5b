//! Identity and session management.
//!
//! The identity provider (email/password and federated sign-in) is an
//! external collaborator behind [`IdentityProvider`]. [`SessionStore`] owns
//! the current identity, exchanges it for a backend access token on every
//! change, and persists both in the local store.
//!
//! ## Example
//!
//! ```no_run
//! use class_market::auth::{RestIdentityProvider, SessionStore};
//! use class_market::net::{AuthedClient, MarketApi, PublicClient};
//! use class_market::store::MemoryStore;
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let public = PublicClient::new("http://localhost:5000", Duration::from_secs(15))?;
//!     let api = MarketApi::new(AuthedClient::new(public, store.clone()));
//!     let provider = Arc::new(RestIdentityProvider::new("web-api-key"));
//!
//!     let session = SessionStore::new(provider, api, store);
//!     session.init().await;
//!     let identity = session.login("ada@example.com", "Secret!1").await?;
//!     println!("Signed in as {}", identity.label());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod provider;
pub mod session;

pub use errors::{ProviderError, ProviderResult, SessionError, SessionResult};
pub use provider::{IdentityProvider, ProviderSession, RestIdentityProvider};
pub use session::SessionStore;
