//! Feature views.
//!
//! Each view is a controller: it owns [`Resource`](crate::fetch::Resource)s
//! for the data it shows, exposes `refresh` to (re)fetch on mount, and async
//! methods for its mutations. Destructive mutations take a [`Confirm`].
//!
//! All backend calls go through [`ViewContext::call`], which turns a 401/403
//! into a session teardown.

pub mod admin;
pub mod auth_forms;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod confirm;
pub mod errors;
pub mod home;
pub mod instructor;
pub mod profile;
pub mod student;

pub use confirm::{Confirm, Decided};
pub use errors::{CheckoutError, CheckoutResult, ViewError, ViewResult};

use crate::{
    auth::SessionStore,
    models::{AppProfile, Role},
    net::{ApiError, ApiResult, MarketApi},
    upload::ImageProbe,
};
use std::{future::Future, sync::Arc};

/// What every view needs: the API, the session it acts for, and the probe
/// that checks card images.
#[derive(Clone)]
pub struct ViewContext {
    session: Arc<SessionStore>,
    images: ImageProbe,
}

impl ViewContext {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_probe(session, ImageProbe::default())
    }

    pub fn with_probe(session: Arc<SessionStore>, images: ImageProbe) -> Self {
        Self { session, images }
    }

    pub fn images(&self) -> &ImageProbe {
        &self.images
    }

    pub fn api(&self) -> &MarketApi {
        self.session.api()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Await a backend call; an authorization failure ends the session.
    pub async fn call<T>(&self, request: impl Future<Output = ApiResult<T>>) -> ViewResult<T> {
        request.await.map_err(|e| self.observe(e).into())
    }

    /// End the session if `error` is an authorization failure.
    pub fn observe(&self, error: ApiError) -> ApiError {
        if error.is_auth_failure() {
            self.session.handle_auth_failure();
        }
        error
    }
}

/// The viewer must hold `role` (by effective role).
pub(crate) fn require_role(viewer: &AppProfile, role: Role, message: &'static str) -> ViewResult<()> {
    if viewer.role.effective() == role {
        Ok(())
    } else {
        Err(ViewError::NotPermitted(message))
    }
}
