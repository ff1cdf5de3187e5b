//! Profile resolution: identity → application profile with a role.

use crate::{
    auth::SessionStore,
    models::{AppProfile, Identity},
};
use log::{debug, warn};
use std::sync::Arc;

/// Derives the [`AppProfile`] for an identity from the backend user record.
///
/// Resolution never fails. A missing identity or email, a transport error, a
/// non-success status, a `null` body or a record without a string role all
/// produce [`AppProfile::fallback`]: role `user`, `is_from_auth = true`. A
/// 401/403 additionally tears the session down.
#[derive(Clone)]
pub struct ProfileResolver {
    session: Arc<SessionStore>,
}

impl ProfileResolver {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Profile for the store's current identity, `None` when signed out.
    pub async fn current(&self) -> Option<AppProfile> {
        let identity = self.session.current()?;
        Some(self.resolve(&identity).await)
    }

    pub async fn resolve(&self, identity: &Identity) -> AppProfile {
        let Some(email) = identity.email() else {
            debug!("Identity without email, using fallback profile");
            return AppProfile::fallback(identity);
        };

        match self.session.api().user(email).await {
            Ok(Some(record)) => {
                debug!("Resolved {} as {}", email, record.role);
                AppProfile::from_record(record, identity)
            }
            Ok(None) => {
                debug!("No backend record for {}, using fallback profile", email);
                AppProfile::fallback(identity)
            }
            Err(e) => {
                warn!("Profile lookup for {} failed: {}", email, e);
                if e.is_auth_failure() {
                    self.session.handle_auth_failure();
                }
                AppProfile::fallback(identity)
            }
        }
    }
}
