//! Identity provider abstraction and its Identity Toolkit REST implementation.

use super::errors::{ProviderError, ProviderResult};
use crate::models::Identity;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// A signed-in provider session: the identity plus the provider's own tokens.
///
/// Persisted by the session store so a later run can restore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub identity: Identity,
    pub id_token: String,
    pub refresh_token: String,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> ProviderResult<ProviderSession>;

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<ProviderSession>;

    /// Federated sign-in with a Google ID token.
    async fn sign_in_with_google(&self, google_id_token: &str) -> ProviderResult<ProviderSession>;

    async fn update_profile(
        &self,
        session: &ProviderSession,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> ProviderResult<ProviderSession>;

    /// Restore a session from a persisted refresh token.
    async fn refresh(&self, refresh_token: &str) -> ProviderResult<ProviderSession>;
}

#[derive(Debug, Deserialize)]
struct RestErrorBody {
    error: RestErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RestErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupPayload {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

/// Identity Toolkit REST client (`accounts:*` and `securetoken` endpoints).
#[derive(Debug, Clone)]
pub struct RestIdentityProvider {
    client: reqwest::Client,
    api_key: String,
    identity_base_url: String,
    secure_token_url: String,
}

impl RestIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoints(api_key, DEFAULT_IDENTITY_BASE_URL, DEFAULT_SECURE_TOKEN_URL)
    }

    pub fn with_endpoints(
        api_key: impl Into<String>,
        identity_base_url: impl Into<String>,
        secure_token_url: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            identity_base_url: identity_base_url.into().trim_end_matches('/').to_string(),
            secure_token_url: secure_token_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn accounts<B: Serialize + Sync, T: DeserializeOwned>(&self, action: &str, body: &B) -> ProviderResult<T> {
        let url = format!("{}/accounts:{}", self.identity_base_url, action);
        debug!("POST {}", url);
        let request = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body);
        decode(request).await
    }

    /// Fill in profile fields the sign-in responses leave out.
    async fn lookup(&self, id_token: &str) -> ProviderResult<Identity> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupRequest<'a> {
            id_token: &'a str,
        }

        let payload: LookupPayload = self.accounts("lookup", &LookupRequest { id_token }).await?;
        let user = payload
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("auth/user-not-found"))?;
        Ok(Identity {
            email: user.email,
            display_name: user.display_name,
            photo_url: user.photo_url,
        })
    }

    async fn session_from(&self, payload: AuthPayload) -> ProviderResult<ProviderSession> {
        let identity = match self.lookup(&payload.id_token).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Profile lookup failed, using sign-in response: {}", e);
                Identity {
                    email: payload.email,
                    display_name: payload.display_name,
                    photo_url: payload.photo_url,
                }
            }
        };
        Ok(ProviderSession {
            identity,
            id_token: payload.id_token,
            refresh_token: payload.refresh_token,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> ProviderResult<ProviderSession> {
        let payload: AuthPayload = self
            .accounts(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.session_from(payload).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<ProviderSession> {
        let payload: AuthPayload = self
            .accounts(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.session_from(payload).await
    }

    async fn sign_in_with_google(&self, google_id_token: &str) -> ProviderResult<ProviderSession> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct IdpRequest {
            post_body: String,
            request_uri: &'static str,
            return_secure_token: bool,
            return_idp_credential: bool,
        }

        let request = IdpRequest {
            post_body: format!("id_token={google_id_token}&providerId=google.com"),
            request_uri: "http://localhost",
            return_secure_token: true,
            return_idp_credential: true,
        };
        let payload: AuthPayload = self.accounts("signInWithIdp", &request).await?;
        self.session_from(payload).await
    }

    async fn update_profile(
        &self,
        session: &ProviderSession,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> ProviderResult<ProviderSession> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct UpdateRequest<'a> {
            id_token: &'a str,
            display_name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            photo_url: Option<&'a str>,
            return_secure_token: bool,
        }

        let payload: UpdatePayload = self
            .accounts(
                "update",
                &UpdateRequest {
                    id_token: &session.id_token,
                    display_name,
                    photo_url,
                    return_secure_token: true,
                },
            )
            .await?;

        Ok(ProviderSession {
            identity: Identity {
                email: payload.email.or_else(|| session.identity.email.clone()),
                display_name: payload.display_name.or_else(|| Some(display_name.to_string())),
                photo_url: payload
                    .photo_url
                    .or_else(|| photo_url.map(str::to_string))
                    .or_else(|| session.identity.photo_url.clone()),
            },
            id_token: payload.id_token.unwrap_or_else(|| session.id_token.clone()),
            refresh_token: payload
                .refresh_token
                .unwrap_or_else(|| session.refresh_token.clone()),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> ProviderResult<ProviderSession> {
        let url = format!("{}/token", self.secure_token_url);
        debug!("POST {}", url);
        let request = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)]);
        let payload: RefreshPayload = decode(request).await?;
        let identity = self.lookup(&payload.id_token).await?;
        Ok(ProviderSession {
            identity,
            id_token: payload.id_token,
            refresh_token: payload.refresh_token,
        })
    }
}

async fn decode<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> ProviderResult<T> {
    let response = request.send().await.map_err(|e| {
        warn!("Identity provider unreachable: {}", e);
        ProviderError::network()
    })?;
    let status = response.status();
    let body = response.bytes().await.map_err(|_| ProviderError::network())?;

    if !status.is_success() {
        let message = serde_json::from_slice::<RestErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_default();
        return Err(ProviderError::from_rest_message(&message));
    }

    serde_json::from_slice(&body).map_err(|e| {
        warn!("Unexpected identity provider response: {}", e);
        ProviderError::new("auth/internal-error")
    })
}
