//! Typed backend endpoints.
//!
//! # Endpoints
//!
//! ## Public
//! - `POST /set-token` - Exchange an identity for an access token
//! - `POST /users` - Save a freshly registered user
//! - `GET /classes?status=approved` - Catalog
//! - `GET /classes/{id}` - Class detail
//! - `GET /instructors` - Instructor list
//!
//! ## Authenticated
//! - `GET /users/{email}`, `GET /users`, `PATCH /users/{id}/role`, `PATCH /users/{email}`
//! - `GET /classes/all`, `GET /classes/instructor/{email}`
//! - `POST /classes`, `PUT /classes/{id}`, `DELETE /classes/{id}`, `PATCH /classes/{id}/status`
//! - `GET /carts?email=`, `POST /carts`, `DELETE /carts/{id}`
//! - `POST /create-payment-intent`, `POST /payments`, `GET /payments/{email}`
//! - `GET /enrolled-classes/{email}`
//! - `POST /instructor-applications`, `GET /instructor-applications`,
//!   `PATCH /instructor-applications/{id}`

use super::{
    errors::ApiResult,
    http::{AuthedClient, PublicClient},
};
use crate::models::{
    ApplicationStatus, CartItem, ClassSubmission, Course, InstructorApplication, NewApplication,
    NewCartItem, PaymentIntent, PaymentIntentRequest, PaymentRecord, Role, StatusChange, UserRecord,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RoleChange<'a> {
    role: &'a Role,
}

#[derive(Debug, Serialize)]
struct ProfileChange<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApplicationDecision {
    status: ApplicationStatus,
}

/// Acknowledgement returned by write endpoints (`insertedId`, `modifiedCount`, ...).
///
/// An empty or `null` body is a valid acknowledgement with no details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Option<AckFields>")]
pub struct WriteAck {
    pub inserted_id: Option<String>,
    pub modified_count: Option<u64>,
    pub deleted_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AckFields {
    #[serde(default)]
    inserted_id: Option<String>,
    #[serde(default)]
    modified_count: Option<u64>,
    #[serde(default)]
    deleted_count: Option<u64>,
}

impl From<Option<AckFields>> for WriteAck {
    fn from(fields: Option<AckFields>) -> Self {
        fields.map_or_else(WriteAck::default, |f| WriteAck {
            inserted_id: f.inserted_id,
            modified_count: f.modified_count,
            deleted_count: f.deleted_count,
        })
    }
}

/// Backend API for the marketplace.
///
/// Cheap to clone: views and background fetches each hold their own copy.
#[derive(Clone)]
pub struct MarketApi {
    public: PublicClient,
    authed: AuthedClient,
}

impl MarketApi {
    pub fn new(authed: AuthedClient) -> Self {
        Self {
            public: authed.public().clone(),
            authed,
        }
    }

    pub fn public(&self) -> &PublicClient {
        &self.public
    }

    pub fn authed(&self) -> &AuthedClient {
        &self.authed
    }

    // ========== Session ==========

    /// Exchange an identity for an access token. `None` when the backend
    /// answers without one.
    pub async fn exchange_token(&self, email: &str, name: &str) -> ApiResult<Option<String>> {
        let response: TokenResponse = self
            .public
            .post(&["set-token"], &TokenRequest { email, name })
            .await?;
        Ok(response.token.filter(|t| !t.is_empty()))
    }

    // ========== Users ==========

    pub async fn save_user(&self, user: &UserRecord) -> ApiResult<WriteAck> {
        self.public.post(&["users"], user).await
    }

    /// Backend record for `email`; `None` when there is none.
    pub async fn user(&self, email: &str) -> ApiResult<Option<UserRecord>> {
        self.authed.get(&["users", email]).await
    }

    pub async fn users(&self) -> ApiResult<Vec<UserRecord>> {
        self.authed.get(&["users"]).await
    }

    pub async fn set_user_role(&self, user_id: &str, role: &Role) -> ApiResult<WriteAck> {
        self.authed
            .patch(&["users", user_id, "role"], &RoleChange { role })
            .await
    }

    pub async fn update_user_profile(&self, email: &str, name: &str, photo: Option<&str>) -> ApiResult<WriteAck> {
        self.authed
            .patch(&["users", email], &ProfileChange { name, photo })
            .await
    }

    pub async fn instructors(&self) -> ApiResult<Vec<UserRecord>> {
        self.public.get(&["instructors"]).await
    }

    // ========== Classes ==========

    pub async fn approved_classes(&self) -> ApiResult<Vec<Course>> {
        self.public
            .get_with_query(&["classes"], &[("status", "approved")])
            .await
    }

    pub async fn class(&self, id: &str) -> ApiResult<Course> {
        self.public.get(&["classes", id]).await
    }

    pub async fn all_classes(&self) -> ApiResult<Vec<Course>> {
        self.authed.get(&["classes", "all"]).await
    }

    pub async fn instructor_classes(&self, email: &str) -> ApiResult<Vec<Course>> {
        self.authed.get(&["classes", "instructor", email]).await
    }

    pub async fn create_class(&self, submission: &ClassSubmission) -> ApiResult<WriteAck> {
        self.authed.post(&["classes"], submission).await
    }

    pub async fn update_class(&self, id: &str, submission: &ClassSubmission) -> ApiResult<WriteAck> {
        self.authed.put(&["classes", id], submission).await
    }

    pub async fn delete_class(&self, id: &str) -> ApiResult<WriteAck> {
        self.authed.delete(&["classes", id]).await
    }

    pub async fn set_class_status(&self, id: &str, change: &StatusChange) -> ApiResult<WriteAck> {
        self.authed.patch(&["classes", id, "status"], change).await
    }

    // ========== Cart ==========

    pub async fn cart(&self, email: &str) -> ApiResult<Vec<CartItem>> {
        self.authed.get_with_query(&["carts"], &[("email", email)]).await
    }

    pub async fn add_to_cart(&self, item: &NewCartItem) -> ApiResult<WriteAck> {
        self.authed.post(&["carts"], item).await
    }

    pub async fn remove_cart_item(&self, id: &str) -> ApiResult<WriteAck> {
        self.authed.delete(&["carts", id]).await
    }

    // ========== Payments ==========

    pub async fn create_payment_intent(&self, price: f64) -> ApiResult<PaymentIntent> {
        self.authed
            .post(&["create-payment-intent"], &PaymentIntentRequest { price })
            .await
    }

    pub async fn record_payment(&self, record: &PaymentRecord) -> ApiResult<WriteAck> {
        self.authed.post(&["payments"], record).await
    }

    pub async fn payments(&self, email: &str) -> ApiResult<Vec<PaymentRecord>> {
        self.authed.get(&["payments", email]).await
    }

    pub async fn enrolled_classes(&self, email: &str) -> ApiResult<Vec<Course>> {
        self.authed.get(&["enrolled-classes", email]).await
    }

    // ========== Instructor applications ==========

    pub async fn submit_application(&self, application: &NewApplication) -> ApiResult<WriteAck> {
        self.authed
            .post(&["instructor-applications"], application)
            .await
    }

    pub async fn applications(&self) -> ApiResult<Vec<InstructorApplication>> {
        self.authed.get(&["instructor-applications"]).await
    }

    pub async fn decide_application(&self, id: &str, status: ApplicationStatus) -> ApiResult<WriteAck> {
        self.authed
            .patch(&["instructor-applications", id], &ApplicationDecision { status })
            .await
    }
}
