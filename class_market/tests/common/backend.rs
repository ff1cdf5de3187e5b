//! In-process mock of the marketplace backend.
//!
//! Documents are kept as JSON values. Every protected route checks the
//! bearer token against the tokens handed out by `/set-token`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::net::TcpListener;

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;
type Shared = Arc<Mutex<BackendState>>;

#[derive(Debug)]
pub struct BackendState {
    pub users: Vec<Value>,
    pub classes: Vec<Value>,
    pub carts: Vec<Value>,
    pub payments: Vec<Value>,
    pub applications: Vec<Value>,
    /// email → enrolled class ids
    pub enrolled: HashMap<String, Vec<String>>,
    /// token → email
    pub tokens: HashMap<String, String>,
    /// `/set-token` answers without a token when false.
    pub issue_tokens: bool,
    /// Raw body served for `GET /users/{email}`, overriding the stored record.
    pub user_override: HashMap<String, Value>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            classes: Vec::new(),
            carts: Vec::new(),
            payments: Vec::new(),
            applications: Vec::new(),
            enrolled: HashMap::new(),
            tokens: HashMap::new(),
            issue_tokens: true,
            user_override: HashMap::new(),
        }
    }
}

pub struct MockBackend {
    pub url: String,
    state: Shared,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().expect("Failed to get local address").port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        Self {
            url: format!("http://127.0.0.1:{port}"),
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// Store a user document and return its id.
    pub fn seed_user(&self, email: &str, name: &str, role: &str) -> String {
        let id = new_id();
        self.state().users.push(json!({
            "_id": id,
            "email": email,
            "name": name,
            "photo": null,
            "role": role,
        }));
        id
    }

    /// Store a class document and return its id.
    pub fn seed_class(&self, mut class: Value) -> String {
        let id = new_id();
        class["_id"] = json!(id);
        self.state().classes.push(class);
        id
    }

    pub fn class(&self, id: &str) -> Option<Value> {
        self.state().classes.iter().find(|c| c["_id"] == id).cloned()
    }

    pub fn user(&self, email: &str) -> Option<Value> {
        self.state().users.iter().find(|u| u["email"] == email).cloned()
    }

    pub fn cart_of(&self, email: &str) -> Vec<Value> {
        self.state()
            .carts
            .iter()
            .filter(|c| c["userEmail"] == email)
            .cloned()
            .collect()
    }

    /// Invalidate every issued token; the next protected call gets a 401.
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }
}

/// A class document with one module of two lessons.
pub fn class_doc(name: &str, instructor_email: &str, status: &str, seats: u32, price: f64) -> Value {
    json!({
        "name": name,
        "image": "https://img.test/class.png",
        "instructorName": "Teacher",
        "instructorEmail": instructor_email,
        "price": price,
        "availableSeats": seats,
        "modules": [{
            "title": "Basics",
            "lessons": [
                {"title": "Hello", "videoLink": "https://video.test/1", "duration": 10},
                {"title": "World", "videoLink": "https://video.test/2", "duration": 15}
            ]
        }],
        "status": status,
        "totalEnrolled": 0,
        "totalLessons": 2,
        "totalDuration": 25
    })
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(|p| p.into_inner())
}

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"error": true, "message": message})))
}

fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "unauthorized access"))?;
    state
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "unauthorized access"))
}

fn inserted(id: &str) -> Reply {
    Ok(Json(json!({"acknowledged": true, "insertedId": id})))
}

fn modified(count: u64) -> Reply {
    Ok(Json(json!({"acknowledged": true, "modifiedCount": count})))
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/set-token", post(set_token))
        .route("/users", get(list_users).post(save_user))
        .route("/users/{key}", get(get_user).patch(update_user))
        .route("/users/{id}/role", patch(set_role))
        .route("/instructors", get(instructors))
        .route("/classes", get(list_classes).post(create_class))
        .route("/classes/all", get(all_classes))
        .route("/classes/instructor/{email}", get(instructor_classes))
        .route("/classes/{id}", get(get_class).put(update_class).delete(delete_class))
        .route("/classes/{id}/status", patch(set_class_status))
        .route("/carts", get(list_cart).post(add_cart))
        .route("/carts/{id}", axum::routing::delete(remove_cart))
        .route("/create-payment-intent", post(create_intent))
        .route("/payments", post(record_payment))
        .route("/payments/{email}", get(list_payments))
        .route("/enrolled-classes/{email}", get(enrolled_classes))
        .route("/instructor-applications", get(list_applications).post(submit_application))
        .route("/instructor-applications/{id}", patch(decide_application))
        .route("/images/{name}", get(image_file))
        .with_state(state)
}

// === Session ===

async fn set_token(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    if !state.issue_tokens {
        return Ok(Json(json!({})));
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let token = format!("tok-{}", new_id());
    state.tokens.insert(token.clone(), email);
    Ok(Json(json!({ "token": token })))
}

// === Users ===

async fn save_user(State(state): State<Shared>, Json(mut body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    if state.users.iter().any(|u| u["email"] == body["email"]) {
        return Ok(Json(json!({"message": "user already exists"})));
    }
    let id = new_id();
    body["_id"] = json!(id);
    state.users.push(body);
    inserted(&id)
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    Ok(Json(json!(state.users)))
}

async fn get_user(State(state): State<Shared>, headers: HeaderMap, Path(email): Path<String>) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    if let Some(raw) = state.user_override.get(&email) {
        return Ok(Json(raw.clone()));
    }
    let user = state.users.iter().find(|u| u["email"] == email).cloned();
    Ok(Json(user.unwrap_or(Value::Null)))
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let Some(user) = state.users.iter_mut().find(|u| u["email"] == email) else {
        return modified(0);
    };
    user["name"] = body["name"].clone();
    if !body["photo"].is_null() {
        user["photo"] = body["photo"].clone();
    }
    modified(1)
}

async fn set_role(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let Some(user) = state.users.iter_mut().find(|u| u["_id"] == id) else {
        return Err(fail(StatusCode::NOT_FOUND, "no such user"));
    };
    user["role"] = body["role"].clone();
    modified(1)
}

async fn instructors(State(state): State<Shared>) -> Reply {
    let state = lock(&state);
    let list: Vec<&Value> = state.users.iter().filter(|u| u["role"] == "instructor").collect();
    Ok(Json(json!(list)))
}

// === Classes ===

async fn list_classes(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Reply {
    let state = lock(&state);
    let list: Vec<&Value> = state
        .classes
        .iter()
        .filter(|c| query.get("status").is_none_or(|s| c["status"] == s.as_str()))
        .collect();
    Ok(Json(json!(list)))
}

async fn all_classes(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    Ok(Json(json!(state.classes)))
}

async fn instructor_classes(State(state): State<Shared>, headers: HeaderMap, Path(email): Path<String>) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    let list: Vec<&Value> = state
        .classes
        .iter()
        .filter(|c| c["instructorEmail"] == email)
        .collect();
    Ok(Json(json!(list)))
}

async fn get_class(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let state = lock(&state);
    state
        .classes
        .iter()
        .find(|c| c["_id"] == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "class not found"))
}

async fn create_class(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let id = new_id();
    body["_id"] = json!(id);
    state.classes.push(body);
    inserted(&id)
}

async fn update_class(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let Some(class) = state.classes.iter_mut().find(|c| c["_id"] == id) else {
        return Err(fail(StatusCode::NOT_FOUND, "class not found"));
    };
    if let (Some(class), Some(update)) = (class.as_object_mut(), body.as_object()) {
        for (key, value) in update {
            class.insert(key.clone(), value.clone());
        }
    }
    modified(1)
}

async fn delete_class(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let before = state.classes.len();
    state.classes.retain(|c| c["_id"] != id);
    Ok(Json(json!({"acknowledged": true, "deletedCount": before - state.classes.len()})))
}

async fn set_class_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let Some(class) = state.classes.iter_mut().find(|c| c["_id"] == id) else {
        return Err(fail(StatusCode::NOT_FOUND, "class not found"));
    };
    class["status"] = body["status"].clone();
    if !body["feedback"].is_null() {
        class["feedback"] = body["feedback"].clone();
    }
    modified(1)
}

// === Cart ===

async fn list_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    let email = query.get("email").cloned().unwrap_or_default();
    let list: Vec<&Value> = state.carts.iter().filter(|c| c["userEmail"] == email).collect();
    Ok(Json(json!(list)))
}

async fn add_cart(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let id = new_id();
    body["_id"] = json!(id);
    state.carts.push(body);
    inserted(&id)
}

async fn remove_cart(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let before = state.carts.len();
    state.carts.retain(|c| c["_id"] != id);
    Ok(Json(json!({"acknowledged": true, "deletedCount": before - state.carts.len()})))
}

// === Payments ===

async fn create_intent(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    if body["price"].as_f64().unwrap_or_default() <= 0.0 {
        return Err(fail(StatusCode::BAD_REQUEST, "price must be positive"));
    }
    Ok(Json(json!({"clientSecret": format!("pi_{}_secret_{}", new_id(), new_id())})))
}

/// Records the payment, enrolls the buyer and clears the paid cart items.
async fn record_payment(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let email = body["userEmail"].as_str().unwrap_or_default().to_string();
    let class_ids: Vec<String> = body["classIds"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let cart_ids: Vec<Value> = body["cartItemIds"].as_array().cloned().unwrap_or_default();

    for class in state.classes.iter_mut() {
        if class["_id"].as_str().is_some_and(|id| class_ids.iter().any(|c| c == id)) {
            let seats = class["availableSeats"].as_u64().unwrap_or_default();
            class["availableSeats"] = json!(seats.saturating_sub(1));
            let enrolled = class["totalEnrolled"].as_u64().unwrap_or_default();
            class["totalEnrolled"] = json!(enrolled + 1);
        }
    }
    state.enrolled.entry(email).or_default().extend(class_ids);
    state.carts.retain(|c| !cart_ids.contains(&c["_id"]));

    let id = new_id();
    body["_id"] = json!(id);
    state.payments.push(body);
    inserted(&id)
}

async fn list_payments(State(state): State<Shared>, headers: HeaderMap, Path(email): Path<String>) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    let list: Vec<&Value> = state.payments.iter().filter(|p| p["userEmail"] == email).collect();
    Ok(Json(json!(list)))
}

async fn enrolled_classes(State(state): State<Shared>, headers: HeaderMap, Path(email): Path<String>) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    let ids = state.enrolled.get(&email).cloned().unwrap_or_default();
    let list: Vec<&Value> = state
        .classes
        .iter()
        .filter(|c| c["_id"].as_str().is_some_and(|id| ids.iter().any(|e| e == id)))
        .collect();
    Ok(Json(json!(list)))
}

// === Instructor applications ===

async fn submit_application(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let id = new_id();
    body["_id"] = json!(id);
    state.applications.push(body);
    inserted(&id)
}

async fn list_applications(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    authorize(&state, &headers)?;
    Ok(Json(json!(state.applications)))
}

async fn decide_application(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    authorize(&state, &headers)?;
    let Some(application) = state.applications.iter_mut().find(|a| a["_id"] == id) else {
        return Err(fail(StatusCode::NOT_FOUND, "application not found"));
    };
    application["status"] = body["status"].clone();
    modified(1)
}

/// Card images: `cover.png` is a real image, `page.png` serves HTML, and
/// anything else is missing.
async fn image_file(Path(name): Path<String>) -> impl IntoResponse {
    match name.as_str() {
        "cover.png" => (StatusCode::OK, [(CONTENT_TYPE, "image/png")], vec![0x89, b'P', b'N', b'G']),
        "page.png" => (StatusCode::OK, [(CONTENT_TYPE, "text/html")], b"<html></html>".to_vec()),
        _ => (StatusCode::NOT_FOUND, [(CONTENT_TYPE, "text/plain")], b"not found".to_vec()),
    }
}
