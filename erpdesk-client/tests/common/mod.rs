//! In-process mock of the ordering API for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use client::{ErpClient, MemoryStorage};
use serde_json::{Value, json};
use shared::config::{Config, RefreshFailurePolicy};
use url::Url;

pub const PASSWORD: &str = "secret";
pub const USER_ID: &str = "u-7";
pub const LOCATION_ID: &str = "L1";

#[derive(Debug)]
pub struct MockState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    generation: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub unauthorized: AtomicUsize,
    /// Refresh answers only after this many 401s were served.
    pub refresh_after: AtomicUsize,
    pub reject_refresh: AtomicBool,
    pub reject_everything: AtomicBool,
    hits: Mutex<Vec<Hit>>,
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub uri: String,
    pub bearer: Option<String>,
}

impl MockState {
    fn new() -> Self {
        Self {
            access_token: Mutex::new("a1".to_string()),
            refresh_token: Mutex::new("r1".to_string()),
            generation: AtomicUsize::new(1),
            refresh_calls: AtomicUsize::new(0),
            unauthorized: AtomicUsize::new(0),
            refresh_after: AtomicUsize::new(0),
            reject_refresh: AtomicBool::new(false),
            reject_everything: AtomicBool::new(false),
            hits: Mutex::new(Vec::new()),
        }
    }

    pub fn access_token(&self) -> String {
        self.access_token.lock().unwrap().clone()
    }

    pub fn refresh_token(&self) -> String {
        self.refresh_token.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn unauthorized(&self) -> usize {
        self.unauthorized.load(Ordering::SeqCst)
    }

    /// Hits whose path and query start with `prefix` (relative to the API root).
    pub fn hits(&self, method: &Method, prefix: &str) -> Vec<Hit> {
        let prefix = format!("/crm/api/{prefix}");
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|hit| &hit.method == method && hit.uri.starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
        self.hits.lock().unwrap().push(Hit {
            method: method.clone(),
            uri: uri.to_string(),
            bearer,
        });
    }

    fn authorize(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<(), Response> {
        self.record(method, uri, headers);
        let expected = format!("Bearer {}", self.access_token());
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if self.reject_everything.load(Ordering::SeqCst) || presented != Some(expected.as_str()) {
            self.unauthorized.fetch_add(1, Ordering::SeqCst);
            return Err(error(StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
        Ok(())
    }
}

pub fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"message": message, "error": message, "statusCode": status.as_u16()})),
    )
        .into_response()
}

pub fn order_json(id: &str) -> Value {
    json!({
        "id": id,
        "status": "new",
        "contract_number": "C-2041",
        "date": "2026-10-21T12:00:00Z",
        "note": null,
        "is_logist": true,
        "location_id": LOCATION_ID,
        "createdAt": "2026-10-19T08:15:00Z",
        "updatedAt": "2026-10-19T08:15:00Z",
        "offer_items": [
            {"id": "i1", "product_id": "p1", "product_name": "Cement M400", "quantity": 12}
        ]
    })
}

type Shared = State<Arc<MockState>>;

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD || body["identifier"].as_str().is_none_or(str::is_empty) {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Json(json!({
        "tokens": {"access_token": state.access_token(), "refresh_token": state.refresh_token()},
        "user": {"id": USER_ID, "role": "admin", "location_id": LOCATION_ID}
    }))
    .into_response()
}

async fn refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let wanted = state.refresh_after.load(Ordering::SeqCst);
    for _ in 0..400 {
        if state.unauthorized() >= wanted {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    if state.reject_refresh.load(Ordering::SeqCst)
        || body["refreshToken"] != state.refresh_token()
        || body["userId"] != USER_ID
    {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }

    let generation = state.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("a{generation}");
    let refresh = format!("r{generation}");
    *state.access_token.lock().unwrap() = access.clone();
    *state.refresh_token.lock().unwrap() = refresh.clone();

    Json(json!({"access_token": access, "refresh_token": refresh})).into_response()
}

async fn logout(State(state): Shared, method: Method, OriginalUri(uri): OriginalUri, headers: HeaderMap) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!({"message": "Logged out"})).into_response()
}

async fn orders_by_location(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "data": {
            "records": [order_json(&format!("o-{page}"))],
            "pagination": {
                "page": page, "limit": 20, "total_pages": 3, "total_count": 41,
                "hasNext": page < 3, "hasPrev": page > 1
            }
        }
    }))
    .into_response()
}

async fn order_by_id(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    if method == Method::DELETE {
        return Json(json!({"deleted": id})).into_response();
    }
    if id == "missing" {
        return error(StatusCode::NOT_FOUND, "Offer not found");
    }
    Json(order_json(&id)).into_response()
}

async fn create_order(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    if body["items"].as_array().is_none_or(Vec::is_empty) {
        return error(StatusCode::BAD_REQUEST, "items must not be empty");
    }
    (StatusCode::CREATED, Json(json!({"id": "o-new"}))).into_response()
}

fn stock_page(search: Option<&str>, page: u32) -> Value {
    let name = search.unwrap_or("Cement M400");
    json!({
        "data": [{
            "id": "s-1",
            "product_id": "p1",
            "product": {"name": name, "unit": "bag", "category": {"name": "Binders"}},
            "purchase_price": "50000.00"
        }],
        "pagination": {"totalCount": 1, "totalPages": 1, "currentPage": page, "limit": 15}
    })
}

async fn stock_all(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    let page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(stock_page(None, page)).into_response()
}

async fn stock_search(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(search): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    let page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(stock_page(Some(&search), page)).into_response()
}

async fn locations(State(state): Shared, method: Method, OriginalUri(uri): OriginalUri, headers: HeaderMap) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!([
        {"id": LOCATION_ID, "name": "Main warehouse", "type": "store"},
        {"id": "F2", "name": "Chirchiq plant", "type": "factory"}
    ]))
    .into_response()
}

async fn location_by_id(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!({"id": id, "name": "Main warehouse", "address": "Tashkent", "phone": "+998 71 000 00 00"}))
        .into_response()
}

async fn users_by_location(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(location_id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!([
        {"id": "u-1", "full_name": "Aziza Rahimova", "username": "arahimova", "location_id": location_id},
        {"id": USER_ID, "full_name": "Dilshod Karimov", "username": "dkarimov",
         "email": "dk@usderp.uz", "role": "admin", "location_id": location_id}
    ]))
    .into_response()
}

async fn edit_user(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!({"id": id, "full_name": body["full_name"]})).into_response()
}

async fn change_password(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    if body["old_password"] != PASSWORD {
        return error(StatusCode::BAD_REQUEST, "Old password is incorrect");
    }
    Json(json!({"message": "Password changed"})).into_response()
}

/// Answers after `ms` milliseconds and checks the token only then, so its
/// 401 can arrive after a refresh triggered by another request settled.
async fn slow_report(
    State(state): Shared,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(ms): Path<u64>,
) -> Response {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    if let Err(response) = state.authorize(&method, &uri, &headers) {
        return response;
    }
    Json(json!({"ok": ms})).into_response()
}

/// A running mock server.
pub struct MockApi {
    pub state: Arc<MockState>,
    pub base_url: Url,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/offers", post(create_order))
            .route("/offers/location", get(orders_by_location))
            .route("/offers/{id}", get(order_by_id).delete(order_by_id))
            .route("/stock/by-name/product", get(stock_all))
            .route("/stock/by-name/product/{search}", get(stock_search))
            .route("/locations", get(locations))
            .route("/locations/{id}", get(location_by_id))
            .route("/user/locationId/{id}", get(users_by_location))
            .route("/user/{id}", axum::routing::put(edit_user))
            .route("/user/change-password/{id}", post(change_password))
            .route("/reports/slow/{ms}", get(slow_report))
            .with_state(state.clone());
        let app = Router::new().nest("/crm/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = Url::parse(&format!("http://{addr}/crm/api/")).unwrap();
        Self { state, base_url }
    }

    pub fn config(&self, policy: RefreshFailurePolicy) -> Config {
        let mut config = Config::with_defaults();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_secs = Some(10);
        config.session.on_refresh_failure = policy;
        config
    }

    /// A client with nothing stored.
    pub fn client(&self) -> (ErpClient, Arc<MemoryStorage>) {
        self.client_with(RefreshFailurePolicy::Logout, &[])
    }

    /// A client whose storage already holds the given fields.
    pub fn client_with(
        &self,
        policy: RefreshFailurePolicy,
        stored: &[(&str, &str)],
    ) -> (ErpClient, Arc<MemoryStorage>) {
        use client::CredentialStorage;

        let storage = Arc::new(MemoryStorage::new());
        for (key, value) in stored {
            storage.store(key, value).unwrap();
        }
        let client = ErpClient::new(&self.config(policy), storage.clone()).unwrap();
        (client, storage)
    }

    /// A client holding an expired access token and a valid refresh token.
    pub fn expired_client(&self, policy: RefreshFailurePolicy) -> (ErpClient, Arc<MemoryStorage>) {
        self.client_with(
            policy,
            &[
                ("access_token", "expired"),
                ("refresh_token", "r1"),
                ("role", "admin"),
                ("location_id", LOCATION_ID),
                ("user_id", USER_ID),
            ],
        )
    }
}
