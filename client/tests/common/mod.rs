#![allow(dead_code)]
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};

use assetdesk_client::{
    api::{ApiClient, AssetDirectory, RemoteError, UserDirectory},
    auth::Claims,
    coordinator::Coordinator,
    models::asset::{Asset, Category, SubCategory},
    resolve::LookupTables,
};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";

/// Number of times each mock endpoint was hit.
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub users: usize,
    pub sub_categories: usize,
}

/// In-memory backend behind the mock HTTP server.
pub struct MockState {
    pub assets: Vec<Value>,
    pub categories: Vec<Value>,
    pub sub_categories: Vec<Value>,
    pub users: HashMap<String, String>,
    pub requests: Vec<Value>,
    pub next_id: i64,
    pub fail_writes: bool,
    pub fail_users: bool,
    pub calls: Calls,
    pub last_payload: Option<Value>,
    pub last_auth: Option<String>,
}

pub type Shared = Arc<Mutex<MockState>>;

impl MockState {
    /// Two categories, three assets, one sub-category, two users and two
    /// existing requests (ids 1 and 2).
    pub fn seeded() -> Self {
        Self {
            assets: vec![
                json!({ "assetId": 1, "assetName": "Laptop", "categoryId": 10 }),
                json!({
                    "assetId": 2,
                    "assetName": "Monitor",
                    "categoryId": 10,
                    "subCategoryId": 100,
                }),
                json!({ "AssetId": 3, "AssetName": "Desk", "CategoryId": 20, "value": 250.0 }),
            ],
            categories: vec![
                json!({ "categoryId": 10, "categoryName": "IT" }),
                json!({ "categoryId": 20, "categoryName": "Furniture" }),
            ],
            sub_categories: vec![json!({
                "subCategoryId": 100,
                "subCategoryName": "Displays",
                "quantity": 5,
                "categoryId": 10,
            })],
            users: HashMap::from([
                ("u1".to_string(), "Alice".to_string()),
                ("u2".to_string(), "Bob".to_string()),
            ]),
            requests: vec![
                json!({
                    "assetReqId": 1,
                    "userId": "u2",
                    "assetId": 3,
                    "categoryId": 20,
                    "assetReqDate": "2024-05-01T00:00:00",
                    "assetReqReason": "standing desk",
                    "assetRequest": "Desk request",
                    "requestStatus": 0,
                    "assetName": "Desk",
                    "categoryName": "Furniture",
                }),
                json!({
                    "assetReqId": 2,
                    "userId": "u1",
                    "assetId": 2,
                    "categoryId": 10,
                    "subCategoryId": 100,
                    "assetReqDate": "2024-06-12T09:30:00",
                    "assetReqReason": "second screen",
                    "requestStatus": "0",
                }),
            ],
            next_id: 3,
            fail_writes: false,
            fail_users: false,
            calls: Calls::default(),
            last_payload: None,
            last_auth: None,
        }
    }
}

async fn list_requests(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.calls.list += 1;
    s.last_auth = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "$id": "1", "$values": s.requests.clone() }))
}

#[derive(serde::Deserialize)]
struct StatusQuery {
    status: i64,
}

async fn requests_by_status(
    State(state): State<Shared>,
    Query(q): Query<StatusQuery>,
) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.calls.list += 1;
    let matching: Vec<Value> = s
        .requests
        .iter()
        .filter(|r| status_code(&r["requestStatus"]) == Some(q.status))
        .cloned()
        .collect();
    Json(Value::Array(matching))
}

fn status_code(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

async fn create_request(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.calls.create += 1;
    s.last_payload = Some(body.clone());
    if s.fail_writes {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let mut record = body;
    record["assetReqId"] = json!(s.next_id);
    s.next_id += 1;
    s.requests.push(record.clone());
    Ok(Json(record))
}

async fn update_request(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.calls.update += 1;
    s.last_payload = Some(body.clone());
    if s.fail_writes {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let existing = s
        .requests
        .iter_mut()
        .find(|r| r["assetReqId"].as_i64() == Some(id))
        .ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(target), Some(fields)) = (existing.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            if key != "password" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Json(existing.clone()))
}

async fn list_assets(State(state): State<Shared>) -> Json<Value> {
    let s = state.lock().unwrap();
    Json(json!({ "$values": s.assets.clone() }))
}

async fn list_categories(State(state): State<Shared>) -> Json<Value> {
    let s = state.lock().unwrap();
    Json(json!({ "items": s.categories.clone() }))
}

#[derive(serde::Deserialize)]
struct SubCategoryQuery {
    #[serde(rename = "categoryId")]
    category_id: Option<i64>,
}

async fn list_sub_categories(
    State(state): State<Shared>,
    Query(q): Query<SubCategoryQuery>,
) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.calls.sub_categories += 1;
    let matching: Vec<Value> = s
        .sub_categories
        .iter()
        .filter(|sub| match q.category_id {
            Some(id) => sub["categoryId"].as_i64() == Some(id),
            None => true,
        })
        .cloned()
        .collect();
    Json(Value::Array(matching))
}

async fn get_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.calls.users += 1;
    if s.fail_users {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let name = s.users.get(&id).cloned().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "userId": id, "userName": name })))
}

/// Spin up the mock backend on a random port.
pub async fn setup_mock_backend(state: MockState) -> (SocketAddr, Shared) {
    let shared: Shared = Arc::new(Mutex::new(state));

    let app = Router::new()
        .route("/api/AssetRequests", get(list_requests).post(create_request))
        .route("/api/AssetRequests/Status", get(requests_by_status))
        .route("/api/AssetRequests/:id", put(update_request))
        .route("/api/Assets", get(list_assets))
        .route("/api/Categories", get(list_categories))
        .route("/api/SubCategories", get(list_sub_categories))
        .route("/api/Users/:id", get(get_user))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, shared)
}

pub fn calls(shared: &Shared) -> Calls {
    shared.lock().unwrap().calls.clone()
}

/// Signed token with the given role and subject, valid for an hour.
pub fn token(role: &str, sub: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = time::OffsetDateTime::now_utc();
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        name: None,
        exp: Some((now + time::Duration::hours(1)).unix_timestamp()),
        iat: Some(now.unix_timestamp()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create token")
}

pub fn claims_with_role(role: &str) -> Claims {
    Claims {
        sub: "u1".to_string(),
        role: role.to_string(),
        name: None,
        exp: None,
        iat: None,
    }
}

pub fn api_client(addr: SocketAddr, token: &str) -> ApiClient {
    ApiClient::with_client(
        reqwest::Client::new(),
        format!("http://{}/api/", addr),
        token.to_string(),
    )
}

/// Coordinator for user `u1` with the given role, with lookups and the
/// request list already loaded.
pub async fn coordinator(addr: SocketAddr, role: &str) -> Coordinator {
    let api = Arc::new(api_client(addr, &token(role, "u1")));
    coordinator_with_directory(addr, role, api).await
}

/// Like [`coordinator`], with reference data served by `directory`.
pub async fn coordinator_with_directory(
    addr: SocketAddr,
    role: &str,
    directory: Arc<dyn AssetDirectory>,
) -> Coordinator {
    let token = token(role, "u1");
    let claims = Claims::decode(&token, Some(JWT_SECRET)).expect("token should decode");
    let api = Arc::new(api_client(addr, &token));

    let mut coordinator = Coordinator::new(Arc::new(claims), api.clone(), directory, api);
    coordinator
        .refresh_lookups()
        .await
        .expect("lookups should load");
    coordinator
        .refresh_requests()
        .await
        .expect("requests should load");
    coordinator
}

/// One laptop in the IT category.
pub fn laptop_tables() -> LookupTables {
    LookupTables::new(
        vec![asset(1, "Laptop", Some(10))],
        vec![Category {
            category_id: 10,
            name: "IT".into(),
        }],
        vec![SubCategory {
            sub_category_id: 100,
            name: "Notebooks".into(),
            quantity: Some(3),
            category_id: Some(10),
        }],
    )
}

pub fn asset(id: i64, name: &str, category_id: Option<i64>) -> Asset {
    Asset {
        asset_id: id,
        name: name.to_string(),
        description: None,
        model: None,
        serial_number: None,
        value: None,
        location: None,
        manufacturing_date: None,
        expiry_date: None,
        status: None,
        category_id,
        sub_category_id: None,
        image: None,
    }
}

/// User directory backed by a map, counting lookups.
pub struct StaticUsers {
    names: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticUsers {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn resolve_user_name(&self, user_id: &str) -> Result<Option<String>, RemoteError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.get(user_id).cloned())
    }
}

/// Asset directory over the mock backend whose sub-category listing can be
/// switched to fail with a 503.
pub struct FlakyDirectory {
    inner: ApiClient,
    pub fail_sub_categories: AtomicBool,
}

impl FlakyDirectory {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            inner: api_client(addr, &token("Employee", "u1")),
            fail_sub_categories: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AssetDirectory for FlakyDirectory {
    async fn list_assets(&self) -> Result<Vec<Asset>, RemoteError> {
        self.inner.list_assets().await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.inner.list_categories().await
    }

    async fn list_sub_categories(
        &self,
        category_id: Option<i64>,
    ) -> Result<Vec<SubCategory>, RemoteError> {
        if self.fail_sub_categories.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.inner.list_sub_categories(category_id).await
    }
}
