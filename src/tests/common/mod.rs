use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::config::credentials::{Credentials, ServiceConfig};
use crate::config::settings::SettingsConfig;
use crate::identity::client::IdentityClient;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// In-process Identity v3 provider.
///
/// Authentication number `n` issues `issue[n]` (the last entry once exhausted).
/// Validation answers 401 for session tokens in `expired`, 200 for subject
/// tokens in `valid`, 404 otherwise.
pub struct Keystone {
    pub base_url: OnceLock<String>,
    pub issue: Mutex<Vec<String>>,
    pub valid: HashSet<String>,
    pub expired: Mutex<HashSet<String>>,
    /// authentications beyond this count are rejected with 401
    pub allowed_auths: AtomicUsize,
    pub validate_delay_ms: AtomicU64,
    pub auth_delay_ms: AtomicU64,
    pub auth_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub auth_bodies: Mutex<Vec<Value>>,
}

impl Keystone {
    pub fn new(issue: &[&str], valid: &[&str]) -> Self {
        Self {
            base_url: OnceLock::new(),
            issue: Mutex::new(issue.iter().map(|t| t.to_string()).collect()),
            valid: valid.iter().map(|t| t.to_string()).collect(),
            expired: Mutex::new(HashSet::new()),
            allowed_auths: AtomicUsize::new(usize::MAX),
            validate_delay_ms: AtomicU64::new(0),
            auth_delay_ms: AtomicU64::new(0),
            auth_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            auth_bodies: Mutex::new(Vec::new()),
        }
    }

    pub fn expire(&self, session_token: &str) {
        self.expired.lock().unwrap().insert(session_token.to_owned());
    }

    pub fn revive(&self, session_token: &str) {
        self.expired.lock().unwrap().remove(session_token);
    }

    pub fn allow_auths(&self, count: usize) {
        self.allowed_auths.store(count, Ordering::SeqCst);
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> String {
        self.base_url.get().cloned().expect("keystone not started")
    }
}

pub async fn spawn_keystone(keystone: Keystone) -> (JoinHandle<()>, Arc<Keystone>) {
    let keystone = Arc::new(keystone);
    let router = Router::new()
        .route("/v3/auth/tokens", post(create_token).head(check_token))
        .with_state(keystone.clone());
    let (handle, addr) = spawn_axum(router).await;
    keystone
        .base_url
        .set(format!("http://{}/v3", addr))
        .expect("base url set once");
    (handle, keystone)
}

async fn create_token(State(keystone): State<Arc<Keystone>>, Json(body): Json<Value>) -> Response {
    let n = keystone.auth_calls.fetch_add(1, Ordering::SeqCst);
    keystone.auth_bodies.lock().unwrap().push(body);

    let delay = keystone.auth_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if n >= keystone.allowed_auths.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "The request you have made requires authentication."}})),
        )
            .into_response();
    }

    let token = {
        let issue = keystone.issue.lock().unwrap();
        issue[n.min(issue.len() - 1)].clone()
    };
    let catalog = json!([
        {"type": "compute", "name": "nova", "endpoints": [
            {"interface": "public", "region": "RegionOne", "url": "http://127.0.0.1:1/compute"}
        ]},
        {"type": "identity", "name": "keystone", "endpoints": [
            {"interface": "admin", "region": "RegionOne", "region_id": "RegionOne", "url": "http://127.0.0.1:1/admin"},
            {"interface": "public", "region": "RegionOne", "region_id": "RegionOne", "url": keystone.url()}
        ]}
    ]);

    (
        StatusCode::CREATED,
        [("X-Subject-Token", token)],
        Json(json!({"token": {
            "methods": ["password"],
            "expires_at": "2099-01-01T00:00:00.000000Z",
            "catalog": catalog
        }})),
    )
        .into_response()
}

async fn check_token(State(keystone): State<Arc<Keystone>>, headers: HeaderMap) -> StatusCode {
    keystone.validate_calls.fetch_add(1, Ordering::SeqCst);

    let delay = keystone.validate_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    };
    let session = header("X-Auth-Token");
    let subject = header("X-Subject-Token");

    if session.is_empty() || keystone.expired.lock().unwrap().contains(&session) {
        return StatusCode::UNAUTHORIZED;
    }
    if keystone.valid.contains(&subject) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

pub fn service_config(auth_url: &str) -> ServiceConfig {
    ServiceConfig {
        global: Credentials {
            auth_url: auth_url.to_owned(),
            username: "svc".to_owned(),
            password: "p".to_owned(),
            domain_name: "default".to_owned(),
            ..Default::default()
        },
        settings: SettingsConfig::default(),
    }
}

pub fn identity_client() -> IdentityClient {
    IdentityClient::from_settings(&SettingsConfig::default().http).expect("reqwest client")
}
