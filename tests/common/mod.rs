//! Test helpers for HTTP store tests.
//!
//! Serves a small imitation of the repository contents API on an ephemeral
//! port, backed by a `MemoryStore`, and records every request it sees.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use gitdrop::config::{HttpConfig, RepositoryConfig};
use gitdrop::{
    ContentItem, ContentStore, Credential, GitDropError, GitHubStore, Identity, ItemKind,
    MemoryStore, Session, SessionStore,
};

/// Token the mock accepts.
pub const TEST_TOKEN: &str = "ghp_test_token";

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct MockState {
    store: Arc<MemoryStore>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Running mock server.
pub struct MockApi {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApi {
    /// Start the mock on 127.0.0.1 with an ephemeral port.
    pub async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            store: store.clone(),
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/user", get(user))
            .route(
                "/repos/:owner/:repo/contents/*path",
                get(get_contents).put(put_contents).delete(delete_contents),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            store,
            requests,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn repository(&self) -> RepositoryConfig {
        RepositoryConfig {
            owner: "octocat".to_string(),
            repo: "files".to_string(),
            branch: "main".to_string(),
            api_base_url: self.base_url(),
        }
    }

    /// Store client signed in with `TEST_TOKEN`.
    pub fn signed_in_store(&self) -> GitHubStore {
        let session = Session {
            token: Credential::new(TEST_TOKEN).unwrap(),
            identity: Identity {
                login: "octocat".to_string(),
                display_name: None,
                avatar_url: String::new(),
            },
        };
        GitHubStore::new(
            &self.repository(),
            &HttpConfig::default(),
            Arc::new(SessionStore::with_session(session)),
        )
        .unwrap()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given method.
    pub fn requests_with(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

fn record(
    state: &MockState,
    method: &str,
    path: &str,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: Option<Value>,
) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.to_string(),
        query,
        headers: headers.clone(),
        body,
    });
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TEST_TOKEN}"))
        .unwrap_or(false)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn store_error(e: GitDropError) -> Response {
    let status = match e {
        GitDropError::NotFound(_) => StatusCode::NOT_FOUND,
        GitDropError::Conflict(_) => StatusCode::CONFLICT,
        GitDropError::Remote { status, .. } => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &e.to_string())
}

fn item_json(item: &ContentItem) -> Value {
    let kind = match item.kind {
        ItemKind::Dir => "dir",
        _ => "file",
    };
    json!({
        "name": item.name,
        "path": item.path,
        "sha": item.sha,
        "size": item.size,
        "type": kind,
        "download_url": item.download_url,
    })
}

async fn user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/user", HashMap::new(), &headers, None);
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    Json(json!({
        "login": "octocat",
        "id": 1,
        "name": "The Octocat",
        "avatar_url": "https://avatars.example.com/u/1",
    }))
    .into_response()
}

async fn get_contents(
    State(state): State<MockState>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record(&state, "GET", &path, query, &headers, None);
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    match state.store.get_contents(&path).await {
        // A file comes back as a bare object, a directory as an array.
        Ok(items) if items.len() == 1 && items[0].path == path => {
            Json(item_json(&items[0])).into_response()
        }
        Ok(items) => Json(Value::Array(items.iter().map(item_json).collect())).into_response(),
        Err(e) => store_error(e),
    }
}

async fn put_contents(
    State(state): State<MockState>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "PUT", &path, HashMap::new(), &headers, Some(body.clone()));
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    let content = body["content"].as_str().unwrap_or_default();
    let message = body["message"].as_str().unwrap_or_default();
    let sha = body["sha"].as_str();
    if sha.is_none() && state.store.object(&path).is_some() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request.\n\n\"sha\" wasn't supplied.",
        );
    }

    match state.store.put_object(&path, content, message, sha).await {
        Ok(put) => {
            let status = if sha.is_some() {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (
                status,
                Json(json!({
                    "content": { "path": path, "sha": put.version_token },
                    "commit": { "message": message },
                })),
            )
                .into_response()
        }
        Err(e) => store_error(e),
    }
}

async fn delete_contents(
    State(state): State<MockState>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(
        &state,
        "DELETE",
        &path,
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    let sha = body["sha"].as_str().unwrap_or_default();
    let message = body["message"].as_str().unwrap_or_default();
    match state.store.delete_object(&path, sha, message).await {
        Ok(()) => Json(json!({ "content": null, "commit": { "message": message } }))
            .into_response(),
        Err(e) => store_error(e),
    }
}
