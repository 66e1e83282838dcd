//! HTTP ingest source — devices push snapshots, the dashboard receives them.
//!
//! Runs a small axum server on its own thread. Each `PUT` or `POST` to the
//! configured path replaces the current reading; `PATCH` merges fields into
//! the last one. `{path}.json` is accepted as well, so devices written against
//! the Firebase REST API can point here unchanged.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, oneshot};

use sensordash_core::{
    DEFAULT_PATH, DashError, PushSource, Result, Snapshot, SnapshotSink, SourceInfo, SourceKind,
    Subscription, spawn_worker,
};

/// Address the ingest server binds when none is configured.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8043";

/// Shared server state.
pub struct IngestState {
    sink: SnapshotSink,
    path: String,
    /// Last accepted object, kept so `PATCH` can merge into it.
    last: Mutex<Map<String, Value>>,
    delivered: AtomicU64,
}

impl IngestState {
    pub fn new(sink: SnapshotSink, path: &str) -> Self {
        Self {
            sink,
            path: path.to_string(),
            last: Mutex::new(Map::new()),
            delivered: AtomicU64::new(0),
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
struct IngestResponse {
    success: bool,
    delivered: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    path: String,
    delivered: u64,
}

type IngestReply = (StatusCode, Json<IngestResponse>);

fn reject(state: &IngestState, status: StatusCode, error: String) -> IngestReply {
    log::warn!("ingest: rejected update ({status}): {error}");
    (
        status,
        Json(IngestResponse {
            success: false,
            delivered: state.delivered(),
            error: Some(error),
        }),
    )
}

async fn apply(state: &IngestState, body: Value, merge: bool) -> IngestReply {
    let Value::Object(fields) = body else {
        return reject(
            state,
            StatusCode::BAD_REQUEST,
            "body must be a JSON object".to_string(),
        );
    };

    // Build the candidate on a copy; `last` only changes once it decodes.
    let mut last = state.last.lock().await;
    let mut next = if merge { last.clone() } else { Map::new() };
    for (key, value) in fields {
        if value.is_null() {
            next.remove(&key);
        } else {
            next.insert(key, value);
        }
    }
    let next = Value::Object(next);

    let snapshot = match Snapshot::from_json(&next) {
        Ok(s) => s,
        Err(e) => return reject(state, StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };
    if let Value::Object(accepted) = next {
        *last = accepted;
    }
    drop(last);

    if !state.sink.deliver(snapshot) {
        return reject(
            state,
            StatusCode::SERVICE_UNAVAILABLE,
            "subscription closed".to_string(),
        );
    }

    let delivered = state.delivered.fetch_add(1, Ordering::Relaxed) + 1;
    log::debug!("ingest: delivered snapshot #{delivered}");
    (
        StatusCode::OK,
        Json(IngestResponse {
            success: true,
            delivered,
            error: None,
        }),
    )
}

async fn handle_replace(
    State(state): State<Arc<IngestState>>,
    Json(body): Json<Value>,
) -> IngestReply {
    apply(&state, body, false).await
}

async fn handle_merge(
    State(state): State<Arc<IngestState>>,
    Json(body): Json<Value>,
) -> IngestReply {
    apply(&state, body, true).await
}

async fn handle_health(State(state): State<Arc<IngestState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.sink.is_cancelled() {
            "closed".to_string()
        } else {
            "receiving".to_string()
        },
        path: state.path.clone(),
        delivered: state.delivered(),
    })
}

async fn handle_index(State(state): State<Arc<IngestState>>) -> Json<Value> {
    let path = format!("/{}", state.path);
    Json(serde_json::json!({
        "name": "sensordash ingest",
        "version": sensordash_core::VERSION,
        "endpoints": {
            "/": "This API index",
            path.as_str(): {
                "methods": ["PUT", "POST", "PATCH"],
                "description": "PUT/POST replace the current reading, PATCH merges fields into it",
                "fields": ["temp", "humidity", "pressure", "x", "y", "z", "altitude"],
            },
            "/health": "Health check with the number of snapshots delivered",
        },
        "examples": {
            "replace": format!("curl -X PUT {path} -d '{{\"temp\":21.5,\"humidity\":40}}'"),
            "merge": format!("curl -X PATCH {path} -d '{{\"temp\":21.7}}'"),
        }
    }))
}

/// Build the axum router.
pub fn build_router(state: Arc<IngestState>) -> Router {
    let route = format!("/{}", state.path);
    let firebase_route = format!("{route}.json");
    let ingest = || {
        put(handle_replace)
            .post(handle_replace)
            .patch(handle_merge)
    };

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route(&route, ingest())
        .route(&firebase_route, ingest())
        .with_state(state)
}

/// Validate an ingest path: non-empty segments of plain characters.
fn normalize_path(path: Option<&str>) -> Result<String> {
    let path = path.unwrap_or(DEFAULT_PATH).trim_matches('/');
    let plain = |seg: &str| {
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
    };
    if path != "health" && path.split('/').all(plain) {
        Ok(path.to_string())
    } else {
        Err(DashError::subscribe(
            "http",
            format!("invalid ingest path '{path}'"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Push source backed by the ingest server.
pub struct HttpIngestSource {
    info: SourceInfo,
    listen: String,
    local_addr: Option<SocketAddr>,
}

impl HttpIngestSource {
    pub fn new(listen: &str, path: Option<&str>) -> Self {
        Self {
            info: SourceInfo {
                name: "http".to_string(),
                kind: SourceKind::HttpIngest,
                path: path.unwrap_or(DEFAULT_PATH).trim_matches('/').to_string(),
                origin: format!("http://{listen}"),
            },
            listen: listen.to_string(),
            local_addr: None,
        }
    }

    /// Address actually bound by the last subscription (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl PushSource for HttpIngestSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription> {
        let path = normalize_path(Some(&self.info.path))?;
        let addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|e: std::net::AddrParseError| DashError::InvalidAddress {
                addr: self.listen.clone(),
                reason: e.to_string(),
            })?;

        // Bind here so a busy port fails the subscription rather than the worker.
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local = listener.local_addr()?;
        self.local_addr = Some(local);
        self.info.origin = format!("http://{local}");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let token = sink.token();
        let app = build_router(Arc::new(IngestState::new(sink, &path)));

        log::info!("ingest: listening on http://{local}/{path}");
        let worker = spawn_worker("http", move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(e) => {
                        log::error!("ingest: listener setup failed: {e}");
                        return;
                    }
                };
                let shutdown = async {
                    let _ = shutdown_rx.await;
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    log::error!("ingest: server error: {e}");
                }
                log::info!("ingest: server on {local} stopped");
            });
        })?;

        Ok(Subscription::new(token)
            .with_worker(worker)
            .on_cancel(move || {
                let _ = shutdown_tx.send(());
            }))
    }
}
