//! In-process fake of the execution service for integration tests.
//!
//! Serves the HTTP API and the `/connect` WebSocket under `/api/v2` on an
//! ephemeral localhost port.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use codux_client::{Client, ClientConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Token the fake service expects on `/connect`.
pub const SESSION_TOKEN: &str = "Bearer session-secret";

/// Shared state of the fake service.
#[derive(Clone, Default)]
pub struct FakeService {
    /// Installed `(language, version)` pairs.
    pub installed: Arc<Mutex<Vec<(String, String)>>>,
    /// Every `/execute` payload received, in order.
    pub executions: Arc<Mutex<Vec<Value>>>,
    /// Close frames received on `/connect`.
    pub session_closes: Arc<AtomicUsize>,
}

impl FakeService {
    /// Start the service with python 3.11.0 pre-installed.
    pub async fn start() -> (Self, SocketAddr) {
        init_tracing();

        let service = Self::default();
        service
            .installed
            .lock()
            .unwrap()
            .push(("python".to_string(), "3.11.0".to_string()));

        let api = Router::new()
            .route("/runtimes", get(runtimes))
            .route(
                "/packages",
                get(list_packages)
                    .post(install_package)
                    .delete(uninstall_package),
            )
            .route("/process/:id", delete(terminate_process))
            .route("/execute", axum::routing::post(execute))
            .route("/headers", get(echo_headers))
            .route("/slow", get(slow))
            .route("/garbage", get(garbage))
            .route("/conflict", axum::routing::post(conflict))
            .route("/connect", get(connect));
        let app = Router::new()
            .nest("/api/v2", api)
            .with_state(service.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake service");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake service");
        });

        (service, addr)
    }

    /// Last `/execute` payload received.
    pub fn last_execution(&self) -> Value {
        self.executions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no execution recorded")
    }

    /// Wait until `count` sessions have sent a close frame.
    pub async fn wait_for_session_closes(&self, count: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.session_closes.load(Ordering::SeqCst) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.session_closes.load(Ordering::SeqCst) >= count
    }
}

/// Base URL of a fake service, with a trailing slash to exercise normalization.
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}/api/v2/")
}

/// Client for a fake service with a short timeout.
pub fn client(addr: SocketAddr) -> Client {
    let config = ClientConfig::builder()
        .base_url(base_url(addr))
        .timeout(Duration::from_secs(1))
        .header("Authorization", SESSION_TOKEN)
        .header("X-Client", "codux-tests")
        .build()
        .expect("valid config");
    Client::new(config).expect("client")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn runtimes(headers: HeaderMap) -> Response {
    if headers.contains_key("x-fake-malformed") {
        return Json(json!([
            {"language": "python", "version": "3.11.0", "aliases": ["py"]},
            {"language": "bash", "aliases": ["sh"]}
        ]))
        .into_response();
    }
    Json(json!([
        {"language": "python", "version": "3.11.0", "aliases": ["py", "py3", "python3"]},
        {"language": "typescript", "version": "5.0.3", "runtime": "node", "aliases": ["ts"]},
        {"language": "bash", "version": "5.2.0", "aliases": ["sh"]}
    ]))
    .into_response()
}

async fn list_packages(State(service): State<FakeService>) -> Json<Value> {
    let installed = service.installed.lock().unwrap().clone();
    let mut packages = vec![json!({
        "language": "node",
        "language_version": "18.15.0",
        "installed": installed.iter().any(|(l, v)| l == "node" && v == "18.15.0"),
    })];
    for (language, version) in installed.iter().filter(|(l, _)| l != "node") {
        packages.push(json!({
            "language": language,
            "language_version": version,
            "installed": true,
        }));
    }
    Json(Value::Array(packages))
}

#[derive(serde::Deserialize)]
struct PackageBody {
    language: String,
    version: String,
}

async fn install_package(
    State(service): State<FakeService>,
    Json(body): Json<PackageBody>,
) -> Response {
    let mut installed = service.installed.lock().unwrap();
    let key = (body.language, body.version);
    if installed.contains(&key) {
        return error_body(
            StatusCode::CONFLICT,
            &format!("{}-{} is already installed", key.0, key.1),
        );
    }
    installed.push(key);
    StatusCode::OK.into_response()
}

async fn uninstall_package(
    State(service): State<FakeService>,
    Json(body): Json<PackageBody>,
) -> Response {
    let mut installed = service.installed.lock().unwrap();
    let key = (body.language, body.version);
    match installed.iter().position(|entry| *entry == key) {
        Some(index) => {
            installed.remove(index);
            StatusCode::OK.into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "no such package"),
    }
}

async fn terminate_process(Path(id): Path<String>) -> Response {
    if id == "1234" {
        StatusCode::NO_CONTENT.into_response()
    } else {
        // Bare 404 without a JSON body
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn execute(
    State(service): State<FakeService>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    service.executions.lock().unwrap().push(payload.clone());

    if headers.contains_key("x-fake-missing") {
        return error_body(StatusCode::NOT_FOUND, "runtime is unknown");
    }

    match payload["language"].as_str() {
        Some("crash") => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "<h1>500 Internal Server Error</h1>")
                .into_response();
        }
        Some("missing") => return error_body(StatusCode::NOT_FOUND, "runtime is unknown"),
        Some("busy") => return error_body(StatusCode::CONFLICT, "sandbox busy"),
        _ => {}
    }

    let content = payload["files"][0]["content"].as_str().unwrap_or_default();
    let stdout = match payload["stdin"].as_str() {
        Some(stdin) => stdin.to_string(),
        None => content
            .strip_prefix("print('")
            .and_then(|rest| rest.strip_suffix("')"))
            .map(|text| format!("{text}\n"))
            .unwrap_or_default(),
    };

    let mut body = json!({
        "language": payload["language"],
        "version": payload["version"],
        "stages": {
            "execute": {"stdout": stdout, "stderr": "", "code": 0, "signal": null}
        }
    });
    if payload.get("dependencies").is_some() {
        body["stages"]["install"] = json!({"stdout": "installed\n"});
    }
    if content.contains("app.run") {
        body["webAppUrl"] = json!("http://sandbox.local/apps/1");
    }
    Json(body).into_response()
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let mut echoed = serde_json::Map::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(v.to_str().unwrap_or_default().to_string()))
            .collect();
        echoed.insert(name.as_str().to_string(), Value::Array(values));
    }
    Json(Value::Object(echoed))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({}))
}

async fn garbage() -> &'static str {
    "this is not json"
}

async fn conflict() -> Response {
    error_body(StatusCode::CONFLICT, "conflict outside packages")
}

async fn connect(
    State(service): State<FakeService>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == SESSION_TOKEN);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| run_session(socket, service))
}

/// Scripted interactive session:
/// - `init` → `runtime` + `stage`
/// - stdin `drop\n` → connection dropped without a close frame
/// - other stdin → echoed as stdout
/// - `signal` → `exit` with that signal, then close
/// - client close frame → counted in `session_closes`
async fn run_session(mut socket: WebSocket, service: FakeService) {
    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => {
                service.session_closes.fetch_add(1, Ordering::SeqCst);
                return;
            }
            _ => continue,
        };
        let frame: Value = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(_) => {
                let _ = send(&mut socket, json!({"type": "error", "message": "bad frame"})).await;
                continue;
            }
        };

        match frame["type"].as_str() {
            Some("init") => {
                let runtime = json!({
                    "type": "runtime",
                    "language": frame["language"],
                    "version": frame["version"],
                });
                if send(&mut socket, runtime).await.is_err()
                    || send(&mut socket, json!({"type": "stage", "stage": "run"}))
                        .await
                        .is_err()
                {
                    return;
                }
            }
            Some("data") => {
                let data = frame["data"].as_str().unwrap_or_default().to_string();
                if data == "drop\n" {
                    return;
                }
                let echo = json!({"type": "data", "stream": "stdout", "data": data});
                if send(&mut socket, echo).await.is_err() {
                    return;
                }
            }
            Some("signal") => {
                let exit = json!({
                    "type": "exit",
                    "stage": "run",
                    "code": null,
                    "signal": frame["signal"],
                });
                let _ = send(&mut socket, exit).await;
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            _ => {
                let _ = send(&mut socket, json!({"type": "heartbeat"})).await;
            }
        }
    }
}

async fn send(socket: &mut WebSocket, frame: Value) -> Result<(), axum::Error> {
    socket.send(Message::Text(frame.to_string())).await
}
