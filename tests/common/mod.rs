#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use modeldb_telemetry::config::TelemetryEnvConfig;
use modeldb_telemetry::domain::telemetry::MetricKey;
use modeldb_telemetry::infrastructure::persistence::Database;
use modeldb_telemetry::infrastructure::persistence::repositories::collection_table;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as seen by the fake collector.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Clone)]
struct CollectorState {
    status: StatusCode,
    response_body: &'static str,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Local HTTP endpoint answering every request with a canned response.
pub struct FakeCollector {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl FakeCollector {
    pub async fn start(status: u16, response_body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = CollectorState {
            status: StatusCode::from_u16(status).unwrap(),
            response_body,
            requests: requests.clone(),
        };
        let app = Router::new().fallback(collect).with_state(state);

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/api/v1/uac-proxy/telemetry/collectTelemetry", addr),
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeCollector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn collect(
    State(state): State<CollectorState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            )
        })
        .collect();

    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.response_body,
    )
}

/// URL of a local port with nothing listening on it.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/telemetry", port)
}

/// Reporter settings pointing at `consumer_url`, with no delay between
/// collection attempts.
pub fn telemetry_config(consumer_url: &str) -> TelemetryEnvConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("TELEMETRY_CONSUMER_URL", consumer_url.to_string()),
        ("TELEMETRY_RETRY_DELAY_MS", "0".to_string()),
        ("TELEMETRY_REQUEST_TIMEOUT_SECS", "5".to_string()),
    ]);
    TelemetryEnvConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// Create every host table the reporter counts.
pub async fn create_host_schema(db: &Database) {
    for key in MetricKey::ALL {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT)",
            collection_table(key)
        ))
        .execute(&db.pool)
        .await
        .unwrap();
    }
}

pub async fn insert_rows(db: &Database, key: MetricKey, rows: usize) {
    let sql = format!("INSERT INTO {} DEFAULT VALUES", collection_table(key));
    for _ in 0..rows {
        sqlx::query(&sql).execute(&db.pool).await.unwrap();
    }
}

/// In-memory store holding projects=3, experiments=5 and empty everything else.
pub async fn seeded_database() -> Database {
    let db = Database::in_memory().await.unwrap();
    create_host_schema(&db).await;
    insert_rows(&db, MetricKey::Projects, 3).await;
    insert_rows(&db, MetricKey::Experiments, 5).await;
    db
}

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing output into a buffer for the guard's lifetime.
/// Works with the default current-thread `#[tokio::test]` runtime.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
