//! Test doubles and payload fixtures.

use crate::error::{Error, TransportError};
use crate::exec::{ExecListener, ExecStatus};
use crate::transport::{HttpRequest, HttpTransport, StreamControl, StreamRequest, StreamSink, StreamTransport};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Reply {
    Body(String),
    Status(u16, String),
    Hang,
}

/// Recorded request: method, path with query, body
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub body: Option<String>,
}

/// `HttpTransport` answering from a script keyed by method and path.
/// Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Mutex<HashMap<(String, String), Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, method: &str, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
    }

    pub fn respond(&self, method: &str, path: &str, body: &str) {
        self.script(method, path, Reply::Body(body.to_string()));
    }

    pub fn fail(&self, method: &str, path: &str, code: u16, body: &str) {
        self.script(method, path, Reply::Status(code, body.to_string()));
    }

    /// Never answer.
    pub fn hang(&self, method: &str, path: &str) {
        self.script(method, path, Reply::Hang);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last_body(&self, method: &str, path: &str) -> Option<String> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
            .and_then(|c| c.body)
    }
}

#[async_trait]
impl HttpTransport for ScriptedHttp {
    async fn send(&self, request: HttpRequest) -> Result<String, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| TransportError::other(&request.url, e.to_string()))?;
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let method = request.method.as_str().to_string();
        self.calls.lock().unwrap().push(Call {
            method: method.clone(),
            path: path.clone(),
            body: request.body.clone(),
        });

        let reply = self.routes.lock().unwrap().get(&(method, path)).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(code, body)) => Err(TransportError::from_status(code, request.url, &body)),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::other(request.url, "hung request resumed"))
            }
            None => Err(TransportError::NotFound {
                url: request.url,
                status: None,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streams
// ─────────────────────────────────────────────────────────────────────────────

struct CountingControl(Arc<AtomicUsize>);

impl StreamControl for CountingControl {
    fn close(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// `StreamTransport` that records opens and lets the test drive the sink.
#[derive(Default)]
pub struct ManualStream {
    opened: Mutex<Vec<(StreamRequest, Arc<dyn StreamSink>)>>,
    closes: Arc<AtomicUsize>,
}

impl ManualStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<StreamRequest> {
        self.opened.lock().unwrap().last().map(|(r, _)| r.clone())
    }

    pub fn last_sink(&self) -> Option<Arc<dyn StreamSink>> {
        self.opened.lock().unwrap().last().map(|(_, s)| Arc::clone(s))
    }

    /// Number of `close` calls on the returned controls
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl StreamTransport for ManualStream {
    fn open(&self, request: StreamRequest, sink: Arc<dyn StreamSink>) -> Box<dyn StreamControl> {
        self.opened.lock().unwrap().push((request, sink));
        Box::new(CountingControl(Arc::clone(&self.closes)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exec listener
// ─────────────────────────────────────────────────────────────────────────────

/// Listener that records every callback.
#[derive(Default)]
pub struct RecordingListener {
    opens: AtomicUsize,
    stdout: Mutex<Vec<u8>>,
    stderr: Mutex<Vec<u8>>,
    exec_errors: Mutex<Vec<ExecStatus>>,
    terminals: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout.lock().unwrap()).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.stderr.lock().unwrap()).into_owned()
    }

    pub fn exec_errors(&self) -> Vec<ExecStatus> {
        self.exec_errors.lock().unwrap().clone()
    }

    /// `"close {code} {reason}"` or `"failure {error}"` per terminal callback
    pub fn terminals(&self) -> Vec<String> {
        self.terminals.lock().unwrap().clone()
    }
}

impl ExecListener for RecordingListener {
    fn on_open(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stdout(&self, data: &[u8]) {
        self.stdout.lock().unwrap().extend_from_slice(data);
    }

    fn on_stderr(&self, data: &[u8]) {
        self.stderr.lock().unwrap().extend_from_slice(data);
    }

    fn on_exec_error(&self, status: &ExecStatus) {
        self.exec_errors.lock().unwrap().push(status.clone());
    }

    fn on_close(&self, code: u16, reason: &str) {
        self.terminals
            .lock()
            .unwrap()
            .push(format!("close {} {}", code, reason));
    }

    fn on_failure(&self, error: &Error) {
        self.terminals
            .lock()
            .unwrap()
            .push(format!("failure {}", error));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

pub mod fixtures {
    use super::{ManualStream, ScriptedHttp};
    use crate::client::Client;
    use crate::registry::ApiVersion;
    use crate::resource::ApiGroup;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Client for `http://cluster.test` at `v1`, namespace `demo`, no negotiation.
    pub async fn client(http: Arc<ScriptedHttp>) -> Client {
        client_with_stream(http, Arc::new(ManualStream::new())).await
    }

    pub async fn client_with_stream(http: Arc<ScriptedHttp>, stream: Arc<ManualStream>) -> Client {
        Client::builder("http://cluster.test")
            .token("test-token")
            .namespace("demo")
            .http_transport(http)
            .stream_transport(stream)
            .build_with_versions([
                (ApiGroup::Kubernetes, ApiVersion::new("v1")),
                (ApiGroup::OpenShift, ApiVersion::new("v1")),
            ])
            .unwrap()
    }

    pub fn versions(versions: &[&str]) -> String {
        json!({ "versions": versions }).to_string()
    }

    pub fn api_resources(names: &[&str]) -> String {
        let resources: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        json!({ "kind": "APIResourceList", "resources": resources }).to_string()
    }

    pub fn list(kind: &str, version: &str, items: &[String]) -> String {
        let items: Vec<Value> = items
            .iter()
            .map(|i| serde_json::from_str(i).unwrap())
            .collect();
        json!({ "kind": kind, "apiVersion": version, "items": items }).to_string()
    }

    pub fn pod(version: &str, name: &str) -> String {
        let (node, account) = if version == "v1beta3" {
            ("host", "serviceAccount")
        } else {
            ("nodeName", "serviceAccountName")
        };
        json!({
            "kind": "Pod",
            "apiVersion": version,
            "metadata": {
                "name": name,
                "namespace": "demo",
                "labels": { "app": name },
                "creationTimestamp": "2015-06-01T10:00:00Z"
            },
            "spec": {
                node: "node-1",
                account: "default",
                "containers": [
                    { "name": "app", "image": "example/app:latest" },
                    { "name": "sidecar", "image": "example/proxy:1.0" }
                ]
            },
            "status": { "phase": "Running", "podIP": "10.1.2.3" }
        })
        .to_string()
    }

    pub fn service(version: &str) -> String {
        let ip = if version == "v1beta3" { "portalIP" } else { "clusterIP" };
        json!({
            "kind": "Service",
            "apiVersion": version,
            "metadata": { "name": "frontend", "namespace": "demo" },
            "spec": {
                ip: "172.30.0.10",
                "selector": { "app": "frontend" },
                "ports": [{ "port": 8080, "protocol": "TCP" }],
                "type": "ClusterIP"
            }
        })
        .to_string()
    }

    pub fn deployment_config(version: &str, name: &str, replicas: i64) -> String {
        json!({
            "kind": "DeploymentConfig",
            "apiVersion": version,
            "metadata": { "name": name, "namespace": "demo" },
            "spec": { "replicas": replicas, "selector": { "app": name } },
            "status": { "latestVersion": 3 }
        })
        .to_string()
    }

    pub fn build(version: &str, name: &str, phase: &str) -> String {
        json!({
            "kind": "Build",
            "apiVersion": version,
            "metadata": { "name": name, "namespace": "demo" },
            "spec": {
                "source": { "git": { "uri": "https://github.com/example/app.git" } },
                "output": { "to": { "kind": "ImageStreamTag", "name": "app:latest" } }
            },
            "status": { "phase": phase }
        })
        .to_string()
    }

    pub fn project(version: &str, name: &str, display_name: Option<&str>) -> String {
        let mut annotations = serde_json::Map::new();
        if let Some(display_name) = display_name {
            annotations.insert("openshift.io/display-name".to_string(), json!(display_name));
        }
        json!({
            "kind": "Project",
            "apiVersion": version,
            "metadata": { "name": name, "annotations": annotations },
            "status": { "phase": "Active" }
        })
        .to_string()
    }

    pub fn route(version: &str, tls: bool) -> String {
        let mut spec = json!({
            "host": "www.example.com",
            "path": "/shop",
            "to": { "kind": "Service", "name": "frontend" }
        });
        if tls {
            spec["tls"] = json!({ "termination": "edge" });
        }
        json!({
            "kind": "Route",
            "apiVersion": version,
            "metadata": { "name": "shop", "namespace": "demo" },
            "spec": spec
        })
        .to_string()
    }
}
