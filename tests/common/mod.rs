//! Shared fixtures for the gateway integration tests.
//!
//! `FakeSheet` stands in for the spreadsheet when only the gateway's own
//! behaviour matters; `spawn_upstream` serves a real axum app on a random
//! local port when the HTTP client itself is under test.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use price_gateway::{
    cache::PriceCache,
    model::{PriceObservation, PriceQuery, SheetRow},
    upstream::{Lookup, PriceSheet, RecordReply},
    AppState, Error,
};
use serde_json::Value;
use std::{
    io,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

pub struct FakeSheet {
    /// `None` simulates an unreachable sheet.
    pub lookup: Option<Lookup>,
    pub reply: RecordReply,
    pub queries: Mutex<Vec<PriceQuery>>,
    pub recorded: Mutex<Vec<PriceObservation>>,
}

impl FakeSheet {
    pub fn rows(rows: Value) -> Self {
        let rows: Vec<SheetRow> = serde_json::from_value(rows).unwrap();
        Self::new(Some(Lookup::Rows(rows)), RecordReply::RunningAverage)
    }

    pub fn new(lookup: Option<Lookup>, reply: RecordReply) -> Self {
        Self {
            lookup,
            reply,
            queries: Mutex::new(Vec::new()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self::new(None, RecordReply::RunningAverage)
    }

    pub fn recorded(&self) -> Vec<PriceObservation> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<PriceQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSheet for FakeSheet {
    async fn lookup(&self, query: &PriceQuery) -> Result<Lookup, Error> {
        self.queries.lock().unwrap().push(query.clone());
        self.lookup
            .clone()
            .ok_or(Error::UpstreamStatus(StatusCode::BAD_GATEWAY))
    }

    async fn record(&self, observation: &PriceObservation) -> Result<RecordReply, Error> {
        if self.lookup.is_none() {
            return Err(Error::UpstreamStatus(StatusCode::BAD_GATEWAY));
        }
        self.recorded.lock().unwrap().push(observation.clone());
        Ok(self.reply.clone())
    }
}

pub fn gateway(sheet: Arc<FakeSheet>) -> (Router, PriceCache) {
    let cache = PriceCache::new();
    let router = price_gateway::router(AppState::new(sheet, cache.clone()));
    (router, cache)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Reply {
    let res = router.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply { status, headers, body }
}

pub async fn get(router: &Router, uri: &str) -> Reply {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(router: &Router, body: Value) -> Reply {
    let request = Request::post("/api/index")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(headers["content-type"], "application/json");
}

/// Serves `app` on an ephemeral port and returns its `/exec` URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/exec")
}

/// URL of a port nothing listens on.
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/exec")
}

/// In-memory log sink. Install `subscriber()` with
/// `tracing::subscriber::set_default` for the duration of a test.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || logs.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
