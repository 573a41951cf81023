// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use certval_model::{CalibrationId, CertNo, EvaluationRecord};
use certval_server::{build_router, AppState, DecisionConfig, FakePhoenix, PhoenixApi, ServerConfig};
use certval_store::{CertificateStore, SqliteCertificateStore};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const REVIEWER: (&str, &str) = ("x-reviewer", "reviewer@lab.example");

pub fn cert(s: &str) -> CertNo {
    CertNo::parse(s).expect("cert")
}

pub fn evaluated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
        .single()
        .expect("ts")
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<SqliteCertificateStore>,
    pub phoenix: Arc<FakePhoenix>,
    _dir: TempDir,
}

pub async fn spawn_router(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("serve");
    });
    addr
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tune: impl FnOnce(&mut DecisionConfig)) -> TestApp {
    let phoenix = Arc::new(FakePhoenix::default());
    spawn_app_with_phoenix(phoenix.clone(), phoenix, tune).await
}

/// Serves the router over a fresh on-disk store. `phoenix` is what the
/// router talks to; `fake` is what the test inspects.
pub async fn spawn_app_with_phoenix(
    phoenix: Arc<dyn PhoenixApi>,
    fake: Arc<FakePhoenix>,
    tune: impl FnOnce(&mut DecisionConfig),
) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        SqliteCertificateStore::open(&dir.path().join("certval.sqlite")).expect("open store"),
    );
    let mut decision = DecisionConfig::default();
    tune(&mut decision);
    let state = AppState::with_config(store.clone(), phoenix, decision, ServerConfig::default());
    TestApp {
        addr: spawn_router(state).await,
        store,
        phoenix: fake,
        _dir: dir,
    }
}

pub async fn seed_evaluation(
    store: &dyn CertificateStore,
    cert_no: &str,
    calibration_id: Option<&str>,
    json_data: Value,
) {
    store
        .insert_evaluation(&EvaluationRecord::new(
            cert(cert_no),
            evaluated_at(),
            json_data,
            calibration_id.map(|id| CalibrationId::parse(id).expect("calibration id")),
        ))
        .await
        .expect("seed evaluation");
}

pub async fn send_raw_with_method(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(payload) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    if let Some(payload) = body {
        req.push_str(payload);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

pub async fn post_json(addr: SocketAddr, path: &str, body: &Value) -> (u16, Value) {
    let raw = body.to_string();
    let (status, _, text) =
        send_raw_with_method(addr, "POST", path, &[REVIEWER], Some(&raw)).await;
    (status, parse_body(&text))
}

pub async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
    let (status, _, text) = send_raw_with_method(addr, "GET", path, &[], None).await;
    (status, parse_body(&text))
}

pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or(Value::String(text.to_string()))
}

/// Header value from a raw response head, matched case-insensitively.
pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}
