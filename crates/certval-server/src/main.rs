// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use certval_server::{
    build_router, AppState, DecisionConfig, PhoenixConfig, PhoenixHttpClient, ServerConfig,
    WebhookConfig, DEFAULT_ERROR_LIST_ID,
};
use certval_store::{CertificateStore, SqliteCertificateStore};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("CERTVAL_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let server_cfg = ServerConfig {
        bind_addr: env::var("CERTVAL_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        db_path: PathBuf::from(
            env::var("CERTVAL_DB_PATH").unwrap_or_else(|_| "artifacts/certval.sqlite".to_string()),
        ),
        max_body_bytes: env_usize("CERTVAL_MAX_BODY_BYTES", 64 * 1024),
        shutdown_drain: env_duration_ms("CERTVAL_SHUTDOWN_DRAIN_MS", 2000),
    };
    let phoenix_cfg = PhoenixConfig {
        base_url: env_string("CERTVAL_PHOENIX_BASE_URL")
            .ok_or_else(|| "CERTVAL_PHOENIX_BASE_URL is required".to_string())?,
        api_key: env_string("CERTVAL_PHOENIX_API_KEY"),
        timeout: env_duration_ms("CERTVAL_PHOENIX_TIMEOUT_MS", 15_000),
    };
    let decision_cfg = DecisionConfig {
        error_list_id: env_string("CERTVAL_PHOENIX_ERROR_LIST_ID")
            .unwrap_or_else(|| DEFAULT_ERROR_LIST_ID.to_string()),
        report_base_url: env_string("CERTVAL_REPORT_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string()),
        webhook: WebhookConfig {
            enabled: env_bool("CERTVAL_WEBHOOK_ENABLED", false),
            url: env_string("CERTVAL_WEBHOOK_URL"),
            timeout: env_duration_ms("CERTVAL_WEBHOOK_TIMEOUT_MS", 5000),
        },
    };
    if decision_cfg.webhook.enabled && decision_cfg.webhook.endpoint().is_none() {
        warn!("CERTVAL_WEBHOOK_ENABLED is set without CERTVAL_WEBHOOK_URL; notifications disabled");
    }

    let store = SqliteCertificateStore::open(&server_cfg.db_path)
        .map_err(|e| format!("open store {}: {e}", server_cfg.db_path.display()))?;
    let store: Arc<dyn CertificateStore> = Arc::new(store);
    let phoenix = PhoenixHttpClient::new(&phoenix_cfg).map_err(|e| e.to_string())?;
    info!(
        store = store.backend_tag(),
        phoenix = %phoenix_cfg.base_url,
        error_list_id = %decision_cfg.error_list_id,
        webhook = decision_cfg.webhook.endpoint().is_some(),
        "certval-server configured"
    );

    let drain = server_cfg.shutdown_drain;
    let bind_addr = server_cfg.bind_addr.clone();
    let state = AppState::with_config(store, Arc::new(phoenix), decision_cfg, server_cfg);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("certval-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!(drain_ms = drain.as_millis() as u64, "shutdown requested");
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
