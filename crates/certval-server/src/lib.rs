// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use certval_api::{
    ROUTE_APPROVE, ROUTE_HEALTHZ, ROUTE_LIVE_CERTIFICATES, ROUTE_REJECT, ROUTE_VALIDATION_LOOKUP,
};
use certval_store::CertificateStore;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

mod config;
mod http;
mod middleware;
mod phoenix;
mod services;

pub const CRATE_NAME: &str = "certval-server";

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<DecisionCoordinator>,
    pub server: ServerConfig,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn CertificateStore>, phoenix: Arc<dyn PhoenixApi>) -> Self {
        Self::with_config(
            store,
            phoenix,
            DecisionConfig::default(),
            ServerConfig::default(),
        )
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn CertificateStore>,
        phoenix: Arc<dyn PhoenixApi>,
        decision: DecisionConfig,
        server: ServerConfig,
    ) -> Self {
        Self {
            coordinator: Arc::new(DecisionCoordinator::new(store, phoenix, decision)),
            server,
            request_id_seed: Arc::new(AtomicU64::new(0)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ROUTE_HEALTHZ, get(http::handlers::healthz_handler))
        .route(ROUTE_REJECT, post(http::handlers::reject_handler))
        .route(ROUTE_APPROVE, post(http::handlers::approve_handler))
        .route(
            ROUTE_VALIDATION_LOOKUP,
            get(http::handlers::validation_lookup_handler),
        )
        .route(
            ROUTE_LIVE_CERTIFICATES,
            get(http::handlers::live_certificates_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.server.max_body_bytes))
        .with_state(state)
}

pub use config::{
    DecisionConfig, PhoenixConfig, ServerConfig, WebhookConfig, DEFAULT_ERROR_LIST_ID,
    DEFAULT_WEBHOOK_TIMEOUT,
};
pub use phoenix::{
    certificate_numbers, ApproveCalibration, FakePhoenix, PhoenixApi, PhoenixError,
    PhoenixHttpClient, RejectCalibration, UpstreamFailure, CERT_NO_FIELDS,
};
pub use services::{
    calibration_id_from_details, report_url, synthesize_justification, ApproveCommand,
    CalibrationIdSource, DecisionCoordinator, DecisionError, DecisionNotification,
    DecisionOutcome, DecisionStage, IdentifierResolver, Notifier, RejectCommand,
    ResolvedCalibrationId, CALIBRATION_ID_FIELDS,
};
