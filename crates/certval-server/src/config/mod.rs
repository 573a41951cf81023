// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ERROR_LIST_ID: &str = "1";
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub max_body_bytes: usize,
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: PathBuf::from("artifacts/certval.sqlite"),
            max_body_bytes: 64 * 1024,
            shutdown_drain: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhoenixConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for PhoenixConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090/api".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Target URL, present only when the flag is on and a URL is configured.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Process-wide settings the decision workflow reads. Built once at startup
/// and handed to the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionConfig {
    pub error_list_id: String,
    pub report_base_url: String,
    pub webhook: WebhookConfig,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            error_list_id: DEFAULT_ERROR_LIST_ID.to_string(),
            report_base_url: "http://localhost:3000".to_string(),
            webhook: WebhookConfig::default(),
        }
    }
}
