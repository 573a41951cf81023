// SPDX-License-Identifier: Apache-2.0

use crate::config::WebhookConfig;
use certval_model::CertNo;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Body posted to the decision webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotification {
    pub cert_no: String,
    pub user: String,
    pub timestamp: String,
    pub report_url: String,
}

impl DecisionNotification {
    #[must_use]
    pub fn new(
        cert_no: &CertNo,
        user: &str,
        decided_at: DateTime<Utc>,
        report_base_url: &str,
    ) -> Self {
        Self {
            cert_no: cert_no.to_string(),
            user: user.to_string(),
            timestamp: decided_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            report_url: report_url(report_base_url, cert_no),
        }
    }
}

/// Public report page for a certificate under `base`.
#[must_use]
pub fn report_url(base: &str, cert_no: &CertNo) -> String {
    let base = base.trim();
    if let Ok(mut url) = Url::parse(base) {
        let extended = match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(["certificates", cert_no.as_str()]);
                true
            }
            Err(()) => false,
        };
        if extended {
            return url.to_string();
        }
    }
    format!("{}/certificates/{}", base.trim_end_matches('/'), cert_no)
}

/// Fire-and-forget webhook sender. Delivery failures are logged and dropped.
#[derive(Clone)]
pub struct Notifier {
    cfg: WebhookConfig,
    client: Option<reqwest::Client>,
}

impl Notifier {
    /// A client that cannot be built with the configured timeout leaves the
    /// notifier switched off.
    #[must_use]
    pub fn new(cfg: WebhookConfig) -> Self {
        let client = if cfg.endpoint().is_some() {
            let built = reqwest::Client::builder()
                .timeout(cfg.timeout)
                .redirect(reqwest::redirect::Policy::none())
                .build();
            match built {
                Ok(client) => Some(client),
                Err(e) => {
                    error!(error = %e, "decision webhook disabled: client setup failed");
                    None
                }
            }
        } else {
            None
        };
        Self { cfg, client }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.is_some() && self.cfg.endpoint().is_some()
    }

    /// Spawns delivery on the runtime and returns immediately. `None` when
    /// the webhook is switched off or has no target.
    pub fn dispatch(&self, payload: DecisionNotification) -> Option<JoinHandle<()>> {
        let endpoint = self.cfg.endpoint()?.to_string();
        let client = self.client.clone()?;
        let timeout = self.cfg.timeout;
        Some(tokio::spawn(async move {
            match deliver(&client, timeout, &endpoint, &payload).await {
                Ok(status) => {
                    debug!(cert_no = %payload.cert_no, status, "decision webhook delivered")
                }
                Err(e) => warn!(cert_no = %payload.cert_no, error = %e, "decision webhook failed"),
            }
        }))
    }
}

async fn deliver(
    client: &reqwest::Client,
    timeout: Duration,
    endpoint: &str,
    payload: &DecisionNotification,
) -> Result<u16, String> {
    let send = client.post(endpoint).json(payload).send();
    let resp = tokio::time::timeout(timeout, send)
        .await
        .map_err(|_| format!("timed out after {}ms", timeout.as_millis()))?
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(format!("webhook answered {}", status.as_u16()))
    }
}
