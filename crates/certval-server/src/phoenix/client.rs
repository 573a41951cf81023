// SPDX-License-Identifier: Apache-2.0

use super::{
    certificate_numbers, ApproveCalibration, PhoenixApi, PhoenixError, RejectCalibration,
};
use crate::config::PhoenixConfig;
use async_trait::async_trait;
use certval_model::CertNo;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, Url};
use serde_json::Value;
use tracing::{debug, instrument};

pub struct PhoenixHttpClient {
    base_url: Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl PhoenixHttpClient {
    pub fn new(cfg: &PhoenixConfig) -> Result<Self, PhoenixError> {
        let base_url = Url::parse(cfg.base_url.trim())
            .map_err(|e| PhoenixError::Transport(format!("invalid phoenix base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PhoenixError::Transport(format!(
                "phoenix base url cannot carry a path: {base_url}"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PhoenixError::Transport(format!("phoenix client setup failed: {e}")))?;
        Ok(Self {
            base_url,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn check(resp: Response) -> Result<Response, PhoenixError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PhoenixError::status(status.as_u16(), &body))
    }

    async fn get_json(&self, url: Url) -> Result<Value, PhoenixError> {
        let resp = self
            .client
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(transport)?;
        Self::check(resp)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| PhoenixError::Decode(e.to_string()))
    }

    async fn post_json<T: serde::Serialize + Sync>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<(), PhoenixError> {
        let resp = self
            .client
            .post(url)
            .headers(self.headers())
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check(resp).await?;
        debug!(status = resp.status().as_u16(), "phoenix accepted request");
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> PhoenixError {
    if e.is_timeout() {
        PhoenixError::Transport(format!("timeout: {e}"))
    } else {
        PhoenixError::Transport(e.to_string())
    }
}

#[async_trait]
impl PhoenixApi for PhoenixHttpClient {
    #[instrument(skip_all, fields(cert_no = %cert_no))]
    async fn certificate_details(&self, cert_no: &CertNo) -> Result<Value, PhoenixError> {
        self.get_json(self.endpoint(&["certificates", cert_no.as_str()]))
            .await
    }

    #[instrument(skip_all, fields(calibration_id = %request.calibration_id))]
    async fn reject_calibration(&self, request: &RejectCalibration) -> Result<(), PhoenixError> {
        self.post_json(self.endpoint(&["calibrations", "reject"]), request)
            .await
    }

    #[instrument(skip_all, fields(calibration_id = %request.calibration_id))]
    async fn approve_calibration(
        &self,
        request: &ApproveCalibration,
    ) -> Result<(), PhoenixError> {
        self.post_json(self.endpoint(&["calibrations", "approve"]), request)
            .await
    }

    #[instrument(skip(self))]
    async fn all_certificates(&self) -> Result<Vec<String>, PhoenixError> {
        let doc = self.get_json(self.endpoint(&["certificates"])).await?;
        Ok(certificate_numbers(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let client = PhoenixHttpClient::new(&PhoenixConfig {
            base_url: "https://phoenix.example.com/api/".to_string(),
            ..PhoenixConfig::default()
        })
        .expect("client");
        let url = client.endpoint(&["certificates", "CAL 001/A"]);
        assert_eq!(
            url.as_str(),
            "https://phoenix.example.com/api/certificates/CAL%20001%2FA"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let err = PhoenixHttpClient::new(&PhoenixConfig {
            base_url: "not a url".to_string(),
            ..PhoenixConfig::default()
        })
        .err()
        .expect("must fail");
        assert!(matches!(err, PhoenixError::Transport(_)));
    }
}
