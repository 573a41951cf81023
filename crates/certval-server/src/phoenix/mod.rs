// SPDX-License-Identifier: Apache-2.0

//! Port to the external calibration-management system.

use async_trait::async_trait;
use certval_model::{CalibrationId, CertNo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub(crate) mod client;
pub(crate) mod fake;

/// Field spellings the external system has used for a certificate number.
pub const CERT_NO_FIELDS: &[&str] = &[
    "CertNo",
    "certNo",
    "cert_no",
    "CertificateNo",
    "certificateNo",
    "CertificateNumber",
    "certificateNumber",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectCalibration {
    #[serde(rename = "CalibrationId")]
    pub calibration_id: CalibrationId,
    #[serde(rename = "ErrorListId")]
    pub error_list_id: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveCalibration {
    #[serde(rename = "CalibrationId")]
    pub calibration_id: CalibrationId,
    #[serde(rename = "Comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoenixError {
    /// Non-2xx answer. `message` keeps the upstream body for diagnostics.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("phoenix transport error: {0}")]
    Transport(String),
    #[error("phoenix response decode error: {0}")]
    Decode(String),
}

impl PhoenixError {
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: format!("Phoenix API error: {status} {}", body.trim()),
        }
    }

    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Domain reading of a failed external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamFailure {
    #[error("already processed or data issue")]
    BadRequest { raw: String },
    #[error("authentication failed")]
    AuthFailed { raw: String },
    #[error("CalibrationId invalid")]
    NotFound { raw: String },
    #[error("upstream server error")]
    ServerError { raw: String },
    #[error("upstream call failed")]
    Other { status: Option<u16>, raw: String },
}

impl UpstreamFailure {
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::BadRequest { raw }
            | Self::AuthFailed { raw }
            | Self::NotFound { raw }
            | Self::ServerError { raw }
            | Self::Other { raw, .. } => raw,
        }
    }
}

impl From<&PhoenixError> for UpstreamFailure {
    fn from(err: &PhoenixError) -> Self {
        let raw = err.to_string();
        match err.upstream_status() {
            Some(400 | 409) => Self::BadRequest { raw },
            Some(401) => Self::AuthFailed { raw },
            Some(404) => Self::NotFound { raw },
            Some(500) => Self::ServerError { raw },
            status => Self::Other { status, raw },
        }
    }
}

#[async_trait]
pub trait PhoenixApi: Send + Sync + 'static {
    /// Raw certificate detail document; its shape varies by import path.
    async fn certificate_details(&self, cert_no: &CertNo) -> Result<Value, PhoenixError>;

    async fn reject_calibration(&self, request: &RejectCalibration) -> Result<(), PhoenixError>;

    async fn approve_calibration(&self, request: &ApproveCalibration)
        -> Result<(), PhoenixError>;

    async fn all_certificates(&self) -> Result<Vec<String>, PhoenixError>;
}

/// Certificate numbers from a list document: plain strings or objects
/// carrying one of [`CERT_NO_FIELDS`], optionally wrapped in `data` or
/// `certificates`.
#[must_use]
pub fn certificate_numbers(doc: &Value) -> Vec<String> {
    let items = match doc {
        Value::Array(items) => items,
        Value::Object(map) => match ["data", "certificates", "items"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
        {
            Some(items) => items,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(map) => CERT_NO_FIELDS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

pub use client::PhoenixHttpClient;
pub use fake::FakePhoenix;
