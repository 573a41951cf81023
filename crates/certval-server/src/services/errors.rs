// SPDX-License-Identifier: Apache-2.0

use crate::phoenix::UpstreamFailure;
use certval_api::error_mapping::status_for_code;
use certval_api::{ApiError, ApiErrorCode};
use certval_model::{CalibrationId, CertNo, CodeValidationError, ValidationStatus};
use certval_store::StoreError;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Step of the decision flow where a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionStage {
    IdempotencyCheck,
    Resignal,
    Insert,
    Lookup,
}

impl DecisionStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdempotencyCheck => "idempotency_check",
            Self::Resignal => "resignal",
            Self::Insert => "insert",
            Self::Lookup => "lookup",
        }
    }

    /// Whether the external system has already accepted the decision when
    /// this stage runs.
    #[must_use]
    pub const fn after_upstream(self) -> bool {
        matches!(self, Self::Resignal | Self::Insert)
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    InvalidCodes(#[from] CodeValidationError),
    #[error("reviewer identity missing")]
    Unauthenticated,
    #[error("CalibrationId not found for certificate {cert_no}")]
    CalibrationIdNotFound { cert_no: CertNo },
    #[error("certificate {cert_no} already has a decision")]
    AlreadyDecided {
        cert_no: CertNo,
        status: Option<ValidationStatus>,
    },
    #[error("Phoenix call failed: {failure}")]
    Upstream {
        cert_no: Option<CertNo>,
        calibration_id: Option<CalibrationId>,
        failure: UpstreamFailure,
    },
    #[error("store failure during {}: {source}", .stage.as_str())]
    Persistence {
        cert_no: Option<CertNo>,
        stage: DecisionStage,
        source: StoreError,
    },
}

impl DecisionError {
    #[must_use]
    pub fn code(&self) -> ApiErrorCode {
        match self {
            Self::InvalidRequest(_) => ApiErrorCode::InvalidRequest,
            Self::InvalidCodes(_) => ApiErrorCode::ValidationFailed,
            Self::Unauthenticated => ApiErrorCode::Unauthenticated,
            Self::CalibrationIdNotFound { .. } => ApiErrorCode::CalibrationIdNotFound,
            Self::AlreadyDecided { .. } => ApiErrorCode::AlreadyDecided,
            Self::Upstream { failure, .. } => match failure {
                UpstreamFailure::BadRequest { .. } => ApiErrorCode::UpstreamRejected,
                UpstreamFailure::AuthFailed { .. } => ApiErrorCode::UpstreamAuthFailed,
                UpstreamFailure::NotFound { .. } => ApiErrorCode::UpstreamNotFound,
                UpstreamFailure::ServerError { .. } => ApiErrorCode::UpstreamServerError,
                UpstreamFailure::Other { .. } => ApiErrorCode::UpstreamUnavailable,
            },
            Self::Persistence { .. } => ApiErrorCode::PersistenceFailed,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        status_for_code(self.code())
    }

    /// Wire form. `details` carries the diagnostics a reviewer needs to
    /// reconcile the two systems by hand.
    #[must_use]
    pub fn to_api_error(&self) -> ApiError {
        let mut details = Map::new();
        match self {
            Self::InvalidRequest(_) | Self::Unauthenticated => {}
            Self::InvalidCodes(err) => {
                details.insert(
                    "field_errors".to_string(),
                    json!([{"field": err.field(), "reason": err.reason()}]),
                );
            }
            Self::CalibrationIdNotFound { cert_no } => {
                details.insert("cert_no".to_string(), json!(cert_no));
            }
            Self::AlreadyDecided { cert_no, status } => {
                details.insert("cert_no".to_string(), json!(cert_no));
                if let Some(status) = status {
                    details.insert("existing_status".to_string(), json!(status));
                }
            }
            Self::Upstream {
                cert_no,
                calibration_id,
                failure,
            } => {
                if let Some(cert_no) = cert_no {
                    details.insert("cert_no".to_string(), json!(cert_no));
                }
                if let Some(id) = calibration_id {
                    details.insert("CalibrationId".to_string(), json!(id));
                }
                if let UpstreamFailure::Other {
                    status: Some(status),
                    ..
                } = failure
                {
                    details.insert("upstream_status".to_string(), json!(status));
                }
                details.insert("raw_error".to_string(), json!(failure.raw()));
            }
            Self::Persistence {
                cert_no,
                stage,
                source,
            } => {
                if let Some(cert_no) = cert_no {
                    details.insert("cert_no".to_string(), json!(cert_no));
                }
                details.insert("stage".to_string(), json!(stage.as_str()));
                details.insert("upstream_applied".to_string(), json!(stage.after_upstream()));
                details.insert("store_error".to_string(), json!(source.code.as_str()));
            }
        }
        ApiError::new(self.code(), self.to_string(), Value::Object(details))
    }
}
