// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const REQUEST_ID_UNKNOWN: &str = "req-unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidRequest,
    ValidationFailed,
    CalibrationIdNotFound,
    Unauthenticated,
    NotFound,
    AlreadyDecided,
    PayloadTooLarge,
    UpstreamRejected,
    UpstreamAuthFailed,
    UpstreamNotFound,
    UpstreamServerError,
    UpstreamUnavailable,
    PersistenceFailed,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::ValidationFailed => "ValidationFailed",
            Self::CalibrationIdNotFound => "CalibrationIdNotFound",
            Self::Unauthenticated => "Unauthenticated",
            Self::NotFound => "NotFound",
            Self::AlreadyDecided => "AlreadyDecided",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::UpstreamRejected => "UpstreamRejected",
            Self::UpstreamAuthFailed => "UpstreamAuthFailed",
            Self::UpstreamNotFound => "UpstreamNotFound",
            Self::UpstreamServerError => "UpstreamServerError",
            Self::UpstreamUnavailable => "UpstreamUnavailable",
            Self::PersistenceFailed => "PersistenceFailed",
            Self::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: REQUEST_ID_UNKNOWN.to_string(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message, json!({}))
    }

    #[must_use]
    pub fn validation_failed(field: &str, reason: &str, message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            message,
            json!({"field_errors": [{"field": field, "reason": reason}]}),
        )
    }

    #[must_use]
    pub fn not_found(what: &str, key: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({"key": key}),
        )
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};
