// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use certval_model::{CertNo, EvaluationRecord, ValidationRecord};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Conflict,
    Validation,
    Io,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation_error",
            Self::Io => "io_error",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.code == StoreErrorCode::Conflict
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// Local system of record for evaluations and reviewer decisions.
///
/// Implementations must enforce at most one `ValidationRecord` per
/// `cert_no` at write time and report a duplicate as
/// [`StoreErrorCode::Conflict`].
#[async_trait]
pub trait CertificateStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    /// Most recent evaluation run for the certificate.
    async fn latest_evaluation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<EvaluationRecord>, StoreError>;

    async fn insert_evaluation(&self, record: &EvaluationRecord) -> Result<(), StoreError>;

    /// Moves the evaluation row identified by `(cert_no, from)` to `to`.
    /// Returns `false` when no such row exists.
    async fn rewrite_evaluation_created_at(
        &self,
        cert_no: &CertNo,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn find_validation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<ValidationRecord>, StoreError>;

    async fn insert_validation(&self, record: &ValidationRecord) -> Result<(), StoreError>;
}
