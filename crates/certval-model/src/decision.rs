// SPDX-License-Identifier: Apache-2.0

use crate::{CalibrationId, CertNo, ValidationError, ANOTHER_REASON};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ValidationStatus {
    Approved,
    Rejected,
}

impl ValidationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ValidationError(format!(
                "unknown validation status: {other}"
            ))),
        }
    }
}

impl Display for ValidationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reviewer-selected rejection reasons for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCategory {
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub another_reason: Option<String>,
}

impl ErrorCategory {
    #[must_use]
    pub fn new(codes: Vec<String>, another_reason: Option<String>) -> Self {
        Self {
            codes,
            another_reason,
        }
    }

    #[must_use]
    pub fn has_another_reason_code(&self) -> bool {
        self.codes.iter().any(|c| c == ANOTHER_REASON)
    }

    /// Storage form: codes deduplicated in submission order, free text
    /// trimmed and dropped entirely when blank.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut codes: Vec<String> = Vec::with_capacity(self.codes.len());
        for code in &self.codes {
            let code = code.trim();
            if !code.is_empty() && !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        let another_reason = self
            .another_reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        Self {
            codes,
            another_reason,
        }
    }
}

/// One evaluation run for a certificate, produced by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub cert_no: CertNo,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub json_data: Value,
    #[serde(
        rename = "CalibrationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub calibration_id: Option<CalibrationId>,
}

impl EvaluationRecord {
    #[must_use]
    pub fn new(
        cert_no: CertNo,
        created_at: DateTime<Utc>,
        json_data: Value,
        calibration_id: Option<CalibrationId>,
    ) -> Self {
        Self {
            cert_no,
            created_at,
            json_data,
            calibration_id,
        }
    }
}

/// Terminal reviewer decision for a certificate. At most one per `cert_no`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationRecord {
    pub cert_no: CertNo,
    pub status: ValidationStatus,
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
    #[serde(rename = "CalibrationId")]
    pub calibration_id: CalibrationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_errors: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmc_errors: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_errors: Option<ErrorCategory>,
}

impl ValidationRecord {
    #[must_use]
    pub fn approved(
        cert_no: CertNo,
        calibration_id: CalibrationId,
        approved_by: impl Into<String>,
        approved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            cert_no,
            status: ValidationStatus::Approved,
            approved_by: approved_by.into(),
            approved_at,
            calibration_id,
            tolerance_errors: None,
            cmc_errors: None,
            requirements_errors: None,
        }
    }

    #[must_use]
    pub fn rejected(
        cert_no: CertNo,
        calibration_id: CalibrationId,
        approved_by: impl Into<String>,
        approved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ValidationStatus::Rejected,
            ..Self::approved(cert_no, calibration_id, approved_by, approved_at)
        }
    }

    /// Attaches error categories in their storage form.
    #[must_use]
    pub fn with_error_categories(
        mut self,
        tolerance: Option<&ErrorCategory>,
        cmc: Option<&ErrorCategory>,
        requirements: Option<&ErrorCategory>,
    ) -> Self {
        self.tolerance_errors = tolerance.map(ErrorCategory::sanitized);
        self.cmc_errors = cmc.map(ErrorCategory::sanitized);
        self.requirements_errors = requirements.map(ErrorCategory::sanitized);
        self
    }
}
