// SPDX-License-Identifier: Apache-2.0

use certval_model::{ErrorCategory, ValidationRecord};
use serde::{Deserialize, Serialize};

/// Body of `POST /validation/reject`. Fields stay loose here; the server
/// validates them so that every problem maps to a typed 400.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequestDto {
    #[serde(default)]
    pub cert_no: Option<String>,
    #[serde(
        rename = "CalibrationId",
        alias = "calibration_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub calibration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_errors: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmc_errors: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_errors: Option<ErrorCategory>,
}

/// Body of `POST /validation/approve`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequestDto {
    #[serde(default)]
    pub cert_no: Option<String>,
    #[serde(
        rename = "CalibrationId",
        alias = "calibration_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub calibration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionResponseDto {
    pub success: bool,
    pub message: String,
    pub data: ValidationRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phoenix_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationLookupDto {
    pub data: ValidationRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiveCertificatesDto {
    pub data: Vec<String>,
}
