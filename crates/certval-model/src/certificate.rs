// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const CERT_NO_MAX_LEN: usize = 128;
pub const CALIBRATION_ID_MAX_LEN: usize = 128;

pub fn parse_cert_no(input: &str) -> Result<CertNo, ValidationError> {
    CertNo::parse(input)
}

pub fn parse_calibration_id(input: &str) -> Result<CalibrationId, ValidationError> {
    CalibrationId::parse(input)
}

/// Business identifier of a calibration certificate.
///
/// Stored and compared locally as an exact, case-sensitive string. The
/// external calibration system compares certificate numbers without regard
/// to case, see [`CertNo::matches_external`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct CertNo(String);

impl CertNo {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("cert_no must not be empty".to_string()));
        }
        if s.len() > CERT_NO_MAX_LEN {
            return Err(ValidationError(format!(
                "cert_no exceeds max length {CERT_NO_MAX_LEN}"
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError(
                "cert_no must not contain control characters".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    #[must_use]
    pub fn matches_external(&self, external: &str) -> bool {
        self.0.eq_ignore_ascii_case(external.trim())
    }
}

impl Display for CertNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a calibration job inside the external system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct CalibrationId(String);

impl CalibrationId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError(
                "CalibrationId must not be empty".to_string(),
            ));
        }
        if s.len() > CALIBRATION_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "CalibrationId exceeds max length {CALIBRATION_ID_MAX_LEN}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for CalibrationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
