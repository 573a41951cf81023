// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Certificate validation model SSOT.
//!
//! ```compile_fail
//! use certval_model::ValidationStatus;
//!
//! fn exhaustive_match(s: ValidationStatus) -> &'static str {
//!     match s {
//!         ValidationStatus::Approved => "a",
//!         ValidationStatus::Rejected => "r",
//!     }
//! }
//! ```

mod certificate;
mod codes;
mod decision;
mod resignal;

pub use certificate::{
    parse_calibration_id, parse_cert_no, CalibrationId, CertNo, ValidationError,
    CALIBRATION_ID_MAX_LEN, CERT_NO_MAX_LEN,
};
pub use codes::{
    validate_codes, validate_error_categories, CodeValidationError, ErrorCategoryKind,
    ANOTHER_REASON, CMC_CODES, REQUIREMENTS_CODES, TOLERANCE_CODES,
};
pub use decision::{ErrorCategory, EvaluationRecord, ValidationRecord, ValidationStatus};
pub use resignal::{resignal_created_at, RESIGNAL_MONTHS};

pub const CRATE_NAME: &str = "certval-model";
