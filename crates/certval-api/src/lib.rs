// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
pub mod error_mapping;
mod errors;

pub use dto::{
    ApproveRequestDto, DecisionResponseDto, LiveCertificatesDto, RejectRequestDto,
    ValidationLookupDto,
};
pub use errors::{ApiError, ApiErrorCode, REQUEST_ID_UNKNOWN};

pub const CRATE_NAME: &str = "certval-api";

pub const ROUTE_REJECT: &str = "/validation/reject";
pub const ROUTE_APPROVE: &str = "/validation/approve";
pub const ROUTE_VALIDATION_LOOKUP: &str = "/validation/:cert_no";
pub const ROUTE_LIVE_CERTIFICATES: &str = "/phoenix/certificates";
pub const ROUTE_HEALTHZ: &str = "/healthz";

/// Header set by the authenticating proxy with the reviewer identity.
pub const REVIEWER_HEADER: &str = "x-reviewer";
