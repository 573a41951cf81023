// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
}

#[must_use]
pub const fn status_for_code(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::InvalidRequest
        | ApiErrorCode::ValidationFailed
        | ApiErrorCode::CalibrationIdNotFound
        | ApiErrorCode::UpstreamRejected => 400,
        ApiErrorCode::Unauthenticated | ApiErrorCode::UpstreamAuthFailed => 401,
        ApiErrorCode::NotFound | ApiErrorCode::UpstreamNotFound => 404,
        ApiErrorCode::AlreadyDecided => 409,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::UpstreamServerError | ApiErrorCode::UpstreamUnavailable => 502,
        ApiErrorCode::PersistenceFailed | ApiErrorCode::Internal => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    ApiErrorMapping {
        status_code: status_for_code(error.code),
    }
}
