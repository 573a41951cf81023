// SPDX-License-Identifier: Apache-2.0

use crate::services::DecisionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certval_api::error_mapping::map_error;
use certval_api::ApiError;
use serde_json::json;

#[must_use]
pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

/// Error body with the status taken from the shared code mapping.
#[must_use]
pub(crate) fn mapped_error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(map_error(&err).status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error_response(status, err)
}

#[must_use]
pub(crate) fn decision_error_response(err: &DecisionError, request_id: &str) -> Response {
    mapped_error_response(err.to_api_error().with_request_id(request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use certval_api::ApiErrorCode;

    #[test]
    fn status_follows_error_code() {
        let resp = mapped_error_response(ApiError::not_found("validation record", "C-1"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = decision_error_response(&DecisionError::Unauthenticated, "req-1");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let err = ApiError::new(ApiErrorCode::AlreadyDecided, "dup", json!({}));
        assert_eq!(mapped_error_response(err).status(), StatusCode::CONFLICT);
    }
}
