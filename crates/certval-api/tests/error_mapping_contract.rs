// SPDX-License-Identifier: Apache-2.0

use certval_api::error_mapping::{map_error, status_for_code};
use certval_api::{ApiError, ApiErrorCode, RejectRequestDto, REQUEST_ID_UNKNOWN};
use serde_json::json;

#[test]
fn upstream_failures_map_to_documented_statuses() {
    assert_eq!(status_for_code(ApiErrorCode::UpstreamRejected), 400);
    assert_eq!(status_for_code(ApiErrorCode::UpstreamAuthFailed), 401);
    assert_eq!(status_for_code(ApiErrorCode::UpstreamNotFound), 404);
    assert_eq!(status_for_code(ApiErrorCode::UpstreamServerError), 502);
    assert_eq!(status_for_code(ApiErrorCode::UpstreamUnavailable), 502);
}

#[test]
fn local_failures_map_to_documented_statuses() {
    assert_eq!(status_for_code(ApiErrorCode::ValidationFailed), 400);
    assert_eq!(status_for_code(ApiErrorCode::CalibrationIdNotFound), 400);
    assert_eq!(status_for_code(ApiErrorCode::AlreadyDecided), 409);
    assert_eq!(status_for_code(ApiErrorCode::PersistenceFailed), 500);
}

#[test]
fn api_error_mapping_is_centralized_and_stable() {
    let err = ApiError::new(ApiErrorCode::AlreadyDecided, "decided", json!({}));
    assert_eq!(err.request_id, REQUEST_ID_UNKNOWN);
    assert_eq!(map_error(&err).status_code, 409);
    let wire = serde_json::to_value(err.with_request_id("req-7")).expect("json");
    assert_eq!(wire["code"], json!("AlreadyDecided"));
    assert_eq!(wire["request_id"], json!("req-7"));
}

#[test]
fn reject_request_accepts_both_calibration_id_spellings() {
    let a: RejectRequestDto =
        serde_json::from_value(json!({"cert_no": "CAL-1", "CalibrationId": "EXT-1"}))
            .expect("decode");
    let b: RejectRequestDto =
        serde_json::from_value(json!({"cert_no": "CAL-1", "calibration_id": "EXT-1"}))
            .expect("decode");
    assert_eq!(a, b);
    let c: RejectRequestDto = serde_json::from_value(json!({
        "cert_no": "CAL-1",
        "tolerance_errors": {"codes": ["Tolerance_applied_fail"]}
    }))
    .expect("decode");
    assert_eq!(
        c.tolerance_errors.map(|t| t.codes),
        Some(vec!["Tolerance_applied_fail".to_string()])
    );
}
