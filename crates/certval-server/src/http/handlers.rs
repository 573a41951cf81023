// SPDX-License-Identifier: Apache-2.0

use super::request_tracing::RequestTrace;
use super::response_contract::{decision_error_response, mapped_error_response};
use crate::services::{ApproveCommand, DecisionError, DecisionOutcome, RejectCommand};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use certval_api::{
    ApiError, ApiErrorCode, ApproveRequestDto, DecisionResponseDto, LiveCertificatesDto,
    RejectRequestDto, ValidationLookupDto, REQUEST_ID_UNKNOWN, REVIEWER_HEADER,
};
use certval_model::CertNo;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};

type Trace = Option<Extension<RequestTrace>>;

fn request_id(trace: &Trace) -> String {
    trace
        .as_ref()
        .map_or_else(|| REQUEST_ID_UNKNOWN.to_string(), |t| t.0.request_id.clone())
}

fn reviewer_identity(headers: &HeaderMap) -> Result<String, DecisionError> {
    headers
        .get(REVIEWER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or(DecisionError::Unauthenticated)
}

fn request_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
    request_id: &str,
) -> Result<T, Response> {
    let bytes = body.map_err(|rejection| {
        let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                ApiErrorCode::PayloadTooLarge,
                "request body too large",
                json!({}),
            )
        } else {
            ApiError::invalid_request(rejection.body_text())
        };
        mapped_error_response(err.with_request_id(request_id))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        decision_error_response(
            &DecisionError::InvalidRequest(format!("malformed JSON body: {e}")),
            request_id,
        )
    })
}

fn required_cert_no(raw: Option<&str>) -> Result<CertNo, DecisionError> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DecisionError::InvalidRequest("cert_no is required".to_string()))?;
    CertNo::parse(raw).map_err(|e| DecisionError::InvalidRequest(e.to_string()))
}

fn decision_response(outcome: DecisionOutcome, verb: &str) -> Response {
    let body = DecisionResponseDto {
        success: true,
        message: format!("Certificate {} {verb}", outcome.record.cert_no),
        data: outcome.record,
        phoenix_comment: outcome.phoenix_comment,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) async fn reject_handler(
    State(state): State<AppState>,
    trace: Trace,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = request_id(&trace);
    let reviewer = match reviewer_identity(&headers) {
        Ok(reviewer) => reviewer,
        Err(e) => return decision_error_response(&e, &request_id),
    };
    let dto: RejectRequestDto = match request_body(body, &request_id) {
        Ok(dto) => dto,
        Err(resp) => return resp,
    };
    let cert_no = match required_cert_no(dto.cert_no.as_deref()) {
        Ok(cert_no) => cert_no,
        Err(e) => return decision_error_response(&e, &request_id),
    };
    let cmd = RejectCommand {
        cert_no,
        reviewer,
        calibration_id: dto.calibration_id,
        comment: dto.comment,
        tolerance_errors: dto.tolerance_errors,
        cmc_errors: dto.cmc_errors,
        requirements_errors: dto.requirements_errors,
    };
    match state.coordinator.reject(cmd).await {
        Ok(outcome) => decision_response(outcome, "rejected"),
        Err(e) => {
            warn!(code = e.code().as_str(), error = %e, "reject failed");
            decision_error_response(&e, &request_id)
        }
    }
}

pub(crate) async fn approve_handler(
    State(state): State<AppState>,
    trace: Trace,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = request_id(&trace);
    let reviewer = match reviewer_identity(&headers) {
        Ok(reviewer) => reviewer,
        Err(e) => return decision_error_response(&e, &request_id),
    };
    let dto: ApproveRequestDto = match request_body(body, &request_id) {
        Ok(dto) => dto,
        Err(resp) => return resp,
    };
    let cert_no = match required_cert_no(dto.cert_no.as_deref()) {
        Ok(cert_no) => cert_no,
        Err(e) => return decision_error_response(&e, &request_id),
    };
    let cmd = ApproveCommand {
        cert_no,
        reviewer,
        calibration_id: dto.calibration_id,
        comment: dto.comment,
    };
    match state.coordinator.approve(cmd).await {
        Ok(outcome) => decision_response(outcome, "approved"),
        Err(e) => {
            warn!(code = e.code().as_str(), error = %e, "approve failed");
            decision_error_response(&e, &request_id)
        }
    }
}

pub(crate) async fn validation_lookup_handler(
    State(state): State<AppState>,
    trace: Trace,
    Path(raw): Path<String>,
) -> Response {
    let request_id = request_id(&trace);
    let cert_no = match required_cert_no(Some(&raw)) {
        Ok(cert_no) => cert_no,
        Err(e) => return decision_error_response(&e, &request_id),
    };
    match state.coordinator.lookup(&cert_no).await {
        Ok(Some(record)) => Json(ValidationLookupDto { data: record }).into_response(),
        Ok(None) => mapped_error_response(
            ApiError::not_found("validation record", cert_no.as_str())
                .with_request_id(&request_id),
        ),
        Err(e) => decision_error_response(&e, &request_id),
    }
}

pub(crate) async fn live_certificates_handler(
    State(state): State<AppState>,
    trace: Trace,
) -> Response {
    let request_id = request_id(&trace);
    match state.coordinator.live_certificates().await {
        Ok(data) => {
            info!(count = data.len(), "live certificates listed");
            Json(LiveCertificatesDto { data }).into_response()
        }
        Err(e) => decision_error_response(&e, &request_id),
    }
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reviewer_header_must_be_non_blank() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            reviewer_identity(&headers),
            Err(DecisionError::Unauthenticated)
        ));
        headers.insert(REVIEWER_HEADER, HeaderValue::from_static("  "));
        assert!(reviewer_identity(&headers).is_err());
        headers.insert(REVIEWER_HEADER, HeaderValue::from_static(" alice@lab "));
        assert_eq!(reviewer_identity(&headers).expect("reviewer"), "alice@lab");
    }

    #[test]
    fn cert_no_is_required_and_trimmed() {
        assert!(required_cert_no(None).is_err());
        assert!(required_cert_no(Some("   ")).is_err());
        assert_eq!(
            required_cert_no(Some(" CAL-001 ")).expect("cert").as_str(),
            "CAL-001"
        );
    }
}
