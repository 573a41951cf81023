// SPDX-License-Identifier: Apache-2.0

use certval_model::{
    CalibrationId, CertNo, ErrorCategory, EvaluationRecord, ValidationRecord, ValidationStatus,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn validation_record_uses_external_calibration_id_spelling() {
    let at = Utc.with_ymd_and_hms(2025, 5, 2, 12, 0, 0).single().expect("ts");
    let record = ValidationRecord::rejected(
        CertNo::parse("CAL-001").expect("cert"),
        CalibrationId::parse("EXT-9").expect("id"),
        "reviewer@example.com",
        at,
    )
    .with_error_categories(
        Some(&ErrorCategory::new(
            vec!["Tolerance_applied_fail".to_string()],
            Some(String::new()),
        )),
        None,
        None,
    );
    let value = serde_json::to_value(&record).expect("json");
    assert_eq!(value["CalibrationId"], json!("EXT-9"));
    assert_eq!(value["status"], json!("REJECTED"));
    assert_eq!(
        value["tolerance_errors"],
        json!({"codes": ["Tolerance_applied_fail"]})
    );
    assert!(value.get("cmc_errors").is_none());
    let back: ValidationRecord = serde_json::from_value(value).expect("decode");
    assert_eq!(back.status, ValidationStatus::Rejected);
}

#[test]
fn validation_record_rejects_unknown_fields() {
    let raw = json!({
        "cert_no": "CAL-001",
        "status": "APPROVED",
        "approved_by": "r",
        "approved_at": "2025-05-02T12:00:00Z",
        "CalibrationId": "EXT-9",
        "extra": true
    });
    assert!(serde_json::from_value::<ValidationRecord>(raw).is_err());
}

#[test]
fn evaluation_record_tolerates_missing_calibration_id() {
    let raw = json!({
        "cert_no": "CAL-002",
        "created_at": "2024-03-01T00:00:00Z",
        "json_data": {"tolerance_checks": []}
    });
    let record: EvaluationRecord = serde_json::from_value(raw).expect("decode");
    assert!(record.calibration_id.is_none());
}
