// SPDX-License-Identifier: Apache-2.0

use crate::{CertificateStore, StoreError, StoreErrorCode};
use async_trait::async_trait;
use certval_model::{
    CalibrationId, CertNo, ErrorCategory, EvaluationRecord, ValidationRecord, ValidationStatus,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS evaluation_records(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cert_no TEXT NOT NULL,
    created_at TEXT NOT NULL,
    json_data TEXT NOT NULL DEFAULT '{}',
    calibration_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_evaluation_records_cert_created
    ON evaluation_records(cert_no, created_at);
CREATE TABLE IF NOT EXISTS validation_records(
    cert_no TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('APPROVED', 'REJECTED')),
    approved_by TEXT NOT NULL,
    approved_at TEXT NOT NULL,
    calibration_id TEXT NOT NULL,
    tolerance_errors TEXT,
    cmc_errors TEXT,
    requirements_errors TEXT,
    CONSTRAINT uq_validation_records_cert_no UNIQUE (cert_no)
);
";

pub struct SqliteCertificateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCertificateStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(sqlite_error)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory().map_err(sqlite_error)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
            .map_err(sqlite_error)?;
        conn.execute_batch(SCHEMA_SQL).map_err(sqlite_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                StoreError::new(StoreErrorCode::Internal, "sqlite connection lock poisoned")
            })?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, format!("sqlite task failed: {e}")))?
    }
}

fn sqlite_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation => {
            StoreError::new(StoreErrorCode::Conflict, err.to_string())
        }
        _ => StoreError::new(StoreErrorCode::Io, err.to_string()),
    }
}

// Fixed-width RFC 3339 keeps lexical order equal to time order.
fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_from_sql(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::new(StoreErrorCode::Validation, format!("bad timestamp {raw}: {e}")))
}

fn category_to_sql(category: Option<&ErrorCategory>) -> Result<Option<String>, StoreError> {
    category
        .map(|c| {
            serde_json::to_string(c)
                .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))
        })
        .transpose()
}

fn category_from_sql(raw: Option<String>) -> Result<Option<ErrorCategory>, StoreError> {
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))
    })
    .transpose()
}

fn model_error(e: certval_model::ValidationError) -> StoreError {
    StoreError::new(StoreErrorCode::Validation, e.to_string())
}

struct EvaluationRow {
    cert_no: String,
    created_at: String,
    json_data: String,
    calibration_id: Option<String>,
}

impl EvaluationRow {
    fn decode(self) -> Result<EvaluationRecord, StoreError> {
        // A corrupt payload is the synthesizer's problem, not a read failure.
        let json_data = serde_json::from_str(&self.json_data)
            .unwrap_or(serde_json::Value::String(self.json_data));
        let calibration_id = self
            .calibration_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(CalibrationId::parse)
            .transpose()
            .map_err(model_error)?;
        Ok(EvaluationRecord::new(
            CertNo::parse(&self.cert_no).map_err(model_error)?,
            ts_from_sql(&self.created_at)?,
            json_data,
            calibration_id,
        ))
    }
}

struct ValidationRow {
    cert_no: String,
    status: String,
    approved_by: String,
    approved_at: String,
    calibration_id: String,
    tolerance_errors: Option<String>,
    cmc_errors: Option<String>,
    requirements_errors: Option<String>,
}

impl ValidationRow {
    fn decode(self) -> Result<ValidationRecord, StoreError> {
        Ok(ValidationRecord {
            cert_no: CertNo::parse(&self.cert_no).map_err(model_error)?,
            status: ValidationStatus::parse(&self.status).map_err(model_error)?,
            approved_by: self.approved_by,
            approved_at: ts_from_sql(&self.approved_at)?,
            calibration_id: CalibrationId::parse(&self.calibration_id).map_err(model_error)?,
            tolerance_errors: category_from_sql(self.tolerance_errors)?,
            cmc_errors: category_from_sql(self.cmc_errors)?,
            requirements_errors: category_from_sql(self.requirements_errors)?,
        })
    }
}

#[async_trait]
impl CertificateStore for SqliteCertificateStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn latest_evaluation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<EvaluationRecord>, StoreError> {
        let cert = cert_no.as_str().to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT cert_no, created_at, json_data, calibration_id
                     FROM evaluation_records
                     WHERE cert_no = ?1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                    params![cert],
                    |row| {
                        Ok(EvaluationRow {
                            cert_no: row.get(0)?,
                            created_at: row.get(1)?,
                            json_data: row.get(2)?,
                            calibration_id: row.get(3)?,
                        })
                    },
                )
                .optional()
                .map_err(sqlite_error)
            })
            .await?;
        row.map(EvaluationRow::decode).transpose()
    }

    async fn insert_evaluation(&self, record: &EvaluationRecord) -> Result<(), StoreError> {
        let cert = record.cert_no.as_str().to_string();
        let created_at = ts_to_sql(record.created_at);
        let json_data = record.json_data.to_string();
        let calibration_id = record
            .calibration_id
            .as_ref()
            .map(|c| c.as_str().to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO evaluation_records(cert_no, created_at, json_data, calibration_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![cert, created_at, json_data, calibration_id],
            )
            .map(|_| ())
            .map_err(sqlite_error)
        })
        .await
    }

    async fn rewrite_evaluation_created_at(
        &self,
        cert_no: &CertNo,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let cert = cert_no.as_str().to_string();
        let from = ts_to_sql(from);
        let to = ts_to_sql(to);
        let changed = self
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE evaluation_records SET created_at = ?3
                     WHERE id = (
                         SELECT id FROM evaluation_records
                         WHERE cert_no = ?1 AND created_at = ?2
                         ORDER BY id DESC LIMIT 1
                     )",
                    params![cert, from, to],
                )
                .map_err(sqlite_error)
            })
            .await?;
        debug!(cert_no = %cert_no, changed, "evaluation created_at rewrite");
        Ok(changed > 0)
    }

    async fn find_validation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<ValidationRecord>, StoreError> {
        let cert = cert_no.as_str().to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT cert_no, status, approved_by, approved_at, calibration_id,
                            tolerance_errors, cmc_errors, requirements_errors
                     FROM validation_records WHERE cert_no = ?1",
                    params![cert],
                    |row| {
                        Ok(ValidationRow {
                            cert_no: row.get(0)?,
                            status: row.get(1)?,
                            approved_by: row.get(2)?,
                            approved_at: row.get(3)?,
                            calibration_id: row.get(4)?,
                            tolerance_errors: row.get(5)?,
                            cmc_errors: row.get(6)?,
                            requirements_errors: row.get(7)?,
                        })
                    },
                )
                .optional()
                .map_err(sqlite_error)
            })
            .await?;
        row.map(ValidationRow::decode).transpose()
    }

    async fn insert_validation(&self, record: &ValidationRecord) -> Result<(), StoreError> {
        let cert = record.cert_no.as_str().to_string();
        let status = record.status.as_str();
        let approved_by = record.approved_by.clone();
        let approved_at = ts_to_sql(record.approved_at);
        let calibration_id = record.calibration_id.as_str().to_string();
        let tolerance = category_to_sql(record.tolerance_errors.as_ref())?;
        let cmc = category_to_sql(record.cmc_errors.as_ref())?;
        let requirements = category_to_sql(record.requirements_errors.as_ref())?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO validation_records(
                    cert_no, status, approved_by, approved_at, calibration_id,
                    tolerance_errors, cmc_errors, requirements_errors)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    cert,
                    status,
                    approved_by,
                    approved_at,
                    calibration_id,
                    tolerance,
                    cmc,
                    requirements
                ],
            )
            .map(|_| ())
            .map_err(sqlite_error)
        })
        .await
    }
}
