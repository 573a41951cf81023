// SPDX-License-Identifier: Apache-2.0

use crate::{CertificateStore, StoreError, StoreErrorCode};
use async_trait::async_trait;
use certval_model::{CertNo, EvaluationRecord, ValidationRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// In-process backend with switchable failure modes.
#[derive(Default)]
pub struct MemoryCertificateStore {
    evaluations: Mutex<Vec<EvaluationRecord>>,
    validations: Mutex<BTreeMap<CertNo, ValidationRecord>>,
    pub fail_reads: AtomicBool,
    pub fail_rewrites: AtomicBool,
    pub fail_validation_inserts: AtomicBool,
}

impl MemoryCertificateStore {
    pub async fn evaluations_for(&self, cert_no: &CertNo) -> Vec<EvaluationRecord> {
        self.evaluations
            .lock()
            .await
            .iter()
            .filter(|r| &r.cert_no == cert_no)
            .cloned()
            .collect()
    }

    pub async fn validation_count(&self) -> usize {
        self.validations.lock().await.len()
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::Relaxed) {
            return Err(StoreError::new(
                StoreErrorCode::Io,
                format!("injected {what} failure"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn latest_evaluation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<EvaluationRecord>, StoreError> {
        Self::injected(&self.fail_reads, "read")?;
        Ok(self
            .evaluations
            .lock()
            .await
            .iter()
            .filter(|r| &r.cert_no == cert_no)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn insert_evaluation(&self, record: &EvaluationRecord) -> Result<(), StoreError> {
        self.evaluations.lock().await.push(record.clone());
        Ok(())
    }

    async fn rewrite_evaluation_created_at(
        &self,
        cert_no: &CertNo,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Self::injected(&self.fail_rewrites, "rewrite")?;
        let mut rows = self.evaluations.lock().await;
        match rows
            .iter_mut()
            .rev()
            .find(|r| &r.cert_no == cert_no && r.created_at == from)
        {
            Some(row) => {
                row.created_at = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_validation(
        &self,
        cert_no: &CertNo,
    ) -> Result<Option<ValidationRecord>, StoreError> {
        Self::injected(&self.fail_reads, "read")?;
        Ok(self.validations.lock().await.get(cert_no).cloned())
    }

    async fn insert_validation(&self, record: &ValidationRecord) -> Result<(), StoreError> {
        Self::injected(&self.fail_validation_inserts, "insert")?;
        let mut rows = self.validations.lock().await;
        if rows.contains_key(&record.cert_no) {
            return Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("validation record already exists for {}", record.cert_no),
            ));
        }
        rows.insert(record.cert_no.clone(), record.clone());
        Ok(())
    }
}
