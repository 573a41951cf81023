// SPDX-License-Identifier: Apache-2.0

use super::{ApproveCalibration, PhoenixApi, PhoenixError, RejectCalibration};
use async_trait::async_trait;
use certval_model::CertNo;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Scriptable stand-in for the external system that records every call.
#[derive(Default)]
pub struct FakePhoenix {
    pub details: Mutex<HashMap<String, Value>>,
    pub certificates: Mutex<Vec<String>>,
    pub details_failure: Mutex<Option<PhoenixError>>,
    pub reject_failure: Mutex<Option<PhoenixError>>,
    pub approve_failure: Mutex<Option<PhoenixError>>,
    pub rejects: Mutex<Vec<RejectCalibration>>,
    pub approvals: Mutex<Vec<ApproveCalibration>>,
    pub detail_calls: AtomicU64,
    pub reject_calls: AtomicU64,
    pub approve_calls: AtomicU64,
}

impl FakePhoenix {
    pub async fn set_details(&self, cert_no: &str, doc: Value) {
        self.details.lock().await.insert(cert_no.to_string(), doc);
    }

    pub async fn fail_rejects_with(&self, err: PhoenixError) {
        *self.reject_failure.lock().await = Some(err);
    }

    pub async fn fail_approvals_with(&self, err: PhoenixError) {
        *self.approve_failure.lock().await = Some(err);
    }

    #[must_use]
    pub fn reject_call_count(&self) -> u64 {
        self.reject_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn approve_call_count(&self) -> u64 {
        self.approve_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PhoenixApi for FakePhoenix {
    async fn certificate_details(&self, cert_no: &CertNo) -> Result<Value, PhoenixError> {
        self.detail_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.details_failure.lock().await.clone() {
            return Err(err);
        }
        self.details
            .lock()
            .await
            .iter()
            .find(|(k, _)| cert_no.matches_external(k))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| PhoenixError::status(404, "certificate not found"))
    }

    async fn reject_calibration(&self, request: &RejectCalibration) -> Result<(), PhoenixError> {
        self.reject_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.reject_failure.lock().await.clone() {
            return Err(err);
        }
        self.rejects.lock().await.push(request.clone());
        Ok(())
    }

    async fn approve_calibration(
        &self,
        request: &ApproveCalibration,
    ) -> Result<(), PhoenixError> {
        self.approve_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.approve_failure.lock().await.clone() {
            return Err(err);
        }
        self.approvals.lock().await.push(request.clone());
        Ok(())
    }

    async fn all_certificates(&self) -> Result<Vec<String>, PhoenixError> {
        Ok(self.certificates.lock().await.clone())
    }
}
