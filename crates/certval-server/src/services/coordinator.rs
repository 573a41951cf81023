// SPDX-License-Identifier: Apache-2.0

use super::errors::{DecisionError, DecisionStage};
use super::justification::synthesize_justification;
use super::notifier::{DecisionNotification, Notifier};
use super::resolver::{IdentifierResolver, ResolvedCalibrationId};
use crate::config::DecisionConfig;
use crate::phoenix::{
    ApproveCalibration, PhoenixApi, PhoenixError, RejectCalibration, UpstreamFailure,
};
use certval_model::{
    resignal_created_at, validate_error_categories, CalibrationId, CertNo, ErrorCategory,
    ValidationRecord,
};
use certval_store::{CertificateStore, StoreError};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Reviewer rejection, already authenticated and parsed.
#[derive(Debug, Clone)]
pub struct RejectCommand {
    pub cert_no: CertNo,
    pub reviewer: String,
    pub calibration_id: Option<String>,
    pub comment: Option<String>,
    pub tolerance_errors: Option<ErrorCategory>,
    pub cmc_errors: Option<ErrorCategory>,
    pub requirements_errors: Option<ErrorCategory>,
}

#[derive(Debug, Clone)]
pub struct ApproveCommand {
    pub cert_no: CertNo,
    pub reviewer: String,
    pub calibration_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug)]
pub struct DecisionOutcome {
    pub record: ValidationRecord,
    /// Comment sent to the external system, when one was sent.
    pub phoenix_comment: Option<String>,
    pub resignalled: bool,
    /// Detached webhook delivery. Dropping it does not cancel delivery.
    pub notification: Option<JoinHandle<()>>,
}

/// Applies reviewer decisions to the external system and the local store.
///
/// The external call is the source of truth: nothing is written locally
/// until it succeeds, and a local failure afterwards is logged as a partial
/// failure rather than compensated.
pub struct DecisionCoordinator {
    store: Arc<dyn CertificateStore>,
    phoenix: Arc<dyn PhoenixApi>,
    resolver: IdentifierResolver,
    notifier: Notifier,
    cfg: DecisionConfig,
}

impl DecisionCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<dyn CertificateStore>,
        phoenix: Arc<dyn PhoenixApi>,
        cfg: DecisionConfig,
    ) -> Self {
        Self {
            resolver: IdentifierResolver::new(Arc::clone(&store), Arc::clone(&phoenix)),
            notifier: Notifier::new(cfg.webhook.clone()),
            store,
            phoenix,
            cfg,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DecisionConfig {
        &self.cfg
    }

    #[instrument(skip_all, fields(cert_no = %cmd.cert_no, decision = "reject"))]
    pub async fn reject(&self, cmd: RejectCommand) -> Result<DecisionOutcome, DecisionError> {
        validate_error_categories(
            cmd.tolerance_errors.as_ref(),
            cmd.cmc_errors.as_ref(),
            cmd.requirements_errors.as_ref(),
        )?;
        let supplied = supplied_calibration_id(cmd.calibration_id.as_deref())?;
        self.ensure_undecided(&cmd.cert_no).await?;
        let resolved = self.resolve(&cmd.cert_no, supplied.as_ref()).await?;

        let comment = match non_blank(cmd.comment.as_deref()) {
            Some(comment) => comment,
            None => self.synthesized_comment(&cmd.cert_no).await,
        };
        let request = RejectCalibration {
            calibration_id: resolved.id.clone(),
            error_list_id: self.cfg.error_list_id.clone(),
            comment: comment.clone(),
        };
        self.phoenix
            .reject_calibration(&request)
            .await
            .map_err(|e| upstream_error(&cmd.cert_no, &resolved.id, &e))?;
        info!(calibration_id = %resolved.id, "phoenix accepted rejection");

        let resignalled = self.resignal(&cmd.cert_no).await?;
        let record = ValidationRecord::rejected(
            cmd.cert_no.clone(),
            resolved.id,
            cmd.reviewer,
            decision_time(),
        )
        .with_error_categories(
            cmd.tolerance_errors.as_ref(),
            cmd.cmc_errors.as_ref(),
            cmd.requirements_errors.as_ref(),
        );
        self.commit(&record).await?;
        let notification = self.notify(&record);
        Ok(DecisionOutcome {
            record,
            phoenix_comment: Some(comment),
            resignalled,
            notification,
        })
    }

    #[instrument(skip_all, fields(cert_no = %cmd.cert_no, decision = "approve"))]
    pub async fn approve(&self, cmd: ApproveCommand) -> Result<DecisionOutcome, DecisionError> {
        let supplied = supplied_calibration_id(cmd.calibration_id.as_deref())?;
        self.ensure_undecided(&cmd.cert_no).await?;
        let resolved = self.resolve(&cmd.cert_no, supplied.as_ref()).await?;

        let comment = non_blank(cmd.comment.as_deref());
        let request = ApproveCalibration {
            calibration_id: resolved.id.clone(),
            comment: comment.clone(),
        };
        self.phoenix
            .approve_calibration(&request)
            .await
            .map_err(|e| upstream_error(&cmd.cert_no, &resolved.id, &e))?;
        info!(calibration_id = %resolved.id, "phoenix accepted approval");

        let record = ValidationRecord::approved(
            cmd.cert_no.clone(),
            resolved.id,
            cmd.reviewer,
            decision_time(),
        );
        self.commit(&record).await?;
        let notification = self.notify(&record);
        Ok(DecisionOutcome {
            record,
            phoenix_comment: comment,
            resignalled: false,
            notification,
        })
    }

    pub async fn lookup(&self, cert_no: &CertNo) -> Result<Option<ValidationRecord>, DecisionError> {
        self.store
            .find_validation(cert_no)
            .await
            .map_err(|source| DecisionError::Persistence {
                cert_no: Some(cert_no.clone()),
                stage: DecisionStage::Lookup,
                source,
            })
    }

    pub async fn live_certificates(&self) -> Result<Vec<String>, DecisionError> {
        self.phoenix
            .all_certificates()
            .await
            .map_err(|e| DecisionError::Upstream {
                cert_no: None,
                calibration_id: None,
                failure: UpstreamFailure::from(&e),
            })
    }

    async fn ensure_undecided(&self, cert_no: &CertNo) -> Result<(), DecisionError> {
        match self.store.find_validation(cert_no).await {
            Ok(None) => Ok(()),
            Ok(Some(existing)) => {
                info!(status = %existing.status, "certificate already decided");
                Err(DecisionError::AlreadyDecided {
                    cert_no: cert_no.clone(),
                    status: Some(existing.status),
                })
            }
            Err(source) => {
                error!(error = %source, "idempotency check failed");
                Err(DecisionError::Persistence {
                    cert_no: Some(cert_no.clone()),
                    stage: DecisionStage::IdempotencyCheck,
                    source,
                })
            }
        }
    }

    async fn resolve(
        &self,
        cert_no: &CertNo,
        supplied: Option<&CalibrationId>,
    ) -> Result<ResolvedCalibrationId, DecisionError> {
        let resolved = self
            .resolver
            .resolve(cert_no, supplied)
            .await
            .ok_or_else(|| DecisionError::CalibrationIdNotFound {
                cert_no: cert_no.clone(),
            })?;
        info!(
            calibration_id = %resolved.id,
            source = resolved.source.as_str(),
            "calibration id resolved"
        );
        Ok(resolved)
    }

    async fn synthesized_comment(&self, cert_no: &CertNo) -> String {
        let evaluation = match self.store.latest_evaluation(cert_no).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(error = %e, "evaluation unavailable for justification");
                None
            }
        };
        synthesize_justification(cert_no, evaluation.as_ref().map(|e| &e.json_data))
    }

    /// Moves the latest evaluation back so the batch orchestrator picks the
    /// certificate up again. Runs only after the external call succeeded.
    async fn resignal(&self, cert_no: &CertNo) -> Result<bool, DecisionError> {
        let latest = self
            .store
            .latest_evaluation(cert_no)
            .await
            .map_err(|e| partial_failure(cert_no, DecisionStage::Resignal, e))?;
        let Some(evaluation) = latest else {
            warn!("no evaluation to resignal");
            return Ok(false);
        };
        let Some(target) = resignal_created_at(evaluation.created_at) else {
            warn!(created_at = %evaluation.created_at, "resignal timestamp out of range");
            return Ok(false);
        };
        let moved = self
            .store
            .rewrite_evaluation_created_at(cert_no, evaluation.created_at, target)
            .await
            .map_err(|e| partial_failure(cert_no, DecisionStage::Resignal, e))?;
        if moved {
            info!(from = %evaluation.created_at, to = %target, "evaluation resignalled");
        } else {
            warn!(created_at = %evaluation.created_at, "evaluation changed before resignal");
        }
        Ok(moved)
    }

    async fn commit(&self, record: &ValidationRecord) -> Result<(), DecisionError> {
        match self.store.insert_validation(record).await {
            Ok(()) => {
                info!(status = %record.status, "decision recorded");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                let status = self
                    .store
                    .find_validation(&record.cert_no)
                    .await
                    .ok()
                    .flatten()
                    .map(|existing| existing.status);
                warn!(
                    partial_failure = true,
                    "concurrent decision won the insert after phoenix accepted this one"
                );
                Err(DecisionError::AlreadyDecided {
                    cert_no: record.cert_no.clone(),
                    status,
                })
            }
            Err(e) => Err(partial_failure(&record.cert_no, DecisionStage::Insert, e)),
        }
    }

    fn notify(&self, record: &ValidationRecord) -> Option<JoinHandle<()>> {
        self.notifier.dispatch(DecisionNotification::new(
            &record.cert_no,
            &record.approved_by,
            record.approved_at,
            &self.cfg.report_base_url,
        ))
    }
}

fn partial_failure(cert_no: &CertNo, stage: DecisionStage, source: StoreError) -> DecisionError {
    error!(
        partial_failure = true,
        stage = stage.as_str(),
        error = %source,
        "phoenix accepted the decision but the local store did not"
    );
    DecisionError::Persistence {
        cert_no: Some(cert_no.clone()),
        stage,
        source,
    }
}

fn upstream_error(cert_no: &CertNo, id: &CalibrationId, err: &PhoenixError) -> DecisionError {
    let failure = UpstreamFailure::from(err);
    warn!(calibration_id = %id, error = %err, "phoenix refused decision");
    DecisionError::Upstream {
        cert_no: Some(cert_no.clone()),
        calibration_id: Some(id.clone()),
        failure,
    }
}

/// A non-blank caller id must be usable as given; it is never swapped for a
/// stored one.
fn supplied_calibration_id(raw: Option<&str>) -> Result<Option<CalibrationId>, DecisionError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(id) => CalibrationId::parse(&id)
            .map(Some)
            .map_err(|e| DecisionError::InvalidRequest(e.to_string())),
    }
}

fn non_blank(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Microsecond precision matches what the store persists.
fn decision_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
