// SPDX-License-Identifier: Apache-2.0

use crate::phoenix::{PhoenixApi, CERT_NO_FIELDS};
use certval_model::{CalibrationId, CertNo};
use certval_store::CertificateStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Spellings of the calibration handle seen in certificate detail documents,
/// in lookup order.
pub const CALIBRATION_ID_FIELDS: &[&str] = &[
    "CalibrationId",
    "calibrationId",
    "CalibrationID",
    "calibrationID",
    "calibration_id",
    "Calibration_Id",
    "CalibrationNo",
    "calibrationNo",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationIdSource {
    Supplied,
    Evaluation,
    PriorValidation,
    Phoenix,
}

impl CalibrationIdSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supplied => "supplied",
            Self::Evaluation => "evaluation",
            Self::PriorValidation => "prior_validation",
            Self::Phoenix => "phoenix",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCalibrationId {
    pub id: CalibrationId,
    pub source: CalibrationIdSource,
}

/// Finds the external calibration handle for a certificate.
///
/// Sources are tried in a fixed order and the first hit wins: caller value,
/// latest evaluation, a prior decision, then the external detail lookup.
/// Failures of individual sources are logged and skipped; only exhausting
/// every source yields `None`.
#[derive(Clone)]
pub struct IdentifierResolver {
    store: Arc<dyn CertificateStore>,
    phoenix: Arc<dyn PhoenixApi>,
}

impl IdentifierResolver {
    #[must_use]
    pub fn new(store: Arc<dyn CertificateStore>, phoenix: Arc<dyn PhoenixApi>) -> Self {
        Self { store, phoenix }
    }

    pub async fn resolve(
        &self,
        cert_no: &CertNo,
        supplied: Option<&CalibrationId>,
    ) -> Option<ResolvedCalibrationId> {
        if let Some(id) = supplied {
            return Some(resolved(id.clone(), CalibrationIdSource::Supplied));
        }

        match self.store.latest_evaluation(cert_no).await {
            Ok(Some(evaluation)) => {
                if let Some(id) = evaluation.calibration_id {
                    return Some(resolved(id, CalibrationIdSource::Evaluation));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(cert_no = %cert_no, error = %e, "evaluation lookup failed"),
        }

        match self.store.find_validation(cert_no).await {
            Ok(Some(prior)) => {
                return Some(resolved(
                    prior.calibration_id,
                    CalibrationIdSource::PriorValidation,
                ))
            }
            Ok(None) => {}
            Err(e) => warn!(cert_no = %cert_no, error = %e, "prior validation lookup failed"),
        }

        match self.phoenix.certificate_details(cert_no).await {
            Ok(doc) => {
                if let Some(id) = calibration_id_from_details(cert_no, &doc) {
                    return Some(resolved(id, CalibrationIdSource::Phoenix));
                }
                debug!(cert_no = %cert_no, "phoenix details carry no calibration id");
            }
            Err(e) => warn!(cert_no = %cert_no, error = %e, "phoenix detail lookup failed"),
        }
        None
    }
}

fn resolved(id: CalibrationId, source: CalibrationIdSource) -> ResolvedCalibrationId {
    ResolvedCalibrationId { id, source }
}

/// First non-empty calibration handle in a certificate detail document.
///
/// The document may be the certificate object itself, wrap it in `data` or
/// `certificate`, or be a list of certificates. From a list only the entry
/// whose number matches `cert_no` is used, or a lone entry that carries no
/// number at all.
#[must_use]
pub fn calibration_id_from_details(cert_no: &CertNo, doc: &Value) -> Option<CalibrationId> {
    let root = match doc {
        Value::Array(items) => select_certificate(cert_no, items)?,
        Value::Object(map) => map,
        _ => return None,
    };
    let mut candidates = vec![root];
    for key in ["data", "certificate", "Certificate"] {
        match root.get(key) {
            Some(Value::Object(inner)) => candidates.push(inner),
            Some(Value::Array(items)) => {
                if let Some(inner) = select_certificate(cert_no, items) {
                    candidates.push(inner);
                }
            }
            _ => {}
        }
    }
    candidates
        .into_iter()
        .find_map(|map| first_string_field(map, CALIBRATION_ID_FIELDS))
        .and_then(|raw| CalibrationId::parse(&raw).ok())
}

fn select_certificate<'a>(cert_no: &CertNo, items: &'a [Value]) -> Option<&'a Map<String, Value>> {
    let objects = || items.iter().filter_map(Value::as_object);
    if let Some(found) = objects().find(|map| {
        first_string_field(map, CERT_NO_FIELDS).is_some_and(|n| cert_no.matches_external(&n))
    }) {
        return Some(found);
    }
    let mut rest = objects();
    match (rest.next(), rest.next()) {
        (Some(only), None) if first_string_field(only, CERT_NO_FIELDS).is_none() => Some(only),
        _ => None,
    }
}

fn first_string_field(map: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        map.get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}
