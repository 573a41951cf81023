// SPDX-License-Identifier: Apache-2.0

pub(crate) mod coordinator;
pub(crate) mod errors;
pub(crate) mod justification;
pub(crate) mod notifier;
pub(crate) mod resolver;

pub use coordinator::{ApproveCommand, DecisionCoordinator, DecisionOutcome, RejectCommand};
pub use errors::{DecisionError, DecisionStage};
pub use justification::synthesize_justification;
pub use notifier::{report_url, DecisionNotification, Notifier};
pub use resolver::{
    calibration_id_from_details, CalibrationIdSource, IdentifierResolver, ResolvedCalibrationId,
    CALIBRATION_ID_FIELDS,
};
