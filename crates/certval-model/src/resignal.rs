// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Months, Utc};

/// Calendar months an evaluation timestamp is moved back to re-queue it.
pub const RESIGNAL_MONTHS: u32 = 24;

/// Timestamp the orchestrator reads as "stale, re-evaluate".
///
/// Calendar arithmetic, not a fixed day count: `2024-03-01` becomes
/// `2022-03-01`, and `2024-02-29` clamps to `2022-02-28`. Time of day is kept.
#[must_use]
pub fn resignal_created_at(created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    created_at.checked_sub_months(Months::new(RESIGNAL_MONTHS))
}
