// SPDX-License-Identifier: Apache-2.0

use crate::ErrorCategory;
use std::fmt::{Display, Formatter};

/// Sentinel code that requires accompanying free text.
pub const ANOTHER_REASON: &str = "another_reason";

pub const TOLERANCE_CODES: &[&str] = &[
    "Tolerance_applied_fail",
    "Tolerance_not_applied",
    "Tolerance_value_incorrect",
    "Tolerance_unit_mismatch",
    "Tolerance_source_missing",
    ANOTHER_REASON,
];

pub const CMC_CODES: &[&str] = &[
    "CMC_exceeds_uncertainty",
    "CMC_not_declared",
    "CMC_scope_mismatch",
    "CMC_unit_mismatch",
    ANOTHER_REASON,
];

pub const REQUIREMENTS_CODES: &[&str] = &[
    "Requirement_missing_information",
    "Requirement_traceability_missing",
    "Requirement_environmental_conditions",
    "Requirement_procedure_missing",
    "Requirement_signature_missing",
    ANOTHER_REASON,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCategoryKind {
    Tolerance,
    Cmc,
    Requirements,
}

impl ErrorCategoryKind {
    pub const ALL: [Self; 3] = [Self::Tolerance, Self::Cmc, Self::Requirements];

    /// Request and storage field carrying this category.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Tolerance => "tolerance_errors",
            Self::Cmc => "cmc_errors",
            Self::Requirements => "requirements_errors",
        }
    }

    #[must_use]
    pub const fn allowed_codes(self) -> &'static [&'static str] {
        match self {
            Self::Tolerance => TOLERANCE_CODES,
            Self::Cmc => CMC_CODES,
            Self::Requirements => REQUIREMENTS_CODES,
        }
    }

    pub fn validate(self, category: &ErrorCategory) -> Result<(), CodeValidationError> {
        validate_codes(
            self.field_name(),
            &category.codes,
            category.another_reason.as_deref(),
            self.allowed_codes(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodeValidationError {
    EmptyCodes { field: String },
    UnknownCode { field: String, code: String },
    MissingJustification { field: String },
}

impl CodeValidationError {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::EmptyCodes { field }
            | Self::UnknownCode { field, .. }
            | Self::MissingJustification { field } => field,
        }
    }

    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::EmptyCodes { .. } => "empty_codes",
            Self::UnknownCode { .. } => "unknown_code",
            Self::MissingJustification { .. } => "missing_justification",
        }
    }
}

impl Display for CodeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCodes { field } => {
                write!(f, "{field}.codes must contain at least one code")
            }
            Self::UnknownCode { field, code } => {
                write!(f, "{field}.codes contains unknown code: {code}")
            }
            Self::MissingJustification { field } => write!(
                f,
                "{field}.another_reason is required when `{ANOTHER_REASON}` is selected"
            ),
        }
    }
}

impl std::error::Error for CodeValidationError {}

/// Checks one category's codes against its closed enumeration.
pub fn validate_codes(
    field: &str,
    codes: &[String],
    another_reason: Option<&str>,
    allowed: &[&str],
) -> Result<(), CodeValidationError> {
    if codes.is_empty() {
        return Err(CodeValidationError::EmptyCodes {
            field: field.to_string(),
        });
    }
    if let Some(unknown) = codes.iter().find(|c| !allowed.contains(&c.as_str())) {
        return Err(CodeValidationError::UnknownCode {
            field: field.to_string(),
            code: unknown.clone(),
        });
    }
    let justified = another_reason.is_some_and(|s| !s.trim().is_empty());
    if codes.iter().any(|c| c == ANOTHER_REASON) && !justified {
        return Err(CodeValidationError::MissingJustification {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates every supplied category; absent categories are valid.
pub fn validate_error_categories(
    tolerance: Option<&ErrorCategory>,
    cmc: Option<&ErrorCategory>,
    requirements: Option<&ErrorCategory>,
) -> Result<(), CodeValidationError> {
    let supplied = [
        (ErrorCategoryKind::Tolerance, tolerance),
        (ErrorCategoryKind::Cmc, cmc),
        (ErrorCategoryKind::Requirements, requirements),
    ];
    for (kind, category) in supplied {
        if let Some(category) = category {
            kind.validate(category)?;
        }
    }
    Ok(())
}
