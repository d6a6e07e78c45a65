use chrono::NaiveDate;
use gridgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::TableRef;

/// One bound of a `range` rule.
///
/// Date bounds are compared as calendar dates, never as raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    /// Numeric bound.
    Number(f64),
    /// Calendar-date bound.
    Date(NaiveDate),
}

/// Typed validation-rule payload, tagged by its condition type.
///
/// A column may carry any number of rules, including several of the same
/// type; all active rules are combined with logical AND at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition_type", rename_all = "snake_case")]
pub enum ConditionRule {
    /// Value must be present and non-empty.
    Required,
    /// Numeric value must be at least the bound.
    Min {
        /// Inclusive lower bound.
        bound: f64,
    },
    /// Numeric value must be at most the bound.
    Max {
        /// Inclusive upper bound.
        bound: f64,
    },
    /// Value must lie within an inclusive numeric or date interval.
    Range {
        /// Inclusive lower bound.
        min: RangeBound,
        /// Inclusive upper bound.
        max: RangeBound,
    },
    /// String length must lie within the present bounds.
    Length {
        /// Inclusive minimum length.
        min: Option<u64>,
        /// Inclusive maximum length.
        max: Option<u64>,
    },
    /// Value must contain the needle, case-sensitively.
    Contains {
        /// Substring to look for.
        needle: String,
    },
    /// Value must start with the prefix, case-sensitively.
    StartsWith {
        /// Required prefix.
        prefix: String,
    },
    /// Value must end with the suffix, case-sensitively.
    EndsWith {
        /// Required suffix.
        suffix: String,
    },
    /// Value must match the regular expression.
    Regex {
        /// Pattern compiled at evaluation time.
        pattern: String,
    },
    /// Value, coerced to boolean, must equal the expectation.
    Value {
        /// Expected boolean value.
        expected: bool,
    },
}

impl ConditionRule {
    /// Returns a stable storage value for the rule's condition type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Range { .. } => "range",
            Self::Length { .. } => "length",
            Self::Contains { .. } => "contains",
            Self::StartsWith { .. } => "starts_with",
            Self::EndsWith { .. } => "ends_with",
            Self::Regex { .. } => "regex",
            Self::Value { .. } => "value",
        }
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Self::Range { min, max } => match (min, max) {
                (RangeBound::Number(low), RangeBound::Number(high)) => {
                    if low > high {
                        return Err(AppError::Validation(
                            "range rule requires min <= max".to_owned(),
                        ));
                    }
                    Ok(())
                }
                (RangeBound::Date(low), RangeBound::Date(high)) => {
                    if low > high {
                        return Err(AppError::Validation(
                            "range rule requires min <= max".to_owned(),
                        ));
                    }
                    Ok(())
                }
                _ => Err(AppError::Validation(
                    "range rule bounds must both be numeric or both be dates".to_owned(),
                )),
            },
            Self::Length { min, max } => {
                if min.is_none() && max.is_none() {
                    return Err(AppError::Validation(
                        "length rule requires at least one bound".to_owned(),
                    ));
                }
                if let (Some(low), Some(high)) = (min, max)
                    && low > high
                {
                    return Err(AppError::Validation(
                        "length rule requires min <= max".to_owned(),
                    ));
                }
                Ok(())
            }
            Self::Contains { needle } => {
                if needle.is_empty() {
                    return Err(AppError::Validation(
                        "contains rule requires a non-empty needle".to_owned(),
                    ));
                }
                Ok(())
            }
            Self::StartsWith { prefix } => {
                if prefix.is_empty() {
                    return Err(AppError::Validation(
                        "starts_with rule requires a non-empty prefix".to_owned(),
                    ));
                }
                Ok(())
            }
            Self::EndsWith { suffix } => {
                if suffix.is_empty() {
                    return Err(AppError::Validation(
                        "ends_with rule requires a non-empty suffix".to_owned(),
                    ));
                }
                Ok(())
            }
            Self::Regex { pattern } => {
                if pattern.trim().is_empty() {
                    return Err(AppError::Validation(
                        "regex rule requires a non-empty pattern".to_owned(),
                    ));
                }
                Ok(())
            }
            Self::Required | Self::Min { .. } | Self::Max { .. } | Self::Value { .. } => Ok(()),
        }
    }
}

/// One validation rule attached to a column of an activated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCondition {
    table: TableRef,
    column_name: NonEmptyString,
    data_type: NonEmptyString,
    rule: ConditionRule,
    is_required: bool,
    is_active: bool,
}

impl TableCondition {
    /// Creates a validated condition.
    ///
    /// `data_type` is a snapshot of the column's catalog type taken when the
    /// condition was attached, kept for display and grouping.
    pub fn new(
        table: TableRef,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        rule: ConditionRule,
        is_required: bool,
        is_active: bool,
    ) -> AppResult<Self> {
        rule.validate()?;

        Ok(Self {
            table,
            column_name: NonEmptyString::new(column_name)?,
            data_type: NonEmptyString::new(data_type)?,
            rule,
            is_required,
            is_active,
        })
    }

    /// Returns the owning table reference.
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns the column the rule applies to.
    #[must_use]
    pub fn column_name(&self) -> &NonEmptyString {
        &self.column_name
    }

    /// Returns the snapshotted catalog data type.
    #[must_use]
    pub fn data_type(&self) -> &NonEmptyString {
        &self.data_type
    }

    /// Returns the typed rule payload.
    #[must_use]
    pub fn rule(&self) -> &ConditionRule {
        &self.rule
    }

    /// Returns whether the column is additionally treated as required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Returns whether the rule participates in validation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
