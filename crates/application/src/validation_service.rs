use std::sync::Arc;

use chrono::NaiveDate;
use gridgate_core::{AppError, AppResult, FieldError, ValidationErrors};
use gridgate_domain::{ConditionRule, RangeBound, TableCondition};
use serde_json::{Map, Value};

use crate::gateway_ports::ConditionRepository;

/// Result of evaluating every active condition against one record.
///
/// All rules are evaluated; a failing rule never short-circuits the rest, so
/// callers receive the complete set of field failures in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    /// Returns whether every rule passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the collected field failures.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Converts the report into a result, failing with `ValidationFailed`
    /// when any rule did not pass.
    pub fn into_result(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(ValidationErrors(self.errors)))
        }
    }
}

/// Application service evaluating the active conditions of a table against
/// candidate records.
#[derive(Clone)]
pub struct ValidationService {
    conditions: Arc<dyn ConditionRepository>,
}

impl ValidationService {
    /// Creates a new validation service from a condition repository.
    #[must_use]
    pub fn new(conditions: Arc<dyn ConditionRepository>) -> Self {
        Self { conditions }
    }

    /// Evaluates every active condition of the table against the record.
    ///
    /// Rules combine with logical AND: adding a rule can only add failures,
    /// never mask one. Columns without conditions are accepted untouched.
    pub async fn validate(
        &self,
        database_name: &str,
        table_name: &str,
        record: &Map<String, Value>,
    ) -> AppResult<ValidationReport> {
        let conditions = self
            .conditions
            .list_active_conditions(database_name, table_name)
            .await?;

        Ok(evaluate(&conditions, record))
    }
}

fn evaluate(conditions: &[TableCondition], record: &Map<String, Value>) -> ValidationReport {
    let mut errors = Vec::new();

    for condition in conditions {
        let column = condition.column_name().as_str();
        let value = record.get(column);

        if condition.is_required()
            && !matches!(condition.rule(), ConditionRule::Required)
            && is_blank(value)
        {
            errors.push(FieldError::new(column, "value is required"));
        }

        if let Some(error) = check_rule(condition.rule(), column, value) {
            errors.push(error);
        }
    }

    ValidationReport { errors }
}

/// Evaluates one rule against one optional column value.
///
/// Absent, null and blank values satisfy every rule except `required`;
/// presence is enforced separately so optional columns stay optional.
/// Present values that cannot be coerced to the rule's shape fail the
/// field rather than passing silently.
fn check_rule(rule: &ConditionRule, column: &str, value: Option<&Value>) -> Option<FieldError> {
    if matches!(rule, ConditionRule::Required) {
        return if is_blank(value) {
            Some(FieldError::new(column, "value is required"))
        } else {
            None
        };
    }

    if is_blank(value) {
        return None;
    }

    let value = value?;

    match rule {
        ConditionRule::Required => None,
        ConditionRule::Min { bound } => match as_number(value) {
            Some(number) if number >= *bound => None,
            Some(number) => Some(FieldError::new(
                column,
                format!("value {number} is below the minimum of {bound}"),
            )),
            None => Some(numeric_coercion_error(column, value)),
        },
        ConditionRule::Max { bound } => match as_number(value) {
            Some(number) if number <= *bound => None,
            Some(number) => Some(FieldError::new(
                column,
                format!("value {number} exceeds the maximum of {bound}"),
            )),
            None => Some(numeric_coercion_error(column, value)),
        },
        ConditionRule::Range { min, max } => check_range(column, value, min, max),
        ConditionRule::Length { min, max } => {
            let Some(text) = as_text(value) else {
                return Some(text_coercion_error(column));
            };
            let length = text.chars().count() as u64;
            if let Some(low) = min
                && length < *low
            {
                return Some(FieldError::new(
                    column,
                    format!("length {length} is below the minimum of {low}"),
                ));
            }
            if let Some(high) = max
                && length > *high
            {
                return Some(FieldError::new(
                    column,
                    format!("length {length} exceeds the maximum of {high}"),
                ));
            }
            None
        }
        ConditionRule::Contains { needle } => {
            let Some(text) = as_text(value) else {
                return Some(text_coercion_error(column));
            };
            if text.contains(needle.as_str()) {
                None
            } else {
                Some(FieldError::new(
                    column,
                    format!("value must contain '{needle}'"),
                ))
            }
        }
        ConditionRule::StartsWith { prefix } => {
            let Some(text) = as_text(value) else {
                return Some(text_coercion_error(column));
            };
            if text.starts_with(prefix.as_str()) {
                None
            } else {
                Some(FieldError::new(
                    column,
                    format!("value must start with '{prefix}'"),
                ))
            }
        }
        ConditionRule::EndsWith { suffix } => {
            let Some(text) = as_text(value) else {
                return Some(text_coercion_error(column));
            };
            if text.ends_with(suffix.as_str()) {
                None
            } else {
                Some(FieldError::new(
                    column,
                    format!("value must end with '{suffix}'"),
                ))
            }
        }
        ConditionRule::Regex { pattern } => {
            let Some(text) = as_text(value) else {
                return Some(text_coercion_error(column));
            };
            match regex::Regex::new(pattern) {
                Ok(compiled) => {
                    if compiled.is_match(&text) {
                        None
                    } else {
                        Some(FieldError::new(
                            column,
                            format!("value does not match pattern '{pattern}'"),
                        ))
                    }
                }
                // A broken stored pattern fails the field rather than the
                // whole request.
                Err(_) => Some(FieldError::new(
                    column,
                    format!("stored pattern '{pattern}' is not a valid regular expression"),
                )),
            }
        }
        ConditionRule::Value { expected } => match as_bool(value) {
            Some(actual) if actual == *expected => None,
            Some(actual) => Some(FieldError::new(
                column,
                format!("value must be {expected}, got {actual}"),
            )),
            None => Some(FieldError::new(
                column,
                "value cannot be interpreted as a boolean",
            )),
        },
    }
}

fn check_range(
    column: &str,
    value: &Value,
    min: &RangeBound,
    max: &RangeBound,
) -> Option<FieldError> {
    match (min, max) {
        (RangeBound::Number(low), RangeBound::Number(high)) => match as_number(value) {
            Some(number) if number >= *low && number <= *high => None,
            Some(number) => Some(FieldError::new(
                column,
                format!("value {number} is outside the range {low}..={high}"),
            )),
            None => Some(numeric_coercion_error(column, value)),
        },
        (RangeBound::Date(low), RangeBound::Date(high)) => match as_date(value) {
            Some(date) if date >= *low && date <= *high => None,
            Some(date) => Some(FieldError::new(
                column,
                format!("date {date} is outside the range {low}..={high}"),
            )),
            None => Some(FieldError::new(
                column,
                "value cannot be interpreted as a calendar date",
            )),
        },
        // Mixed bounds are rejected at construction time.
        _ => Some(FieldError::new(column, "range rule has inconsistent bounds")),
    }
}

fn numeric_coercion_error(column: &str, value: &Value) -> FieldError {
    FieldError::new(
        column,
        format!("value {value} cannot be interpreted as a number"),
    )
}

fn text_coercion_error(column: &str) -> FieldError {
    FieldError::new(column, "value cannot be interpreted as text")
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use gridgate_core::AppResult;
    use gridgate_domain::{ConditionRule, RangeBound, TableCondition, TableRef};
    use serde_json::{Map, Value, json};

    use crate::gateway_ports::ConditionRepository;

    use super::{ValidationService, check_rule, evaluate};

    struct FakeConditionRepository {
        conditions: Vec<TableCondition>,
    }

    #[async_trait]
    impl ConditionRepository for FakeConditionRepository {
        async fn save_condition(&self, _condition: TableCondition) -> AppResult<i64> {
            unimplemented!("not exercised by validation tests")
        }

        async fn delete_condition(&self, _condition_id: i64) -> AppResult<()> {
            unimplemented!("not exercised by validation tests")
        }

        async fn list_conditions(
            &self,
            _database_name: &str,
            _table_name: &str,
        ) -> AppResult<Vec<(i64, TableCondition)>> {
            unimplemented!("not exercised by validation tests")
        }

        async fn list_active_conditions(
            &self,
            _database_name: &str,
            _table_name: &str,
        ) -> AppResult<Vec<TableCondition>> {
            Ok(self.conditions.clone())
        }
    }

    fn table() -> TableRef {
        TableRef::new("hr", "employees").unwrap_or_else(|_| unreachable!())
    }

    fn condition(column: &str, data_type: &str, rule: ConditionRule) -> TableCondition {
        TableCondition::new(table(), column, data_type, rule, false, true)
            .unwrap_or_else(|_| unreachable!())
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn employee_record_passing_every_rule_is_valid() {
        let service = ValidationService::new(Arc::new(FakeConditionRepository {
            conditions: vec![
                condition("email", "text", ConditionRule::Required),
                condition(
                    "email",
                    "text",
                    ConditionRule::EndsWith {
                        suffix: "@corp.example".to_owned(),
                    },
                ),
                condition(
                    "salary",
                    "numeric",
                    ConditionRule::Range {
                        min: RangeBound::Number(1000.0),
                        max: RangeBound::Number(100_000.0),
                    },
                ),
            ],
        }));

        let report = service
            .validate(
                "hr",
                "employees",
                &record(json!({
                    "email": "ana@corp.example",
                    "salary": 52_000,
                })),
            )
            .await;
        assert!(report.is_ok());
        assert!(report.unwrap_or_default().is_valid());
    }

    #[tokio::test]
    async fn all_failures_are_reported_without_short_circuit() {
        let service = ValidationService::new(Arc::new(FakeConditionRepository {
            conditions: vec![
                condition("email", "text", ConditionRule::Required),
                condition("salary", "numeric", ConditionRule::Min { bound: 1000.0 }),
            ],
        }));

        let report = service
            .validate("hr", "employees", &record(json!({ "salary": 500 })))
            .await;
        assert!(report.is_ok());
        let report = report.unwrap_or_default();
        assert_eq!(report.errors().len(), 2);
    }

    #[test]
    fn two_min_rules_on_one_column_both_apply() {
        let conditions = vec![
            condition("salary", "numeric", ConditionRule::Min { bound: 1000.0 }),
            condition("salary", "numeric", ConditionRule::Min { bound: 2000.0 }),
        ];

        // 1500 satisfies the first bound but not the second.
        let report = evaluate(&conditions, &record(json!({ "salary": 1500 })));
        assert_eq!(report.errors().len(), 1);

        let report = evaluate(&conditions, &record(json!({ "salary": 2500 })));
        assert!(report.is_valid());
    }

    #[test]
    fn non_numeric_value_fails_numeric_rules() {
        let error = check_rule(
            &ConditionRule::Min { bound: 10.0 },
            "salary",
            Some(&json!("plenty")),
        );
        assert!(error.is_some());
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let error = check_rule(
            &ConditionRule::Min { bound: 10.0 },
            "salary",
            Some(&json!("12.5")),
        );
        assert!(error.is_none());
    }

    #[test]
    fn date_range_compares_calendar_dates() {
        let low = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_else(|| unreachable!());
        let high = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_else(|| unreachable!());
        let rule = ConditionRule::Range {
            min: RangeBound::Date(low),
            max: RangeBound::Date(high),
        };

        assert!(check_rule(&rule, "hired_on", Some(&json!("2024-06-15"))).is_none());
        assert!(check_rule(&rule, "hired_on", Some(&json!("2025-01-01"))).is_some());
        assert!(check_rule(&rule, "hired_on", Some(&json!("not a date"))).is_some());
    }

    #[test]
    fn substring_rules_are_case_sensitive() {
        let rule = ConditionRule::Contains {
            needle: "Corp".to_owned(),
        };

        assert!(check_rule(&rule, "company", Some(&json!("MegaCorp"))).is_none());
        assert!(check_rule(&rule, "company", Some(&json!("megacorp"))).is_some());
    }

    #[test]
    fn uncompilable_pattern_fails_the_field() {
        let rule = ConditionRule::Regex {
            pattern: "[unclosed".to_owned(),
        };

        let error = check_rule(&rule, "code", Some(&json!("anything")));
        assert!(error.is_some());
    }

    #[test]
    fn boolean_rule_coerces_common_spellings() {
        let rule = ConditionRule::Value { expected: true };

        assert!(check_rule(&rule, "active", Some(&json!(true))).is_none());
        assert!(check_rule(&rule, "active", Some(&json!("true"))).is_none());
        assert!(check_rule(&rule, "active", Some(&json!(1))).is_none());
        assert!(check_rule(&rule, "active", Some(&json!(false))).is_some());
        assert!(check_rule(&rule, "active", Some(&json!("maybe"))).is_some());
    }

    #[test]
    fn non_textual_values_fail_string_shaped_rules() {
        let rules = [
            ConditionRule::Length {
                min: Some(1),
                max: None,
            },
            ConditionRule::Contains {
                needle: "x".to_owned(),
            },
            ConditionRule::StartsWith {
                prefix: "x".to_owned(),
            },
            ConditionRule::EndsWith {
                suffix: "x".to_owned(),
            },
            ConditionRule::Regex {
                pattern: "^x".to_owned(),
            },
        ];

        for rule in &rules {
            assert!(check_rule(rule, "tags", Some(&json!([1, 2, 3]))).is_some());
            assert!(check_rule(rule, "tags", Some(&json!({ "nested": true }))).is_some());
        }
    }

    #[test]
    fn blank_values_satisfy_non_required_rules() {
        let rule = ConditionRule::Min { bound: 10.0 };

        assert!(check_rule(&rule, "salary", None).is_none());
        assert!(check_rule(&rule, "salary", Some(&Value::Null)).is_none());
        assert!(check_rule(&rule, "salary", Some(&json!("   "))).is_none());
    }

    #[test]
    fn required_rejects_blank_values() {
        assert!(check_rule(&ConditionRule::Required, "email", None).is_some());
        assert!(check_rule(&ConditionRule::Required, "email", Some(&Value::Null)).is_some());
        assert!(check_rule(&ConditionRule::Required, "email", Some(&json!(""))).is_some());
        assert!(check_rule(&ConditionRule::Required, "email", Some(&json!("a@b.c"))).is_none());
    }

    mod properties {
        use proptest::prelude::*;
        use serde_json::json;

        use super::{ConditionRule, condition, evaluate, record};

        proptest! {
            // Rules combine with AND: appending a rule never removes failures.
            #[test]
            fn adding_a_rule_never_hides_a_failure(
                value in -1_000_000.0_f64..1_000_000.0,
                first in -1_000.0_f64..1_000.0,
                second in -1_000.0_f64..1_000.0,
            ) {
                let base = vec![condition(
                    "amount",
                    "numeric",
                    ConditionRule::Min { bound: first },
                )];
                let mut extended = base.clone();
                extended.push(condition(
                    "amount",
                    "numeric",
                    ConditionRule::Max { bound: second },
                ));

                let row = record(json!({ "amount": value }));
                let before = evaluate(&base, &row).errors().len();
                let after = evaluate(&extended, &row).errors().len();
                prop_assert!(after >= before);
            }
        }
    }
}
