//! Declarative checks applied to every calculation request before a formula runs.

use serde::Serialize;
use std::fmt::{self, Display};

/// A single rejected field together with the constraint it broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Every violation found in a request; never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_violations(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn is_about(&self, field: &str) -> bool {
        self.violations.iter().any(|violation| violation.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Implemented by every request record; formulas may assume a request that passed.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Collects violations so a caller sees every bad field in one response.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive range check.
    pub fn range<T>(&mut self, field: &'static str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + Display + Copy,
    {
        // NaN fails both comparisons, so test for containment rather than exclusion.
        if !(value >= min && value <= max) {
            self.violations.push(FieldViolation {
                field,
                message: format!("must be between {min} and {max} (got {value})"),
            });
        }
        self
    }

    pub fn optional_range<T>(
        &mut self,
        field: &'static str,
        value: Option<T>,
        min: T,
        max: T,
    ) -> &mut Self
    where
        T: PartialOrd + Display + Copy,
    {
        if let Some(value) = value {
            self.range(field, value, min, max);
        }
        self
    }

    /// Records `message` against `field` unless `condition` holds.
    pub fn ensure(
        &mut self,
        condition: bool,
        field: &'static str,
        message: impl Into<String>,
    ) -> &mut Self {
        if !condition {
            self.violations.push(FieldViolation {
                field,
                message: message.into(),
            });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: std::mem::take(&mut self.violations),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_accepts_inclusive_bounds() {
        let result = Validator::new()
            .range("age", 18, 18, 120)
            .range("age", 120, 18, 120)
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let error = Validator::new()
            .range("age", 15, 18, 120)
            .range("serum_creatinine", 25.0, 0.1, 20.0)
            .ensure(false, "diastolic_bp", "must not exceed systolic_bp")
            .finish()
            .expect_err("three violations");

        assert_eq!(error.violations().len(), 3);
        assert!(error.is_about("serum_creatinine"));
        assert_eq!(
            error.violations()[0].message,
            "must be between 18 and 120 (got 15)"
        );
    }

    #[test]
    fn nan_is_never_in_range() {
        let error = Validator::new()
            .range("ph", f64::NAN, 6.8, 7.8)
            .finish()
            .expect_err("nan rejected");
        assert!(error.is_about("ph"));
    }

    #[test]
    fn optional_range_skips_missing_values() {
        assert!(Validator::new()
            .optional_range::<f64>("po2", None, 30.0, 600.0)
            .finish()
            .is_ok());
        assert!(Validator::new()
            .optional_range("po2", Some(10.0), 30.0, 600.0)
            .finish()
            .is_err());
    }

    #[test]
    fn display_joins_violations() {
        let error = Validator::new()
            .ensure(false, "a", "is wrong")
            .ensure(false, "b", "is also wrong")
            .finish()
            .expect_err("two violations");
        assert_eq!(error.to_string(), "a is wrong; b is also wrong");
        let as_error: &dyn std::error::Error = &error;
        assert!(as_error.source().is_none());
    }
}
