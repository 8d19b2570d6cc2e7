use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthParseError {
    #[error("month must be in YYYY-MM format, got {0:?}")]
    Format(String),
    #[error("year {0} is outside 1900..=2100")]
    YearOutOfRange(i32),
    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn into_result(self) -> Result<(), ProjectionError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProjectionError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid scenario: {0}")]
    Validation(ValidationErrors),
    #[error("mismatch: {projections} monthly projections but {spending} spending amounts")]
    LengthMismatch { projections: usize, spending: usize },
    #[error("mismatch: {projections} monthly projections but {net_income} net income rows")]
    NetIncomeMismatch { projections: usize, net_income: usize },
    #[error(transparent)]
    InvalidMonth(#[from] MonthParseError),
}
