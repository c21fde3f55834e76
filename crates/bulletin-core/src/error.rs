//! Error types for roster import and configuration.
//!
//! The indicator engine itself never fails; these cover the boundaries
//! around it. They are returned inside `anyhow::Error` and can be recovered
//! with `downcast_ref` when a caller needs to branch on the kind.

use thiserror::Error;

use crate::model::Subject;

/// Errors raised while importing a roster file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A mandatory column is missing from the CSV header.
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    /// A row has an unrecognised sex value.
    #[error("row {row}: unknown sex '{value}'")]
    InvalidSex { row: usize, value: String },

    /// A score cell is not a number.
    #[error("row {row}: invalid score '{value}' for {subject}")]
    InvalidScore {
        row: usize,
        subject: Subject,
        value: String,
    },

    /// The general average cell is not a number.
    #[error("row {row}: invalid general average '{value}'")]
    InvalidAverage { row: usize, value: String },

    /// A required cell is empty.
    #[error("row {row}: empty {column}")]
    EmptyField { row: usize, column: &'static str },
}

/// Errors raised when an indicator configuration is inconsistent.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No subject would be analysed.
    #[error("subject list is empty")]
    EmptySubjectList,

    /// The same subject is listed twice.
    #[error("subject {0} is listed more than once")]
    DuplicateSubject(Subject),

    /// A threshold table is not strictly ordered from best to worst.
    #[error("{table} thresholds are out of order")]
    ThresholdsOutOfOrder { table: &'static str },

    /// A mark lies outside `(0, max_score]`.
    #[error("{name} = {value} is outside (0, {max}]")]
    MarkOutOfRange {
        name: &'static str,
        value: f64,
        max: f64,
    },
}

impl ImportError {
    /// The 1-based data row the error refers to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::MissingColumn(_) => None,
            ImportError::InvalidSex { row, .. }
            | ImportError::InvalidScore { row, .. }
            | ImportError::InvalidAverage { row, .. }
            | ImportError::EmptyField { row, .. } => Some(*row),
        }
    }
}
