//! Error types for `homeroom-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// An input failed a field-level check. Always carries the offending field
  /// so callers can re-render forms with inline detail.
  #[error("validation failed on {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// A toggle was attempted on a date the subject is not active.
  #[error("subject {subject_id} is not active on {date}")]
  InactiveDate {
    subject_id: Uuid,
    date:       NaiveDate,
  },

  /// An option was supplied that does not belong to the subject.
  #[error("option {option_id} does not belong to subject {subject_id}")]
  InvalidOption {
    subject_id: Uuid,
    option_id:  Uuid,
  },

  #[error("not authorized: {0}")]
  Authorization(String),

  #[error("guardian not found: {0}")]
  GuardianNotFound(Uuid),

  #[error("learner not found: {0}")]
  LearnerNotFound(Uuid),

  #[error("group not found: {0}")]
  GroupNotFound(Uuid),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  /// A persisted unique constraint rejected a write. Toggle recovers this
  /// locally; anywhere else it surfaces as a conflict.
  #[error("uniqueness violation: {0}")]
  UniquenessViolation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
