//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a store failure; the status code is derived when the response is
  /// rendered.
  pub fn store<E>(e: E) -> Self
  where E: std::error::Error + Send + Sync + 'static {
    Self::Store(Box::new(e))
  }
}

/// Classify a store failure by locating the domain error in its source
/// chain. Backends wrap [`homeroom_core::Error`] in their own error type, so
/// the chain is walked rather than matched at the top level. Validation
/// failures also report the offending field.
fn store_status(
  err: &(dyn std::error::Error + 'static),
) -> (StatusCode, Option<&'static str>) {
  let mut cursor: Option<&(dyn std::error::Error + 'static)> = Some(err);
  while let Some(e) = cursor {
    if let Some(core) = e.downcast_ref::<homeroom_core::Error>() {
      use homeroom_core::Error as E;
      return match core {
        E::Validation { field, .. } => {
          (StatusCode::UNPROCESSABLE_ENTITY, Some(*field))
        }
        E::InactiveDate { .. } | E::InvalidOption { .. } => {
          (StatusCode::UNPROCESSABLE_ENTITY, None)
        }
        E::Authorization(_) => (StatusCode::FORBIDDEN, None),
        E::GuardianNotFound(_)
        | E::LearnerNotFound(_)
        | E::GroupNotFound(_)
        | E::SubjectNotFound(_) => (StatusCode::NOT_FOUND, None),
        E::UniquenessViolation(_) => (StatusCode::CONFLICT, None),
        E::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
      };
    }
    cursor = e.source();
  }
  (StatusCode::INTERNAL_SERVER_ERROR, None)
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, field) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), None),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone(), None),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone(), None),
      ApiError::Store(e) => {
        let (status, field) = store_status(e.as_ref());
        (status, e.to_string(), field)
      }
    };
    let body = match field {
      Some(field) => json!({ "error": message, "field": field }),
      None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;

  fn wrapped(core: homeroom_core::Error) -> homeroom_store_sqlite::Error {
    homeroom_store_sqlite::Error::Core(core)
  }

  #[test]
  fn domain_errors_map_through_the_backend_wrapper() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let cases = [
      (
        homeroom_core::Error::InactiveDate {
          subject_id: Uuid::new_v4(),
          date,
        },
        StatusCode::UNPROCESSABLE_ENTITY,
      ),
      (
        homeroom_core::Error::SubjectNotFound(Uuid::new_v4()),
        StatusCode::NOT_FOUND,
      ),
      (
        homeroom_core::Error::UniquenessViolation("completion".into()),
        StatusCode::CONFLICT,
      ),
      (
        homeroom_core::Error::Authorization("nope".into()),
        StatusCode::FORBIDDEN,
      ),
    ];

    for (core, expected) in cases {
      let (status, field) = store_status(&wrapped(core));
      assert_eq!(status, expected);
      assert!(field.is_none());
    }
  }

  #[test]
  fn validation_errors_carry_the_field() {
    let core = homeroom_core::Error::Validation {
      field:   "days",
      message: "empty".into(),
    };
    let (status, field) = store_status(&wrapped(core));
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field, Some("days"));
  }

  #[test]
  fn unrecognised_store_errors_are_internal() {
    let err = std::io::Error::other("disk on fire");
    let (status, field) = store_status(&err);
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(field.is_none());
  }
}
