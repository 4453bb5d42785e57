//! Handlers for completion, narration, and analytics endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subjects/:id/toggle` | Body: [`ToggleBody`]; completion-gated |
//! | `GET`    | `/subjects/:id/completions` | `?from&to` inclusive range |
//! | `GET`    | `/subjects/:id/balance` | `?from&to`; Pick1 subjects only |
//! | `POST`   | `/subjects/:id/narrations` | Body: [`NarrationBody`]; completion-gated |
//! | `DELETE` | `/subjects/:id/narrations` | `?actor_kind&actor_id&date`; completion-gated |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use homeroom_core::{
  access,
  analytics::BalanceReport,
  completion::{Completion, ToggleOutcome},
  roster::Actor,
  store::CurriculumStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ActorParams, error::ApiError};

// ─── Toggle ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /subjects/:id/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleBody {
  pub actor:     Actor,
  pub date:      NaiveDate,
  /// Required for Pick1 subjects, ignored otherwise.
  pub option_id: Option<Uuid>,
}

/// `POST /subjects/:id/toggle`
///
/// Flips the completion state of the subject on `date` and reports the
/// resulting state, including any narration reminder.
pub async fn toggle<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ToggleBody>,
) -> Result<Json<ToggleOutcome>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_complete(store.as_ref(), body.actor, id).await?;

  let outcome = store
    .toggle(id, body.date, body.option_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(outcome))
}

// ─── Completion history ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

/// `GET /subjects/:id/completions?from=<date>&to=<date>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(range): Query<RangeParams>,
) -> Result<Json<Vec<Completion>>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let completions = store
    .completions_in_range(id, range.from, range.to)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(completions))
}

// ─── Balance ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id/balance?from=<date>&to=<date>`
///
/// Selection-distribution report for a Pick1 subject. 422 for any other
/// variant.
pub async fn balance<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(range): Query<RangeParams>,
) -> Result<Json<BalanceReport>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let report = store
    .balance(id, range.from, range.to)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}

// ─── Narration evidence ───────────────────────────────────────────────────────

/// JSON body accepted by `POST /subjects/:id/narrations`.
#[derive(Debug, Deserialize)]
pub struct NarrationBody {
  pub actor: Actor,
  pub date:  NaiveDate,
}

/// `POST /subjects/:id/narrations` — returns 201 + the record. Idempotent:
/// re-posting returns the existing record.
pub async fn add_narration<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NarrationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_complete(store.as_ref(), body.actor, id).await?;

  let record = store
    .add_narration(id, body.date)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveNarrationParams {
  #[serde(flatten)]
  pub actor: ActorParams,
  pub date:  NaiveDate,
}

/// `DELETE /subjects/:id/narrations?actor_kind=<kind>&actor_id=<id>&date=<date>`
pub async fn remove_narration<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<RemoveNarrationParams>,
) -> Result<StatusCode, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_complete(store.as_ref(), params.actor.actor(), id).await?;
  store
    .remove_narration(id, params.date)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Shared gate ──────────────────────────────────────────────────────────────

/// Resolve `actor` against the subject's ownership and fail with 403 unless
/// completion is permitted.
async fn require_complete<S>(
  store: &S,
  actor: Actor,
  subject_id: Uuid,
) -> Result<(), ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ctx = store.actor_context(actor).await.map_err(ApiError::store)?;
  let view = store
    .ownership_view(subject_id)
    .await
    .map_err(ApiError::store)?;
  if !access::can_complete(&ctx, &view) {
    return Err(ApiError::Forbidden(
      "actor may not record completions on this subject".into(),
    ));
  }
  Ok(())
}
