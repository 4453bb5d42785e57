//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subjects` | Body: [`CreateSubjectBody`]; guardian-gated |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `PATCH`  | `/subjects/:id` | Body: [`UpdateSubjectBody`]; guardian-gated |
//! | `DELETE` | `/subjects/:id` | `?actor_kind&actor_id`; guardian-gated |
//! | `GET`    | `/learners/:id/subjects` | `?actor_kind&actor_id`; visibility union |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use homeroom_core::{
  access,
  owner::Owner,
  roster::Actor,
  store::CurriculumStore,
  subject::{NewScheduleVariant, NewSubject, Subject, SubjectUpdate},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ActorParams, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /subjects`.
#[derive(Debug, Deserialize)]
pub struct CreateSubjectBody {
  pub actor:              Actor,
  pub name:               String,
  pub icon:               Option<String>,
  pub variant:            NewScheduleVariant,
  #[serde(default)]
  pub narration_required: bool,
  pub owner:              Owner,
}

/// `POST /subjects` — returns 201 + the stored subject.
///
/// Only a guardian managing the owner (directly, or via a group member they
/// own) may create a subject.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateSubjectBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ctx = store.actor_context(body.actor).await.map_err(ApiError::store)?;
  let view = store.owner_view(body.owner).await.map_err(ApiError::store)?;
  if !access::can_manage(&ctx, &view) {
    return Err(ApiError::Forbidden(
      "actor may not manage subjects for this owner".into(),
    ));
  }

  let subject = store
    .add_subject(NewSubject {
      name:               body.name,
      icon:               body.icon,
      variant:            body.variant,
      narration_required: body.narration_required,
      owner:              body.owner,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let subject = store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /subjects/:id`. Omitted fields are left
/// unchanged; a new `variant` replaces the option list wholesale.
#[derive(Debug, Deserialize)]
pub struct UpdateSubjectBody {
  pub actor:              Actor,
  pub name:               Option<String>,
  pub icon:               Option<String>,
  pub variant:            Option<NewScheduleVariant>,
  pub narration_required: Option<bool>,
}

/// `PATCH /subjects/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateSubjectBody>,
) -> Result<Json<Subject>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_manage(store.as_ref(), body.actor, id).await?;

  let subject = store
    .update_subject(id, SubjectUpdate {
      name:               body.name,
      icon:               body.icon,
      variant:            body.variant,
      narration_required: body.narration_required,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subject))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id?actor_kind=<kind>&actor_id=<id>`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ActorParams>,
) -> Result<StatusCode, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_manage(store.as_ref(), params.actor(), id).await?;
  store.delete_subject(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Visibility ───────────────────────────────────────────────────────────────

/// `GET /learners/:id/subjects?actor_kind=<kind>&actor_id=<id>`
///
/// The union of the learner's individually-owned subjects and those owned by
/// groups the learner belongs to. The actor must be the learner themselves
/// or a guardian owning them.
pub async fn visible<S>(
  State(store): State<Arc<S>>,
  Path(learner_id): Path<Uuid>,
  Query(params): Query<ActorParams>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ctx = store
    .actor_context(params.actor())
    .await
    .map_err(ApiError::store)?;
  if !ctx.learner_ids.contains(&learner_id) {
    return Err(ApiError::Forbidden(
      "actor may not view this learner's subjects".into(),
    ));
  }

  let subjects = store
    .visible_subjects(learner_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Shared gate ──────────────────────────────────────────────────────────────

/// Resolve `actor` against the subject's ownership and fail with 403 unless
/// management is permitted.
pub(crate) async fn require_manage<S>(
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
  if !access::can_manage(&ctx, &view) {
    return Err(ApiError::Forbidden(
      "actor may not manage this subject".into(),
    ));
  }
  Ok(())
}
