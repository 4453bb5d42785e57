//! Handlers for roster endpoints: guardians, learners, and groups.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/guardians` | Body: `{"name":"..."}` |
//! | `GET`    | `/guardians/:id` | 404 if not found |
//! | `GET`    | `/guardians/:id/learners` | All learners of the guardian |
//! | `POST`   | `/learners` | Body: `{"guardian_id":"...","name":"..."}` |
//! | `GET`    | `/learners/:id` | 404 if not found |
//! | `POST`   | `/groups` | Body: `{"name":"..."}` |
//! | `GET`    | `/groups/:id` | 404 if not found |
//! | `PUT`    | `/groups/:id/members/:learner_id` | Idempotent; 204 |
//! | `DELETE` | `/groups/:id/members/:learner_id` | Idempotent; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use homeroom_core::{
  roster::{Group, Guardian, Learner},
  store::CurriculumStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Guardians ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NameBody {
  pub name: String,
}

/// `POST /guardians` — body: `{"name":"..."}`
pub async fn create_guardian<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let guardian = store.add_guardian(body.name).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(guardian)))
}

/// `GET /guardians/:id`
pub async fn get_guardian<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Guardian>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let guardian = store
    .get_guardian(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("guardian {id} not found")))?;
  Ok(Json(guardian))
}

/// `GET /guardians/:id/learners`
pub async fn list_learners<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Learner>>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_guardian(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("guardian {id} not found")))?;
  let learners = store.list_learners(id).await.map_err(ApiError::store)?;
  Ok(Json(learners))
}

// ─── Learners ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateLearnerBody {
  pub guardian_id: Uuid,
  pub name:        String,
}

/// `POST /learners` — body: `{"guardian_id":"...","name":"..."}`
pub async fn create_learner<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateLearnerBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let learner = store
    .add_learner(body.guardian_id, body.name)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(learner)))
}

/// `GET /learners/:id`
pub async fn get_learner<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Learner>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let learner = store
    .get_learner(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("learner {id} not found")))?;
  Ok(Json(learner))
}

// ─── Groups ───────────────────────────────────────────────────────────────────

/// `POST /groups` — body: `{"name":"..."}`
pub async fn create_group<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let group = store.add_group(body.name).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups/:id`
pub async fn get_group<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let group = store
    .get_group(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}

/// `PUT /groups/:id/members/:learner_id`
pub async fn add_member<S>(
  State(store): State<Arc<S>>,
  Path((group_id, learner_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .add_group_member(group_id, learner_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /groups/:id/members/:learner_id`
pub async fn remove_member<S>(
  State(store): State<Arc<S>>,
  Path((group_id, learner_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: CurriculumStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .remove_group_member(group_id, learner_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
