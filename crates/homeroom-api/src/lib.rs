//! JSON REST API for Homeroom.
//!
//! Exposes an axum [`Router`] backed by any
//! [`homeroom_core::store::CurriculumStore`]. TLS and transport concerns are
//! the caller's responsibility.
//!
//! Authorization happens here, at the edge: each mutating handler resolves
//! the acting party to an [`homeroom_core::owner::ActorContext`], resolves
//! the target subject's ownership, and consults
//! [`homeroom_core::access`] before touching the store.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", homeroom_api::api_router(store.clone()))
//! ```

pub mod completions;
pub mod error;
pub mod roster;
pub mod subjects;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use homeroom_core::{roster::Actor, store::CurriculumStore};
use serde::Deserialize;
use uuid::Uuid;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Actor extraction ─────────────────────────────────────────────────────────

/// The two actor roles, as they appear in query strings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
  Guardian,
  Learner,
}

/// The acting party, supplied in a query string as
/// `?actor_kind=guardian&actor_id=<uuid>`. Handlers taking a JSON body carry
/// the actor as a tagged `{"kind":"guardian","id":"..."}` field instead.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActorParams {
  pub actor_kind: ActorKind,
  pub actor_id:   Uuid,
}

impl ActorParams {
  pub fn actor(self) -> Actor {
    match self.actor_kind {
      ActorKind::Guardian => Actor::Guardian(self.actor_id),
      ActorKind::Learner => Actor::Learner(self.actor_id),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CurriculumStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Roster
    .route("/guardians", post(roster::create_guardian::<S>))
    .route("/guardians/{id}", get(roster::get_guardian::<S>))
    .route("/guardians/{id}/learners", get(roster::list_learners::<S>))
    .route("/learners", post(roster::create_learner::<S>))
    .route("/learners/{id}", get(roster::get_learner::<S>))
    .route("/learners/{id}/subjects", get(subjects::visible::<S>))
    .route("/groups", post(roster::create_group::<S>))
    .route("/groups/{id}", get(roster::get_group::<S>))
    .route(
      "/groups/{id}/members/{learner_id}",
      put(roster::add_member::<S>).delete(roster::remove_member::<S>),
    )
    // Subjects
    .route("/subjects", post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .patch(subjects::update::<S>)
        .delete(subjects::delete_one::<S>),
    )
    // Completions, narration evidence, and analytics
    .route("/subjects/{id}/toggle", post(completions::toggle::<S>))
    .route("/subjects/{id}/completions", get(completions::list::<S>))
    .route("/subjects/{id}/balance", get(completions::balance::<S>))
    .route(
      "/subjects/{id}/narrations",
      post(completions::add_narration::<S>)
        .delete(completions::remove_narration::<S>),
    )
    .with_state(store)
}
