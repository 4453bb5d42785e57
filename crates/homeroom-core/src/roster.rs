//! The household roster: guardians, learners, and learner groups.
//!
//! These are thin envelopes — a uuid, a display name, and a creation
//! timestamp. Everything behavioural about the curriculum lives on subjects
//! and completions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An adult account. Owns zero or more learners and manages their curricula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guardian {
  pub guardian_id: Uuid,
  pub name:        String,
  pub created_at:  DateTime<Utc>,
}

/// A child being taught. Belongs to exactly one guardian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
  pub learner_id:  Uuid,
  pub guardian_id: Uuid,
  pub name:        String,
  pub created_at:  DateTime<Utc>,
}

/// A named collection of learners sharing certain subjects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
  pub group_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// The acting user behind a domain call. Always passed explicitly — the core
/// never reads ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Actor {
  Guardian(Uuid),
  Learner(Uuid),
}
