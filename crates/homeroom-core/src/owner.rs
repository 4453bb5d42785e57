//! Subject ownership — the "teachable" side of the model.
//!
//! A subject is owned either by one learner or by a learner group. Ownership
//! is a closed tagged union resolved by a single `match`; there is no
//! inheritance hierarchy anywhere in the dispatch.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::Actor;

// ─── Owner ───────────────────────────────────────────────────────────────────

/// Who a subject belongs to. Exactly one owner record exists per concrete
/// learner or group (enforced by the store's unique constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Owner {
  /// Owned by a single learner; only they (or their guardian) may complete.
  Individual(Uuid),
  /// Owned by a learner group; shared across all member learners.
  Group(Uuid),
}

/// The two ownership kinds, without the identifier payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
  Individual,
  Group,
}

impl Owner {
  pub fn kind(&self) -> OwnerKind {
    match self {
      Self::Individual(_) => OwnerKind::Individual,
      Self::Group(_) => OwnerKind::Group,
    }
  }

  /// The owning learner or group id, without the kind.
  pub fn owner_id(&self) -> Uuid {
    match self {
      Self::Individual(id) | Self::Group(id) => *id,
    }
  }
}

// ─── Resolved views ──────────────────────────────────────────────────────────

/// A subject's owner together with the membership needed to authorize
/// against it. For an [`Owner::Individual`] the member set is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipView {
  pub owner:         Owner,
  /// Learner ids belonging to the owning group, if the owner is a group.
  pub group_members: BTreeSet<Uuid>,
}

/// An actor together with the learners they may act for: all owned learners
/// for a guardian, the singleton set of themselves for a learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
  pub actor:       Actor,
  pub learner_ids: BTreeSet<Uuid>,
}
