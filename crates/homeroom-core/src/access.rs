//! Role-based authorization over resolved ownership views.
//!
//! Both checks are pure: the store resolves an [`ActorContext`] and an
//! [`OwnershipView`], and the answers fall out of a single match on the
//! actor/owner pair.

use crate::owner::{ActorContext, Owner, OwnershipView};
use crate::roster::Actor;

/// May `actor` toggle completions on the subject?
///
/// Guardians may complete any subject owned — directly or via group
/// membership — by a learner they own. Learner actors may complete only
/// individually-owned subjects of their own; never group subjects, even as
/// a member.
pub fn can_complete(actor: &ActorContext, subject: &OwnershipView) -> bool {
  match (&actor.actor, &subject.owner) {
    (Actor::Guardian(_), Owner::Individual(learner)) => {
      actor.learner_ids.contains(learner)
    }
    (Actor::Guardian(_), Owner::Group(_)) => subject
      .group_members
      .iter()
      .any(|member| actor.learner_ids.contains(member)),
    (Actor::Learner(me), Owner::Individual(learner)) => learner == me,
    (Actor::Learner(_), Owner::Group(_)) => false,
  }
}

/// May `actor` edit or delete the subject?
///
/// Management is collaborative: any guardian owning the owning learner, or
/// at least one member of the owning group, qualifies — not just the
/// creator. Learners never manage.
pub fn can_manage(actor: &ActorContext, subject: &OwnershipView) -> bool {
  match (&actor.actor, &subject.owner) {
    (Actor::Learner(_), _) => false,
    (Actor::Guardian(_), Owner::Individual(learner)) => {
      actor.learner_ids.contains(learner)
    }
    (Actor::Guardian(_), Owner::Group(_)) => subject
      .group_members
      .iter()
      .any(|member| actor.learner_ids.contains(member)),
  }
}
