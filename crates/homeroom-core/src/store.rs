//! The `CurriculumStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `homeroom-store-sqlite`). Higher layers (`homeroom-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! Authorization is the caller's step: the controller resolves an
//! [`ActorContext`] and an [`OwnershipView`], consults
//! [`crate::access::can_complete`] / [`crate::access::can_manage`], and only
//! then calls a mutation.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  analytics::BalanceReport,
  completion::{Completion, ToggleOutcome},
  narration::NarrationRecord,
  owner::{ActorContext, Owner, OwnershipView},
  roster::{Actor, Group, Guardian, Learner},
  subject::{NewSubject, Subject, SubjectUpdate},
};

/// Abstraction over a Homeroom curriculum store backend.
///
/// Each method call is its own transaction boundary. The toggle's
/// check-then-write sequence must be atomic within the backend; the unique
/// constraint on `(subject_id, date)` is the final arbiter under concurrent
/// writers.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CurriculumStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Roster ────────────────────────────────────────────────────────────

  fn add_guardian(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Guardian, Self::Error>> + Send + '_;

  /// Retrieve a guardian by id. Returns `None` if not found.
  fn get_guardian(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Guardian>, Self::Error>> + Send + '_;

  /// Create a learner owned by `guardian_id`.
  fn add_learner(
    &self,
    guardian_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Learner, Self::Error>> + Send + '_;

  fn get_learner(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Learner>, Self::Error>> + Send + '_;

  /// All learners owned by a guardian.
  fn list_learners(
    &self,
    guardian_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Learner>, Self::Error>> + Send + '_;

  fn add_group(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// Add a learner to a group. Idempotent — re-adding is a no-op.
  fn add_group_member(
    &self,
    group_id: Uuid,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn remove_group_member(
    &self,
    group_id: Uuid,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn is_member(
    &self,
    group_id: Uuid,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Ownership resolution ──────────────────────────────────────────────

  /// Resolve an actor to the learners they may act for: all owned learners
  /// for a guardian, the singleton set of themselves for a learner.
  fn actor_context(
    &self,
    actor: Actor,
  ) -> impl Future<Output = Result<ActorContext, Self::Error>> + Send + '_;

  /// Resolve an owner to the view authorization needs. Fails if the
  /// underlying learner or group does not exist.
  fn owner_view(
    &self,
    owner: Owner,
  ) -> impl Future<Output = Result<OwnershipView, Self::Error>> + Send + '_;

  /// [`Self::owner_view`] for an existing subject's owner.
  fn ownership_view(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<OwnershipView, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Validate and persist a new subject, assigning option ids for Pick1
  /// variants and ensuring the owner's teachable record exists.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Apply a partial edit. A replaced variant swaps out the option list.
  fn update_subject(
    &self,
    id: Uuid,
    update: SubjectUpdate,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Destroy a subject; its completions, options, and narration records
  /// cascade away with it.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Subjects a learner sees: individually owned ∪ owned by any group the
  /// learner belongs to.
  fn visible_subjects(
    &self,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Completions ───────────────────────────────────────────────────────

  /// Toggle the completion state of a subject on a date, atomically. See
  /// [`crate::completion::plan_toggle`] for the transition rules.
  fn toggle(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    option_id: Option<Uuid>,
  ) -> impl Future<Output = Result<ToggleOutcome, Self::Error>> + Send + '_;

  fn completion_on(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Completion>, Self::Error>> + Send + '_;

  /// Completions with `from <= date <= to`, ordered by date.
  fn completions_in_range(
    &self,
    subject_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Completion>, Self::Error>> + Send + '_;

  /// Selection-distribution report for a Pick1 subject over an inclusive
  /// date range.
  fn balance(
    &self,
    subject_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<BalanceReport, Self::Error>> + Send + '_;

  // ── Narration records ─────────────────────────────────────────────────

  /// Record narration evidence for `(subject, date)`. Returns the existing
  /// record when one is already present.
  fn add_narration(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<NarrationRecord, Self::Error>> + Send + '_;

  /// Remove narration evidence. Removing a missing record is a no-op.
  fn remove_narration(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn narration_exists(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
