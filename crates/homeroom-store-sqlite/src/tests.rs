//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use homeroom_core::{
  owner::Owner,
  roster::Actor,
  store::CurriculumStore,
  subject::{NewScheduleVariant, NewSubject, SchoolDay, Subject},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A guardian with one learner — the smallest useful household.
async fn family(s: &SqliteStore) -> (Uuid, Uuid) {
  let guardian = s.add_guardian("Parent".into()).await.unwrap();
  let learner = s
    .add_learner(guardian.guardian_id, "Child".into())
    .await
    .unwrap();
  (guardian.guardian_id, learner.learner_id)
}

fn new_subject(name: &str, variant: NewScheduleVariant, owner: Owner) -> NewSubject {
  NewSubject {
    name: name.into(),
    icon: None,
    variant,
    narration_required: false,
    owner,
  }
}

fn days(list: &[SchoolDay]) -> BTreeSet<SchoolDay> {
  list.iter().copied().collect()
}

fn option_id(subject: &Subject, name: &str) -> Uuid {
  subject
    .variant
    .options()
    .iter()
    .find(|o| o.name == name)
    .map(|o| o.option_id)
    .expect("option by name")
}

// 2026-01-26 is a Monday; the 30th is a Friday, the 31st a Saturday.
fn date(day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

// ─── Roster ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_guardian() {
  let s = store().await;
  let guardian = s.add_guardian("Parent".into()).await.unwrap();

  let fetched = s.get_guardian(guardian.guardian_id).await.unwrap().unwrap();
  assert_eq!(fetched.guardian_id, guardian.guardian_id);
  assert_eq!(fetched.name, "Parent");
}

#[tokio::test]
async fn add_learner_requires_existing_guardian() {
  let s = store().await;
  let err = s.add_learner(Uuid::new_v4(), "Child".into()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::GuardianNotFound(_))
  ));
}

#[tokio::test]
async fn list_learners_by_guardian() {
  let s = store().await;
  let (guardian_id, _) = family(&s).await;
  s.add_learner(guardian_id, "Second".into()).await.unwrap();

  let learners = s.list_learners(guardian_id).await.unwrap();
  assert_eq!(learners.len(), 2);
  assert!(learners.iter().all(|l| l.guardian_id == guardian_id));
}

#[tokio::test]
async fn group_membership_roundtrip_and_idempotence() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let group = s.add_group("Morning Circle".into()).await.unwrap();

  assert!(!s.is_member(group.group_id, learner_id).await.unwrap());

  s.add_group_member(group.group_id, learner_id).await.unwrap();
  // Re-adding is a no-op, not an error.
  s.add_group_member(group.group_id, learner_id).await.unwrap();
  assert!(s.is_member(group.group_id, learner_id).await.unwrap());

  s.remove_group_member(group.group_id, learner_id).await.unwrap();
  assert!(!s.is_member(group.group_id, learner_id).await.unwrap());
}

#[tokio::test]
async fn actor_context_resolves_accessible_learners() {
  let s = store().await;
  let (guardian_id, learner_id) = family(&s).await;
  let second = s.add_learner(guardian_id, "Second".into()).await.unwrap();

  let ctx = s.actor_context(Actor::Guardian(guardian_id)).await.unwrap();
  assert_eq!(ctx.learner_ids.len(), 2);
  assert!(ctx.learner_ids.contains(&learner_id));
  assert!(ctx.learner_ids.contains(&second.learner_id));

  let ctx = s.actor_context(Actor::Learner(learner_id)).await.unwrap();
  assert_eq!(ctx.learner_ids.len(), 1);
  assert!(ctx.learner_ids.contains(&learner_id));
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_subject_assigns_option_ids_in_order() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;

  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec![
          "Safar Book".into(),
          "Quran Recitation".into(),
          "Seerah Stories".into(),
        ],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  let options = fetched.variant.options();
  assert_eq!(options.len(), 3);
  assert_eq!(options[0].name, "Safar Book");
  assert_eq!(options[0].position, 0);
  assert_eq!(options[2].name, "Seerah Stories");
  assert_eq!(options[2].position, 2);
}

#[tokio::test]
async fn add_subject_unknown_owner_errors() {
  let s = store().await;
  let err = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(Uuid::new_v4()),
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::LearnerNotFound(_))
  ));
}

#[tokio::test]
async fn add_subject_empty_day_set_rejected() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;

  let err = s
    .add_subject(new_subject(
      "Nature Walk",
      NewScheduleVariant::Scheduled {
        days: BTreeSet::new(),
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::Validation { field: "days", .. })
  ));
}

#[tokio::test]
async fn update_subject_replaces_option_list() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec!["Safar Book".into(), "Quran Recitation".into()],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let old_safar = option_id(&subject, "Safar Book");

  // Complete Monday bound to the old option.
  s.toggle(subject.subject_id, date(26), Some(old_safar))
    .await
    .unwrap();

  let updated = s
    .update_subject(
      subject.subject_id,
      homeroom_core::subject::SubjectUpdate {
        variant: Some(NewScheduleVariant::Pick1 {
          options: vec!["Tajweed".into()],
        }),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  assert_eq!(updated.variant.options().len(), 1);
  assert_eq!(updated.variant.options()[0].name, "Tajweed");

  // The completion bound to the removed option cascaded away.
  let remaining = s
    .completion_on(subject.subject_id, date(26))
    .await
    .unwrap();
  assert!(remaining.is_none());
}

#[tokio::test]
async fn delete_subject_cascades_completions_options_and_narrations() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let mut input = new_subject(
    "History",
    NewScheduleVariant::Fixed,
    Owner::Individual(learner_id),
  );
  input.narration_required = true;
  let subject = s.add_subject(input).await.unwrap();

  s.toggle(subject.subject_id, date(26), None).await.unwrap();
  s.add_narration(subject.subject_id, date(26)).await.unwrap();

  s.delete_subject(subject.subject_id).await.unwrap();

  assert!(s.get_subject(subject.subject_id).await.unwrap().is_none());
  assert!(
    s.completion_on(subject.subject_id, date(26))
      .await
      .unwrap()
      .is_none()
  );
  assert!(!s.narration_exists(subject.subject_id, date(26)).await.unwrap());
}

#[tokio::test]
async fn delete_missing_subject_errors() {
  let s = store().await;
  let err = s.delete_subject(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::SubjectNotFound(_))
  ));
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn visible_subjects_unions_individual_and_group_ownership() {
  let s = store().await;
  let (guardian_id, learner_id) = family(&s).await;
  let sibling = s.add_learner(guardian_id, "Sibling".into()).await.unwrap();

  let group = s.add_group("Morning Circle".into()).await.unwrap();
  s.add_group_member(group.group_id, learner_id).await.unwrap();

  let own = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let shared = s
    .add_subject(new_subject(
      "Circle Time",
      NewScheduleVariant::Fixed,
      Owner::Group(group.group_id),
    ))
    .await
    .unwrap();
  // The sibling is not in the group; their subject stays invisible.
  s.add_subject(new_subject(
    "Phonics",
    NewScheduleVariant::Fixed,
    Owner::Individual(sibling.learner_id),
  ))
  .await
  .unwrap();

  let visible = s.visible_subjects(learner_id).await.unwrap();
  let ids: Vec<_> = visible.iter().map(|subject| subject.subject_id).collect();
  assert_eq!(visible.len(), 2);
  assert!(ids.contains(&own.subject_id));
  assert!(ids.contains(&shared.subject_id));

  let sibling_view = s.visible_subjects(sibling.learner_id).await.unwrap();
  assert_eq!(sibling_view.len(), 1);
  assert_eq!(sibling_view[0].name, "Phonics");
}

#[tokio::test]
async fn ownership_view_carries_group_members() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let group = s.add_group("Morning Circle".into()).await.unwrap();
  s.add_group_member(group.group_id, learner_id).await.unwrap();

  let subject = s
    .add_subject(new_subject(
      "Circle Time",
      NewScheduleVariant::Fixed,
      Owner::Group(group.group_id),
    ))
    .await
    .unwrap();

  let view = s.ownership_view(subject.subject_id).await.unwrap();
  assert_eq!(view.owner, Owner::Group(group.group_id));
  assert!(view.group_members.contains(&learner_id));
}

// ─── Toggle ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fixed_toggle_is_an_involution() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  // Wednesday 2026-01-28, no prior record.
  let first = s.toggle(subject.subject_id, date(28), None).await.unwrap();
  assert!(first.completed);
  assert!(first.selected_option_id.is_none());
  assert!(
    s.completion_on(subject.subject_id, date(28))
      .await
      .unwrap()
      .is_some()
  );

  let second = s.toggle(subject.subject_id, date(28), None).await.unwrap();
  assert!(!second.completed);
  assert!(
    s.completion_on(subject.subject_id, date(28))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn single_toggle_leaves_exactly_one_row() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  s.toggle(subject.subject_id, date(28), None).await.unwrap();

  let rows = s
    .completions_in_range(subject.subject_id, date(26), date(30))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].date, date(28));
}

#[tokio::test]
async fn scheduled_subject_refuses_off_day_toggle() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Nature Walk",
      NewScheduleVariant::Scheduled {
        days: days(&[SchoolDay::Mon, SchoolDay::Tue, SchoolDay::Wed, SchoolDay::Thu]),
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  // Friday the 30th is outside the day-set.
  let err = s.toggle(subject.subject_id, date(30), None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::InactiveDate { .. })
  ));

  let rows = s
    .completions_in_range(subject.subject_id, date(26), date(31))
    .await
    .unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn weekend_toggle_refused_for_every_variant() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  // Saturday the 31st.
  let err = s.toggle(subject.subject_id, date(31), None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::InactiveDate { .. })
  ));
}

#[tokio::test]
async fn pick1_selection_lifecycle() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec![
          "Safar Book".into(),
          "Quran Recitation".into(),
          "Seerah Stories".into(),
        ],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let safar = option_id(&subject, "Safar Book");
  let quran = option_id(&subject, "Quran Recitation");

  // Select Safar — completed.
  let out = s.toggle(subject.subject_id, date(28), Some(safar)).await.unwrap();
  assert!(out.completed);
  assert_eq!(out.selected_option_id, Some(safar));

  // Same option again — uncompleted, row gone.
  let out = s.toggle(subject.subject_id, date(28), Some(safar)).await.unwrap();
  assert!(!out.completed);
  assert!(
    s.completion_on(subject.subject_id, date(28))
      .await
      .unwrap()
      .is_none()
  );

  // Fresh selection of Quran.
  let out = s.toggle(subject.subject_id, date(28), Some(quran)).await.unwrap();
  assert!(out.completed);
  assert_eq!(out.selected_option_id, Some(quran));

  // Switching to Safar rebinds in place — still exactly one row.
  let out = s.toggle(subject.subject_id, date(28), Some(safar)).await.unwrap();
  assert!(out.completed);
  assert_eq!(out.selected_option_id, Some(safar));

  let rows = s
    .completions_in_range(subject.subject_id, date(26), date(30))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].selected_option_id, Some(safar));
}

#[tokio::test]
async fn pick1_requires_option() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec!["Safar Book".into()],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  let err = s.toggle(subject.subject_id, date(28), None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::Validation {
      field: "option_id",
      ..
    })
  ));
}

#[tokio::test]
async fn pick1_rejects_option_of_another_subject() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec!["Safar Book".into()],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let other = s
    .add_subject(new_subject(
      "Poetry",
      NewScheduleVariant::Pick1 {
        options: vec!["Memorise".into()],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let foreign = option_id(&other, "Memorise");

  let err = s
    .toggle(subject.subject_id, date(28), Some(foreign))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::InvalidOption { .. })
  ));
  assert!(
    s.completion_on(subject.subject_id, date(28))
      .await
      .unwrap()
      .is_none()
  );
}

// ─── Narration reminders ─────────────────────────────────────────────────────

#[tokio::test]
async fn reminder_raised_only_when_evidence_is_missing() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let mut input = new_subject(
    "History",
    NewScheduleVariant::Fixed,
    Owner::Individual(learner_id),
  );
  input.narration_required = true;
  let subject = s.add_subject(input).await.unwrap();

  // Create without evidence — reminder.
  let out = s.toggle(subject.subject_id, date(26), None).await.unwrap();
  let reminder = out.narration_reminder.expect("reminder");
  assert_eq!(reminder.subject_id, subject.subject_id);
  assert_eq!(reminder.date, date(26));

  // Destroy — never a reminder.
  let out = s.toggle(subject.subject_id, date(26), None).await.unwrap();
  assert!(out.narration_reminder.is_none());

  // With evidence on file, the re-create stays quiet.
  s.add_narration(subject.subject_id, date(26)).await.unwrap();
  let out = s.toggle(subject.subject_id, date(26), None).await.unwrap();
  assert!(out.completed);
  assert!(out.narration_reminder.is_none());
}

#[tokio::test]
async fn no_reminder_without_the_flag() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  let out = s.toggle(subject.subject_id, date(26), None).await.unwrap();
  assert!(out.completed);
  assert!(out.narration_reminder.is_none());
}

#[tokio::test]
async fn narration_records_roundtrip() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "History",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  assert!(!s.narration_exists(subject.subject_id, date(26)).await.unwrap());

  let first = s.add_narration(subject.subject_id, date(26)).await.unwrap();
  // Re-adding returns the existing record.
  let second = s.add_narration(subject.subject_id, date(26)).await.unwrap();
  assert_eq!(first.narration_id, second.narration_id);
  assert!(s.narration_exists(subject.subject_id, date(26)).await.unwrap());

  s.remove_narration(subject.subject_id, date(26)).await.unwrap();
  assert!(!s.narration_exists(subject.subject_id, date(26)).await.unwrap());
}

// The store recovers a lost insert race by re-reading the winning row; that
// path hinges on classifying the failed insert correctly.
#[test]
fn unique_violations_are_recognised() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn
    .execute_batch("CREATE TABLE t (day TEXT NOT NULL, UNIQUE (day));")
    .unwrap();

  conn
    .execute("INSERT INTO t (day) VALUES ('2026-01-26')", [])
    .unwrap();
  let dup = conn
    .execute("INSERT INTO t (day) VALUES ('2026-01-26')", [])
    .unwrap_err();
  assert!(crate::store::is_unique_violation(&dup));

  let other = conn.execute("INSERT INTO missing (day) VALUES ('x')", []);
  assert!(!crate::store::is_unique_violation(&other.unwrap_err()));
}

// ─── Balance ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn balance_with_no_completions_lists_every_option_at_zero() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec![
          "Safar Book".into(),
          "Quran Recitation".into(),
          "Seerah Stories".into(),
        ],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  let report = s
    .balance(subject.subject_id, date(26), date(30))
    .await
    .unwrap();
  assert_eq!(report.total, 0);
  assert_eq!(report.shares.len(), 3);
  assert!(report.shares.iter().all(|sh| sh.count == 0));
  assert!(report.shares.iter().all(|sh| sh.percentage == 0.0));
}

#[tokio::test]
async fn balance_counts_only_the_inclusive_range() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Islamic Study",
      NewScheduleVariant::Pick1 {
        options: vec![
          "Safar Book".into(),
          "Quran Recitation".into(),
          "Seerah Stories".into(),
        ],
      },
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();
  let safar = option_id(&subject, "Safar Book");
  let quran = option_id(&subject, "Quran Recitation");

  // Mon + Tue Safar, Wed Quran, Thu Safar (outside the queried range).
  s.toggle(subject.subject_id, date(26), Some(safar)).await.unwrap();
  s.toggle(subject.subject_id, date(27), Some(safar)).await.unwrap();
  s.toggle(subject.subject_id, date(28), Some(quran)).await.unwrap();
  s.toggle(subject.subject_id, date(29), Some(safar)).await.unwrap();

  let report = s
    .balance(subject.subject_id, date(26), date(28))
    .await
    .unwrap();
  assert_eq!(report.total, 3);

  assert_eq!(report.shares[0].name, "Safar Book");
  assert_eq!(report.shares[0].count, 2);
  assert_eq!(report.shares[0].percentage, 66.7);

  assert_eq!(report.shares[1].name, "Quran Recitation");
  assert_eq!(report.shares[1].count, 1);
  assert_eq!(report.shares[1].percentage, 33.3);

  assert_eq!(report.shares[2].name, "Seerah Stories");
  assert_eq!(report.shares[2].count, 0);
  assert_eq!(report.shares[2].percentage, 0.0);
}

#[tokio::test]
async fn balance_rejects_non_pick1_subjects() {
  let s = store().await;
  let (_, learner_id) = family(&s).await;
  let subject = s
    .add_subject(new_subject(
      "Math",
      NewScheduleVariant::Fixed,
      Owner::Individual(learner_id),
    ))
    .await
    .unwrap();

  let err = s
    .balance(subject.subject_id, date(26), date(30))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(homeroom_core::Error::Validation {
      field: "variant",
      ..
    })
  ));
}
