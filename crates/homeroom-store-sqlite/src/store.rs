//! [`SqliteStore`] — the SQLite implementation of [`CurriculumStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use homeroom_core::Error as CoreError;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use homeroom_core::{
  analytics::{self, BalanceReport},
  completion::{
    Completion, NarrationReminder, ToggleAction, ToggleOutcome, plan_toggle,
  },
  narration::NarrationRecord,
  owner::{ActorContext, Owner, OwnershipView},
  roster::{Actor, Group, Guardian, Learner},
  store::CurriculumStore,
  subject::{
    NewScheduleVariant, NewSubject, ScheduleVariant, Subject, SubjectOption,
    SubjectUpdate,
  },
};

use crate::{
  Error, Result,
  encode::{
    RawCompletion, RawSubject, decode_uuid, encode_date, encode_days,
    encode_dt, encode_owner_kind, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Homeroom curriculum store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The single
/// serialised connection plus per-call transactions give each store call its
/// own atomic boundary.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// Synchronous helpers running inside `conn.call` closures. They return the
// crate error type so domain failures (not-found, inactive date, invalid
// option) travel out of the closure intact.

fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  id: Uuid,
) -> Result<bool> {
  let found: Option<bool> = conn
    .query_row(sql, rusqlite::params![encode_uuid(id)], |_| Ok(true))
    .optional()?;
  Ok(found.unwrap_or(false))
}

fn guardian_by_id(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Guardian>> {
  let raw: Option<(String, String, String)> = conn
    .query_row(
      "SELECT guardian_id, name, created_at FROM guardians WHERE guardian_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .optional()?;

  raw
    .map(|(id_str, name, at)| {
      Ok(Guardian {
        guardian_id: decode_uuid(&id_str)?,
        name,
        created_at: crate::encode::decode_dt(&at)?,
      })
    })
    .transpose()
}

fn learner_by_id(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Learner>> {
  let raw: Option<(String, String, String, String)> = conn
    .query_row(
      "SELECT learner_id, guardian_id, name, created_at FROM learners
       WHERE learner_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )
    .optional()?;

  raw
    .map(|(id_str, guardian_str, name, at)| {
      Ok(Learner {
        learner_id:  decode_uuid(&id_str)?,
        guardian_id: decode_uuid(&guardian_str)?,
        name,
        created_at:  crate::encode::decode_dt(&at)?,
      })
    })
    .transpose()
}

fn group_by_id(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Group>> {
  let raw: Option<(String, String, String)> = conn
    .query_row(
      "SELECT group_id, name, created_at FROM groups WHERE group_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .optional()?;

  raw
    .map(|(id_str, name, at)| {
      Ok(Group {
        group_id:   decode_uuid(&id_str)?,
        name,
        created_at: crate::encode::decode_dt(&at)?,
      })
    })
    .transpose()
}

fn options_for(
  conn: &rusqlite::Connection,
  subject_id: &str,
) -> Result<Vec<SubjectOption>> {
  let mut stmt = conn.prepare(
    "SELECT option_id, name, position FROM subject_options
     WHERE subject_id = ?1 ORDER BY position",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![subject_id], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, i64>(2)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|(id_str, name, position)| {
      Ok(SubjectOption {
        option_id: decode_uuid(&id_str)?,
        name,
        position: position as u32,
      })
    })
    .collect()
}

const SUBJECT_COLUMNS: &str =
  "s.subject_id, s.name, s.icon, s.variant, s.days, s.narration_required,
   s.created_at, t.kind, t.owner_id";

fn raw_subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubject> {
  Ok(RawSubject {
    subject_id:         row.get(0)?,
    name:               row.get(1)?,
    icon:               row.get(2)?,
    variant:            row.get(3)?,
    days:               row.get(4)?,
    narration_required: row.get(5)?,
    created_at:         row.get(6)?,
    owner_kind:         row.get(7)?,
    owner_id:           row.get(8)?,
  })
}

fn subject_by_id(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Subject>> {
  let id_str = encode_uuid(id);
  let raw: Option<RawSubject> = conn
    .query_row(
      &format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects s
         JOIN teachables t ON t.teachable_id = s.teachable_id
         WHERE s.subject_id = ?1"
      ),
      rusqlite::params![id_str],
      raw_subject_from_row,
    )
    .optional()?;

  let Some(raw) = raw else {
    return Ok(None);
  };
  let options = if raw.variant == "pick1" {
    options_for(conn, &id_str)?
  } else {
    Vec::new()
  };
  Ok(Some(raw.into_subject(options)?))
}

fn completion_for(
  conn: &rusqlite::Connection,
  subject_id: &str,
  date: &str,
) -> Result<Option<Completion>> {
  let raw: Option<RawCompletion> = conn
    .query_row(
      "SELECT completion_id, subject_id, date, selected_option_id, completed_at
       FROM completions WHERE subject_id = ?1 AND date = ?2",
      rusqlite::params![subject_id, date],
      |row| {
        Ok(RawCompletion {
          completion_id:      row.get(0)?,
          subject_id:         row.get(1)?,
          date:               row.get(2)?,
          selected_option_id: row.get(3)?,
          completed_at:       row.get(4)?,
        })
      },
    )
    .optional()?;

  raw.map(RawCompletion::into_completion).transpose()
}

fn narration_present(
  conn: &rusqlite::Connection,
  subject_id: &str,
  date: &str,
) -> Result<bool> {
  let found: Option<bool> = conn
    .query_row(
      "SELECT 1 FROM narrations WHERE subject_id = ?1 AND date = ?2",
      rusqlite::params![subject_id, date],
      |_| Ok(true),
    )
    .optional()?;
  Ok(found.unwrap_or(false))
}

fn resolve_owner_view(
  conn: &rusqlite::Connection,
  owner: Owner,
) -> Result<OwnershipView> {
  match owner {
    Owner::Individual(learner_id) => {
      if !row_exists(
        conn,
        "SELECT 1 FROM learners WHERE learner_id = ?1",
        learner_id,
      )? {
        return Err(CoreError::LearnerNotFound(learner_id).into());
      }
      Ok(OwnershipView {
        owner,
        group_members: BTreeSet::new(),
      })
    }
    Owner::Group(group_id) => {
      if !row_exists(conn, "SELECT 1 FROM groups WHERE group_id = ?1", group_id)?
      {
        return Err(CoreError::GroupNotFound(group_id).into());
      }
      let mut stmt = conn
        .prepare("SELECT learner_id FROM group_members WHERE group_id = ?1")?;
      let members = stmt
        .query_map(rusqlite::params![encode_uuid(group_id)], |row| {
          row.get::<_, String>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      let group_members = members
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<BTreeSet<_>>>()?;
      Ok(OwnershipView {
        owner,
        group_members,
      })
    }
  }
}

fn resolve_actor_context(
  conn: &rusqlite::Connection,
  actor: Actor,
) -> Result<ActorContext> {
  match actor {
    Actor::Guardian(guardian_id) => {
      if !row_exists(
        conn,
        "SELECT 1 FROM guardians WHERE guardian_id = ?1",
        guardian_id,
      )? {
        return Err(CoreError::GuardianNotFound(guardian_id).into());
      }
      let mut stmt =
        conn.prepare("SELECT learner_id FROM learners WHERE guardian_id = ?1")?;
      let learners = stmt
        .query_map(rusqlite::params![encode_uuid(guardian_id)], |row| {
          row.get::<_, String>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      let learner_ids = learners
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<BTreeSet<_>>>()?;
      Ok(ActorContext { actor, learner_ids })
    }
    Actor::Learner(learner_id) => {
      if !row_exists(
        conn,
        "SELECT 1 FROM learners WHERE learner_id = ?1",
        learner_id,
      )? {
        return Err(CoreError::LearnerNotFound(learner_id).into());
      }
      Ok(ActorContext {
        actor,
        learner_ids: BTreeSet::from([learner_id]),
      })
    }
  }
}

/// Find the owner's teachable record, creating it on first use.
fn ensure_teachable(conn: &rusqlite::Connection, owner: Owner) -> Result<String> {
  let kind = encode_owner_kind(owner.kind());
  let owner_id_str = encode_uuid(owner.owner_id());

  let existing: Option<String> = conn
    .query_row(
      "SELECT teachable_id FROM teachables WHERE kind = ?1 AND owner_id = ?2",
      rusqlite::params![kind, owner_id_str],
      |row| row.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  let teachable_id = encode_uuid(Uuid::new_v4());
  conn.execute(
    "INSERT INTO teachables (teachable_id, kind, owner_id, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![teachable_id, kind, owner_id_str, encode_dt(Utc::now())],
  )?;
  Ok(teachable_id)
}

fn insert_options(
  conn: &rusqlite::Connection,
  subject_id: &str,
  names: &[String],
) -> Result<Vec<SubjectOption>> {
  names
    .iter()
    .enumerate()
    .map(|(position, name)| {
      let option = SubjectOption {
        option_id: Uuid::new_v4(),
        name:      name.clone(),
        position:  position as u32,
      };
      conn.execute(
        "INSERT INTO subject_options (option_id, subject_id, name, position)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
          encode_uuid(option.option_id),
          subject_id,
          option.name,
          option.position,
        ],
      )?;
      Ok(option)
    })
    .collect()
}

fn create_subject(
  conn: &rusqlite::Connection,
  input: NewSubject,
  now: DateTime<Utc>,
) -> Result<Subject> {
  // Owner must exist before a teachable record is minted for it.
  resolve_owner_view(conn, input.owner)?;
  let teachable_id = ensure_teachable(conn, input.owner)?;

  let subject_id = Uuid::new_v4();
  let id_str = encode_uuid(subject_id);

  let (variant_str, days_str) = match &input.variant {
    NewScheduleVariant::Fixed => ("fixed", None),
    NewScheduleVariant::Scheduled { days } => {
      ("scheduled", Some(encode_days(days)?))
    }
    NewScheduleVariant::Pick1 { .. } => ("pick1", None),
  };

  conn.execute(
    "INSERT INTO subjects (
       subject_id, teachable_id, name, icon, variant, days,
       narration_required, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      id_str,
      teachable_id,
      input.name,
      input.icon,
      variant_str,
      days_str,
      input.narration_required,
      encode_dt(now),
    ],
  )?;

  let variant = match input.variant {
    NewScheduleVariant::Fixed => ScheduleVariant::Fixed,
    NewScheduleVariant::Scheduled { days } => ScheduleVariant::Scheduled { days },
    NewScheduleVariant::Pick1 { options } => ScheduleVariant::Pick1 {
      options: insert_options(conn, &id_str, &options)?,
    },
  };

  Ok(Subject {
    subject_id,
    name: input.name,
    icon: input.icon,
    variant,
    narration_required: input.narration_required,
    owner: input.owner,
    created_at: now,
  })
}

fn apply_subject_update(
  conn: &rusqlite::Connection,
  id: Uuid,
  update: SubjectUpdate,
) -> Result<Subject> {
  let mut subject =
    subject_by_id(conn, id)?.ok_or(CoreError::SubjectNotFound(id))?;
  let id_str = encode_uuid(id);

  if let Some(name) = update.name {
    subject.name = name;
  }
  if let Some(icon) = update.icon {
    subject.icon = Some(icon);
  }
  if let Some(flag) = update.narration_required {
    subject.narration_required = flag;
  }
  if let Some(variant) = update.variant {
    // The new variant replaces the option list wholesale; completions bound
    // to removed options cascade away with them.
    conn.execute(
      "DELETE FROM subject_options WHERE subject_id = ?1",
      rusqlite::params![id_str],
    )?;
    subject.variant = match variant {
      NewScheduleVariant::Fixed => ScheduleVariant::Fixed,
      NewScheduleVariant::Scheduled { days } => {
        ScheduleVariant::Scheduled { days }
      }
      NewScheduleVariant::Pick1 { options } => ScheduleVariant::Pick1 {
        options: insert_options(conn, &id_str, &options)?,
      },
    };
  }

  let days_str = match &subject.variant {
    ScheduleVariant::Scheduled { days } => Some(encode_days(days)?),
    _ => None,
  };
  conn.execute(
    "UPDATE subjects
     SET name = ?2, icon = ?3, variant = ?4, days = ?5, narration_required = ?6
     WHERE subject_id = ?1",
    rusqlite::params![
      id_str,
      subject.name,
      subject.icon,
      subject.variant.discriminant(),
      days_str,
      subject.narration_required,
    ],
  )?;

  Ok(subject)
}

fn learner_subjects(
  conn: &rusqlite::Connection,
  learner_id: Uuid,
) -> Result<Vec<Subject>> {
  if !row_exists(
    conn,
    "SELECT 1 FROM learners WHERE learner_id = ?1",
    learner_id,
  )? {
    return Err(CoreError::LearnerNotFound(learner_id).into());
  }

  let id_str = encode_uuid(learner_id);
  let mut stmt = conn.prepare(&format!(
    "SELECT {SUBJECT_COLUMNS} FROM subjects s
     JOIN teachables t ON t.teachable_id = s.teachable_id
     WHERE (t.kind = 'individual' AND t.owner_id = ?1)
        OR (t.kind = 'group' AND t.owner_id IN
              (SELECT group_id FROM group_members WHERE learner_id = ?1))
     ORDER BY s.created_at"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![id_str], raw_subject_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let options = if raw.variant == "pick1" {
        options_for(conn, &raw.subject_id)?
      } else {
        Vec::new()
      };
      raw.into_subject(options)
    })
    .collect()
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// The toggle state machine, executed within the caller's transaction.
fn run_toggle(
  conn: &rusqlite::Connection,
  subject_id: Uuid,
  date: NaiveDate,
  option_id: Option<Uuid>,
) -> Result<ToggleOutcome> {
  let subject =
    subject_by_id(conn, subject_id)?.ok_or(CoreError::SubjectNotFound(subject_id))?;
  let subject_id_str = encode_uuid(subject_id);
  let date_str = encode_date(date);

  let existing = completion_for(conn, &subject_id_str, &date_str)?;
  let plan = plan_toggle(&subject, date, existing.as_ref(), option_id)
    .map_err(Error::Core)?;

  match plan {
    ToggleAction::Create { option_id } => {
      let insert = conn.execute(
        "INSERT INTO completions (
           completion_id, subject_id, date, selected_option_id, completed_at
         ) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
          encode_uuid(Uuid::new_v4()),
          subject_id_str,
          date_str,
          option_id.map(encode_uuid),
          encode_dt(Utc::now()),
        ],
      );

      match insert {
        Ok(_) => {
          let narration_reminder = (subject.narration_required
            && !narration_present(conn, &subject_id_str, &date_str)?)
          .then_some(NarrationReminder { subject_id, date });
          Ok(ToggleOutcome {
            completed: true,
            selected_option_id: option_id,
            narration_reminder,
          })
        }
        // A concurrent toggle won the insert. Adopt its row as this call's
        // result — "someone else already completed this" is a valid
        // idempotent outcome, not a crash.
        Err(e) if is_unique_violation(&e) => {
          match completion_for(conn, &subject_id_str, &date_str)? {
            Some(current) => Ok(ToggleOutcome {
              completed:          true,
              selected_option_id: current.selected_option_id,
              narration_reminder: None,
            }),
            None => Err(
              CoreError::UniquenessViolation(format!(
                "completion for subject {subject_id} on {date_str}"
              ))
              .into(),
            ),
          }
        }
        Err(e) => Err(e.into()),
      }
    }

    ToggleAction::Destroy { completion_id } => {
      conn.execute(
        "DELETE FROM completions WHERE completion_id = ?1",
        rusqlite::params![encode_uuid(completion_id)],
      )?;
      Ok(ToggleOutcome {
        completed:          false,
        selected_option_id: None,
        narration_reminder: None,
      })
    }

    ToggleAction::Rebind {
      completion_id,
      option_id,
    } => {
      conn.execute(
        "UPDATE completions SET selected_option_id = ?2 WHERE completion_id = ?1",
        rusqlite::params![encode_uuid(completion_id), encode_uuid(option_id)],
      )?;
      Ok(ToggleOutcome {
        completed:          true,
        selected_option_id: Some(option_id),
        narration_reminder: None,
      })
    }
  }
}

fn compute_balance(
  conn: &rusqlite::Connection,
  subject_id: Uuid,
  from: NaiveDate,
  to: NaiveDate,
) -> Result<BalanceReport> {
  let subject =
    subject_by_id(conn, subject_id)?.ok_or(CoreError::SubjectNotFound(subject_id))?;
  let ScheduleVariant::Pick1 { options } = &subject.variant else {
    return Err(
      CoreError::Validation {
        field:   "variant",
        message: "balance applies only to pick-one subjects".into(),
      }
      .into(),
    );
  };

  // Completions are trusted as ground truth; a schedule edit does not
  // retroactively filter the historical rows.
  let mut stmt = conn.prepare(
    "SELECT selected_option_id FROM completions
     WHERE subject_id = ?1 AND date >= ?2 AND date <= ?3
       AND selected_option_id IS NOT NULL",
  )?;
  let raw = stmt
    .query_map(
      rusqlite::params![encode_uuid(subject_id), encode_date(from), encode_date(to)],
      |row| row.get::<_, String>(0),
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let selections = raw
    .iter()
    .map(|s| decode_uuid(s))
    .collect::<Result<Vec<_>>>()?;

  Ok(analytics::balance(options, &selections))
}

// ─── CurriculumStore impl ────────────────────────────────────────────────────

impl CurriculumStore for SqliteStore {
  type Error = Error;

  // ── Roster ────────────────────────────────────────────────────────────────

  async fn add_guardian(&self, name: String) -> Result<Guardian> {
    let guardian = Guardian {
      guardian_id: Uuid::new_v4(),
      name,
      created_at: Utc::now(),
    };
    let id_str = encode_uuid(guardian.guardian_id);
    let at_str = encode_dt(guardian.created_at);
    let name_cl = guardian.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO guardians (guardian_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_cl, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(guardian)
  }

  async fn get_guardian(&self, id: Uuid) -> Result<Option<Guardian>> {
    self.conn.call(move |conn| Ok(guardian_by_id(conn, id))).await?
  }

  async fn add_learner(&self, guardian_id: Uuid, name: String) -> Result<Learner> {
    let learner = Learner {
      learner_id: Uuid::new_v4(),
      guardian_id,
      name,
      created_at: Utc::now(),
    };
    let id_str = encode_uuid(learner.learner_id);
    let guardian_str = encode_uuid(guardian_id);
    let at_str = encode_dt(learner.created_at);
    let name_cl = learner.name.clone();

    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<()> {
          if !row_exists(
            conn,
            "SELECT 1 FROM guardians WHERE guardian_id = ?1",
            guardian_id,
          )? {
            return Err(CoreError::GuardianNotFound(guardian_id).into());
          }
          conn.execute(
            "INSERT INTO learners (learner_id, guardian_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, guardian_str, name_cl, at_str],
          )?;
          Ok(())
        })())
      })
      .await??;

    Ok(learner)
  }

  async fn get_learner(&self, id: Uuid) -> Result<Option<Learner>> {
    self.conn.call(move |conn| Ok(learner_by_id(conn, id))).await?
  }

  async fn list_learners(&self, guardian_id: Uuid) -> Result<Vec<Learner>> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<Vec<Learner>> {
          let mut stmt = conn.prepare(
            "SELECT learner_id, guardian_id, name, created_at FROM learners
             WHERE guardian_id = ?1 ORDER BY created_at",
          )?;
          let raws = stmt
            .query_map(rusqlite::params![encode_uuid(guardian_id)], |row| {
              Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
              ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          raws
            .into_iter()
            .map(|(id_str, guardian_str, name, at)| {
              Ok(Learner {
                learner_id:  decode_uuid(&id_str)?,
                guardian_id: decode_uuid(&guardian_str)?,
                name,
                created_at:  crate::encode::decode_dt(&at)?,
              })
            })
            .collect()
        })())
      })
      .await?
  }

  async fn add_group(&self, name: String) -> Result<Group> {
    let group = Group {
      group_id: Uuid::new_v4(),
      name,
      created_at: Utc::now(),
    };
    let id_str = encode_uuid(group.group_id);
    let at_str = encode_dt(group.created_at);
    let name_cl = group.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_cl, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    self.conn.call(move |conn| Ok(group_by_id(conn, id))).await?
  }

  async fn add_group_member(&self, group_id: Uuid, learner_id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<()> {
          if !row_exists(conn, "SELECT 1 FROM groups WHERE group_id = ?1", group_id)? {
            return Err(CoreError::GroupNotFound(group_id).into());
          }
          if !row_exists(
            conn,
            "SELECT 1 FROM learners WHERE learner_id = ?1",
            learner_id,
          )? {
            return Err(CoreError::LearnerNotFound(learner_id).into());
          }
          conn.execute(
            "INSERT OR IGNORE INTO group_members (group_id, learner_id) VALUES (?1, ?2)",
            rusqlite::params![encode_uuid(group_id), encode_uuid(learner_id)],
          )?;
          Ok(())
        })())
      })
      .await?
  }

  async fn remove_group_member(
    &self,
    group_id: Uuid,
    learner_id: Uuid,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM group_members WHERE group_id = ?1 AND learner_id = ?2",
          rusqlite::params![encode_uuid(group_id), encode_uuid(learner_id)],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn is_member(&self, group_id: Uuid, learner_id: Uuid) -> Result<bool> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<bool> {
          let found: Option<bool> = conn
            .query_row(
              "SELECT 1 FROM group_members WHERE group_id = ?1 AND learner_id = ?2",
              rusqlite::params![encode_uuid(group_id), encode_uuid(learner_id)],
              |_| Ok(true),
            )
            .optional()?;
          Ok(found.unwrap_or(false))
        })())
      })
      .await?
  }

  // ── Ownership resolution ──────────────────────────────────────────────────

  async fn actor_context(&self, actor: Actor) -> Result<ActorContext> {
    self
      .conn
      .call(move |conn| Ok(resolve_actor_context(conn, actor)))
      .await?
  }

  async fn owner_view(&self, owner: Owner) -> Result<OwnershipView> {
    self
      .conn
      .call(move |conn| Ok(resolve_owner_view(conn, owner)))
      .await?
  }

  async fn ownership_view(&self, subject_id: Uuid) -> Result<OwnershipView> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<OwnershipView> {
          let subject = subject_by_id(conn, subject_id)?
            .ok_or(CoreError::SubjectNotFound(subject_id))?;
          resolve_owner_view(conn, subject.owner)
        })())
      })
      .await?
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    input.validate()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = create_subject(&tx, input, Utc::now());
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    self.conn.call(move |conn| Ok(subject_by_id(conn, id))).await?
  }

  async fn update_subject(&self, id: Uuid, update: SubjectUpdate) -> Result<Subject> {
    update.validate()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = apply_subject_update(&tx, id, update);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn delete_subject(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<()> {
          let deleted = conn.execute(
            "DELETE FROM subjects WHERE subject_id = ?1",
            rusqlite::params![encode_uuid(id)],
          )?;
          if deleted == 0 {
            return Err(CoreError::SubjectNotFound(id).into());
          }
          Ok(())
        })())
      })
      .await?
  }

  async fn visible_subjects(&self, learner_id: Uuid) -> Result<Vec<Subject>> {
    self
      .conn
      .call(move |conn| Ok(learner_subjects(conn, learner_id)))
      .await?
  }

  // ── Completions ───────────────────────────────────────────────────────────

  async fn toggle(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    option_id: Option<Uuid>,
  ) -> Result<ToggleOutcome> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = run_toggle(&tx, subject_id, date, option_id);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn completion_on(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> Result<Option<Completion>> {
    self
      .conn
      .call(move |conn| {
        Ok(completion_for(conn, &encode_uuid(subject_id), &encode_date(date)))
      })
      .await?
  }

  async fn completions_in_range(
    &self,
    subject_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<Completion>> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<Vec<Completion>> {
          let mut stmt = conn.prepare(
            "SELECT completion_id, subject_id, date, selected_option_id, completed_at
             FROM completions
             WHERE subject_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
          )?;
          let raws = stmt
            .query_map(
              rusqlite::params![
                encode_uuid(subject_id),
                encode_date(from),
                encode_date(to),
              ],
              |row| {
                Ok(RawCompletion {
                  completion_id:      row.get(0)?,
                  subject_id:         row.get(1)?,
                  date:               row.get(2)?,
                  selected_option_id: row.get(3)?,
                  completed_at:       row.get(4)?,
                })
              },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          raws.into_iter().map(RawCompletion::into_completion).collect()
        })())
      })
      .await?
  }

  async fn balance(
    &self,
    subject_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<BalanceReport> {
    self
      .conn
      .call(move |conn| Ok(compute_balance(conn, subject_id, from, to)))
      .await?
  }

  // ── Narration records ─────────────────────────────────────────────────────

  async fn add_narration(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> Result<NarrationRecord> {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<NarrationRecord> {
          if !row_exists(
            conn,
            "SELECT 1 FROM subjects WHERE subject_id = ?1",
            subject_id,
          )? {
            return Err(CoreError::SubjectNotFound(subject_id).into());
          }

          let subject_id_str = encode_uuid(subject_id);
          let date_str = encode_date(date);

          let existing: Option<(String, String)> = conn
            .query_row(
              "SELECT narration_id, created_at FROM narrations
               WHERE subject_id = ?1 AND date = ?2",
              rusqlite::params![subject_id_str, date_str],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
          if let Some((id_str, at_str)) = existing {
            return Ok(NarrationRecord {
              narration_id: decode_uuid(&id_str)?,
              subject_id,
              date,
              created_at: crate::encode::decode_dt(&at_str)?,
            });
          }

          let record = NarrationRecord {
            narration_id: Uuid::new_v4(),
            subject_id,
            date,
            created_at: Utc::now(),
          };
          conn.execute(
            "INSERT INTO narrations (narration_id, subject_id, date, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              encode_uuid(record.narration_id),
              subject_id_str,
              date_str,
              encode_dt(record.created_at),
            ],
          )?;
          Ok(record)
        })())
      })
      .await?
  }

  async fn remove_narration(&self, subject_id: Uuid, date: NaiveDate) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM narrations WHERE subject_id = ?1 AND date = ?2",
          rusqlite::params![encode_uuid(subject_id), encode_date(date)],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn narration_exists(&self, subject_id: Uuid, date: NaiveDate) -> Result<bool> {
    self
      .conn
      .call(move |conn| {
        Ok(narration_present(conn, &encode_uuid(subject_id), &encode_date(date)))
      })
      .await?
  }
}
