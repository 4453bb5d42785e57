//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! `YYYY-MM-DD` (which sorts and compares lexicographically), the scheduled
//! day-set as compact JSON, and UUIDs as hyphenated lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use homeroom_core::{
  completion::Completion,
  owner::{Owner, OwnerKind},
  subject::{ScheduleVariant, SchoolDay, Subject, SubjectOption},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Owner kind ──────────────────────────────────────────────────────────────

pub fn encode_owner_kind(kind: OwnerKind) -> &'static str {
  match kind {
    OwnerKind::Individual => "individual",
    OwnerKind::Group => "group",
  }
}

pub fn decode_owner(kind: &str, owner_id: &str) -> Result<Owner> {
  let id = decode_uuid(owner_id)?;
  match kind {
    "individual" => Ok(Owner::Individual(id)),
    "group" => Ok(Owner::Group(id)),
    other => Err(Error::DateParse(format!("unknown owner kind: {other:?}"))),
  }
}

// ─── Day sets ────────────────────────────────────────────────────────────────

pub fn encode_days(days: &BTreeSet<SchoolDay>) -> Result<String> {
  Ok(serde_json::to_string(days)?)
}

pub fn decode_days(s: &str) -> Result<BTreeSet<SchoolDay>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `subjects` row joined with its teachable.
pub struct RawSubject {
  pub subject_id:         String,
  pub name:               String,
  pub icon:               Option<String>,
  pub variant:            String,
  pub days:               Option<String>,
  pub narration_required: bool,
  pub created_at:         String,
  // teachables join
  pub owner_kind:         String,
  pub owner_id:           String,
}

impl RawSubject {
  /// Assemble the domain subject; `options` are the subject's options in
  /// position order (empty unless the variant is `pick1`).
  pub fn into_subject(self, options: Vec<SubjectOption>) -> Result<Subject> {
    let variant = match self.variant.as_str() {
      "fixed" => ScheduleVariant::Fixed,
      "scheduled" => {
        let days_json = self.days.as_deref().unwrap_or("[]");
        ScheduleVariant::Scheduled {
          days: decode_days(days_json)?,
        }
      }
      "pick1" => ScheduleVariant::Pick1 { options },
      other => {
        return Err(Error::DateParse(format!(
          "unknown schedule variant: {other:?}"
        )));
      }
    };

    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name: self.name,
      icon: self.icon,
      variant,
      narration_required: self.narration_required,
      owner: decode_owner(&self.owner_kind, &self.owner_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `completions` row.
pub struct RawCompletion {
  pub completion_id:      String,
  pub subject_id:         String,
  pub date:               String,
  pub selected_option_id: Option<String>,
  pub completed_at:       String,
}

impl RawCompletion {
  pub fn into_completion(self) -> Result<Completion> {
    Ok(Completion {
      completion_id:      decode_uuid(&self.completion_id)?,
      subject_id:         decode_uuid(&self.subject_id)?,
      date:               decode_date(&self.date)?,
      selected_option_id: self
        .selected_option_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      completed_at:       decode_dt(&self.completed_at)?,
    })
  }
}
