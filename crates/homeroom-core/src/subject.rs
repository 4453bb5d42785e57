//! Subject types and the schedule engine.
//!
//! A subject's scheduling behaviour is a closed sum type. The active-on-date
//! predicate is computed by matching on the variant — no virtual dispatch,
//! no type-discriminator conditionals.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, owner::Owner};

// ─── School days ─────────────────────────────────────────────────────────────

/// A weekday on which schooling can happen. Saturday and Sunday are not
/// representable; weekend inactivity holds by construction.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SchoolDay {
  Mon,
  Tue,
  Wed,
  Thu,
  Fri,
}

impl SchoolDay {
  /// The school day a calendar date falls on, or `None` for weekends.
  pub fn from_date(date: NaiveDate) -> Option<Self> {
    match date.weekday() {
      Weekday::Mon => Some(Self::Mon),
      Weekday::Tue => Some(Self::Tue),
      Weekday::Wed => Some(Self::Wed),
      Weekday::Thu => Some(Self::Thu),
      Weekday::Fri => Some(Self::Fri),
      Weekday::Sat | Weekday::Sun => None,
    }
  }
}

// ─── Options ─────────────────────────────────────────────────────────────────

/// One selectable option of a [`ScheduleVariant::Pick1`] subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectOption {
  pub option_id: Uuid,
  pub name:      String,
  /// Stable display position within the subject, starting at 0.
  pub position:  u32,
}

// ─── Schedule variant ────────────────────────────────────────────────────────

/// How a subject recurs across the school week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScheduleVariant {
  /// Active every school weekday.
  Fixed,
  /// Active only on an explicit subset of weekdays. Never empty.
  Scheduled { days: BTreeSet<SchoolDay> },
  /// Active every school weekday; completing requires selecting exactly one
  /// of the named options.
  Pick1 { options: Vec<SubjectOption> },
}

impl ScheduleVariant {
  /// The discriminant string stored in the `variant` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Fixed => "fixed",
      Self::Scheduled { .. } => "scheduled",
      Self::Pick1 { .. } => "pick1",
    }
  }

  /// Whether the subject is due on `date`. Weekends are never active for
  /// any variant.
  pub fn active_on(&self, date: NaiveDate) -> bool {
    let Some(day) = SchoolDay::from_date(date) else {
      return false;
    };
    match self {
      Self::Fixed | Self::Pick1 { .. } => true,
      Self::Scheduled { days } => days.contains(&day),
    }
  }

  /// Whether a completion of this subject must carry an option selection.
  pub fn requires_option(&self) -> bool {
    matches!(self, Self::Pick1 { .. })
  }

  /// The options of a Pick1 subject, or an empty slice otherwise.
  pub fn options(&self) -> &[SubjectOption] {
    match self {
      Self::Pick1 { options } => options,
      _ => &[],
    }
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A recurring curriculum item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:         Uuid,
  pub name:               String,
  pub icon:               Option<String>,
  pub variant:            ScheduleVariant,
  /// When set, a newly-created completion without narration evidence raises
  /// an informational reminder.
  pub narration_required: bool,
  pub owner:              Owner,
  pub created_at:         DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Scheduling input for subject creation and edits. Option ids are assigned
/// by the store, so Pick1 options arrive as bare names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NewScheduleVariant {
  Fixed,
  Scheduled { days: BTreeSet<SchoolDay> },
  Pick1 { options: Vec<String> },
}

impl NewScheduleVariant {
  /// Field-level validation, run at creation and update — never re-checked
  /// per lookup.
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Fixed => Ok(()),
      Self::Scheduled { days } if days.is_empty() => Err(Error::Validation {
        field:   "days",
        message: "a scheduled subject needs at least one weekday".into(),
      }),
      Self::Scheduled { .. } => Ok(()),
      Self::Pick1 { options } if options.is_empty() => Err(Error::Validation {
        field:   "options",
        message: "a pick-one subject needs at least one option".into(),
      }),
      Self::Pick1 { options } => {
        if options.iter().any(|name| name.trim().is_empty()) {
          return Err(Error::Validation {
            field:   "options",
            message: "option names must not be blank".into(),
          });
        }
        Ok(())
      }
    }
  }
}

/// Input to [`crate::store::CurriculumStore::add_subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub name:               String,
  pub icon:               Option<String>,
  pub variant:            NewScheduleVariant,
  #[serde(default)]
  pub narration_required: bool,
  pub owner:              Owner,
}

impl NewSubject {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation {
        field:   "name",
        message: "subject name must not be blank".into(),
      });
    }
    self.variant.validate()
  }
}

/// Partial edit applied by [`crate::store::CurriculumStore::update_subject`].
/// `None` fields are left unchanged; a new variant replaces the old one
/// (including its option list).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectUpdate {
  pub name:               Option<String>,
  pub icon:               Option<String>,
  pub variant:            Option<NewScheduleVariant>,
  pub narration_required: Option<bool>,
}

impl SubjectUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::Validation {
        field:   "name",
        message: "subject name must not be blank".into(),
      });
    }
    match &self.variant {
      Some(variant) => variant.validate(),
      None => Ok(()),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  // 2026-01-26 is a Monday.
  const MON: (i32, u32, u32) = (2026, 1, 26);
  const FRI: (i32, u32, u32) = (2026, 1, 30);
  const SAT: (i32, u32, u32) = (2026, 1, 31);
  const SUN: (i32, u32, u32) = (2026, 2, 1);

  fn scheduled(days: &[SchoolDay]) -> ScheduleVariant {
    ScheduleVariant::Scheduled {
      days: days.iter().copied().collect(),
    }
  }

  fn pick1(names: &[&str]) -> ScheduleVariant {
    ScheduleVariant::Pick1 {
      options: names
        .iter()
        .enumerate()
        .map(|(i, n)| SubjectOption {
          option_id: Uuid::new_v4(),
          name:      (*n).into(),
          position:  i as u32,
        })
        .collect(),
    }
  }

  #[test]
  fn fixed_active_every_school_weekday() {
    let v = ScheduleVariant::Fixed;
    assert!(v.active_on(date(MON.0, MON.1, MON.2)));
    assert!(v.active_on(date(FRI.0, FRI.1, FRI.2)));
  }

  #[test]
  fn no_variant_is_active_on_weekends() {
    let variants = [
      ScheduleVariant::Fixed,
      scheduled(&[SchoolDay::Mon, SchoolDay::Tue]),
      pick1(&["a", "b"]),
    ];
    for v in &variants {
      assert!(!v.active_on(date(SAT.0, SAT.1, SAT.2)), "{v:?} on Saturday");
      assert!(!v.active_on(date(SUN.0, SUN.1, SUN.2)), "{v:?} on Sunday");
    }
  }

  #[test]
  fn scheduled_active_iff_weekday_in_set() {
    let v = scheduled(&[
      SchoolDay::Mon,
      SchoolDay::Tue,
      SchoolDay::Wed,
      SchoolDay::Thu,
    ]);
    // Mon 26th through Thu 29th active, Fri 30th not.
    for d in 26..=29 {
      assert!(v.active_on(date(2026, 1, d)));
    }
    assert!(!v.active_on(date(FRI.0, FRI.1, FRI.2)));
  }

  #[test]
  fn pick1_active_every_school_weekday() {
    let v = pick1(&["Safar Book", "Quran Recitation"]);
    for d in 26..=30 {
      assert!(v.active_on(date(2026, 1, d)));
    }
  }

  #[test]
  fn school_day_mapping_matches_calendar() {
    assert_eq!(SchoolDay::from_date(date(2026, 1, 26)), Some(SchoolDay::Mon));
    assert_eq!(SchoolDay::from_date(date(2026, 1, 30)), Some(SchoolDay::Fri));
    assert_eq!(SchoolDay::from_date(date(2026, 1, 31)), None);
    assert_eq!(SchoolDay::from_date(date(2026, 2, 1)), None);
  }

  #[test]
  fn empty_scheduled_day_set_rejected() {
    let input = NewScheduleVariant::Scheduled {
      days: BTreeSet::new(),
    };
    let err = input.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "days", .. }));
  }

  #[test]
  fn empty_pick1_options_rejected() {
    let input = NewScheduleVariant::Pick1 { options: vec![] };
    let err = input.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "options", .. }));
  }

  #[test]
  fn blank_subject_name_rejected() {
    let input = NewSubject {
      name:               "  ".into(),
      icon:               None,
      variant:            NewScheduleVariant::Fixed,
      narration_required: false,
      owner:              Owner::Individual(Uuid::new_v4()),
    };
    let err = input.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "name", .. }));
  }
}
