//! Narration evidence tracking.
//!
//! The core tracks only existence: the narration content itself (text,
//! attachments) belongs to an external collaborator keyed by
//! `(subject, date)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::Subject;

/// Evidence that a subject's work was narrated on a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationRecord {
  pub narration_id: Uuid,
  pub subject_id:   Uuid,
  pub date:         NaiveDate,
  pub created_at:   DateTime<Utc>,
}

/// Whether the subject's evidence requirement is satisfied for a date.
/// Subjects without the flag are always satisfied.
pub fn has_required_evidence(subject: &Subject, narration_exists: bool) -> bool {
  !subject.narration_required || narration_exists
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{owner::Owner, subject::ScheduleVariant};

  fn subject(narration_required: bool) -> Subject {
    Subject {
      subject_id: Uuid::new_v4(),
      name: "History".into(),
      icon: None,
      variant: ScheduleVariant::Fixed,
      narration_required,
      owner: Owner::Individual(Uuid::new_v4()),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn flag_off_is_always_satisfied() {
    let s = subject(false);
    assert!(has_required_evidence(&s, false));
    assert!(has_required_evidence(&s, true));
  }

  #[test]
  fn flag_on_requires_existing_narration() {
    let s = subject(true);
    assert!(!has_required_evidence(&s, false));
    assert!(has_required_evidence(&s, true));
  }
}
