//! The completion ledger — toggle state machine and its outcome types.
//!
//! A completion is a presence/absence record: toggling a day done creates a
//! row, toggling it again destroys that row. Nothing is ever flipped in
//! place except a Pick1 selection switch, which rebinds the existing row to
//! the newly-chosen option.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, subject::Subject};

// ─── Completion ──────────────────────────────────────────────────────────────

/// A subject marked done on a specific date. At most one exists per
/// `(subject, date)` — the store's unique constraint is the final arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
  pub completion_id:      Uuid,
  pub subject_id:         Uuid,
  pub date:               NaiveDate,
  /// Set for Pick1 subjects, always `None` otherwise.
  pub selected_option_id: Option<Uuid>,
  pub completed_at:       DateTime<Utc>,
}

// ─── Toggle plan ─────────────────────────────────────────────────────────────

/// The single mutation a toggle resolves to, decided by [`plan_toggle`] and
/// executed atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
  /// No completion exists — create one.
  Create { option_id: Option<Uuid> },
  /// A completion exists (same option, for Pick1) — destroy it.
  Destroy { completion_id: Uuid },
  /// A Pick1 completion exists bound to a different option — switch the
  /// binding in place. Row count is unchanged.
  Rebind {
    completion_id: Uuid,
    option_id:     Uuid,
  },
}

/// Decide what a toggle does, given the current row state.
///
/// Fails with [`Error::InactiveDate`] when the subject is not due on `date`,
/// with [`Error::Validation`] when a Pick1 toggle arrives without an option,
/// and with [`Error::InvalidOption`] when the option belongs to another
/// subject. An `option_id` supplied for a non-Pick1 subject is ignored.
pub fn plan_toggle(
  subject: &Subject,
  date: NaiveDate,
  existing: Option<&Completion>,
  option_id: Option<Uuid>,
) -> Result<ToggleAction> {
  if !subject.variant.active_on(date) {
    return Err(Error::InactiveDate {
      subject_id: subject.subject_id,
      date,
    });
  }

  if subject.variant.requires_option() {
    let requested = option_id.ok_or(Error::Validation {
      field:   "option_id",
      message: "a pick-one subject requires an option selection".into(),
    })?;
    if !subject
      .variant
      .options()
      .iter()
      .any(|o| o.option_id == requested)
    {
      return Err(Error::InvalidOption {
        subject_id: subject.subject_id,
        option_id:  requested,
      });
    }

    return Ok(match existing {
      None => ToggleAction::Create {
        option_id: Some(requested),
      },
      Some(c) if c.selected_option_id == Some(requested) => {
        ToggleAction::Destroy {
          completion_id: c.completion_id,
        }
      }
      Some(c) => ToggleAction::Rebind {
        completion_id: c.completion_id,
        option_id:     requested,
      },
    });
  }

  Ok(match existing {
    None => ToggleAction::Create { option_id: None },
    Some(c) => ToggleAction::Destroy {
      completion_id: c.completion_id,
    },
  })
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Best-effort signal that a narration-required subject was completed
/// without evidence on file. Informational only — never blocks the toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationReminder {
  pub subject_id: Uuid,
  pub date:       NaiveDate,
}

/// What a toggle returns: enough state for the caller to render a partial UI
/// update without re-querying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleOutcome {
  pub completed:          bool,
  pub selected_option_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub narration_reminder: Option<NarrationReminder>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
