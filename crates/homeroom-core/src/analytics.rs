//! Pick1 selection-distribution analytics.
//!
//! The balance report answers "how evenly have the options been chosen over
//! a date range". Completions are trusted as ground truth — a later schedule
//! edit does not retroactively erase rows from the report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::SubjectOption;

/// One option's share of the selections in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionShare {
  pub option_id:  Uuid,
  pub name:       String,
  pub count:      u64,
  /// Percentage of the range total, rounded to one decimal place. `0.0`
  /// when the total is zero.
  pub percentage: f64,
}

/// Selection distribution for a Pick1 subject over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
  /// Every option of the subject in display order — options never chosen in
  /// range appear with a zero count, which is the point of the report.
  pub shares: Vec<OptionShare>,
  pub total:  u64,
}

/// Compute the balance report from the subject's option list and the option
/// selections of the completions whose date fell within the range.
pub fn balance(options: &[SubjectOption], selections: &[Uuid]) -> BalanceReport {
  let total = selections.len() as u64;

  let shares = options
    .iter()
    .map(|option| {
      let count = selections
        .iter()
        .filter(|id| **id == option.option_id)
        .count() as u64;
      let percentage = if total == 0 {
        0.0
      } else {
        round1(count as f64 / total as f64 * 100.0)
      };
      OptionShare {
        option_id: option.option_id,
        name: option.name.clone(),
        count,
        percentage,
      }
    })
    .collect();

  BalanceReport { shares, total }
}

fn round1(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(names: &[&str]) -> Vec<SubjectOption> {
    names
      .iter()
      .enumerate()
      .map(|(i, n)| SubjectOption {
        option_id: Uuid::new_v4(),
        name:      (*n).into(),
        position:  i as u32,
      })
      .collect()
  }

  #[test]
  fn zero_completions_yields_all_zero_shares() {
    let opts = options(&["Safar Book", "Quran Recitation", "Seerah Stories"]);
    let report = balance(&opts, &[]);

    assert_eq!(report.total, 0);
    assert_eq!(report.shares.len(), 3);
    for share in &report.shares {
      assert_eq!(share.count, 0);
      assert_eq!(share.percentage, 0.0);
    }
  }

  #[test]
  fn counts_sum_to_total_and_percentages_to_hundred() {
    let opts = options(&["a", "b", "c"]);
    let selections = vec![
      opts[0].option_id,
      opts[0].option_id,
      opts[1].option_id,
      opts[0].option_id,
    ];
    let report = balance(&opts, &selections);

    assert_eq!(report.total, 4);
    let count_sum: u64 = report.shares.iter().map(|s| s.count).sum();
    assert_eq!(count_sum, report.total);

    let pct_sum: f64 = report.shares.iter().map(|s| s.percentage).sum();
    assert!((pct_sum - 100.0).abs() < 0.2, "sum was {pct_sum}");

    assert_eq!(report.shares[0].count, 3);
    assert_eq!(report.shares[0].percentage, 75.0);
    assert_eq!(report.shares[1].count, 1);
    assert_eq!(report.shares[1].percentage, 25.0);
    assert_eq!(report.shares[2].count, 0);
    assert_eq!(report.shares[2].percentage, 0.0);
  }

  #[test]
  fn percentages_round_to_one_decimal() {
    let opts = options(&["a", "b", "c"]);
    let selections = vec![
      opts[0].option_id,
      opts[1].option_id,
      opts[2].option_id,
    ];
    let report = balance(&opts, &selections);

    // 1/3 → 33.333…% → 33.3.
    for share in &report.shares {
      assert_eq!(share.percentage, 33.3);
    }
  }

  #[test]
  fn never_chosen_options_stay_visible() {
    let opts = options(&["used", "unused"]);
    let report = balance(&opts, &[opts[0].option_id]);

    assert_eq!(report.shares.len(), 2);
    assert_eq!(report.shares[1].name, "unused");
    assert_eq!(report.shares[1].count, 0);
  }
}
