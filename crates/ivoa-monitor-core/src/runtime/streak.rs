// crates/ivoa-monitor-core/src/runtime/streak.rs
// ============================================================================
// Module: IVOA Monitor Days-Unchanged Streak
// Description: Streak computation for the `days_same` column.
// Purpose: Keep the accumulate-or-reset decision in one swappable function.
// Dependencies: crate::core, serde, tracing
// ============================================================================

//! ## Overview
//! `days_same` counts elapsed days between validations. The long-standing
//! behavior accumulates unconditionally, even when the new result differs
//! from the previous one. [`StreakPolicy::ResetOnChange`] restarts the streak
//! when the result changes instead. Callers only ever go through
//! [`next_days_same`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::core::CalendarDay;
use crate::core::ResultSnapshot;
use crate::core::ValidationOutcome;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// How `days_same` reacts to a new result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakPolicy {
    /// Add elapsed days regardless of whether the result changed.
    #[default]
    Accumulate,
    /// Add elapsed days while the result is unchanged; restart at 0 otherwise.
    ResetOnChange,
}

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Whole days between the previous validation and `today`.
///
/// Absent dates count as 0. Unparsable dates count as 0 and are logged.
#[must_use]
pub fn elapsed_days(previous: Option<&str>, today: CalendarDay) -> i64 {
    let Some(raw) = previous else {
        return 0;
    };
    match CalendarDay::parse(raw) {
        Ok(day) => today.days_since(day),
        Err(err) => {
            warn!(previous = raw, error = %err, "previous validation date unreadable; counting 0 days");
            0
        }
    }
}

/// Computes the new `days_same` value for a merge.
#[must_use]
pub fn next_days_same(
    policy: StreakPolicy,
    previous: &ResultSnapshot,
    outcome: &ValidationOutcome,
    today: CalendarDay,
) -> i64 {
    let elapsed = elapsed_days(previous.date.as_deref(), today);
    match policy {
        StreakPolicy::Accumulate => previous.days_same + elapsed,
        StreakPolicy::ResetOnChange => {
            if result_changed(previous, outcome) {
                0
            } else {
                previous.days_same + elapsed
            }
        }
    }
}

/// Returns true when the flags or counts differ from the stored snapshot.
fn result_changed(previous: &ResultSnapshot, outcome: &ValidationOutcome) -> bool {
    previous.result_vot != outcome.result_vot
        || previous.result_spec != outcome.result_spec
        || previous.counts != outcome.counts
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use time::macros::date;

    use super::*;
    use crate::core::ResultCounts;

    fn snapshot(date: Option<&str>, days_same: i64, warnings: i64) -> ResultSnapshot {
        ResultSnapshot {
            date: date.map(str::to_string),
            days_same,
            counts: ResultCounts {
                warnings,
                ..ResultCounts::default()
            },
            ..ResultSnapshot::default()
        }
    }

    fn outcome(warnings: i64) -> ValidationOutcome {
        ValidationOutcome {
            counts: ResultCounts {
                warnings,
                ..ResultCounts::default()
            },
            ..ValidationOutcome::default()
        }
    }

    const TODAY: CalendarDay = CalendarDay::new(date!(2018 - 04 - 10));

    #[test]
    fn accumulate_adds_elapsed_days_even_when_result_changes() {
        let previous = snapshot(Some("2018-04-07"), 5, 1);
        assert_eq!(next_days_same(StreakPolicy::Accumulate, &previous, &outcome(1), TODAY), 8);
        assert_eq!(next_days_same(StreakPolicy::Accumulate, &previous, &outcome(9), TODAY), 8);
    }

    #[test]
    fn never_validated_service_keeps_its_streak() {
        let previous = snapshot(None, 0, 0);
        assert_eq!(next_days_same(StreakPolicy::Accumulate, &previous, &outcome(3), TODAY), 0);
    }

    #[test]
    fn same_day_revalidation_adds_nothing() {
        let previous = snapshot(Some("2018-04-10"), 4, 0);
        assert_eq!(next_days_same(StreakPolicy::Accumulate, &previous, &outcome(0), TODAY), 4);
    }

    #[test]
    fn unparsable_previous_date_counts_zero_days() {
        let previous = snapshot(Some("10/04/2018"), 2, 0);
        assert_eq!(next_days_same(StreakPolicy::Accumulate, &previous, &outcome(0), TODAY), 2);
    }

    #[test]
    fn reset_on_change_restarts_only_on_a_different_result() {
        let previous = snapshot(Some("2018-04-08"), 6, 2);
        assert_eq!(next_days_same(StreakPolicy::ResetOnChange, &previous, &outcome(2), TODAY), 8);
        assert_eq!(next_days_same(StreakPolicy::ResetOnChange, &previous, &outcome(3), TODAY), 0);
    }

    #[test]
    #[ignore = "parked until the default policy resets the streak on a changed result"]
    fn default_policy_resets_streak_on_changed_result() {
        let previous = snapshot(Some("2018-04-08"), 6, 2);
        assert_eq!(next_days_same(StreakPolicy::default(), &previous, &outcome(3), TODAY), 0);
    }
}
