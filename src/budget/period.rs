//! Budget period windows.
//!
//! Recurring windows are anchored on the budget's start date: weekly windows
//! are consecutive 7-day blocks, monthly windows step by calendar months from
//! the original start (clamped to month end, so a Jan 31 start gives Feb 28).

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use super::types::{Budget, BudgetPeriod};

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Days from the window start through `day`, clamped to the window.
    pub fn days_elapsed(&self, day: NaiveDate) -> i64 {
        ((day - self.start).num_days() + 1).clamp(0, self.total_days())
    }
}

fn add_months(day: NaiveDate, months: u32) -> NaiveDate {
    day.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Saturates at `NaiveDate::MAX`.
fn add_days(day: NaiveDate, days: i64) -> NaiveDate {
    day.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

/// The window of `budget` that contains `reference`. References before the
/// start date resolve to the first window.
pub fn current_window(budget: &Budget, reference: NaiveDate) -> Window {
    let start = budget.start_date;
    match budget.period {
        BudgetPeriod::Custom => Window {
            start,
            end: budget.end_date.unwrap_or(start),
        },
        BudgetPeriod::Weekly => {
            let n = (reference - start).num_days().max(0) / 7;
            let window_start = add_days(start, 7 * n);
            Window {
                start: window_start,
                end: add_days(window_start, 6),
            }
        }
        BudgetPeriod::Monthly => {
            let months = (reference.year() - start.year()) * 12 + reference.month() as i32
                - start.month() as i32;
            let mut n = months.max(0) as u32;
            if n > 0 && add_months(start, n) > reference {
                n -= 1;
            }
            Window {
                start: add_months(start, n),
                end: add_months(start, n + 1) - Duration::days(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::types::{BudgetScope, NewBudget};
    use chrono::Utc;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(period: BudgetPeriod, start: NaiveDate, end: Option<NaiveDate>) -> Budget {
        Budget::create(
            Uuid::nil(),
            NewBudget {
                name: "Test".into(),
                description: None,
                amount: 100.0,
                period,
                start_date: start,
                end_date: end,
                scope: BudgetScope::default(),
                alert_threshold: 80,
                alert_enabled: true,
                is_active: true,
            },
            "u1",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_windows_near_max_date_saturate() {
        let start = NaiveDate::MAX - Duration::days(2);
        let b = budget(BudgetPeriod::Weekly, start, None);
        let w = current_window(&b, start);
        assert_eq!((w.start, w.end), (start, NaiveDate::MAX));
        assert_eq!(w.total_days(), 3);

        let b = budget(BudgetPeriod::Monthly, start, None);
        let w = current_window(&b, NaiveDate::MAX);
        assert_eq!(w.start, start);
        assert_eq!(w.end, NaiveDate::MAX - Duration::days(1));
    }

    #[test]
    fn test_weekly_windows() {
        let b = budget(BudgetPeriod::Weekly, day(2025, 1, 1), None);
        let w = current_window(&b, day(2025, 1, 7));
        assert_eq!((w.start, w.end), (day(2025, 1, 1), day(2025, 1, 7)));
        let w = current_window(&b, day(2025, 1, 8));
        assert_eq!((w.start, w.end), (day(2025, 1, 8), day(2025, 1, 14)));
        assert_eq!(w.total_days(), 7);
    }

    #[test]
    fn test_monthly_windows() {
        let b = budget(BudgetPeriod::Monthly, day(2025, 1, 15), None);
        let w = current_window(&b, day(2025, 2, 14));
        assert_eq!((w.start, w.end), (day(2025, 1, 15), day(2025, 2, 14)));
        let w = current_window(&b, day(2025, 2, 15));
        assert_eq!((w.start, w.end), (day(2025, 2, 15), day(2025, 3, 14)));
        let w = current_window(&b, day(2026, 1, 20));
        assert_eq!((w.start, w.end), (day(2026, 1, 15), day(2026, 2, 14)));
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let b = budget(BudgetPeriod::Monthly, day(2025, 1, 31), None);
        let w = current_window(&b, day(2025, 2, 27));
        assert_eq!((w.start, w.end), (day(2025, 1, 31), day(2025, 2, 27)));
        let w = current_window(&b, day(2025, 2, 28));
        assert_eq!(w.start, day(2025, 2, 28));
        // Anchored on the original start, so March gets its 31st back.
        let w = current_window(&b, day(2025, 3, 31));
        assert_eq!(w.start, day(2025, 3, 31));
    }

    #[test]
    fn test_custom_and_before_start() {
        let b = budget(BudgetPeriod::Custom, day(2025, 3, 1), Some(day(2025, 3, 10)));
        let w = current_window(&b, day(2025, 6, 1));
        assert_eq!((w.start, w.end), (day(2025, 3, 1), day(2025, 3, 10)));
        assert_eq!(w.total_days(), 10);

        let weekly = budget(BudgetPeriod::Weekly, day(2025, 3, 1), None);
        let w = current_window(&weekly, day(2025, 2, 1));
        assert_eq!(w.start, day(2025, 3, 1));
        assert_eq!(w.days_elapsed(day(2025, 2, 1)), 0);
    }

    #[test]
    fn test_days_elapsed_is_clamped() {
        let w = Window {
            start: day(2025, 1, 1),
            end: day(2025, 1, 7),
        };
        assert_eq!(w.days_elapsed(day(2025, 1, 1)), 1);
        assert_eq!(w.days_elapsed(day(2025, 1, 4)), 4);
        assert_eq!(w.days_elapsed(day(2025, 2, 1)), 7);
    }
}
