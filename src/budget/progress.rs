//! Budget progress: spending inside the current window compared against the
//! budget's linear daily pace.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::period::current_window;
use super::types::{Budget, BudgetPeriod};
use crate::error::{LedgerError, LedgerResult};
use crate::expense::Expense;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Under,
    Warning,
    Over,
    Exceeded,
}

/// Pace status of a single day, used by calendar views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Under,
    Warning,
    Over,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_spent: f64,
    pub expense_count: usize,
    pub remaining: f64,
    pub percentage_used: f64,
    pub total_days: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub daily_pace: f64,
    pub expected_spending_by_now: f64,
    pub actual_daily_average: f64,
    pub projected_spending: f64,
    pub is_over_budget: bool,
    pub is_over_pace: bool,
    pub is_on_track: bool,
    pub status: BudgetStatus,
    pub alert_triggered: bool,
}

/// Sum of scoped expenses dated within `[from, to]` (inclusive days; `to`
/// open when `None`).
fn scoped_spend(
    budget: &Budget,
    expenses: &[&Expense],
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> (f64, usize) {
    expenses
        .iter()
        .filter(|e| !e.audit.is_deleted() && e.vault_id == budget.vault_id)
        .filter(|e| budget.scope.matches(e))
        .filter(|e| {
            let day = e.date.date_naive();
            day >= from && to.map_or(true, |to| day <= to)
        })
        .fold((0.0, 0), |(sum, count), e| (sum + e.amount, count + 1))
}

/// Spending as a percentage of what the pace allows; any spending against a
/// zero expectation counts as fully over pace.
fn pace_ratio(spent: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        spent / expected * 100.0
    } else if spent > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

pub fn classify(spent: f64, amount: f64, expected: f64, alert_threshold: u8) -> BudgetStatus {
    if spent >= amount {
        return BudgetStatus::Exceeded;
    }
    let ratio = pace_ratio(spent, expected);
    if ratio >= 100.0 {
        BudgetStatus::Over
    } else if ratio >= alert_threshold as f64 {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Under
    }
}

pub fn calculate_progress(
    budget: &Budget,
    expenses: &[&Expense],
    reference: NaiveDate,
) -> BudgetProgress {
    let window = current_window(budget, reference);
    let (total_spent, expense_count) =
        scoped_spend(budget, expenses, window.start, Some(window.end));

    let total_days = window.total_days();
    let days_elapsed = window.days_elapsed(reference);
    let daily_pace = budget.amount / total_days as f64;
    let expected_spending_by_now = daily_pace * days_elapsed as f64;
    let actual_daily_average = total_spent / days_elapsed.max(1) as f64;

    let status = classify(
        total_spent,
        budget.amount,
        expected_spending_by_now,
        budget.alert_threshold,
    );
    let is_on_track = status == BudgetStatus::Under;

    BudgetProgress {
        budget_id: budget.id,
        name: budget.name.clone(),
        amount: budget.amount,
        period_start: window.start,
        period_end: window.end,
        total_spent,
        expense_count,
        remaining: budget.amount - total_spent,
        percentage_used: total_spent / budget.amount * 100.0,
        total_days,
        days_elapsed,
        days_remaining: total_days - days_elapsed,
        daily_pace,
        expected_spending_by_now,
        actual_daily_average,
        projected_spending: actual_daily_average * total_days as f64,
        is_over_budget: total_spent > budget.amount,
        is_over_pace: actual_daily_average > daily_pace,
        is_on_track,
        status,
        alert_triggered: budget.alert_enabled && !is_on_track,
    }
}

/// Status of `date` within the window containing it: spending from the window
/// start through that day against the pace for the same span. `None` when the
/// date precedes the budget.
pub fn day_status(budget: &Budget, expenses: &[&Expense], date: NaiveDate) -> Option<DayStatus> {
    let window = current_window(budget, date);
    if !window.contains(date) {
        return None;
    }
    let (spent, _) = scoped_spend(budget, expenses, window.start, Some(date));
    let expected = budget.amount / window.total_days() as f64 * window.days_elapsed(date) as f64;
    let status = match classify(spent, budget.amount, expected, budget.alert_threshold) {
        BudgetStatus::Under => DayStatus::Under,
        BudgetStatus::Warning => DayStatus::Warning,
        BudgetStatus::Over | BudgetStatus::Exceeded => DayStatus::Over,
    };
    Some(status)
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: Option<DayStatus>,
}

/// Day statuses for every day of the given month.
pub fn month_calendar(
    budget: &Budget,
    expenses: &[&Expense],
    year: i32,
    month: u32,
) -> LedgerResult<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LedgerError::invalid(format!("Invalid month {}-{}", year, month)))?;
    let days = first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .map(|date| CalendarDay {
            date,
            status: day_status(budget, expenses, date),
        })
        .collect();
    Ok(days)
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    pub budget_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub lifetime_spent: f64,
    pub expense_count: usize,
}

/// Lifetime spending of each active budget since its start date.
pub fn summarize(budgets: &[&Budget], expenses: &[&Expense]) -> Vec<BudgetSummary> {
    budgets
        .iter()
        .filter(|b| b.is_active && !b.audit.is_deleted())
        .map(|b| {
            let (lifetime_spent, expense_count) =
                scoped_spend(b, expenses, b.start_date, b.end_date);
            BudgetSummary {
                budget_id: b.id,
                name: b.name.clone(),
                amount: b.amount,
                period: b.period,
                start_date: b.start_date,
                end_date: b.end_date,
                lifetime_spent,
                expense_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Audit;
    use crate::budget::types::{BudgetScope, NewBudget};
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(period: BudgetPeriod, amount: f64, start: NaiveDate, end: Option<NaiveDate>) -> Budget {
        Budget::create(
            Uuid::nil(),
            NewBudget {
                name: "Household".into(),
                description: None,
                amount,
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

    fn spend(amount: f64, on: NaiveDate, category: &str, paid_by: Option<&str>) -> Expense {
        let date = Utc
            .with_ymd_and_hms(on.year(), on.month(), on.day(), 12, 0, 0)
            .unwrap();
        Expense {
            id: Uuid::new_v4(),
            vault_id: Uuid::nil(),
            note: None,
            amount,
            category_name: category.to_string(),
            date,
            paid_by: paid_by.map(str::to_string),
            template_id: None,
            audit: Audit::initial("u1", date),
        }
    }

    #[test]
    fn test_progress_for_budget_starting_at_calendar_edge() {
        let start = NaiveDate::MAX - chrono::Duration::days(2);
        let b = budget(BudgetPeriod::Weekly, 70.0, start, None);
        let p = calculate_progress(&b, &[], start);
        assert_eq!(p.period_end, NaiveDate::MAX);
        assert_eq!(p.total_days, 3);
        assert_eq!(p.status, BudgetStatus::Under);
        assert_eq!(day_status(&b, &[], NaiveDate::MAX), Some(DayStatus::Under));
    }

    #[test]
    fn test_progress_on_pace() {
        // 10-day custom budget of 100: pace 10/day.
        let b = budget(BudgetPeriod::Custom, 100.0, day(2025, 3, 1), Some(day(2025, 3, 10)));
        let expenses = vec![
            spend(20.0, day(2025, 3, 1), "Groceries", None),
            spend(10.0, day(2025, 3, 4), "Groceries", None),
            spend(99.0, day(2025, 4, 1), "Groceries", None),
        ];
        let refs: Vec<&Expense> = expenses.iter().collect();
        let p = calculate_progress(&b, &refs, day(2025, 3, 5));

        assert_eq!(p.total_spent, 30.0);
        assert_eq!(p.expense_count, 2);
        assert_eq!(p.total_days, 10);
        assert_eq!(p.days_elapsed, 5);
        assert_eq!(p.days_remaining, 5);
        assert_eq!(p.expected_spending_by_now, 50.0);
        assert_eq!(p.actual_daily_average, 6.0);
        assert_eq!(p.projected_spending, 60.0);
        assert_eq!(p.status, BudgetStatus::Under);
        assert!(p.is_on_track && !p.alert_triggered && !p.is_over_pace);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(100.0, 100.0, 10.0, 80), BudgetStatus::Exceeded);
        assert_eq!(classify(50.0, 100.0, 50.0, 80), BudgetStatus::Over);
        assert_eq!(classify(40.0, 100.0, 50.0, 80), BudgetStatus::Warning);
        assert_eq!(classify(39.0, 100.0, 50.0, 80), BudgetStatus::Under);
        assert_eq!(classify(1.0, 100.0, 0.0, 80), BudgetStatus::Over);
        assert_eq!(classify(0.0, 100.0, 0.0, 80), BudgetStatus::Under);
    }

    #[test]
    fn test_alert_follows_status() {
        let mut b = budget(BudgetPeriod::Weekly, 70.0, day(2025, 1, 6), None);
        let expenses = vec![spend(45.0, day(2025, 1, 6), "Fuel", None)];
        let refs: Vec<&Expense> = expenses.iter().collect();

        let p = calculate_progress(&b, &refs, day(2025, 1, 8));
        assert_eq!(p.status, BudgetStatus::Over);
        assert!(p.alert_triggered && p.is_over_pace && !p.is_over_budget);

        b.alert_enabled = false;
        assert!(!calculate_progress(&b, &refs, day(2025, 1, 8)).alert_triggered);
    }

    #[test]
    fn test_scope_filters_spending() {
        let mut b = budget(BudgetPeriod::Monthly, 300.0, day(2025, 1, 1), None);
        b.scope.category_names = vec!["Groceries".into()];
        b.scope.user_ids = vec!["alice".into()];
        let expenses = vec![
            spend(10.0, day(2025, 1, 2), "Groceries", Some("alice")),
            spend(20.0, day(2025, 1, 2), "Groceries", Some("bob")),
            spend(40.0, day(2025, 1, 2), "Groceries", None),
            spend(80.0, day(2025, 1, 2), "Fuel", Some("alice")),
        ];
        let refs: Vec<&Expense> = expenses.iter().collect();
        let p = calculate_progress(&b, &refs, day(2025, 1, 15));
        assert_eq!(p.total_spent, 10.0);
    }

    #[test]
    fn test_reference_before_start() {
        let b = budget(BudgetPeriod::Weekly, 70.0, day(2025, 1, 6), None);
        let p = calculate_progress(&b, &[], day(2025, 1, 1));
        assert_eq!(p.period_start, day(2025, 1, 6));
        assert_eq!(p.days_elapsed, 0);
        assert_eq!(p.expected_spending_by_now, 0.0);
        assert_eq!(p.status, BudgetStatus::Under);
    }

    #[test]
    fn test_day_status_and_calendar() {
        // 7-day week of 70: pace 10/day.
        let b = budget(BudgetPeriod::Weekly, 70.0, day(2025, 1, 6), None);
        let expenses = vec![
            spend(8.5, day(2025, 1, 6), "Groceries", None),
            spend(30.0, day(2025, 1, 8), "Groceries", None),
        ];
        let refs: Vec<&Expense> = expenses.iter().collect();

        assert_eq!(day_status(&b, &refs, day(2025, 1, 5)), None);
        assert_eq!(day_status(&b, &refs, day(2025, 1, 6)), Some(DayStatus::Warning));
        assert_eq!(day_status(&b, &refs, day(2025, 1, 7)), Some(DayStatus::Under));
        assert_eq!(day_status(&b, &refs, day(2025, 1, 8)), Some(DayStatus::Over));
        // A new week starts clean.
        assert_eq!(day_status(&b, &refs, day(2025, 1, 13)), Some(DayStatus::Under));

        let calendar = month_calendar(&b, &refs, 2025, 1).unwrap();
        assert_eq!(calendar.len(), 31);
        assert_eq!(calendar[0].status, None);
        assert_eq!(calendar[7].status, Some(DayStatus::Over));
        assert!(month_calendar(&b, &refs, 2025, 13).is_err());
    }

    #[test]
    fn test_summary_uses_lifetime_spend() {
        let monthly = budget(BudgetPeriod::Monthly, 100.0, day(2025, 1, 1), None);
        let mut inactive = budget(BudgetPeriod::Monthly, 100.0, day(2025, 1, 1), None);
        inactive.is_active = false;
        let custom = budget(BudgetPeriod::Custom, 50.0, day(2025, 2, 1), Some(day(2025, 2, 28)));
        let expenses = vec![
            spend(10.0, day(2024, 12, 31), "Groceries", None),
            spend(20.0, day(2025, 1, 10), "Groceries", None),
            spend(30.0, day(2025, 2, 10), "Groceries", None),
            spend(40.0, day(2025, 3, 10), "Groceries", None),
        ];
        let refs: Vec<&Expense> = expenses.iter().collect();
        let summary = summarize(&[&monthly, &inactive, &custom], &refs);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].lifetime_spent, 90.0);
        assert_eq!(summary[0].expense_count, 3);
        assert_eq!(summary[1].lifetime_spent, 30.0);
    }
}
