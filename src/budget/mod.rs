//! Budget module - spending caps and progress tracking.
//!
//! # Key Concepts
//! - Budget: a spending cap for a vault, optionally scoped to categories,
//!   templates or payers
//! - Period: weekly, monthly or custom windows anchored on the start date
//! - Progress: actual spending vs. linear pace, classified into a status
//! - Calendar: per-day pace status for month views
//! - Summary: lifetime spending of active budgets

mod period;
mod progress;
mod types;

pub use period::{current_window, Window};
pub use progress::{
    calculate_progress, classify, day_status, month_calendar, summarize, BudgetProgress,
    BudgetStatus, BudgetSummary, CalendarDay, DayStatus,
};
pub use types::{
    Budget, BudgetPatch, BudgetPeriod, BudgetScope, NewBudget, DEFAULT_ALERT_THRESHOLD,
};
