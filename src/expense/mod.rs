//! Expense module - spending records, reusable templates and listing queries.

mod query;
mod types;

pub use query::{
    group_by_day, paginate, DateFilter, DateRange, DayGroup, ExpenseFilter, ExpenseQuery, Page,
    Pagination, MAX_PAGE_SIZE,
};
pub use types::{Expense, ExpenseDraft, ExpenseTemplate, PaidByDefault, DEFAULT_TEMPLATE_ICON};
