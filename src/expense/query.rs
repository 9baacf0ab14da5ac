//! Filtering, pagination and grouping of expense listings.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Expense;
use crate::error::{LedgerError, LedgerResult};
use crate::validation;

pub const MAX_PAGE_SIZE: u32 = 100;

/// Inclusive instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::default()).and_utc()
}

fn end_of_day(day: NaiveDate) -> LedgerResult<DateTime<Utc>> {
    start_of_day(day)
        .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
        .ok_or_else(|| LedgerError::invalid(format!("Date {} is out of range", day)))
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<Self> {
        if end < start {
            return Err(LedgerError::invalid("End date must not be before start date"));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days, both inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate) -> LedgerResult<Self> {
        Self::new(start_of_day(first), end_of_day(last)?)
    }

    /// Build a range from optional query bounds. The range only applies when
    /// both bounds are given; a bare day as the end bound covers that whole day.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> LedgerResult<Option<Self>> {
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(None);
        };
        let start = validation::parse_instant(start)?;
        let end = match NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d") {
            Ok(day) => end_of_day(day)?,
            Err(_) => validation::parse_instant(end)?,
        };
        Self::new(start, end).map(Some)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Preset periods offered by listing screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Week,
    Month,
    Year,
    Custom,
}

impl DateFilter {
    /// Range covered by the preset around `now`. Weeks run Sunday to Saturday.
    /// `Custom` uses the explicit bounds and yields no range unless both exist.
    pub fn range(
        self,
        now: DateTime<Utc>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> LedgerResult<Option<DateRange>> {
        let today = now.date_naive();
        let range = match self {
            Self::All => return Ok(None),
            Self::Custom => return DateRange::from_bounds(start, end),
            Self::Today => DateRange::days(today, today)?,
            Self::Week => {
                let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                DateRange::days(sunday, sunday + Duration::days(6))?
            }
            Self::Month => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .map(|next| next - Duration::days(1))
                    .unwrap_or(today);
                DateRange::days(first, last)?
            }
            Self::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                DateRange::days(first, last)?
            }
        };
        Ok(Some(range))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All Time",
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::Year => "This Year",
            Self::Custom => "Custom Range",
        }
    }
}

/// Query-string parameters of an expense listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category_name: Option<String>,
    #[serde(default)]
    pub date_filter: DateFilter,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Comma-separated payer ids.
    pub member_ids: Option<String>,
}

/// Resolved form of [`ExpenseQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFilter {
    pub page: u32,
    pub limit: u32,
    pub category_name: Option<String>,
    pub range: Option<DateRange>,
    pub member_ids: Vec<String>,
}

impl ExpenseQuery {
    pub fn resolve(&self, now: DateTime<Utc>, default_limit: u32) -> LedgerResult<ExpenseFilter> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(LedgerError::invalid("page starts at 1"));
        }
        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(LedgerError::invalid(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        // Explicit bounds without a preset behave like a custom range.
        let filter = match (self.date_filter, &self.start_date, &self.end_date) {
            (DateFilter::All, Some(_), Some(_)) => DateFilter::Custom,
            (filter, _, _) => filter,
        };
        let range = filter.range(now, self.start_date.as_deref(), self.end_date.as_deref())?;

        let member_ids = self
            .member_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ExpenseFilter {
            page,
            limit,
            category_name: self.category_name.clone().filter(|c| !c.trim().is_empty()),
            range,
            member_ids,
        })
    }
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = &self.category_name {
            if &expense.category_name != category {
                return false;
            }
        }
        if let Some(range) = &self.range {
            if !range.contains(expense.date) {
                return false;
            }
        }
        if !self.member_ids.is_empty() {
            match &expense.paid_by {
                Some(payer) if self.member_ids.contains(payer) => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Cut one page out of an already ordered list.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let total = items.len();
    let limit_usize = limit.max(1) as usize;
    let offset = (page.max(1) as usize - 1).saturating_mul(limit_usize);
    let items = items.into_iter().skip(offset).take(limit_usize).collect();
    Page {
        items,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(limit_usize),
        },
    }
}

/// Expenses of one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup<T> {
    /// `YYYY-MM-DD`
    pub date_key: String,
    /// e.g. `Monday, Jan 6, 2025`
    pub date_label: String,
    pub items: Vec<T>,
}

/// Group items by UTC day, newest day first; order within a day is kept.
pub fn group_by_day<T>(items: Vec<T>, date_of: impl Fn(&T) -> DateTime<Utc>) -> Vec<DayGroup<T>> {
    let mut groups: std::collections::BTreeMap<NaiveDate, Vec<T>> = Default::default();
    for item in items {
        groups.entry(date_of(&item).date_naive()).or_default().push(item);
    }
    groups
        .into_iter()
        .rev()
        .map(|(day, items)| DayGroup {
            date_key: day.format("%Y-%m-%d").to_string(),
            date_label: day.format("%A, %b %-d, %Y").to_string(),
            items,
        })
        .collect()
}
