use std::collections::BTreeSet;

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Result, StockError};
use crate::fmt::month_abbr;
use crate::models::Transaction;

/// Year / month / item selection. Defaults to everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub items: BTreeSet<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Reject combinations no granularity can represent.
    pub fn validate(&self) -> Result<()> {
        if let Some(m) = self.month {
            if !(1..=12).contains(&m) {
                return Err(StockError::InvalidFilter(format!(
                    "month must be between 1 and 12, got {m}"
                )));
            }
            if self.year.is_none() {
                return Err(StockError::InvalidFilter(
                    "a month can only be selected together with a year".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        self.year.map_or(true, |y| txn.year() == y)
            && self.month.map_or(true, |m| txn.month() == m)
            && (self.items.is_empty() || self.items.contains(&txn.item_code))
    }

    /// Short human description of the active filters.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (self.year, self.month) {
            (Some(y), Some(m)) => parts.push(format!("{y}-{}", month_abbr(m))),
            (Some(y), None) => parts.push(y.to_string()),
            _ => parts.push("All years".to_string()),
        }
        if !self.items.is_empty() {
            let items: Vec<&str> = self.items.iter().map(String::as_str).collect();
            parts.push(format!("items: {}", items.join(", ")));
        }
        parts.join(" | ")
    }

    /// Step the year selection through `All` followed by `years`, wrapping.
    /// Returning to `All` clears the month.
    pub fn cycle_year(&mut self, years: &[i32], delta: i32) {
        let options: Vec<Option<i32>> = std::iter::once(None)
            .chain(years.iter().copied().map(Some))
            .collect();
        let current = options.iter().position(|o| *o == self.year).unwrap_or(0);
        self.year = options[wrap_index(current, delta, options.len())];
        if self.year.is_none() {
            self.month = None;
        }
    }

    /// Step the month selection through `none`, 1..=12, wrapping.
    /// No-op while no year is selected.
    pub fn cycle_month(&mut self, delta: i32) {
        if self.year.is_none() {
            return;
        }
        let current = self.month.unwrap_or(0) as usize;
        let next = wrap_index(current, delta, 13);
        self.month = if next == 0 { None } else { Some(next as u32) };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn wrap_index(current: usize, delta: i32, len: usize) -> usize {
    let len = len as i64;
    ((current as i64 + delta as i64).rem_euclid(len)) as usize
}

/// Narrow the dataset to rows matching every active filter.
///
/// Fails with `EmptyFilterResult` rather than handing back an empty table.
pub fn resolve<'a>(dataset: &'a Dataset, filter: &FilterState) -> Result<Vec<&'a Transaction>> {
    filter.validate()?;
    let rows: Vec<&Transaction> = dataset.rows.iter().filter(|t| filter.matches(t)).collect();
    debug!(
        kind = %dataset.kind,
        total = dataset.len(),
        matched = rows.len(),
        filter = %filter.describe(),
        "resolved filter"
    );
    if rows.is_empty() {
        return Err(StockError::EmptyFilterResult);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetKind, RECEIVE_FLAG, SHIP_FLAG};
    use chrono::NaiveDate;

    fn txn(y: i32, m: u32, d: u32, item: &str, qty: f64, flag: &str) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), item, qty, flag)
    }

    fn sample() -> Dataset {
        Dataset::new(
            DatasetKind::ReceiveShip,
            vec![
                txn(2022, 12, 30, "A", 3.0, RECEIVE_FLAG),
                txn(2023, 1, 5, "A", 10.0, RECEIVE_FLAG),
                txn(2023, 1, 20, "A", -5.0, SHIP_FLAG),
                txn(2023, 2, 1, "B", 7.0, RECEIVE_FLAG),
                txn(2024, 2, 29, "C", 1.0, SHIP_FLAG),
            ],
        )
    }

    #[test]
    fn test_no_filter_returns_everything() {
        let ds = sample();
        assert_eq!(resolve(&ds, &FilterState::new()).unwrap().len(), 5);
    }

    #[test]
    fn test_year_month_item_filters() {
        let ds = sample();
        let year = resolve(&ds, &FilterState::new().with_year(2023)).unwrap();
        assert_eq!(year.len(), 3);

        let month = resolve(&ds, &FilterState::new().with_year(2023).with_month(1)).unwrap();
        assert_eq!(month.len(), 2);
        assert!(month.iter().all(|t| t.month() == 1 && t.year() == 2023));

        let items = resolve(&ds, &FilterState::new().with_items(["B", "C"])).unwrap();
        assert_eq!(items.len(), 2);

        let all = resolve(
            &ds,
            &FilterState::new().with_year(2023).with_month(2).with_items(["B"]),
        )
        .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].item_code, "B");
    }

    #[test]
    fn test_empty_result_is_reported() {
        let ds = sample();
        let err = resolve(&ds, &FilterState::new().with_year(2019)).unwrap_err();
        assert!(matches!(err, StockError::EmptyFilterResult));

        let err = resolve(&ds, &FilterState::new().with_year(2023).with_items(["C"])).unwrap_err();
        assert!(matches!(err, StockError::EmptyFilterResult));
    }

    #[test]
    fn test_invalid_month_rejected() {
        let ds = sample();
        let err = resolve(&ds, &FilterState::new().with_year(2023).with_month(13)).unwrap_err();
        assert!(matches!(err, StockError::InvalidFilter(_)));
        let err = resolve(&ds, &FilterState::new().with_year(2023).with_month(0)).unwrap_err();
        assert!(matches!(err, StockError::InvalidFilter(_)));
    }

    #[test]
    fn test_month_requires_year() {
        let ds = sample();
        let err = resolve(&ds, &FilterState::new().with_month(1)).unwrap_err();
        assert!(matches!(err, StockError::InvalidFilter(_)));
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterState::new().describe(), "All years");
        assert_eq!(FilterState::new().with_year(2023).describe(), "2023");
        assert_eq!(
            FilterState::new()
                .with_year(2023)
                .with_month(3)
                .with_items(["B", "A"])
                .describe(),
            "2023-Mar | items: A, B"
        );
    }

    #[test]
    fn test_cycle_year_wraps_and_clears_month() {
        let years = [2022, 2023];
        let mut f = FilterState::new();
        f.cycle_year(&years, 1);
        assert_eq!(f.year, Some(2022));
        f.cycle_year(&years, 1);
        assert_eq!(f.year, Some(2023));
        f.month = Some(4);
        f.cycle_year(&years, 1);
        assert_eq!(f.year, None);
        assert_eq!(f.month, None);
        f.cycle_year(&years, -1);
        assert_eq!(f.year, Some(2023));
    }

    #[test]
    fn test_cycle_month() {
        let mut f = FilterState::new();
        f.cycle_month(1);
        assert_eq!(f.month, None, "month needs a year");

        f.year = Some(2023);
        f.cycle_month(1);
        assert_eq!(f.month, Some(1));
        f.cycle_month(-1);
        assert_eq!(f.month, None);
        f.cycle_month(-1);
        assert_eq!(f.month, Some(12));
        f.cycle_month(1);
        assert_eq!(f.month, None);
    }

    #[test]
    fn test_reset() {
        let mut f = FilterState::new().with_year(2023).with_month(1).with_items(["A"]);
        f.reset();
        assert_eq!(f, FilterState::default());
    }
}
