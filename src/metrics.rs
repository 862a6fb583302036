use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::filter::FilterState;
use crate::fmt::quantity;
use crate::models::{year_month_key, Transaction};

/// Size of the activity window, in distinct year-months present in the data.
pub const TRAILING_MONTHS: usize = 12;

/// Counters shown under the receive/ship chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_items: usize,
    pub movement_items: usize,
    pub non_movement_items: usize,
    pub new_items: usize,
    pub receive_days: usize,
    pub ship_days: usize,
    pub receive_items: usize,
    pub ship_items: usize,
    pub receive_quantity: f64,
    pub ship_quantity: f64,
}

impl SummaryMetrics {
    /// The nine display widgets, in order.
    pub fn labelled(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Items", self.total_items.to_string()),
            ("Movement Items", self.movement_items.to_string()),
            ("Non-Movement", self.non_movement_items.to_string()),
            ("New Items", self.new_items.to_string()),
            ("Receive (Day)", self.receive_days.to_string()),
            ("Ship (Day)", self.ship_days.to_string()),
            ("Receive (Item)", self.receive_items.to_string()),
            ("Ship (Item)", self.ship_items.to_string()),
            (
                "QTY Receive/Ship",
                format!("{:.0}/{:.0}", self.receive_quantity, self.ship_quantity),
            ),
        ]
    }

    /// Same as `labelled`, with thousands separators on the quantities.
    pub fn labelled_pretty(&self) -> Vec<(&'static str, String)> {
        let mut out = self.labelled();
        if let Some(last) = out.last_mut() {
            last.1 = format!(
                "{}/{}",
                quantity(self.receive_quantity),
                quantity(self.ship_quantity)
            );
        }
        out
    }
}

/// The `months` largest distinct `year*100+month` keys present in `rows`.
/// Relative to the data, not to today's date.
pub fn trailing_window(rows: &[Transaction], months: usize) -> BTreeSet<i32> {
    let keys: BTreeSet<i32> = rows.iter().map(Transaction::year_month).collect();
    keys.into_iter().rev().take(months).collect()
}

/// First year-month key covered by the filter, if a year is selected.
pub fn period_start_key(filter: &FilterState) -> Option<i32> {
    filter
        .year
        .map(|y| year_month_key(y, filter.month.unwrap_or(1)))
}

/// Items in `filtered` never seen in `all` before the filtered period starts.
/// Zero without a year filter, since "before" has no bound.
pub fn new_items(all: &[Transaction], filtered: &[Transaction], filter: &FilterState) -> usize {
    let Some(start) = period_start_key(filter) else {
        return 0;
    };
    let prior: HashSet<&str> = all
        .iter()
        .filter(|t| t.year_month() < start)
        .map(|t| t.item_code.as_str())
        .collect();
    let current: HashSet<&str> = filtered.iter().map(|t| t.item_code.as_str()).collect();
    current.difference(&prior).count()
}

/// Compute the summary counters.
///
/// `all` is the full unfiltered table; `filtered` is the filtered receive/ship
/// subset the chart was built from.
pub fn compute(all: &[Transaction], filtered: &[Transaction], filter: &FilterState) -> SummaryMetrics {
    let total_items = distinct_items(all.iter());

    let window = trailing_window(all, TRAILING_MONTHS);
    let movement_items = distinct_items(
        all.iter()
            .filter(|t| window.contains(&t.year_month()))
            .filter(|t| t.is_receive() || t.is_ship()),
    );

    let receive: Vec<&Transaction> = filtered.iter().filter(|t| t.is_receive()).collect();
    let ship: Vec<&Transaction> = filtered.iter().filter(|t| t.is_ship()).collect();

    SummaryMetrics {
        total_items,
        movement_items,
        non_movement_items: total_items.saturating_sub(movement_items),
        new_items: new_items(all, filtered, filter),
        receive_days: distinct_dates(&receive),
        ship_days: distinct_dates(&ship),
        receive_items: distinct_items(receive.iter().copied()),
        ship_items: distinct_items(ship.iter().copied()),
        receive_quantity: receive.iter().map(|t| t.quantity.abs()).sum(),
        ship_quantity: ship.iter().map(|t| t.quantity.abs()).sum(),
    }
}

fn distinct_items<'a>(rows: impl Iterator<Item = &'a Transaction>) -> usize {
    rows.map(|t| t.item_code.as_str()).collect::<HashSet<_>>().len()
}

fn distinct_dates(rows: &[&Transaction]) -> usize {
    rows.iter()
        .map(|t| t.operation_date)
        .collect::<HashSet<NaiveDate>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RECEIVE_FLAG, SHIP_FLAG};

    fn txn(y: i32, m: u32, d: u32, item: &str, qty: f64, flag: &str) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), item, qty, flag)
    }

    fn filtered(all: &[Transaction], filter: &FilterState) -> Vec<Transaction> {
        all.iter()
            .filter(|t| filter.matches(t))
            .filter(|t| t.is_receive() || t.is_ship())
            .cloned()
            .collect()
    }

    #[test]
    fn test_trailing_window_is_data_relative() {
        let mut rows = Vec::new();
        for m in 1..=12 {
            rows.push(txn(2015, m, 1, "A", 1.0, RECEIVE_FLAG));
        }
        rows.push(txn(2016, 3, 1, "A", 1.0, RECEIVE_FLAG));
        rows.push(txn(2016, 3, 9, "B", 1.0, RECEIVE_FLAG));
        let window = trailing_window(&rows, TRAILING_MONTHS);
        assert_eq!(window.len(), 12);
        assert!(window.contains(&201603));
        assert!(window.contains(&201502));
        assert!(!window.contains(&201501));
    }

    #[test]
    fn test_trailing_window_shorter_history() {
        let rows = vec![
            txn(2023, 1, 1, "A", 1.0, RECEIVE_FLAG),
            txn(2023, 1, 2, "A", 1.0, SHIP_FLAG),
        ];
        assert_eq!(trailing_window(&rows, TRAILING_MONTHS).len(), 1);
    }

    #[test]
    fn test_movement_partition() {
        let mut all = vec![
            txn(2020, 1, 1, "OLD", 5.0, RECEIVE_FLAG),
            txn(2023, 6, 1, "B", 1.0, SHIP_FLAG),
            txn(2023, 7, 1, "C", 1.0, "Adjust"),
        ];
        for m in 1..=12 {
            all.push(txn(2023, m, 2, "A", 1.0, RECEIVE_FLAG));
        }
        let filter = FilterState::new();
        let m = compute(&all, &filtered(&all, &filter), &filter);
        assert_eq!(m.total_items, 4);
        // OLD is outside the window; C only has a non-movement flag.
        assert_eq!(m.movement_items, 2);
        assert_eq!(m.non_movement_items, 2);
        assert_eq!(m.movement_items + m.non_movement_items, m.total_items);
    }

    #[test]
    fn test_new_items_zero_without_year() {
        let all = vec![
            txn(2023, 1, 1, "A", 1.0, RECEIVE_FLAG),
            txn(2023, 2, 1, "B", 1.0, RECEIVE_FLAG),
        ];
        let filter = FilterState::new();
        assert_eq!(compute(&all, &filtered(&all, &filter), &filter).new_items, 0);
    }

    #[test]
    fn test_new_items_without_prior_data() {
        let all = vec![
            txn(2023, 1, 1, "A", 1.0, RECEIVE_FLAG),
            txn(2023, 2, 1, "B", 1.0, SHIP_FLAG),
            txn(2023, 2, 5, "B", 1.0, RECEIVE_FLAG),
        ];
        let filter = FilterState::new().with_year(2023);
        assert_eq!(compute(&all, &filtered(&all, &filter), &filter).new_items, 2);
    }

    #[test]
    fn test_new_items_excludes_items_seen_earlier() {
        let all = vec![
            txn(2022, 11, 1, "A", 1.0, RECEIVE_FLAG),
            txn(2023, 1, 15, "B", 1.0, RECEIVE_FLAG),
            txn(2023, 3, 1, "A", 1.0, SHIP_FLAG),
            txn(2023, 3, 2, "B", 1.0, SHIP_FLAG),
            txn(2023, 3, 3, "C", 1.0, RECEIVE_FLAG),
        ];
        let year = FilterState::new().with_year(2023);
        // B and C first appear in 2023; A was seen in 2022.
        assert_eq!(new_items(&all, &filtered(&all, &year), &year), 2);

        let march = FilterState::new().with_year(2023).with_month(3);
        // B was already seen in January.
        assert_eq!(new_items(&all, &filtered(&all, &march), &march), 1);
    }

    #[test]
    fn test_new_items_month_filter_across_year_boundary() {
        // A prior-year row in a later calendar month must still count as prior.
        let all = vec![
            txn(2022, 12, 20, "A", 1.0, RECEIVE_FLAG),
            txn(2023, 1, 4, "A", 1.0, SHIP_FLAG),
            txn(2023, 1, 9, "Z", 1.0, RECEIVE_FLAG),
        ];
        let jan = FilterState::new().with_year(2023).with_month(1);
        assert_eq!(period_start_key(&jan), Some(202301));
        assert_eq!(new_items(&all, &filtered(&all, &jan), &jan), 1);
    }

    #[test]
    fn test_per_flag_counts() {
        let all = vec![
            txn(2023, 1, 5, "A", 10.0, RECEIVE_FLAG),
            txn(2023, 1, 5, "B", 3.0, RECEIVE_FLAG),
            txn(2023, 1, 7, "A", 2.0, RECEIVE_FLAG),
            txn(2023, 1, 20, "A", -5.0, SHIP_FLAG),
            txn(2023, 1, 20, "A", -1.0, SHIP_FLAG),
            txn(2023, 2, 1, "B", 7.0, RECEIVE_FLAG),
        ];
        let filter = FilterState::new().with_year(2023).with_month(1);
        let m = compute(&all, &filtered(&all, &filter), &filter);
        assert_eq!(m.receive_days, 2);
        assert_eq!(m.ship_days, 1);
        assert_eq!(m.receive_items, 2);
        assert_eq!(m.ship_items, 1);
        assert_eq!(m.receive_quantity, 15.0);
        assert_eq!(m.ship_quantity, 6.0);
    }

    #[test]
    fn test_labelled_metrics() {
        let m = SummaryMetrics {
            total_items: 1200,
            movement_items: 900,
            non_movement_items: 300,
            new_items: 4,
            receive_days: 10,
            ship_days: 12,
            receive_items: 30,
            ship_items: 40,
            receive_quantity: 12345.4,
            ship_quantity: 6789.6,
        };
        let labels = m.labelled();
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[0], ("Total Items", "1200".to_string()));
        assert_eq!(labels[2].0, "Non-Movement");
        assert_eq!(labels[8], ("QTY Receive/Ship", "12345/6790".to_string()));
        assert_eq!(m.labelled_pretty()[8].1, "12,345/6,790");
    }
}
