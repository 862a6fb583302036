use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StockError};
use crate::filter::{self, FilterState};
use crate::fmt::{day_suffix, month_abbr};
use crate::metrics::{self, SummaryMetrics};
use crate::models::{DatasetKind, Transaction};
use crate::session::Session;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// The two report pages. Both share the filter → aggregate → reindex pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Stock level per flag category, signed quantities.
    Stock,
    /// Receive vs ship with summary metrics.
    Movement,
}

impl Page {
    pub fn dataset_kind(&self) -> DatasetKind {
        match self {
            Self::Stock => DatasetKind::DailyStock,
            Self::Movement => DatasetKind::ReceiveShip,
        }
    }

    pub fn chart_kind(&self) -> ChartKind {
        match self {
            Self::Stock => ChartKind::Line,
            Self::Movement => ChartKind::Bar,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Movement => "movement",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Stock => "Stock",
            Self::Movement => "Receive-Ship",
        }
    }
}

// ---------------------------------------------------------------------------
// Granularity and periods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Granularity {
    /// Days of one month.
    Day { year: i32, month: u32 },
    /// Months of one year.
    Month { year: i32 },
    /// Calendar years present in the data.
    Year,
    /// Raw operation dates across the full history.
    Date,
}

impl Granularity {
    /// Finest bucket implied by the active filters.
    pub fn select(filter: &FilterState, page: Page) -> Self {
        match (filter.year, filter.month) {
            (Some(year), Some(month)) => Self::Day { year, month },
            (Some(year), None) => Self::Month { year },
            (None, _) => match page {
                Page::Stock => Self::Date,
                Page::Movement => Self::Year,
            },
        }
    }

    pub fn period_of(&self, txn: &Transaction) -> Period {
        match self {
            Self::Day { .. } => Period::Day(txn.day()),
            Self::Month { .. } => Period::Month(txn.month()),
            Self::Year => Period::Year(txn.year()),
            Self::Date => Period::Date(txn.operation_date),
        }
    }

    /// The complete calendar grid, or `None` when only observed periods apply.
    pub fn expected_periods(&self) -> Option<Vec<Period>> {
        match self {
            Self::Day { year, month } => {
                Some((1..=days_in_month(*year, *month)).map(Period::Day).collect())
            }
            Self::Month { .. } => Some((1..=12).map(Period::Month).collect()),
            Self::Year | Self::Date => None,
        }
    }

    pub fn title(&self, page: Page) -> String {
        let noun = page.noun();
        match self {
            Self::Day { year, month } => format!("Daily {noun} in {year}-{}", month_abbr(*month)),
            Self::Month { year } => format!("Monthly {noun} in {year}"),
            Self::Year | Self::Date => format!("{noun} by Year"),
        }
    }
}

/// Number of days in a month, leap-year aware. Returns 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return 0;
    }
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|n| n.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// A bucket on the time axis. Within one series every period has the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Period {
    Day(u32),
    Month(u32),
    Year(i32),
    Date(NaiveDate),
}

impl Period {
    pub fn label(&self) -> String {
        match self {
            Self::Day(d) => day_suffix(*d),
            Self::Month(m) => month_abbr(*m).to_string(),
            Self::Year(y) => y.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period_label: String,
    pub period: Period,
    pub flag: String,
    pub quantity: f64,
}

impl SeriesPoint {
    fn new(period: Period, flag: impl Into<String>, quantity: f64) -> Self {
        Self {
            period_label: period.label(),
            period,
            flag: flag.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub granularity: Granularity,
    pub points: Vec<SeriesPoint>,
}

impl ChartSpec {
    /// Distinct flags, sorted.
    pub fn flags(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.points.iter().map(|p| p.flag.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct periods with their labels, in series order.
    pub fn periods(&self) -> Vec<(Period, &str)> {
        let mut out: Vec<(Period, &str)> = Vec::new();
        for p in &self.points {
            if out.last().map_or(true, |(last, _)| *last != p.period) {
                out.push((p.period, p.period_label.as_str()));
            }
        }
        out
    }

    pub fn quantity(&self, period: Period, flag: &str) -> f64 {
        self.points
            .iter()
            .find(|p| p.period == period && p.flag == flag)
            .map_or(0.0, |p| p.quantity)
    }

    pub fn total(&self, flag: &str) -> f64 {
        self.points
            .iter()
            .filter(|p| p.flag == flag)
            .map(|p| p.quantity)
            .sum()
    }
}

/// Sum quantity per `(period, flag)`. One point per combination present in `rows`,
/// ascending by period then flag.
pub fn aggregate<'a, I>(rows: I, granularity: Granularity) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut sums: BTreeMap<(Period, &'a str), f64> = BTreeMap::new();
    for txn in rows {
        let key = (granularity.period_of(txn), txn.movement_flag.as_str());
        *sums.entry(key).or_insert(0.0) += txn.quantity;
    }
    sums.into_iter()
        .map(|((period, flag), quantity)| SeriesPoint::new(period, flag, quantity))
        .collect()
}

/// Expand an aggregate to every expected period crossed with every observed flag.
/// Missing combinations get exactly zero.
pub fn reindex(aggregated: &[SeriesPoint], granularity: Granularity) -> Vec<SeriesPoint> {
    let flags: BTreeSet<&str> = aggregated.iter().map(|p| p.flag.as_str()).collect();
    let lookup: BTreeMap<(Period, &str), f64> = aggregated
        .iter()
        .map(|p| ((p.period, p.flag.as_str()), p.quantity))
        .collect();
    let periods = granularity.expected_periods().unwrap_or_else(|| {
        let present: BTreeSet<Period> = aggregated.iter().map(|p| p.period).collect();
        present.into_iter().collect()
    });

    let mut out = Vec::with_capacity(periods.len() * flags.len());
    for period in periods {
        for flag in &flags {
            let quantity = lookup.get(&(period, *flag)).copied().unwrap_or(0.0);
            out.push(SeriesPoint::new(period, *flag, quantity));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Report assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub page: Page,
    pub filter: String,
    pub chart: ChartSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SummaryMetrics>,
}

/// Receive/ship rows only, with absolute quantities.
fn movement_rows(rows: &[&Transaction]) -> Vec<Transaction> {
    rows.iter()
        .filter(|t| t.is_receive() || t.is_ship())
        .map(|t| Transaction {
            quantity: t.quantity.abs(),
            ..(*t).clone()
        })
        .collect()
}

/// Build one page for the current filter selection.
pub fn build_report(session: &Session, page: Page, filter: &FilterState) -> Result<Report> {
    let dataset = session.get(page.dataset_kind())?;
    let matched = filter::resolve(dataset, filter)?;
    let granularity = Granularity::select(filter, page);

    let rows: Vec<Transaction> = match page {
        Page::Stock => matched.into_iter().cloned().collect(),
        Page::Movement => movement_rows(&matched),
    };
    if rows.is_empty() {
        return Err(StockError::EmptyFilterResult);
    }

    let aggregated = aggregate(&rows, granularity);
    let points = reindex(&aggregated, granularity);
    debug!(
        page = page.name(),
        ?granularity,
        rows = rows.len(),
        groups = aggregated.len(),
        points = points.len(),
        "built chart series"
    );

    let metrics = match page {
        Page::Stock => None,
        Page::Movement => Some(metrics::compute(&dataset.rows, &rows, filter)),
    };

    Ok(Report {
        page,
        filter: filter.describe(),
        chart: ChartSpec {
            title: granularity.title(page),
            kind: page.chart_kind(),
            granularity,
            points,
        },
        metrics,
    })
}
