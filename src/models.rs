use std::fmt;

use chrono::{Datelike, NaiveDate};
/// Flag value marking an inbound movement in the receive/ship dataset.
pub const RECEIVE_FLAG: &str = "Rcv(increase)";
/// Flag value marking an outbound movement in the receive/ship dataset.
pub const SHIP_FLAG: &str = "So(decrese)";

/// One inventory movement event.
///
/// Calendar parts are derived from `operation_date` on demand and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub operation_date: NaiveDate,
    pub item_code: String,
    pub quantity: f64,
    pub movement_flag: String,
}

impl Transaction {
    pub fn new(
        operation_date: NaiveDate,
        item_code: impl Into<String>,
        quantity: f64,
        movement_flag: impl Into<String>,
    ) -> Self {
        Self {
            operation_date,
            item_code: item_code.into(),
            quantity,
            movement_flag: movement_flag.into(),
        }
    }

    pub fn year(&self) -> i32 {
        self.operation_date.year()
    }

    pub fn month(&self) -> u32 {
        self.operation_date.month()
    }

    pub fn day(&self) -> u32 {
        self.operation_date.day()
    }

    /// Combined sortable key: `year * 100 + month`.
    pub fn year_month(&self) -> i32 {
        year_month_key(self.year(), self.month())
    }

    pub fn is_receive(&self) -> bool {
        self.movement_flag == RECEIVE_FLAG
    }

    pub fn is_ship(&self) -> bool {
        self.movement_flag == SHIP_FLAG
    }
}

pub fn year_month_key(year: i32, month: u32) -> i32 {
    year * 100 + month as i32
}

/// Which report page a dataset feeds. The session key mirrors the loader's naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetKind {
    DailyStock,
    ReceiveShip,
}

impl DatasetKind {
    pub fn session_key(&self) -> &'static str {
        match self {
            Self::DailyStock => "daily_stock_data",
            Self::ReceiveShip => "receive_ship_data",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DailyStock => "Daily Stock",
            Self::ReceiveShip => "Receive-Ship",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "stock" | "daily_stock" | "daily_stock_data" => Some(Self::DailyStock),
            "movement" | "receive_ship" | "receive_ship_data" => Some(Self::ReceiveShip),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.session_key())
    }
}
