use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};

use crate::error::Result;
use crate::models::{DatasetKind, Transaction, RECEIVE_FLAG, SHIP_FLAG};
use crate::settings::{get_data_dir, load_settings, save_settings, shellexpand_path};

const MONTHS: u32 = 18;

/// Stocked items: (code, typical receive quantity, first active month index).
const ITEMS: &[(&str, f64, u32)] = &[
    ("BRK-1001", 120.0, 0),
    ("BRK-1002", 80.0, 0),
    ("FLT-2040", 45.0, 0),
    ("GSK-0310", 300.0, 0),
    ("HSE-7700", 24.0, 2),
    ("PMP-5120", 12.0, 6),
    ("VLV-0900", 60.0, 11),
    ("SNS-3301", 30.0, 16),
];

/// Only ever received once, early on. Shows up as a non-movement item.
const DORMANT_ITEM: (&str, f64) = ("OBS-0001", 5.0);

/// Small deterministic variation, +/- up to ~15%.
fn vary(base: f64, seed: usize) -> f64 {
    let factor = 1.0 + ((seed % 7) as f64 - 3.0) * 0.05;
    (base * factor).round()
}

/// Clamp a day to the last valid day of the given year/month.
fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    let last_day = crate::reports::days_in_month(year, month);
    day.min(last_day).max(1)
}

fn make_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, clamp_day(year, month, day))
}

/// Receive/ship movements for `MONTHS` months ending with the month of `end`.
pub fn generate_movements(end: NaiveDate) -> Vec<Transaction> {
    let mut txns = Vec::new();

    for i in 0..MONTHS {
        let target = end - chrono::Months::new(MONTHS - 1 - i);
        let (year, month) = (target.year(), target.month());

        if i == 0 {
            if let Some(date) = make_date(year, month, 2) {
                txns.push(Transaction::new(date, DORMANT_ITEM.0, DORMANT_ITEM.1, RECEIVE_FLAG));
            }
        }

        for (j, (code, base, first)) in ITEMS.iter().enumerate() {
            if i < *first {
                continue;
            }
            let seed = i as usize * 3 + j;
            // Every item skips one month in three so the charts have gaps to fill.
            if (i as usize + j) % 3 == 2 {
                continue;
            }
            if let Some(date) = make_date(year, month, 3 + j as u32 * 3) {
                txns.push(Transaction::new(date, *code, vary(*base, seed), RECEIVE_FLAG));
            }
            if let Some(date) = make_date(year, month, 9 + j as u32 * 2) {
                txns.push(Transaction::new(date, *code, -vary(base * 0.7, seed + 1), SHIP_FLAG));
            }
            if j % 2 == 0 {
                if let Some(date) = make_date(year, month, 24 + j as u32) {
                    txns.push(Transaction::new(date, *code, -vary(base * 0.2, seed + 2), SHIP_FLAG));
                }
            }
        }
    }

    txns.sort_by(|a, b| a.operation_date.cmp(&b.operation_date));
    txns
}

/// Stock dataset: the same movements plus month-end count adjustments.
pub fn generate_stock(end: NaiveDate) -> Vec<Transaction> {
    let mut txns = generate_movements(end);
    for i in 0..MONTHS {
        let target = end - chrono::Months::new(MONTHS - 1 - i);
        let (year, month) = (target.year(), target.month());
        let Some(date) = make_date(year, month, 31) else {
            continue;
        };
        for (j, (code, _, first)) in ITEMS.iter().enumerate() {
            if i < *first || (i as usize + j) % 4 != 0 {
                continue;
            }
            let delta = ((i as usize + j) % 5) as f64 - 2.0;
            txns.push(Transaction::new(date, *code, delta, "Adjust"));
        }
    }
    txns.sort_by(|a, b| a.operation_date.cmp(&b.operation_date));
    txns
}

pub fn write_dataset(path: &Path, rows: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["Operation Date", "Item Code", "Quantity[Unit1]", "Rcv So Flag"])?;
    for t in rows {
        wtr.write_record([
            t.operation_date.format("%Y-%m-%d").to_string(),
            t.item_code.clone(),
            t.quantity.to_string(),
            t.movement_flag.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(output_dir: Option<String>) -> Result<()> {
    let dir = output_dir
        .map(|d| PathBuf::from(shellexpand_path(&d)))
        .unwrap_or_else(|| get_data_dir().join("demo"));
    std::fs::create_dir_all(&dir)?;

    let today = Local::now().date_naive();
    let mut settings = load_settings();
    for (kind, name, rows) in [
        (DatasetKind::ReceiveShip, "receive_ship.csv", generate_movements(today)),
        (DatasetKind::DailyStock, "daily_stock.csv", generate_stock(today)),
    ] {
        let path = dir.join(name);
        write_dataset(&path, &rows)?;
        settings.set_dataset_path(kind, path.to_string_lossy().to_string());
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }
    save_settings(&settings)?;

    println!();
    println!("Sample data registered. Try:");
    println!("  stockview report movement --year {}", today.year());
    println!("  stockview report stock --year {} --month {}", today.year(), today.month());
    Ok(())
}
