use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{Result, StockError};
use crate::models::{DatasetKind, Transaction};

/// A loaded transaction table. Read-only once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub source: Option<PathBuf>,
    pub rows: Vec<Transaction>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, rows: Vec<Transaction>) -> Self {
        Self {
            kind,
            source: None,
            rows,
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|r| r.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Distinct item codes in first-appearance order.
    pub fn item_codes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.item_code.as_str())
            .filter(|code| seen.insert(*code))
            .collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.operation_date).min()?;
        let max = self.rows.iter().map(|r| r.operation_date).max()?;
        Some((min, max))
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Parse a quantity, tolerating thousands separators, quotes and accounting
/// parentheses for negatives.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an operation date. Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and `M/D/YYYY`,
/// optionally followed by a time part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Serials past NaiveDate's range are junk cells, not dates.
    if !serial.is_finite() || serial.abs() > i32::MAX as f64 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::TimeDelta::try_days(serial.trunc() as i64)?)
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

const DATE_COLUMN: &str = "Operation Date";
const ITEM_COLUMN: &str = "Item Code";
const QUANTITY_COLUMN: &str = "Quantity[Unit1]";
const FLAG_COLUMN: &str = "Rcv So Flag";

const REQUIRED_COLUMNS: &[&str] = &[DATE_COLUMN, ITEM_COLUMN, QUANTITY_COLUMN, FLAG_COLUMN];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    date: usize,
    item: usize,
    quantity: usize,
    flag: usize,
}

fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    let wanted = normalize_header(name);
    header.iter().position(|h| normalize_header(h) == wanted)
}

impl Columns {
    fn locate(header: &[String]) -> std::result::Result<Self, Vec<&'static str>> {
        let found: Vec<Option<usize>> = REQUIRED_COLUMNS
            .iter()
            .map(|name| find_column(header, name))
            .collect();
        match found.as_slice() {
            [Some(date), Some(item), Some(quantity), Some(flag)] => Ok(Self {
                date: *date,
                item: *item,
                quantity: *quantity,
                flag: *flag,
            }),
            _ => Err(REQUIRED_COLUMNS
                .iter()
                .zip(found)
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| *name)
                .collect()),
        }
    }

    fn max_index(&self) -> usize {
        self.date.max(self.item).max(self.quantity).max(self.flag)
    }

    fn parse_row(&self, fields: &[String]) -> Option<Transaction> {
        if fields.len() <= self.max_index() {
            return None;
        }
        let item_code = fields[self.item].trim();
        if item_code.is_empty() {
            return None;
        }
        Some(Transaction::new(
            parse_date(&fields[self.date])?,
            item_code,
            parse_quantity(&fields[self.quantity])?,
            fields[self.flag].trim(),
        ))
    }
}

/// Scan records for the header row, then parse everything after it.
/// Returns the parsed rows and the number of skipped data rows.
fn parse_records<I>(records: I) -> Result<(Vec<Transaction>, usize)>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut columns: Option<Columns> = None;
    let mut first_missing: Option<Vec<&'static str>> = None;
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(cols) = columns else {
            match Columns::locate(&record) {
                Ok(cols) => {
                    debug!(?cols, "located header row");
                    columns = Some(cols);
                }
                Err(missing) => {
                    first_missing.get_or_insert(missing);
                }
            }
            continue;
        };
        match cols.parse_row(&record) {
            Some(txn) => rows.push(txn),
            None => skipped += 1,
        }
    }

    if columns.is_none() {
        let missing = first_missing.unwrap_or_else(|| REQUIRED_COLUMNS.to_vec());
        return Err(StockError::MissingColumn(missing.join(", ")));
    }
    Ok((rows, skipped))
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LoadResult {
    pub dataset: Dataset,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Xlsx,
}

fn detect_format(path: &Path) -> Result<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" | "" => Ok(FileFormat::Csv),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" => Ok(FileFormat::Xlsx),
        other => Err(StockError::UnsupportedFile(format!(
            "{} (.{other} is not a supported format)",
            path.display()
        ))),
    }
}

/// Load a transaction table from a CSV (or XLSX) file.
pub fn load_file(path: &Path, kind: DatasetKind) -> Result<LoadResult> {
    if !path.exists() {
        return Err(StockError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let (rows, skipped) = match detect_format(path)? {
        FileFormat::Csv => parse_csv(path)?,
        #[cfg(feature = "xlsx")]
        FileFormat::Xlsx => parse_xlsx(path)?,
    };
    if skipped > 0 {
        warn!(skipped, path = %path.display(), "skipped unparseable rows");
    }
    info!(rows = rows.len(), kind = %kind, "loaded dataset");
    Ok(LoadResult {
        dataset: Dataset::new(kind, rows).with_source(path),
        skipped,
    })
}

fn parse_csv(path: &Path) -> Result<(Vec<Transaction>, usize)> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    parse_records(records)
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Turn sheet rows into text records. Bare numbers in the date column
/// below the header are Excel serials.
#[cfg(feature = "xlsx")]
fn sheet_records<'a, I>(rows: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a [calamine::Data]>,
{
    let mut date_col: Option<usize> = None;
    let mut records = Vec::new();
    for row in rows {
        let mut fields: Vec<String> = row.iter().map(cell_text).collect();
        if date_col.is_none() {
            date_col = find_column(&fields, DATE_COLUMN);
        } else if let Some(idx) = date_col {
            if let Some(calamine::Data::Float(serial)) = row.get(idx) {
                if let Some(date) = excel_serial_to_date(*serial) {
                    fields[idx] = date.format("%Y-%m-%d").to_string();
                }
            }
        }
        records.push(fields);
    }
    records
}

#[cfg(feature = "xlsx")]
fn parse_xlsx(path: &Path) -> Result<(Vec<Transaction>, usize)> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StockError::UnsupportedFile(format!("{} has no worksheets", path.display())))??;
    parse_records(sheet_records(range.rows()))
}
