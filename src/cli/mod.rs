pub mod demo;
pub mod load;
pub mod report;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dataset::load_file;
use crate::error::{Result, StockError};
use crate::filter::FilterState;
use crate::fmt::parse_month;
use crate::models::DatasetKind;
use crate::session::Session;
use crate::settings::{load_settings, shellexpand_path};

#[derive(Parser)]
#[command(
    name = "stockview",
    version,
    about = "Inventory stock and receive/ship movement reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remember a CSV/XLSX file as the dataset for a report page.
    Load {
        /// Path to the CSV or XLSX export
        file: String,
        /// Dataset kind: stock or movement
        #[arg(long)]
        kind: String,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show configured datasets and their shape.
    Status,
    /// Write sample stock and receive/ship data and register it.
    Demo {
        /// Directory for the sample files (default: <data_dir>/demo)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Stock level per movement flag over time.
    Stock {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        output: ReportOutputArgs,
    },
    /// Receive vs ship quantities over time, with summary metrics.
    Movement {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        output: ReportOutputArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Dataset file to read instead of the one remembered by `load`
    #[arg(long)]
    pub file: Option<String>,
    /// Year filter: YYYY
    #[arg(long)]
    pub year: Option<i32>,
    /// Month filter (requires --year): 1-12 or Jan..Dec
    #[arg(long)]
    pub month: Option<String>,
    /// Item code filter; repeat for several items
    #[arg(long = "item")]
    pub items: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<FilterState> {
        let mut filter = FilterState::new().with_items(self.items.iter().cloned());
        filter.year = self.year;
        if let Some(raw) = &self.month {
            let month = parse_month(raw)
                .ok_or_else(|| StockError::InvalidFilter(format!("unrecognised month '{raw}'")))?;
            filter.month = Some(month);
        }
        filter.validate()?;
        Ok(filter)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportOutputArgs {
    /// Export format: text or json
    #[arg(long)]
    pub format: Option<String>,
    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
    /// Display mode: view (interactive) or text
    #[arg(long)]
    pub mode: Option<String>,
}

pub(crate) fn parse_kind(raw: &str) -> Result<DatasetKind> {
    DatasetKind::from_key(raw).ok_or_else(|| {
        StockError::Other(format!("Unknown dataset kind '{raw}' (expected stock or movement)"))
    })
}

/// Resolve which file feeds `kind`: an explicit path wins over settings.
pub(crate) fn dataset_path(kind: DatasetKind, file: Option<&str>) -> Option<PathBuf> {
    match file {
        Some(f) => Some(PathBuf::from(shellexpand_path(f))),
        None => load_settings().dataset_path(kind),
    }
}

/// Load the dataset for `kind` into a fresh session.
pub(crate) fn open_session(kind: DatasetKind, file: Option<&str>) -> Result<Session> {
    let path = dataset_path(kind, file).ok_or(StockError::MissingDataset(kind))?;
    let loaded = load_file(&path, kind)?;
    if loaded.skipped > 0 {
        eprintln!(
            "Skipped {} unreadable row(s) in {}",
            loaded.skipped,
            path.display()
        );
    }
    let mut session = Session::new();
    session.insert(loaded.dataset);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_to_filter() {
        let args = FilterArgs {
            year: Some(2023),
            month: Some("Feb".into()),
            items: vec!["A".into(), "B".into()],
            ..FilterArgs::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.year, Some(2023));
        assert_eq!(filter.month, Some(2));
        assert_eq!(filter.items.len(), 2);
    }

    #[test]
    fn test_filter_args_rejects_bad_month() {
        let args = FilterArgs {
            year: Some(2023),
            month: Some("Smarch".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(args.to_filter(), Err(StockError::InvalidFilter(_))));

        let args = FilterArgs {
            month: Some("3".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(args.to_filter(), Err(StockError::InvalidFilter(_))));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("stock").unwrap(), DatasetKind::DailyStock);
        assert!(parse_kind("ledger").is_err());
    }

    #[test]
    fn test_cli_parses_report_flags() {
        let cli = Cli::try_parse_from([
            "stockview", "report", "movement", "--year", "2023", "--month", "1", "--item", "A",
            "--item", "B", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                command: ReportCommands::Movement { filters, output },
            } => {
                assert_eq!(filters.year, Some(2023));
                assert_eq!(filters.items, vec!["A", "B"]);
                assert_eq!(output.format.as_deref(), Some("json"));
            }
            _ => panic!("expected movement report"),
        }
    }
}
