pub mod text;
pub mod view;

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing::info;

use crate::cli::{open_session, FilterArgs, ReportCommands, ReportOutputArgs};
use crate::error::{Result, StockError};
use crate::reports::{build_report, Page, Report};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ExportFormat {
    Text,
    Json,
}

impl ExportFormat {
    fn parse(raw: Option<&str>) -> Result<Option<Self>> {
        match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
            None => Ok(None),
            Some("text") | Some("txt") => Ok(Some(Self::Text)),
            Some("json") => Ok(Some(Self::Json)),
            Some(other) => Err(StockError::Other(format!(
                "Unknown format '{other}' (expected text or json)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DisplayMode {
    View,
    Text,
}

impl DisplayMode {
    fn parse(raw: Option<&str>) -> Result<Option<Self>> {
        match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
            None => Ok(None),
            Some("view") => Ok(Some(Self::View)),
            Some("text") => Ok(Some(Self::Text)),
            Some(other) => Err(StockError::Other(format!(
                "Unknown mode '{other}' (expected view or text)"
            ))),
        }
    }
}

pub fn dispatch(cmd: ReportCommands) -> Result<()> {
    let (page, filters, output) = match cmd {
        ReportCommands::Stock { filters, output } => (Page::Stock, filters, output),
        ReportCommands::Movement { filters, output } => (Page::Movement, filters, output),
    };
    run(page, &filters, &output)
}

fn run(page: Page, filters: &FilterArgs, args: &ReportOutputArgs) -> Result<()> {
    let format = ExportFormat::parse(args.format.as_deref())?;
    let mode = DisplayMode::parse(args.mode.as_deref())?;
    let filter = filters.to_filter()?;
    let session = open_session(page.dataset_kind(), filters.file.as_deref())?;

    if args.output.is_some() || format == Some(ExportFormat::Json) {
        let report = build_report(&session, page, &filter)?;
        return export(&report, format.unwrap_or(ExportFormat::Text), args.output.as_deref());
    }

    let interactive = match mode {
        Some(DisplayMode::View) => true,
        Some(DisplayMode::Text) => false,
        None => std::io::stdout().is_terminal(),
    };
    if interactive {
        view::run(&session, page, filter)
    } else {
        // Non-TTY: plain text to stdout
        let report = build_report(&session, page, &filter)?;
        println!("{}", text::render(&report));
        Ok(())
    }
}

pub(crate) fn render_export(report: &Report, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(text::render_plain(report)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn export(report: &Report, format: ExportFormat, output: Option<&str>) -> Result<()> {
    let content = render_export(report, format)?;
    let Some(output) = output else {
        println!("{content}");
        return Ok(());
    };
    let p = PathBuf::from(output);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&p, format!("{content}\n"))?;
    info!(path = %p.display(), ?format, "exported report");
    println!("Wrote {}", p.display());
    Ok(())
}
