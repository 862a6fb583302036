use colored::Colorize;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

use crate::fmt::quantity;
use crate::metrics::SummaryMetrics;
use crate::reports::{ChartSpec, Report};

const FLAG_COLORS: &[Color] = &[
    Color::Green,
    Color::Red,
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
];

/// Terminal rendering: colored title and styled table cells.
pub fn render(report: &Report) -> String {
    format_report(report, true)
}

/// Same layout without any escape codes, for files.
pub fn render_plain(report: &Report) -> String {
    format_report(report, false)
}

fn format_report(report: &Report, styled: bool) -> String {
    let title = if styled {
        report.chart.title.bold().to_string()
    } else {
        report.chart.title.clone()
    };
    let mut out = format!("{title}\nFilter: {}\n{}", report.filter, format_series(&report.chart, styled));
    if let Some(m) = &report.metrics {
        out.push_str(&format!("\n\nSummary\n{}", format_metrics(m, styled)));
    }
    out
}

fn new_table(styled: bool) -> Table {
    let mut table = Table::new();
    if !styled {
        table.force_no_tty();
    }
    table
}

/// One row per period, one column per flag, and a total row.
pub fn format_series(chart: &ChartSpec, styled: bool) -> String {
    let flags = chart.flags();
    let mut table = new_table(styled);

    let mut header = vec![Cell::new("Period")];
    for (i, flag) in flags.iter().enumerate() {
        let cell = Cell::new(flag);
        header.push(if styled {
            cell.fg(FLAG_COLORS[i % FLAG_COLORS.len()])
        } else {
            cell
        });
    }
    table.set_header(header);

    for (period, label) in chart.periods() {
        let mut row = vec![Cell::new(label)];
        for flag in &flags {
            row.push(Cell::new(quantity(chart.quantity(period, flag))).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    let mut total = vec![Cell::new("Total").add_attribute(Attribute::Bold)];
    for flag in &flags {
        total.push(
            Cell::new(quantity(chart.total(flag)))
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        );
    }
    table.add_row(total);

    table.to_string()
}

pub fn format_metrics(m: &SummaryMetrics, styled: bool) -> String {
    let mut table = new_table(styled);
    table.set_header(vec!["Metric", "Value"]);
    for (label, value) in m.labelled_pretty() {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}
