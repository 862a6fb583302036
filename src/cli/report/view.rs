use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset as ChartData, GraphType,
        Paragraph, Wrap,
    },
    Frame,
};

use crossterm::event::KeyCode;
use tracing::debug;

use crate::error::Result;
use crate::filter::FilterState;
use crate::fmt::quantity;
use crate::metrics::SummaryMetrics;
use crate::reports::{build_report, ChartKind, ChartSpec, Page, Report};
use crate::session::Session;
use crate::tui::{
    run_report_view, series_style, wrap_text, ReportView, ReportViewAction, FOOTER_STYLE,
    HEADER_STYLE, METRIC_LABEL_STYLE, METRIC_VALUE_STYLE, WARNING_STYLE,
};

const AXIS_STYLE: Style = Style::new().fg(Color::DarkGray);
const FILTER_STYLE: Style = Style::new().fg(Color::Gray).add_modifier(Modifier::ITALIC);

/// Open the interactive chart for `page`, starting from `filter`.
pub fn run(session: &Session, page: Page, filter: FilterState) -> Result<()> {
    let mut view = ChartView::new(session, page, filter)?;
    run_report_view(&mut view)
}

enum ViewState {
    Ready(Report),
    /// Inline message shown in place of the chart.
    Warning(String),
}

pub(crate) struct ChartView<'a> {
    session: &'a Session,
    page: Page,
    years: Vec<i32>,
    filter: FilterState,
    state: ViewState,
}

impl<'a> ChartView<'a> {
    /// Fails only on hard errors; warnings become the initial inline message.
    pub(crate) fn new(session: &'a Session, page: Page, filter: FilterState) -> Result<Self> {
        let years = session.get(page.dataset_kind())?.years();
        let state = match build_report(session, page, &filter) {
            Ok(report) => ViewState::Ready(report),
            Err(e) if e.is_warning() => ViewState::Warning(e.to_string()),
            Err(e) => return Err(e),
        };
        Ok(Self {
            session,
            page,
            years,
            filter,
            state,
        })
    }

    fn rebuild(&mut self) {
        debug!(page = self.page.name(), filter = %self.filter.describe(), "recomputing view");
        self.state = match build_report(self.session, self.page, &self.filter) {
            Ok(report) => ViewState::Ready(report),
            Err(e) if e.is_warning() => ViewState::Warning(e.to_string()),
            Err(e) => ViewState::Warning(format!("Error: {e}")),
        };
    }

    fn title(&self) -> String {
        match &self.state {
            ViewState::Ready(report) => report.chart.title.clone(),
            ViewState::Warning(_) => match self.page {
                Page::Stock => "Stock".to_string(),
                Page::Movement => "Receive-Ship".to_string(),
            },
        }
    }

    fn draw_warning(frame: &mut Frame, area: Rect, message: &str) {
        let (wrapped, lines) = wrap_text(message, area.width.saturating_sub(4) as usize);
        let top = area.height.saturating_sub(lines) / 2;
        let [_, msg_area, _] = Layout::vertical([
            Constraint::Length(top),
            Constraint::Length(lines),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(
            Paragraph::new(wrapped)
                .style(WARNING_STYLE)
                .alignment(ratatui::layout::Alignment::Center),
            msg_area,
        );
    }
}

fn draw_bar_chart(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let flags = chart.flags();
    let groups: Vec<BarGroup> = chart
        .periods()
        .into_iter()
        .map(|(period, label)| {
            let bars: Vec<Bar> = flags
                .iter()
                .enumerate()
                .map(|(i, flag)| {
                    let q = chart.quantity(period, flag);
                    Bar::default()
                        .value(q.max(0.0).round() as u64)
                        .text_value(quantity(q))
                        .style(series_style(i))
                })
                .collect();
            BarGroup::default()
                .label(Line::from(label.to_string()))
                .bars(&bars)
        })
        .collect();

    let mut widget = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(legend(&flags)))
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);
    for group in groups {
        widget = widget.data(group);
    }
    frame.render_widget(widget, area);
}

fn draw_line_chart(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let flags = chart.flags();
    let periods = chart.periods();

    let series: Vec<Vec<(f64, f64)>> = flags
        .iter()
        .map(|flag| {
            periods
                .iter()
                .enumerate()
                .map(|(x, (period, _))| (x as f64, chart.quantity(*period, flag)))
                .collect()
        })
        .collect();

    let (mut lo, mut hi) = series
        .iter()
        .flatten()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
    if lo == hi {
        hi = lo + 1.0;
    }
    lo = lo.floor();
    hi = hi.ceil();

    let datasets: Vec<ChartData> = flags
        .iter()
        .zip(&series)
        .enumerate()
        .map(|(i, (flag, data))| {
            ChartData::default()
                .name(flag.to_string())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(series_style(i))
                .data(data)
        })
        .collect();

    let x_max = periods.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<String> = match periods.len() {
        0 => Vec::new(),
        1 => vec![periods[0].1.to_string()],
        n => vec![
            periods[0].1.to_string(),
            periods[n / 2].1.to_string(),
            periods[n - 1].1.to_string(),
        ],
    };
    let y_labels = vec![quantity(lo), quantity((lo + hi) / 2.0), quantity(hi)];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .x_axis(
            Axis::default()
                .style(AXIS_STYLE)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(AXIS_STYLE)
                .bounds([lo, hi])
                .labels(y_labels),
        );
    frame.render_widget(widget, area);
}

fn legend(flags: &[&str]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (i, flag) in flags.iter().enumerate() {
        spans.push(Span::styled("\u{25a0} ", series_style(i)));
        spans.push(Span::raw(format!("{flag}  ")));
    }
    Line::from(spans)
}

fn metrics_lines(m: &SummaryMetrics) -> Vec<Line<'static>> {
    let spans: Vec<Span> = m
        .labelled_pretty()
        .into_iter()
        .flat_map(|(label, value)| {
            [
                Span::styled(format!(" {label}: "), METRIC_LABEL_STYLE),
                Span::styled(value, METRIC_VALUE_STYLE),
                Span::raw("  "),
            ]
        })
        .collect();
    vec![Line::from(spans)]
}

impl ReportView for ChartView<'_> {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let metrics_height = match &self.state {
            ViewState::Ready(Report { metrics: Some(_), .. }) => 3,
            _ => 0,
        };
        let [header_area, sep_area, chart_area, metrics_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(metrics_height),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!(" {}", self.title()), HEADER_STYLE),
                Span::styled(format!("  [{}]", self.filter.describe()), FILTER_STYLE),
            ])),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        match &self.state {
            ViewState::Warning(message) => Self::draw_warning(frame, chart_area, message),
            ViewState::Ready(report) => {
                match report.chart.kind {
                    ChartKind::Bar => draw_bar_chart(frame, chart_area, &report.chart),
                    ChartKind::Line => draw_line_chart(frame, chart_area, &report.chart),
                }
                if let Some(m) = &report.metrics {
                    frame.render_widget(
                        Paragraph::new(metrics_lines(m)).wrap(Wrap { trim: true }),
                        metrics_area,
                    );
                }
            }
        }

        let month_hint = if self.filter.year.is_some() {
            "\u{2191}/\u{2193}=month  "
        } else {
            ""
        };
        frame.render_widget(
            Paragraph::new(format!(
                " \u{2190}/\u{2192}=year  {month_hint}a=all  q/Esc=close"
            ))
            .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportViewAction::Close,
            KeyCode::Left | KeyCode::Char('h') => self.filter.cycle_year(&self.years, -1),
            KeyCode::Right | KeyCode::Char('l') => self.filter.cycle_year(&self.years, 1),
            KeyCode::Up | KeyCode::Char('k') if self.filter.year.is_some() => {
                self.filter.cycle_month(-1)
            }
            KeyCode::Down | KeyCode::Char('j') if self.filter.year.is_some() => {
                self.filter.cycle_month(1)
            }
            KeyCode::Char('a') => self.filter.reset(),
            _ => return ReportViewAction::Continue,
        }
        self.rebuild();
        ReportViewAction::Continue
    }
}
