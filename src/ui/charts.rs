use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Direction, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::core::types::{ChartSeries, TrendSeries};

/// Owns one chart's data between cycles. A chart is mounted with fresh data and destroyed
/// before the next mount, so nothing from an older cycle leaks into the new render.
#[derive(Debug, Clone)]
pub struct ChartPanel<T> {
    title: &'static str,
    data: Option<T>,
    mounted_at: Option<DateTime<Utc>>,
}

impl<T> ChartPanel<T> {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            data: None,
            mounted_at: None,
        }
    }

    pub fn mount(&mut self, data: T, at: DateTime<Utc>) {
        self.destroy();
        self.data = Some(data);
        self.mounted_at = Some(at);
    }

    pub fn destroy(&mut self) {
        self.data = None;
        self.mounted_at = None;
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.data.is_some()
    }

    /// Title with the local time the current data was mounted.
    pub fn heading(&self) -> String {
        match self.mounted_at {
            Some(at) => format!(
                "{}({}) ",
                self.title,
                at.with_timezone(&Local).format("%H:%M:%S")
            ),
            None => self.title.to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.title
    }
}

fn placeholder(f: &mut Frame<'_>, area: Rect, title: &str, text: &str) {
    let para = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    f.render_widget(para, area);
}

/// Bars rounded to whole counts; the bar widget only draws integers.
pub fn render_bars(
    f: &mut Frame<'_>,
    area: Rect,
    panel: &ChartPanel<ChartSeries>,
    color: Color,
    direction: Direction,
) {
    let Some(series) = panel.data().filter(|s| !s.is_empty()) else {
        placeholder(f, area, panel.title(), "No data");
        return;
    };
    let bars: Vec<(&str, u64)> = series
        .labels
        .iter()
        .zip(series.values.iter())
        .map(|(label, &value)| (label.as_str(), value.max(0.0).round() as u64))
        .collect();
    let bar_width = match direction {
        Direction::Horizontal => 1,
        Direction::Vertical => 7,
    };
    let chart = BarChart::default()
        .block(Block::default().title(panel.heading()).borders(Borders::ALL))
        .direction(direction)
        .bar_width(bar_width)
        .bar_gap(if direction == Direction::Horizontal { 0 } else { 1 })
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color))
        .data(bars.as_slice());
    f.render_widget(chart, area);
}

pub fn render_trend(f: &mut Frame<'_>, area: Rect, panel: &ChartPanel<TrendSeries>) {
    let Some(trend) = panel.data().filter(|t| !t.is_empty()) else {
        placeholder(f, area, panel.title(), "No trend data");
        return;
    };
    let detected = trend.detected_points();
    let mitigated = trend.mitigated_points();
    let points = detected.len().max(mitigated.len()).max(1);
    let max_x = (points - 1).max(1) as f64;
    let max_y = (trend.max_value() * 1.1).max(1.0).ceil();

    let datasets = vec![
        Dataset::default()
            .name("Detected")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&detected),
        Dataset::default()
            .name("Mitigated")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&mitigated),
    ];

    let first = trend.labels.first().cloned().unwrap_or_default();
    let last = trend.labels.last().cloned().unwrap_or_default();
    let chart = Chart::new(datasets)
        .block(Block::default().title(panel.heading()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_x])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y])
                .labels(vec![Span::raw("0"), Span::raw(format!("{}", max_y))]),
        );
    f.render_widget(chart, area);
}
