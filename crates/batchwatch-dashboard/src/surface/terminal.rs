use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use super::{AxisSide, ChartBackend, ChartSpec, SeriesStyle};

const LINE_COLORS: [Color; 2] = [Color::Cyan, Color::Magenta];
const BAR_COLOR: Color = Color::Blue;
const BORDER: Color = Color::DarkGray;

/// Builds [`TerminalChart`]s for the ratatui renderer.
#[derive(Debug, Default)]
pub struct TerminalBackend;

impl ChartBackend for TerminalBackend {
    type Instance = TerminalChart;

    fn create(&mut self, spec: &ChartSpec) -> TerminalChart {
        TerminalChart::from_spec(spec)
    }

    fn destroy(&mut self, instance: TerminalChart) {
        tracing::trace!(chart = instance.title, "Releasing chart buffers");
        drop(instance);
    }
}

/// A line series split into contiguous runs of defined values.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedLine {
    pub name: &'static str,
    pub axis: AxisSide,
    /// Each run is drawn separately so a NaN leaves a visible gap.
    pub segments: Vec<Vec<(f64, f64)>>,
    pub bounds: Option<(f64, f64)>,
}

/// Bar series with short category labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedBars {
    pub name: &'static str,
    pub bars: Vec<(String, u64)>,
}

/// Owned, render-ready chart data.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalChart {
    title: &'static str,
    labels: Vec<String>,
    lines: Vec<PlottedLine>,
    bars: Option<PlottedBars>,
}

impl TerminalChart {
    pub fn from_spec(spec: &ChartSpec) -> Self {
        let mut lines = Vec::new();
        let mut bars = None;
        for series in &spec.series {
            match series.style {
                SeriesStyle::Line => lines.push(PlottedLine {
                    name: series.name,
                    axis: series.axis,
                    segments: series.data.segments(),
                    bounds: series.data.bounds(),
                }),
                SeriesStyle::Bar => {
                    bars = Some(PlottedBars {
                        name: series.name,
                        bars: series
                            .data
                            .labels
                            .iter()
                            .zip(&series.data.values)
                            .map(|(label, v)| (short_label(label), bar_height(*v)))
                            .collect(),
                    });
                },
            }
        }
        Self {
            title: spec.title,
            labels: spec.labels.clone(),
            lines,
            bars,
        }
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn lines(&self) -> &[PlottedLine] {
        &self.lines
    }

    pub fn bars(&self) -> Option<&PlottedBars> {
        self.bars.as_ref()
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER))
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        f.render_widget(block, area);

        match &self.bars {
            None => self.render_lines(f, inner, AxisSide::Primary),
            Some(bars) => {
                let [top, bottom] =
                    Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                        .areas(inner);
                render_bars(f, top, bars);
                self.render_lines(f, bottom, AxisSide::Secondary);
            },
        }
    }

    fn render_lines(&self, f: &mut Frame, area: Rect, side: AxisSide) {
        let lines: Vec<&PlottedLine> = self.lines.iter().filter(|l| l.axis == side).collect();
        let Some((lo, hi)) = lines
            .iter()
            .filter_map(|l| l.bounds)
            .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
        else {
            let msg = Paragraph::new("No defined values").style(Style::default().fg(Color::Gray));
            f.render_widget(msg, area);
            return;
        };

        let margin = (hi - lo).abs().max(hi.abs() * 0.1).max(1e-3) * 0.15;
        let y_min = if lo >= 0.0 { (lo - margin).max(0.0) } else { lo - margin };
        let y_max = hi + margin;
        let x_max = (self.labels.len().saturating_sub(1)).max(1) as f64;

        let mut datasets = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let style = Style::default().fg(LINE_COLORS[i % LINE_COLORS.len()]);
            for (n, segment) in line.segments.iter().enumerate() {
                let graph = if segment.len() == 1 {
                    GraphType::Scatter
                } else {
                    GraphType::Line
                };
                let mut dataset = Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(graph)
                    .style(style)
                    .data(segment);
                if n == 0 {
                    dataset = dataset.name(line.name);
                }
                datasets.push(dataset);
            }
        }

        // Stacked under the bars, the line pane uses the bar labels.
        let x_label = |label: Option<&String>| match (label, &self.bars) {
            (Some(label), Some(_)) => short_label(label),
            (Some(label), None) => label.clone(),
            (None, _) => String::new(),
        };
        let first = x_label(self.labels.first());
        let last = x_label(self.labels.last());
        let axis_title = match side {
            AxisSide::Primary => "",
            AxisSide::Secondary => "secondary",
        };

        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, x_max])
                    .labels(vec![Span::raw(first), Span::raw(last)]),
            )
            .y_axis(
                Axis::default()
                    .title(axis_title)
                    .style(Style::default().fg(Color::Gray))
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Span::raw(format!("{y_min:.2}")),
                        Span::raw(format!("{y_max:.2}")),
                    ]),
            );
        f.render_widget(chart, area);
    }
}

fn render_bars(f: &mut Frame, area: Rect, bars: &PlottedBars) {
    let data: Vec<(&str, u64)> = bars.bars.iter().map(|(l, v)| (l.as_str(), *v)).collect();
    let count = data.len().max(1) as u16;
    let bar_width = (area.width / count).saturating_sub(1).clamp(1, 8);

    let chart = BarChart::default()
        .block(Block::default().title(bars.name))
        .data(data.as_slice())
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(BAR_COLOR))
        .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR));
    f.render_widget(chart, area);
}

fn bar_height(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

// "Batch 12" -> "#12"; bars are too narrow for the full label.
fn short_label(label: &str) -> String {
    match label.strip_prefix("Batch ") {
        Some(id) => format!("#{id}"),
        None => label.to_string(),
    }
}
