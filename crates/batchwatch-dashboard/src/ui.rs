//! Terminal layout: summary cards on top, the two chart surfaces below.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use batchwatch_core::{AggregatorState, DashboardViewModel};

use crate::surface::{SurfaceKind, TerminalChart};

/// Everything one frame needs. Built fresh for every draw.
pub struct Screen<'a> {
    pub stats: &'a AggregatorState,
    /// Still loading long enough that the service is probably down.
    pub unreachable_notice: bool,
    pub cost_trend: Option<&'a TerminalChart>,
    pub efficiency: Option<&'a TerminalChart>,
    pub simulator_key: bool,
    pub status: Option<&'a str>,
}

pub fn draw(f: &mut Frame, screen: &Screen<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0]);
    match screen.stats.view_model() {
        Some(vm) => render_cards(f, chunks[1], vm),
        None => render_loading(f, chunks[1], screen.unreachable_notice),
    }

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_surface(f, charts[0], SurfaceKind::CostTrend, screen.cost_trend);
    render_surface(f, charts[1], SurfaceKind::BatchEfficiency, screen.efficiency);

    render_footer(f, chunks[3], screen);
}

fn render_header(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "batchwatch",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  pipeline monitor"),
    ]));
    f.render_widget(title, area);
}

fn render_cards(f: &mut Frame, area: Rect, vm: &DashboardViewModel) {
    let cards = summary_cards(vm);
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    for (card, slot) in cards.iter().zip(slots.iter()) {
        card.render(f, *slot);
    }
}

/// The summary cards, left to right.
pub fn summary_cards(vm: &DashboardViewModel) -> Vec<SummaryCard> {
    let db = &vm.database;
    let worker = &vm.worker;
    let worker_tone = if worker.is_running { Tone::Good } else { Tone::Bad };
    vec![
        SummaryCard::new("Events", db.events.total.to_string()).detail(format!(
            "{} processed, {} pending",
            db.events.processed, db.events.unprocessed
        )),
        SummaryCard::new("Processing Rate", vm.processing_rate_label())
            .tone(Tone::Good)
            .detail(format!("{} / {}", db.events.processed, db.events.total)),
        SummaryCard::new("Batches", db.batches.total.to_string()).detail(format!(
            "avg {:.1} events, {:.2}s, ${:.3}",
            db.batches.avg_size, db.batches.avg_processing_time, db.batches.avg_cost
        )),
        SummaryCard::new("Total Cost", format!("${:.4}", db.costs.total))
            .tone(Tone::Cost)
            .detail(format!("${:.6} per event", db.costs.per_event)),
        SummaryCard::new("Worker", vm.worker_label())
            .tone(worker_tone)
            .detail(format!(
                "{} predictions, {}",
                worker.ml_predictions_used,
                vm.ml_label()
            )),
    ]
}

fn render_loading(f: &mut Frame, area: Rect, unreachable_notice: bool) {
    let mut lines = vec![Line::from(Span::styled(
        "Loading statistics...",
        Style::default().fg(Color::Gray),
    ))];
    if unreachable_notice {
        lines.push(Line::from(Span::styled(
            "Service unreachable, still retrying",
            Style::default().fg(Color::Yellow),
        )));
    }
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Statistics "),
    );
    f.render_widget(paragraph, area);
}

fn render_surface(f: &mut Frame, area: Rect, kind: SurfaceKind, chart: Option<&TerminalChart>) {
    match chart {
        Some(chart) => chart.render(f, area),
        None => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", kind.title()));
            f.render_widget(block, area);
        },
    }
}

fn render_footer(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let mut spans = vec![Span::styled("q", Style::default().fg(Color::Cyan)), Span::raw(" quit")];
    if screen.simulator_key {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("s", Style::default().fg(Color::Cyan)));
        spans.push(Span::raw(" start simulator"));
    }
    if let Some(status) = screen.status {
        spans.push(Span::raw("  | "));
        spans.push(Span::styled(status, Style::default().fg(Color::DarkGray)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Accent for a card's headline value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Good,
    Bad,
    Cost,
}

impl Tone {
    fn color(self) -> Color {
        match self {
            Tone::Neutral => Color::Cyan,
            Tone::Good => Color::Green,
            Tone::Bad => Color::Red,
            Tone::Cost => Color::Yellow,
        }
    }
}

/// One summary card: a headline value and an optional detail line.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: String,
    pub detail: Option<String>,
    pub tone: Tone,
}

impl SummaryCard {
    pub fn new(title: &'static str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
            detail: None,
            tone: Tone::default(),
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let headline = Style::default()
            .fg(self.tone.color())
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = std::iter::once(Line::from(Span::styled(self.value.as_str(), headline)))
            .chain(self.detail.as_deref().map(|detail| {
                Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray)))
            }))
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", self.title));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
