use std::io::{Stdout, stdout};

use anyhow::{Result, bail};
use crossterm::{
    event::{
        DisableFocusChange, EnableFocusChange, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use batchwatch_api::MetricsClient;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::surface::TerminalBackend;
use crate::ui::{self, Screen};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Restores the terminal on drop, including on early return or panic unwind.
struct TerminalCleanup;

impl Drop for TerminalCleanup {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableFocusChange, LeaveAlternateScreen);
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableFocusChange)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

/// What a key press asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    StartSimulator,
    Ignore,
}

pub fn key_action(key: KeyEvent, simulator_key: bool) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::Ignore;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('s') if simulator_key => Action::StartSimulator,
        _ => Action::Ignore,
    }
}

/// Run the terminal dashboard until the user quits.
pub async fn run(config: &DashboardConfig, client: MetricsClient) -> Result<()> {
    let mut terminal = init()?;
    let _cleanup = TerminalCleanup;

    let simulator_key = config.ui.simulator_key_enabled;
    let mut dashboard = Dashboard::mount(config, client.clone(), |_| TerminalBackend);
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
    let mut status: Option<String> = None;

    let mut redraw = tokio::time::interval(config.redraw_interval());
    let mut events = EventStream::new();

    let result = async {
        loop {
            tokio::select! {
                _ = redraw.tick() => {
                    dashboard.sync_surfaces();
                    draw(&mut terminal, &dashboard, simulator_key, status.as_deref())?;
                },
                alive = dashboard.changed() => {
                    if !alive {
                        bail!("a dashboard poller stopped unexpectedly");
                    }
                    draw(&mut terminal, &dashboard, simulator_key, status.as_deref())?;
                },
                Some(message) = status_rx.recv() => {
                    status = Some(message);
                },
                maybe_event = events.next() => {
                    let Some(event) = maybe_event else {
                        break;
                    };
                    match event? {
                        Event::Key(key) => match key_action(key, simulator_key) {
                            Action::Quit => break,
                            Action::StartSimulator => {
                                status = Some("Starting simulator...".to_string());
                                spawn_simulator_start(client.clone(), status_tx.clone());
                            },
                            Action::Ignore => {},
                        },
                        Event::FocusGained => dashboard.set_visible(true),
                        Event::FocusLost => dashboard.set_visible(false),
                        _ => {},
                    }
                },
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    dashboard.unmount();
    result
}

fn draw(
    terminal: &mut Tui,
    dashboard: &Dashboard<TerminalBackend>,
    simulator_key: bool,
    status: Option<&str>,
) -> Result<()> {
    let stats = dashboard.stats();
    let unreachable_notice = dashboard.show_unreachable_notice();
    terminal.draw(|f| {
        ui::draw(
            f,
            &Screen {
                stats: &stats,
                unreachable_notice,
                cost_trend: dashboard.cost_trend().instance(),
                efficiency: dashboard.efficiency().instance(),
                simulator_key,
                status,
            },
        )
    })?;
    Ok(())
}

// Fire and forget; only the outcome message comes back.
fn spawn_simulator_start(client: MetricsClient, tx: mpsc::UnboundedSender<String>) {
    tokio::spawn(async move {
        let message = match client.start_simulator().await {
            Ok(ack) => {
                tracing::info!(message = %ack.message, "Simulator start acknowledged");
                ack.message
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start simulator");
                "Simulator start failed".to_string()
            },
        };
        let _ = tx.send(message);
    });
}
