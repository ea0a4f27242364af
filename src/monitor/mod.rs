//! Market tracker TUI using ratatui + crossterm.
//!
//! Shows the tracked assets as a table or card grid, a detail panel for the
//! selection, the price chart of the last requested asset and a log panel.

mod render;
mod state;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use gecko::Gecko;
use ratatui::prelude::*;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::controller::{Controller, MarketSource, NoticeKind, Update};
use crate::error::AppError;

use state::{Action, ViewState};

/// Target render interval (10 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Run the market tracker TUI until 'q' or cancellation.
///
/// Snapshots refresh immediately and then on every `refresh_interval`. A
/// failed refresh keeps the previous data on screen and adds a log line.
///
/// # Errors
///
/// Returns [`AppError`] if the client cannot be built or the terminal cannot
/// be set up.
pub async fn run_monitor(config: AppConfig, cancel: CancellationToken) -> Result<(), AppError> {
    let gecko = Arc::new(Gecko::new(config.gecko.clone())?);
    let currency = gecko.vs_currency.clone();
    let (mut controller, mut outcomes) = Controller::new(Arc::clone(&gecko));

    info!(
        assets = gecko.asset_ids.len(),
        currency = %currency,
        refresh = ?config.refresh_interval,
        "starting monitor"
    );

    let mut state = ViewState::new(config.default_range);
    state.push_log(format!(
        "Tracking {} in {}",
        gecko.asset_ids.join(", "),
        currency.to_uppercase()
    ));

    // Set up terminal.
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
            return Err(e.into());
        }
    };

    state.push_log("Loading market data... Press 'q' to quit.");

    // First tick completes immediately.
    let mut refresh = tokio::time::interval(config.refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);

    // Main event loop.
    let mut quit = false;
    let result: Result<(), AppError> = loop {
        if quit {
            break Ok(());
        }

        tokio::select! {
            _ = refresh.tick() => {
                controller.request_snapshots();
            }

            Some(outcome) = outcomes.recv() => {
                let update = controller.apply(outcome);
                on_update(&mut state, &controller, update);
            }

            // Render tick, also polls keyboard input.
            _ = render_interval.tick() => {
                while event::poll(Duration::ZERO).unwrap_or(false) {
                    if let Ok(Event::Key(key)) = event::read() {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        let action = {
                            let visible = state.visible(controller.snapshots());
                            state.handle_key(key, &visible)
                        };
                        match action {
                            Action::None => {}
                            Action::Quit => quit = true,
                            Action::Refresh => {
                                state.push_log("Refreshing...");
                                controller.request_snapshots();
                                refresh.reset();
                            }
                            Action::ShowChart { asset_id } => {
                                controller.request_history(&asset_id, state.range);
                            }
                            Action::RangeChanged(range) => {
                                state.push_log(format!("Chart range {range}"));
                                let target = controller.history_target().map(|(id, _)| id.to_string());
                                if let Some(asset_id) = target {
                                    controller.request_history(&asset_id, range);
                                }
                            }
                        }
                    }
                }

                if !quit {
                    if let Some(asset) = state.selected_asset(controller.snapshots()).cloned() {
                        controller.request_icon(&asset);
                    }
                    let _ = terminal.draw(|frame| {
                        render::render_ui(frame, &state, &controller, &currency);
                    });
                }
            }

            _ = cancel.cancelled() => {
                break Ok(());
            }
        }
    };

    // Restore terminal.
    restore_terminal(&mut terminal);
    info!("monitor stopped");

    result
}

/// Reflect an applied fetch in the view.
fn on_update<S: MarketSource>(state: &mut ViewState, controller: &Controller<S>, update: Update) {
    match update {
        Update::Snapshots { count } => {
            let visible = state.visible(controller.snapshots()).len();
            state.clamp_selection(visible);
            state.push_log(format!("Loaded {count} assets"));
        }
        Update::History {
            asset_id,
            range,
            points,
        } => {
            state.push_log(format!("{asset_id} {range}: {points} points"));
        }
        Update::Icon { .. } | Update::Stale => {}
        Update::Failed(notice) => {
            let prefix = match notice.kind {
                NoticeKind::Fetch => "error",
                NoticeKind::NoData => "no data",
            };
            state.push_log(format!("{prefix}: {}", notice.message));
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

/// Restore terminal to normal mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = terminal.show_cursor();
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}
