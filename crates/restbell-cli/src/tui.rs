//! Rest countdown TUI.
//!
//! Terminal I/O runs on a dedicated OS thread; the countdown ticks and all
//! gRPC work stay on the tokio runtime. Communication via
//! `tokio::sync::mpsc` channels.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Gauge, Paragraph};
use tokio_util::sync::CancellationToken;

use restbell_core::db::unix_timestamp_ms;
use restbell_core::timer::{CountdownController, CountdownPhase, CountdownView, display};

use crate::scheduler::RemoteReminderScheduler;

/// Terminal events forwarded from the UI reader thread.
pub enum TermEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
}

/// Render cadence. Remaining time is recomputed from timestamps on every
/// tick, so a missed frame costs nothing.
const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Run the countdown for one exercise until the user quits.
///
/// Keys: space pauses/resumes, `s` skips the rest, `r` restarts it
/// (superseding the scheduled notification), `q`/Esc quits.
pub async fn run(
    scheduler: RemoteReminderScheduler,
    exercise_id: &str,
    duration_secs: u32,
) -> anyhow::Result<()> {
    let mut controller = CountdownController::new(scheduler);
    controller.start(exercise_id, duration_secs, unix_timestamp_ms());

    // Enter raw mode, create terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Channels + cancellation token
    let cancel = CancellationToken::new();
    let (term_tx, mut term_rx) = tokio::sync::mpsc::channel::<TermEvent>(64);

    // Spawn dedicated OS thread for crossterm::event::read()
    let cancel_clone = cancel.clone();
    let ui_thread = std::thread::spawn(move || {
        loop {
            if cancel_clone.is_cancelled() {
                break;
            }
            // Poll with 50ms timeout so we can check cancellation
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) => {
                        // Filter out Release events (Windows emits Press + Release per keystroke)
                        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                            continue;
                        }
                        if term_tx.blocking_send(TermEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                    Ok(Event::Resize(..)) => {
                        if term_tx.blocking_send(TermEvent::Resize).is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    });

    let duration_ms = i64::from(duration_secs) * 1000;
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            _ = tick.tick() => {
                let view = controller.tick(unix_timestamp_ms());
                if let Err(e) = terminal.draw(|f| draw(f, exercise_id, duration_ms, view)) {
                    break Err(e.into());
                }
            }
            maybe_event = term_rx.recv() => {
                match maybe_event {
                    Some(TermEvent::Key(key)) => {
                        let now_ms = unix_timestamp_ms();
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                            KeyCode::Char(' ') => match controller.tick(now_ms).phase {
                                CountdownPhase::Running => controller.pause(now_ms),
                                CountdownPhase::Paused => controller.resume(now_ms),
                                _ => {}
                            },
                            KeyCode::Char('s') => controller.skip(),
                            KeyCode::Char('r') => {
                                controller.start(exercise_id, duration_secs, now_ms);
                            }
                            _ => {}
                        }
                    }
                    Some(TermEvent::Resize) => {
                        if let Err(e) = terminal.autoresize() {
                            break Err(e.into());
                        }
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    // Stop the reader thread and restore the terminal
    cancel.cancel();
    let _ = ui_thread.join();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn draw(frame: &mut ratatui::Frame<'_>, exercise_id: &str, duration_ms: i64, view: CountdownView) {
    let [title_area, gauge_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(format!("Resting: {exercise_id}")),
        title_area,
    );
    frame.render_widget(gauge(duration_ms, view), gauge_area);
    frame.render_widget(
        Paragraph::new("space pause/resume · s skip · r restart · q quit")
            .style(Style::default().fg(Color::DarkGray)),
        help_area,
    );
}

fn gauge(duration_ms: i64, view: CountdownView) -> Gauge<'static> {
    let (label, ratio, color) = match view.phase {
        CountdownPhase::Idle => ("no rest in progress".to_string(), 0.0, Color::DarkGray),
        CountdownPhase::Running => (
            display::format_mm_ss(view.remaining_ms),
            remaining_ratio(duration_ms, view),
            Color::Green,
        ),
        CountdownPhase::Paused => (
            format!("{} (paused)", display::format_mm_ss(view.remaining_ms)),
            remaining_ratio(duration_ms, view),
            Color::Yellow,
        ),
        CountdownPhase::Completed => ("Ready! Start your next set".to_string(), 1.0, Color::Cyan),
    };

    Gauge::default()
        .block(Block::bordered().title("Rest"))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(label)
}

#[allow(clippy::cast_precision_loss)]
fn remaining_ratio(duration_ms: i64, view: CountdownView) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    // Gauge fills up as the rest elapses
    let elapsed = (duration_ms - view.remaining_ms).clamp(0, duration_ms);
    elapsed as f64 / duration_ms as f64
}
