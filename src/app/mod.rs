use std::io::Stdout;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Frame;
use ratatui::Terminal;

mod selector;
mod tasks;

pub use selector::NoteSelector;
pub use tasks::TaskBoard;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    CursorUp,
    CursorDown,
    GoToTop,
    GoToBottom,
    Choose,
    SetInProgress,
    SetComplete,
    ClearStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A full-screen view driven by [`run_screen`].
pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);

    fn apply(&mut self, action: Action) -> Flow;
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let plain = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Up | KeyCode::Char('k') if plain => Some(Action::CursorUp),
        KeyCode::Down | KeyCode::Char('j') if plain => Some(Action::CursorDown),
        KeyCode::Home | KeyCode::Char('g') if plain => Some(Action::GoToTop),
        KeyCode::End | KeyCode::Char('G') if plain => Some(Action::GoToBottom),
        KeyCode::Enter => Some(Action::Choose),
        KeyCode::Char('p') if plain => Some(Action::SetInProgress),
        KeyCode::Char('C') if plain => Some(Action::SetComplete),
        KeyCode::Char('c') if plain => Some(Action::ClearStatus),
        _ => None,
    }
}

pub fn run_screen<S: Screen>(screen: &mut S) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, screen);
    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<S: Screen>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    screen: &mut S,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| screen.draw(frame))
            .context("rendering frame")?;

        if !event::poll(POLL_INTERVAL).context("polling for terminal events")? {
            continue;
        }
        match event::read().context("reading terminal event")? {
            Event::Key(key) => {
                let Some(action) = action_for(key) else {
                    continue;
                };
                tracing::trace!(?action, "key action");
                if screen.apply(action) == Flow::Exit {
                    return Ok(());
                }
            }
            Event::Resize(_, _) => {
                // next draw re-measures against the new size
            }
            _ => {}
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
