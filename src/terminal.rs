use std::io::{self, Stdout};

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::engine::CountdownDisplay;
use crate::keymap::Keymap;
use crate::session::Session;
use crate::ui::CountdownView;

/// Raw mode + alternate screen for as long as this value lives. Dropping it
/// restores the terminal on every exit path, including unwinding.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    pub fn init() -> io::Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        let terminal = execute!(stdout, EnterAlternateScreen)
            .and_then(|_| Terminal::new(CrosstermBackend::new(stdout)));
        let terminal = match terminal {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(err);
            }
        };

        // from here on Drop undoes both steps
        let mut guard = Self { terminal };
        guard.terminal.hide_cursor()?;
        guard.terminal.clear()?;
        Ok(guard)
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show);
    }
}

/// Draws sessions onto any ratatui terminal
pub struct TerminalDisplay<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    keymap: &'a Keymap,
    title: Option<&'a str>,
}

impl<'a, B: Backend> TerminalDisplay<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, keymap: &'a Keymap, title: Option<&'a str>) -> Self {
        Self {
            terminal,
            keymap,
            title,
        }
    }
}

impl<B: Backend> CountdownDisplay for TerminalDisplay<'_, B> {
    fn draw(&mut self, session: &Session) -> io::Result<()> {
        let (keymap, title) = (self.keymap, self.title);
        // terminal.draw autoresizes, which covers resize events
        self.terminal.draw(|f| {
            f.render_widget(CountdownView::new(session, keymap, title), f.area())
        })?;
        Ok(())
    }
}
