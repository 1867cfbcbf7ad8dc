use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::keymap::{Keymap, ABORT_KEY, CONFIRM_KEY};
use crate::session::Session;

pub const DEFAULT_TITLE: &str = "tarry";

const MARGIN: u16 = 2;
const GAUGE_HEIGHT: u16 = 3;
// borders + heading + the two fixed keys
const LEGEND_BASE_HEIGHT: u16 = 5;

/// Read-only view of a session: the keybinding legend above a timer gauge
pub struct CountdownView<'a> {
    pub session: &'a Session,
    pub keymap: &'a Keymap,
    pub title: &'a str,
}

impl<'a> CountdownView<'a> {
    pub fn new(session: &'a Session, keymap: &'a Keymap, title: Option<&'a str>) -> Self {
        Self {
            session,
            keymap,
            title: title.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE),
        }
    }

    fn legend_lines(&self) -> Vec<Line<'a>> {
        let key_style = Style::default().fg(Color::Green);

        let fixed: [(String, &'a str); 2] = [
            (ABORT_KEY.to_string(), "abort"),
            (CONFIRM_KEY.to_string(), "continue"),
        ];
        let entries = fixed.into_iter().chain(
            self.keymap
                .bindings()
                .iter()
                .map(|b| (b.key.clone(), b.label.as_str())),
        );

        let mut lines = vec![Line::from("KEYBINDINGS:")];
        lines.extend(entries.map(|(key, label)| {
            Line::from(vec![
                Span::styled(format!("'{}'", key), key_style),
                Span::raw(format!(" -> {}", label)),
            ])
        }));
        lines
    }

    fn gauge_label(&self) -> String {
        format!(
            "{}s / {}s",
            self.session.elapsed().as_secs(),
            self.session.total().as_secs()
        )
    }
}

impl Widget for CountdownView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let legend_height = LEGEND_BASE_HEIGHT.saturating_add(self.keymap.len() as u16);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(MARGIN)
            .constraints([
                Constraint::Length(legend_height),
                Constraint::Length(GAUGE_HEIGHT),
                Constraint::Min(0),
            ])
            .split(area);

        let title_style = Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD);

        let legend = Paragraph::new(self.legend_lines())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(self.title, title_style)),
            )
            .wrap(Wrap { trim: true });

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled("timer", title_style)),
            )
            .gauge_style(Style::default().fg(Color::Green))
            .percent(self.session.progress_percent().min(100))
            .label(Span::styled(
                self.gauge_label(),
                Style::default().fg(Color::Yellow),
            ));

        legend.render(chunks[0], buf);
        gauge.render(chunks[1], buf);
    }
}
