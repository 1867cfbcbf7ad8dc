use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

/// Lowest exit code a binding may use
pub const MIN_EXIT_CODE: i32 = 64;
/// Highest exit code a binding may use
pub const MAX_EXIT_CODE: i32 = 113;

pub const ABORT_KEY: KeySymbol = KeySymbol::Char('q');
pub const CONFIRM_KEY: KeySymbol = KeySymbol::Char('c');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("Invalid mapping '{0}', format should be <retcode>:<key>:<label>")]
    Malformed(String),
    #[error("Invalid mapping '{raw}', retcode '{retcode}' is either not a number or < 64 or > 113")]
    InvalidExitCode { raw: String, retcode: String },
}

/// A single input token a binding can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Insert,
    F(u8),
}

impl KeySymbol {
    /// Parse a key field: one character, or a bracketed name such as `<enter>`.
    pub fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeySymbol::Char(c));
        }

        let name = token.strip_prefix('<')?.strip_suffix('>')?.to_ascii_lowercase();
        let symbol = match name.as_str() {
            "enter" => KeySymbol::Enter,
            "space" => KeySymbol::Char(' '),
            "tab" => KeySymbol::Tab,
            "backspace" => KeySymbol::Backspace,
            "esc" | "escape" => KeySymbol::Esc,
            "up" => KeySymbol::Up,
            "down" => KeySymbol::Down,
            "left" => KeySymbol::Left,
            "right" => KeySymbol::Right,
            "home" => KeySymbol::Home,
            "end" => KeySymbol::End,
            "pageup" => KeySymbol::PageUp,
            "pagedown" => KeySymbol::PageDown,
            "delete" => KeySymbol::Delete,
            "insert" => KeySymbol::Insert,
            f => match f.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => KeySymbol::F(n),
                _ => return None,
            },
        };
        Some(symbol)
    }

    /// Map a crossterm key press to a symbol. Modified presses other than
    /// shift never map, so `ctrl+r` does not trigger a binding on `r`.
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }

        let symbol = match key.code {
            KeyCode::Char(c) => KeySymbol::Char(c),
            KeyCode::Enter => KeySymbol::Enter,
            KeyCode::Tab => KeySymbol::Tab,
            KeyCode::Backspace => KeySymbol::Backspace,
            KeyCode::Esc => KeySymbol::Esc,
            KeyCode::Up => KeySymbol::Up,
            KeyCode::Down => KeySymbol::Down,
            KeyCode::Left => KeySymbol::Left,
            KeyCode::Right => KeySymbol::Right,
            KeyCode::Home => KeySymbol::Home,
            KeyCode::End => KeySymbol::End,
            KeyCode::PageUp => KeySymbol::PageUp,
            KeyCode::PageDown => KeySymbol::PageDown,
            KeyCode::Delete => KeySymbol::Delete,
            KeyCode::Insert => KeySymbol::Insert,
            KeyCode::F(n) => KeySymbol::F(n),
            _ => return None,
        };
        Some(symbol)
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(' ') => f.write_str("<space>"),
            KeySymbol::Char(c) => write!(f, "{}", c),
            KeySymbol::Enter => f.write_str("<enter>"),
            KeySymbol::Tab => f.write_str("<tab>"),
            KeySymbol::Backspace => f.write_str("<backspace>"),
            KeySymbol::Esc => f.write_str("<escape>"),
            KeySymbol::Up => f.write_str("<up>"),
            KeySymbol::Down => f.write_str("<down>"),
            KeySymbol::Left => f.write_str("<left>"),
            KeySymbol::Right => f.write_str("<right>"),
            KeySymbol::Home => f.write_str("<home>"),
            KeySymbol::End => f.write_str("<end>"),
            KeySymbol::PageUp => f.write_str("<pageup>"),
            KeySymbol::PageDown => f.write_str("<pagedown>"),
            KeySymbol::Delete => f.write_str("<delete>"),
            KeySymbol::Insert => f.write_str("<insert>"),
            KeySymbol::F(n) => write!(f, "<f{}>", n),
        }
    }
}

/// One custom key override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub exit_code: i32,
    /// The key field as written
    pub key: String,
    /// `None` when the key field names no key we can receive; such a binding
    /// is listed but never fires
    pub symbol: Option<KeySymbol>,
    pub label: String,
}

impl Binding {
    pub fn parse(raw: &str) -> Result<Self, KeymapError> {
        let fields: Vec<&str> = raw.split(':').collect();
        let [retcode, key, label] = fields.as_slice() else {
            return Err(KeymapError::Malformed(raw.to_string()));
        };

        let exit_code = retcode
            .parse::<i32>()
            .ok()
            .filter(|code| (MIN_EXIT_CODE..=MAX_EXIT_CODE).contains(code))
            .ok_or_else(|| KeymapError::InvalidExitCode {
                raw: raw.to_string(),
                retcode: retcode.to_string(),
            })?;

        Ok(Self {
            exit_code,
            key: key.to_string(),
            symbol: KeySymbol::parse(key),
            label: label.to_string(),
        })
    }
}

/// The validated, immutable set of bindings in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

/// Compile raw `retcode:key:label` specs, failing on the first bad one.
pub fn resolve<I, S>(raw_specs: I) -> Result<Keymap, KeymapError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let bindings = raw_specs
        .into_iter()
        .map(|raw| Binding::parse(raw.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = bindings.len(), "resolved key bindings");
    Ok(Keymap { bindings })
}
