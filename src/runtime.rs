use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::keymap::KeySymbol;

/// Production tick cadence
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A key press as seen by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPress {
    Symbol(KeySymbol),
    /// ctrl+c; raw mode swallows SIGINT so this is the user's interrupt
    Interrupt,
}

impl KeyPress {
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Press
            && key.modifiers.contains(KeyModifiers::CONTROL)
            && key.code == KeyCode::Char('c')
        {
            return Some(KeyPress::Interrupt);
        }
        KeySymbol::from_key_event(key).map(KeyPress::Symbol)
    }
}

/// Unified event type consumed by the countdown engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Time elapsed since the session started
    Tick(Duration),
    Key(KeyPress),
    Resize,
}

/// Anything the engine can pull its next event from
pub trait EventStream {
    /// Blocks until the next event is available
    fn next_event(&mut self) -> CountdownEvent;
}

/// Source of terminal input events (keyboard, resize)
pub trait InputSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<CountdownEvent, RecvTimeoutError>;
}

/// Production input source using crossterm
pub struct CrosstermInputSource {
    rx: Receiver<CountdownEvent>,
}

impl CrosstermInputSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => KeyPress::from_key_event(&key).map(CountdownEvent::Key),
                Ok(CtEvent::Resize(_, _)) => Some(CountdownEvent::Resize),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(%err, "terminal input reader stopped");
                    break;
                }
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for CrosstermInputSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CountdownEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed input source for tests
pub struct TestInputSource {
    rx: Receiver<CountdownEvent>,
}

impl TestInputSource {
    pub fn new(rx: Receiver<CountdownEvent>) -> Self {
        Self { rx }
    }
}

impl InputSource for TestInputSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CountdownEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Merges terminal input with ticks fired at `start + n * interval`.
pub struct Runner<E: InputSource, T: Ticker> {
    input: E,
    ticker: T,
    started_at: Instant,
    ticks: u32,
}

impl<E: InputSource, T: Ticker> Runner<E, T> {
    pub fn new(input: E, ticker: T) -> Self {
        Self {
            input,
            ticker,
            started_at: Instant::now(),
            ticks: 0,
        }
    }

    fn next_deadline(&self) -> Duration {
        self.ticker.interval() * (self.ticks + 1)
    }

    /// Blocks until the next tick deadline and returns the next input event,
    /// or Tick once the deadline passes
    pub fn step(&mut self) -> CountdownEvent {
        let wait = self
            .next_deadline()
            .saturating_sub(self.started_at.elapsed());

        match self.input.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick(),
            Err(RecvTimeoutError::Disconnected) => {
                let wait = self
                    .next_deadline()
                    .saturating_sub(self.started_at.elapsed());
                std::thread::sleep(wait);
                self.tick()
            }
        }
    }

    fn tick(&mut self) -> CountdownEvent {
        self.ticks += 1;
        CountdownEvent::Tick(self.started_at.elapsed())
    }
}

impl<E: InputSource, T: Ticker> EventStream for Runner<E, T> {
    fn next_event(&mut self) -> CountdownEvent {
        self.step()
    }
}

/// Replays a fixed list of events; afterwards it only ever yields ticks
/// one interval apart, continuing from the last scripted tick.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<CountdownEvent>,
    last_tick: Duration,
    pulled: usize,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = CountdownEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            last_tick: Duration::ZERO,
            pulled: 0,
        }
    }

    /// `n` ticks one second apart, starting at 1s
    pub fn ticks(n: u64) -> impl Iterator<Item = CountdownEvent> {
        (1..=n).map(|s| CountdownEvent::Tick(Duration::from_secs(s)))
    }

    /// How many events the consumer asked for
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventStream for ScriptedEvents {
    fn next_event(&mut self) -> CountdownEvent {
        self.pulled += 1;
        let event = self.events.pop_front().unwrap_or_else(|| {
            CountdownEvent::Tick(self.last_tick + TICK_INTERVAL)
        });
        if let CountdownEvent::Tick(elapsed) = event {
            self.last_tick = elapsed;
        }
        event
    }
}
