//! The countdown state machine.
//!
//! A session is `Running` until the first terminating event arrives; from then
//! on it is `Terminated` and no further event is pulled, dispatched or drawn.

use std::collections::HashMap;
use std::io;

use crate::keymap::{Keymap, KeySymbol, ABORT_KEY, CONFIRM_KEY};
use crate::runtime::{CountdownEvent, EventStream, KeyPress};
use crate::session::{Outcome, Session};

/// Anything that can draw the current session state
pub trait CountdownDisplay {
    fn draw(&mut self, session: &Session) -> io::Result<()>;
}

/// Key to outcome table, filled in registration order: the fixed keys first,
/// then every binding, so later entries shadow earlier ones.
#[derive(Debug, Clone)]
pub struct Dispatch {
    table: HashMap<KeySymbol, Outcome>,
}

impl Dispatch {
    pub fn new(keymap: &Keymap) -> Self {
        let mut table = HashMap::new();
        table.insert(ABORT_KEY, Outcome::Aborted);
        table.insert(CONFIRM_KEY, Outcome::Confirmed);
        for binding in keymap.bindings() {
            if let Some(symbol) = binding.symbol {
                table.insert(symbol, Outcome::Binding(binding.exit_code));
            }
        }
        Self { table }
    }

    pub fn outcome_for(&self, key: KeyPress) -> Option<Outcome> {
        match key {
            KeyPress::Interrupt => Some(Outcome::Aborted),
            KeyPress::Symbol(symbol) => self.table.get(&symbol).copied(),
        }
    }
}

/// Apply one event to the session. Returns the outcome if this event ended it.
pub fn dispatch(event: &CountdownEvent, session: &mut Session, keys: &Dispatch) -> Option<Outcome> {
    if !session.is_running() {
        return None;
    }

    let outcome = match event {
        CountdownEvent::Tick(elapsed) => {
            session.advance_to(*elapsed);
            session.has_expired().then_some(Outcome::TimerExpired)
        }
        CountdownEvent::Key(key) => keys.outcome_for(*key),
        CountdownEvent::Resize => None,
    };

    if let Some(outcome) = outcome {
        session.terminate(outcome);
    }
    outcome
}

pub struct Countdown {
    session: Session,
    keys: Dispatch,
}

impl Countdown {
    pub fn new(session: Session, keymap: &Keymap) -> Self {
        Self {
            session,
            keys: Dispatch::new(keymap),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drive the session until it terminates. Draws once up front, after
    /// every event while running, and once more on termination.
    pub fn run<S, D>(&mut self, events: &mut S, display: &mut D) -> io::Result<Outcome>
    where
        S: EventStream + ?Sized,
        D: CountdownDisplay + ?Sized,
    {
        display.draw(&self.session)?;

        loop {
            let event = events.next_event();
            tracing::trace!(?event, "dispatching");

            let outcome = dispatch(&event, &mut self.session, &self.keys);
            display.draw(&self.session)?;

            if let Some(outcome) = outcome {
                tracing::info!(
                    %outcome,
                    exit_code = outcome.exit_code(),
                    elapsed_ms = self.session.elapsed().as_millis() as u64,
                    "countdown finished"
                );
                return Ok(outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::resolve;
    use crate::runtime::ScriptedEvents;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingDisplay {
        draws: Vec<(u16, Option<Outcome>)>,
    }

    impl CountdownDisplay for CountingDisplay {
        fn draw(&mut self, session: &Session) -> io::Result<()> {
            self.draws.push((session.progress_percent(), session.outcome()));
            Ok(())
        }
    }

    struct BrokenDisplay;

    impl CountdownDisplay for BrokenDisplay {
        fn draw(&mut self, _session: &Session) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn key(c: char) -> CountdownEvent {
        CountdownEvent::Key(KeyPress::Symbol(KeySymbol::Char(c)))
    }

    fn tick(secs: u64) -> CountdownEvent {
        CountdownEvent::Tick(Duration::from_secs(secs))
    }

    fn countdown(secs: u64, specs: &[&str]) -> Countdown {
        let keymap = resolve(specs).unwrap();
        Countdown::new(Session::new(Duration::from_secs(secs)), &keymap)
    }

    #[test]
    fn test_dispatch_fixed_keys() {
        let keys = Dispatch::new(&Keymap::default());
        let mut session = Session::new(Duration::from_secs(10));
        assert_eq!(dispatch(&key('q'), &mut session, &keys), Some(Outcome::Aborted));

        let mut session = Session::new(Duration::from_secs(10));
        assert_eq!(dispatch(&key('c'), &mut session, &keys), Some(Outcome::Confirmed));
    }

    #[test]
    fn test_dispatch_unmapped_key_is_ignored() {
        let keys = Dispatch::new(&Keymap::default());
        let mut session = Session::new(Duration::from_secs(10));
        assert_eq!(dispatch(&key('z'), &mut session, &keys), None);
        assert!(session.is_running());
    }

    #[test]
    fn test_dispatch_resize_never_terminates() {
        let keys = Dispatch::new(&Keymap::default());
        let mut session = Session::new(Duration::from_secs(1));
        assert_eq!(dispatch(&CountdownEvent::Resize, &mut session, &keys), None);
        assert!(session.is_running());
    }

    #[test]
    fn test_dispatch_interrupt_aborts() {
        let keys = Dispatch::new(&resolve(["70:q:override"]).unwrap());
        let mut session = Session::new(Duration::from_secs(10));
        let event = CountdownEvent::Key(KeyPress::Interrupt);
        assert_eq!(dispatch(&event, &mut session, &keys), Some(Outcome::Aborted));
    }

    #[test]
    fn test_binding_shadows_fixed_key() {
        let keys = Dispatch::new(&resolve(["70:q:override", "71:c:other"]).unwrap());
        assert_eq!(
            keys.outcome_for(KeyPress::Symbol(KeySymbol::Char('q'))),
            Some(Outcome::Binding(70))
        );
        assert_eq!(
            keys.outcome_for(KeyPress::Symbol(KeySymbol::Char('c'))),
            Some(Outcome::Binding(71))
        );
    }

    #[test]
    fn test_last_binding_wins() {
        let keys = Dispatch::new(&resolve(["70:r:first", "80:r:second"]).unwrap());
        assert_eq!(
            keys.outcome_for(KeyPress::Symbol(KeySymbol::Char('r'))),
            Some(Outcome::Binding(80))
        );
    }

    #[test]
    fn test_unreceivable_binding_never_fires() {
        let keys = Dispatch::new(&resolve(["70:ab:two", "71::empty", "72:a:one"]).unwrap());
        for c in ['a', 'b'] {
            let expected = (c == 'a').then_some(Outcome::Binding(72));
            assert_eq!(keys.outcome_for(KeyPress::Symbol(KeySymbol::Char(c))), expected);
        }
        assert_eq!(
            keys.outcome_for(KeyPress::Symbol(KeySymbol::Char('q'))),
            Some(Outcome::Aborted)
        );
    }

    #[test]
    fn test_dispatch_after_termination_is_ignored() {
        let keys = Dispatch::new(&resolve(["70:r:retry"]).unwrap());
        let mut session = Session::new(Duration::from_secs(10));
        dispatch(&tick(3), &mut session, &keys);
        dispatch(&key('c'), &mut session, &keys);

        assert_eq!(dispatch(&key('r'), &mut session, &keys), None);
        assert_eq!(dispatch(&tick(20), &mut session, &keys), None);
        assert_eq!(session.outcome(), Some(Outcome::Confirmed));
        assert_eq!(session.progress_percent(), 30);
    }

    #[test]
    fn test_timer_expires_on_whole_seconds() {
        let keys = Dispatch::new(&Keymap::default());
        let mut session = Session::new(Duration::from_secs(2));
        let almost = CountdownEvent::Tick(Duration::from_millis(1_999));
        assert_eq!(dispatch(&almost, &mut session, &keys), None);
        assert_eq!(dispatch(&tick(2), &mut session, &keys), Some(Outcome::TimerExpired));
    }

    #[test]
    fn test_scenario_timer_expires() {
        let mut countdown = countdown(5, &[]);
        let mut events = ScriptedEvents::new(ScriptedEvents::ticks(5));
        let mut display = CountingDisplay::default();

        let outcome = countdown.run(&mut events, &mut display).unwrap();

        assert_eq!(outcome, Outcome::TimerExpired);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(countdown.session().progress_percent(), 100);
        assert_eq!(events.pulled(), 5);
        let progress: Vec<u16> = display.draws.iter().map(|(p, _)| *p).collect();
        assert_eq!(progress, vec![0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn test_scenario_abort_stops_ticks() {
        let mut countdown = countdown(30, &[]);
        let mut events = ScriptedEvents::new([tick(1), key('q'), tick(2), tick(3)]);
        let mut display = CountingDisplay::default();

        let outcome = countdown.run(&mut events, &mut display).unwrap();

        assert_eq!(outcome, Outcome::Aborted);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(events.remaining(), 2);
        assert_eq!(countdown.session().elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_scenario_confirm_early() {
        let mut countdown = countdown(30, &[]);
        let mut events = ScriptedEvents::new([tick(1), tick(2), key('c')]);
        let mut display = CountingDisplay::default();

        let outcome = countdown.run(&mut events, &mut display).unwrap();

        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(countdown.session().progress_percent(), 6);
    }

    #[test]
    fn test_scenario_mapped_key() {
        let mut countdown = countdown(30, &["70:r:retry"]);
        let mut events = ScriptedEvents::new([key('r')]);
        let mut display = CountingDisplay::default();

        let outcome = countdown.run(&mut events, &mut display).unwrap();

        assert_eq!(outcome, Outcome::Binding(70));
        assert_eq!(outcome.exit_code(), 70);
    }

    #[test]
    fn test_key_before_expiring_tick_wins() {
        let mut countdown = countdown(2, &["70:r:retry"]);
        let mut events = ScriptedEvents::new([tick(1), key('r'), tick(2)]);
        let outcome = countdown
            .run(&mut events, &mut CountingDisplay::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Binding(70));
    }

    #[test]
    fn test_expiring_tick_before_key_wins() {
        let mut countdown = countdown(2, &["70:r:retry"]);
        let mut events = ScriptedEvents::new([tick(1), tick(2), key('r')]);
        let outcome = countdown
            .run(&mut events, &mut CountingDisplay::default())
            .unwrap();
        assert_eq!(outcome, Outcome::TimerExpired);
        assert_eq!(events.remaining(), 1);
    }

    #[test]
    fn test_final_draw_shows_outcome() {
        let mut countdown = countdown(30, &[]);
        let mut events = ScriptedEvents::new([CountdownEvent::Resize, key('q')]);
        let mut display = CountingDisplay::default();

        countdown.run(&mut events, &mut display).unwrap();

        assert_eq!(display.draws.len(), 3);
        assert_eq!(display.draws.last(), Some(&(0, Some(Outcome::Aborted))));
    }

    #[test]
    fn test_draw_failure_propagates() {
        let mut countdown = countdown(30, &[]);
        let mut events = ScriptedEvents::new([key('q')]);
        let err = countdown.run(&mut events, &mut BrokenDisplay).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(events.pulled(), 0);
    }
}
