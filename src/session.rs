use std::time::Duration;

/// How a countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    TimerExpired,
    Aborted,
    Confirmed,
    Binding(i32),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::TimerExpired | Outcome::Confirmed => 0,
            Outcome::Aborted => 1,
            Outcome::Binding(code) => *code,
        }
    }
}

/// Live countdown state. Once `outcome` is set nothing changes anymore.
#[derive(Debug, Clone)]
pub struct Session {
    elapsed: Duration,
    total: Duration,
    progress_percent: u16,
    outcome: Option<Outcome>,
}

impl Session {
    /// `total` is expected to be positive; a zero total reads as already full.
    pub fn new(total: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            total,
            progress_percent: 0,
            outcome: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn progress_percent(&self) -> u16 {
        self.progress_percent
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.outcome.is_none()
    }

    /// Move the clock forward. Ignored after termination or if `elapsed`
    /// would go backwards.
    pub fn advance_to(&mut self, elapsed: Duration) {
        if !self.is_running() || elapsed < self.elapsed {
            return;
        }
        self.elapsed = elapsed;
        self.progress_percent = progress_percent(elapsed, self.total);
    }

    /// First writer wins.
    pub fn terminate(&mut self, outcome: Outcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }

    pub fn has_expired(&self) -> bool {
        self.elapsed.as_secs() >= self.total.as_secs()
    }
}

fn progress_percent(elapsed: Duration, total: Duration) -> u16 {
    let total_ms = total.as_millis();
    if total_ms == 0 {
        return 100;
    }
    (elapsed.as_millis() * 100 / total_ms).min(100) as u16
}
