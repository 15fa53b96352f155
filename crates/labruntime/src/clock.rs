use chrono::{DateTime, Duration, TimeZone, Utc};
use std::time::Instant;

/// How execution timestamps advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Elapsed real time since the run began, added to the configured start
    /// time. Replays with a non-"now" start time stay internally consistent.
    #[default]
    WallClock,
    /// Synthetic counter seeded at a fixed epoch, advancing one second per
    /// reading regardless of real elapsed time. Deterministic, for
    /// golden-output tests.
    Ordinal,
}

/// Source of monotonically advancing execution timestamps.
///
/// `now()` never returns a value earlier than the previous call within a run.
#[derive(Debug)]
pub struct ExecutionClock {
    mode: ClockMode,
    start_time: DateTime<Utc>,
    wall_clock_start: Instant,
    ordinal: DateTime<Utc>,
    last: Option<DateTime<Utc>>,
}

impl ExecutionClock {
    /// Fix the reference instant for a run
    pub fn start(mode: ClockMode, start_time: Option<DateTime<Utc>>) -> Self {
        let start_time = match mode {
            ClockMode::Ordinal => ordinal_epoch(),
            ClockMode::WallClock => start_time.unwrap_or_else(Utc::now),
        };
        Self {
            mode,
            start_time,
            wall_clock_start: Instant::now(),
            ordinal: ordinal_epoch(),
            last: None,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        let candidate = match self.mode {
            ClockMode::Ordinal => {
                let now = self.ordinal;
                self.ordinal += Duration::seconds(1);
                now
            }
            ClockMode::WallClock => {
                let elapsed = Duration::from_std(self.wall_clock_start.elapsed())
                    .unwrap_or_else(|_| Duration::zero());
                self.start_time + elapsed
            }
        };
        // never go backward within a run
        let stamped = match self.last {
            Some(last) if candidate < last => last,
            _ => candidate,
        };
        self.last = Some(stamped);
        stamped
    }
}

/// Epoch used by ordinal clocks: 2000-01-01T00:00:00Z
pub fn ordinal_epoch() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0) {
        chrono::LocalResult::Single(t) => t,
        _ => Utc::now(),
    }
}
