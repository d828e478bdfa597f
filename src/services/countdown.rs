// timegate-service/src/services/countdown.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_SECOND: i64 = 1000;

// Whole-second time left before a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

impl Countdown {
    pub fn between(end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let delta = (end - now).num_milliseconds();
        if delta <= 0 {
            return Self {
                hours: 0,
                minutes: 0,
                seconds: 0,
                expired: true,
            };
        }

        Self {
            hours: delta / MILLIS_PER_HOUR,
            minutes: (delta % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            seconds: (delta % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            expired: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running(Countdown),
    // Emitted once, the first time the deadline is reached
    Expired,
    Finished,
}

/// Drives a ticking view from a fixed canonical deadline.
pub struct CountdownTicker {
    end: DateTime<Utc>,
    expired_signalled: bool,
}

impl CountdownTicker {
    pub fn new(end: DateTime<Utc>) -> Self {
        Self {
            end,
            expired_signalled: false,
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        if self.expired_signalled {
            return Tick::Finished;
        }

        let countdown = Countdown::between(self.end, now);
        if countdown.expired {
            self.expired_signalled = true;
            Tick::Expired
        } else {
            Tick::Running(countdown)
        }
    }
}
