//! Time keys and minute boundaries
//!
//! A time key is the zero-padded `HH:MM` of a timestamp in the viewer's zone.
//! Ticks are aligned to wall-clock minutes by sleeping exactly until the next
//! boundary instead of running on a fixed interval.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::config::ConfigError;
use crate::interface::{Clock, ClockError};

const MINUTE: Duration = Duration::from_secs(60);

// ─────────────────────────────────────────────────────────────────────────────
// TIME KEY
// ─────────────────────────────────────────────────────────────────────────────

/// Canonical `HH:MM` minute-of-day key. Always 5 characters, hour 00-23, minute 00-59.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeKey {
    hour: u8,
    minute: u8,
    text: String,
}

impl TimeKey {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self::from_parts(hour as u8, minute as u8))
    }

    fn from_parts(hour: u8, minute: u8) -> Self {
        Self {
            hour,
            minute,
            text: format!("{:02}:{:02}", hour, minute),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for TimeKey {
    type Err = ClockError;

    /// Accepts only the canonical form: `"9:05"` or `"09:5"` are rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockError::InvalidTimeKey(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = u32::from((digits[0] - b'0') * 10 + (digits[1] - b'0'));
        let minute = u32::from((digits[2] - b'0') * 10 + (digits[3] - b'0'));
        TimeKey::new(hour, minute).ok_or_else(invalid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ZONES
// ─────────────────────────────────────────────────────────────────────────────

/// The zone a viewer reads the clock in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockZone {
    /// The host's system zone
    Local,
    /// Interim default while no zone is configured
    #[default]
    Utc,
    Named(Tz),
}

impl FromStr for ClockZone {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(ClockZone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") {
            return Ok(ClockZone::Utc);
        }
        trimmed
            .parse::<Tz>()
            .map(ClockZone::Named)
            .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
    }
}

impl fmt::Display for ClockZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockZone::Local => f.write_str("local"),
            ClockZone::Utc => f.write_str("UTC"),
            ClockZone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// KEY DERIVATION
// ─────────────────────────────────────────────────────────────────────────────

/// The time key for `timestamp` as read in `zone`
pub fn key_for(timestamp: DateTime<Utc>, zone: &ClockZone) -> TimeKey {
    let (hour, minute) = match zone {
        ClockZone::Local => {
            let local = timestamp.with_timezone(&Local);
            (local.hour(), local.minute())
        }
        ClockZone::Utc => (timestamp.hour(), timestamp.minute()),
        ClockZone::Named(tz) => {
            let zoned = timestamp.with_timezone(tz);
            (zoned.hour(), zoned.minute())
        }
    };
    TimeKey::from_parts(hour as u8, minute as u8)
}

/// Time left until the next wall-clock minute starts: `60s - seconds - subsecond`.
///
/// Boundary-exclusive: exactly on a boundary the full minute is returned, so the
/// result is never zero. Leap-second nanoseconds are clamped to the last instant
/// of the second.
pub fn delay_until_next_boundary(timestamp: DateTime<Utc>) -> Duration {
    let nanos = timestamp.nanosecond().min(999_999_999);
    let elapsed = Duration::from_secs(u64::from(timestamp.second())) + Duration::from_nanos(u64::from(nanos));
    MINUTE.saturating_sub(elapsed)
}

// ─────────────────────────────────────────────────────────────────────────────
// CLOCKS
// ─────────────────────────────────────────────────────────────────────────────

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used to drive sessions deterministically.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
