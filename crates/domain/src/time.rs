//! Time and time-of-day helpers.
//!
//! Schedules are expressed in local wall-clock time. [`TimeOfDay`] is the
//! minute-resolution value every schedule, oracle answer and clamp bound is
//! normalised to. Arithmetic on it saturates inside a single day: nothing
//! here ever wraps past midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used for audit fields (last rebuild, …).
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time with minute resolution, `00:00..=23:59`.
///
/// Defaults to midnight.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time of day, validating both components.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::HourOutOfRange`] or
    /// [`ValidationError::MinuteOutOfRange`] when a component is out of range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(ValidationError::MinuteOutOfRange(minute));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        u32::from(self.hour)
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        u32::from(self.minute)
    }

    /// Minutes elapsed since midnight.
    #[must_use]
    pub fn minutes_of_day(self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_minutes_saturating(minutes: i64) -> Self {
        let clamped = minutes.clamp(0, i64::from(MINUTES_PER_DAY - 1)) as u32;
        Self {
            hour: (clamped / 60) as u8,
            minute: (clamped % 60) as u8,
        }
    }

    /// Move earlier by `minutes`, stopping at `00:00`.
    #[must_use]
    pub fn saturating_sub_minutes(self, minutes: u32) -> Self {
        Self::from_minutes_saturating(i64::from(self.minutes_of_day()) - i64::from(minutes))
    }

    /// Move later by `minutes`, stopping at `23:59`.
    #[must_use]
    pub fn saturating_add_minutes(self, minutes: u32) -> Self {
        Self::from_minutes_saturating(i64::from(self.minutes_of_day()) + i64::from(minutes))
    }

    fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// The next local date-time at which this time of day occurs, strictly
    /// after `now`. A time that has already passed today resolves to
    /// tomorrow.
    #[must_use]
    pub fn next_occurrence(self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.as_naive_time());
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    /// Parse `HH:MM` or `HH:MM:SS`; seconds are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedTime(s.to_string());
        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(malformed)?;
        let minute = parts.next().ok_or_else(malformed)?;
        if let Some(seconds) = parts.next() {
            seconds.parse::<u32>().map_err(|_| malformed())?;
        }
        if parts.next().is_some() {
            return Err(malformed());
        }
        let hour: u32 = hour.parse().map_err(|_| malformed())?;
        let minute: u32 = minute.parse().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// An inclusive `[floor, ceiling]` window an adjusted time is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClampWindow {
    floor: TimeOfDay,
    ceiling: TimeOfDay,
}

impl ClampWindow {
    /// `17:00..=20:00`, the usual window for evening lights.
    pub const EVENING: Self = Self {
        floor: TimeOfDay { hour: 17, minute: 0 },
        ceiling: TimeOfDay { hour: 20, minute: 0 },
    };

    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedWindow`] when `floor > ceiling`.
    pub fn new(floor: TimeOfDay, ceiling: TimeOfDay) -> Result<Self, ValidationError> {
        if floor > ceiling {
            return Err(ValidationError::InvertedWindow {
                floor: floor.to_string(),
                ceiling: ceiling.to_string(),
            });
        }
        Ok(Self { floor, ceiling })
    }

    #[must_use]
    pub fn floor(&self) -> TimeOfDay {
        self.floor
    }

    #[must_use]
    pub fn ceiling(&self) -> TimeOfDay {
        self.ceiling
    }

    /// Pull `time` into the window: below the floor gives the floor, above
    /// the ceiling gives the ceiling.
    #[must_use]
    pub fn clamp(&self, time: TimeOfDay) -> TimeOfDay {
        time.clamp(self.floor, self.ceiling)
    }
}
