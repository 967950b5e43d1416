//! Schedule time handling.
//!
//! Timetables publish times of day only. A train that leaves at 23:40 and
//! arrives at 00:20 needs the second time to land on the following day, so
//! every `ScheduleTime` carries an explicit day offset counted from the day
//! the train starts. A missing ("not valid") time is `None` wherever an
//! `Option<ScheduleTime>` appears.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A time of day relative to the start day of a schedule.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::ScheduleTime;
/// use chrono::NaiveDate;
///
/// let t = ScheduleTime::parse("00:20").unwrap().with_day_offset(1);
/// let start = NaiveDate::from_ymd_opt(2019, 8, 12).unwrap();
///
/// let at = t.on(start).unwrap();
/// assert_eq!(at.date(), NaiveDate::from_ymd_opt(2019, 8, 13).unwrap());
/// assert_eq!(t.to_string(), "00:20");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ScheduleTime {
    day_offset: u8,
    time: NaiveTime,
}

impl ScheduleTime {
    /// Create a time from its parts.
    pub fn new(day_offset: u8, time: NaiveTime) -> Self {
        Self { day_offset, time }
    }

    /// Parse `HH:MM` or `HH:MM:SS` into a time on the start day.
    ///
    /// ```
    /// use timetable_server::domain::ScheduleTime;
    ///
    /// assert!(ScheduleTime::parse("00:00").is_ok());
    /// assert!(ScheduleTime::parse("23:59:30").is_ok());
    ///
    /// assert!(ScheduleTime::parse("2359").is_err());
    /// assert!(ScheduleTime::parse("24:00").is_err());
    /// assert!(ScheduleTime::parse("12:00:75").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        let time = NaiveTime::from_hms_opt(hour, minute, second)
            .ok_or_else(|| TimeError::new("invalid time"))?;

        Ok(Self { day_offset: 0, time })
    }

    /// The same time of day, moved to another day offset.
    pub fn with_day_offset(self, day_offset: u8) -> Self {
        Self {
            day_offset,
            time: self.time,
        }
    }

    /// Days after the schedule's start day.
    pub fn day_offset(&self) -> u8 {
        self.day_offset
    }

    /// Time of day.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    /// Elapsed time since midnight of the start day.
    pub fn since_origin(&self) -> Duration {
        Duration::seconds(
            i64::from(self.day_offset) * SECONDS_PER_DAY
                + i64::from(self.time.num_seconds_from_midnight()),
        )
    }

    /// The concrete timestamp of this time for a schedule starting on `start`.
    pub fn on(&self, start: NaiveDate) -> Option<NaiveDateTime> {
        start
            .and_time(NaiveTime::MIN)
            .checked_add_signed(self.since_origin())
    }
}

impl TryFrom<String> for ScheduleTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Ord for ScheduleTime {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.day_offset, self.time).cmp(&(other.day_offset, other.time))
    }
}

impl PartialOrd for ScheduleTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduleTime(+{} {})", self.day_offset, self.time)
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.time.second() == 0 {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        } else {
            write!(
                f,
                "{:02}:{:02}:{:02}",
                self.hour(),
                self.minute(),
                self.time.second()
            )
        }
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Threshold for detecting midnight rollover in a stop sequence.
///
/// Public times are rounded from working times, so a public time can sit a
/// few seconds before the working time listed ahead of it. Only a backwards
/// step of more than six hours counts as crossing midnight.
const ROLLOVER_THRESHOLD_HOURS: i64 = 6;

/// Assign day offsets to a chronologically ordered sequence of times.
///
/// Times arrive as bare times of day. Walking the sequence, whenever a time
/// is more than six hours earlier than the previous one the day offset is
/// advanced. `None` entries are skipped and left untouched.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::{ScheduleTime, assign_day_offsets};
///
/// let mut times = vec![
///     Some(ScheduleTime::parse("23:30").unwrap()),
///     None,
///     Some(ScheduleTime::parse("00:15").unwrap()),
///     Some(ScheduleTime::parse("01:00").unwrap()),
/// ];
/// assign_day_offsets(times.iter_mut());
///
/// assert_eq!(times[0].unwrap().day_offset(), 0);
/// assert_eq!(times[2].unwrap().day_offset(), 1);
/// assert_eq!(times[3].unwrap().day_offset(), 1);
/// ```
pub fn assign_day_offsets<'a>(times: impl IntoIterator<Item = &'a mut Option<ScheduleTime>>) {
    let mut day_offset: u8 = 0;
    let mut prev_time: Option<NaiveTime> = None;

    for slot in times {
        let Some(current) = slot.as_mut() else {
            continue;
        };

        if let Some(prev) = prev_time {
            let diff = current.time.signed_duration_since(prev);
            if diff < -Duration::hours(ROLLOVER_THRESHOLD_HOURS) {
                day_offset = day_offset.saturating_add(1);
            }
        }

        prev_time = Some(current.time);
        current.day_offset = day_offset;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any valid HH:MM string parses and displays back unchanged
        #[test]
        fn parse_display_roundtrip(h in 0u32..24, m in 0u32..60) {
            let s = format!("{h:02}:{m:02}");
            let time = ScheduleTime::parse(&s).unwrap();
            prop_assert_eq!(time.to_string(), s);
        }

        /// Ordering agrees with elapsed time since origin
        #[test]
        fn ordering_matches_since_origin(
            d1 in 0u8..3, s1 in 0u32..86_400,
            d2 in 0u8..3, s2 in 0u32..86_400,
        ) {
            let a = ScheduleTime::new(d1, NaiveTime::from_num_seconds_from_midnight_opt(s1, 0).unwrap());
            let b = ScheduleTime::new(d2, NaiveTime::from_num_seconds_from_midnight_opt(s2, 0).unwrap());
            prop_assert_eq!(a.cmp(&b), a.since_origin().cmp(&b.since_origin()));
        }

        /// Offsets never decrease along a sequence
        #[test]
        fn day_offsets_monotonic(secs in proptest::collection::vec(0u32..86_400, 0..30)) {
            let mut times: Vec<Option<ScheduleTime>> = secs
                .iter()
                .map(|s| Some(ScheduleTime::new(0, NaiveTime::from_num_seconds_from_midnight_opt(*s, 0).unwrap())))
                .collect();
            assign_day_offsets(times.iter_mut());
            for pair in times.windows(2) {
                prop_assert!(pair[0].unwrap().day_offset() <= pair[1].unwrap().day_offset());
            }
        }
    }
}
