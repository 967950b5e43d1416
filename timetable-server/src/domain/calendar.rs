//! Operating calendars.
//!
//! A calendar is a date range, a set of weekdays and a bank holiday rule.
//! Many schedules share an identical pattern, so calendars compare and hash
//! by value and are interned during load.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Errors building a calendar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("calendar runs from {from} which is after its end {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("invalid day mask {0:?}: expected seven 0/1 characters, Monday first")]
    InvalidDayMask(String),

    #[error("invalid bank holiday policy {0:?}")]
    InvalidBankHolidayPolicy(String),
}

/// Set of weekdays a pattern applies to. Bit 0 is Monday.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayMask(u8);

impl DayMask {
    pub const WEEKDAYS: DayMask = DayMask(0b001_1111);
    pub const EVERY_DAY: DayMask = DayMask(0b111_1111);

    /// Parse the seven character `"1111100"` form, Monday first.
    ///
    /// ```
    /// use timetable_server::domain::DayMask;
    /// use chrono::Weekday;
    ///
    /// let mask = DayMask::parse("1111100").unwrap();
    /// assert!(mask.contains(Weekday::Mon));
    /// assert!(!mask.contains(Weekday::Sun));
    /// assert_eq!(mask, DayMask::WEEKDAYS);
    /// ```
    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        if s.len() != 7 {
            return Err(CalendarError::InvalidDayMask(s.to_string()));
        }

        let mut bits = 0u8;
        for (i, b) in s.bytes().enumerate() {
            match b {
                b'1' => bits |= 1 << i,
                b'0' => {}
                _ => return Err(CalendarError::InvalidDayMask(s.to_string())),
            }
        }
        Ok(DayMask(bits))
    }

    /// A mask containing only the given day.
    pub fn only(day: Weekday) -> Self {
        DayMask(1 << day.num_days_from_monday())
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayMask({self})")
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..7 {
            f.write_str(if self.0 & (1 << i) != 0 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Whether a pattern runs on bank holidays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BankHolidayPolicy {
    #[default]
    RunsOnBankHoliday,
    /// Does not run on English and Welsh bank holidays.
    ExcludesEnglish,
    /// Does not run on Scottish bank holidays.
    ExcludesScottish,
}

impl BankHolidayPolicy {
    /// Parse the timetable feed code: blank, `X` (English) or `G` (Scottish).
    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        match s.trim() {
            "" => Ok(Self::RunsOnBankHoliday),
            "X" => Ok(Self::ExcludesEnglish),
            "G" => Ok(Self::ExcludesScottish),
            other => Err(CalendarError::InvalidBankHolidayPolicy(other.to_string())),
        }
    }
}

/// Bank holiday dates, supplied from outside the timetable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankHolidays {
    #[serde(default)]
    english: HashSet<NaiveDate>,
    #[serde(default)]
    scottish: HashSet<NaiveDate>,
}

impl BankHolidays {
    pub fn new(
        english: impl IntoIterator<Item = NaiveDate>,
        scottish: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            english: english.into_iter().collect(),
            scottish: scottish.into_iter().collect(),
        }
    }

    /// Whether `policy` excludes `date`.
    pub fn excludes(&self, policy: BankHolidayPolicy, date: NaiveDate) -> bool {
        match policy {
            BankHolidayPolicy::RunsOnBankHoliday => false,
            BankHolidayPolicy::ExcludesEnglish => self.english.contains(&date),
            BankHolidayPolicy::ExcludesScottish => self.scottish.contains(&date),
        }
    }

    pub fn len(&self) -> usize {
        self.english.len() + self.scottish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.english.is_empty() && self.scottish.is_empty()
    }
}

/// Longest span, in days, held in a calendar's per-date lookup.
pub const LOOKUP_DAYS: i64 = 3 * 366;

/// An operating pattern: date range, weekdays and bank holiday rule.
///
/// Equality, ordering and hashing cover the four pattern fields only; the
/// per-date lookup built by [`Calendar::generate`] is derived state.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::{BankHolidayPolicy, BankHolidays, Calendar, DayMask};
/// use chrono::NaiveDate;
///
/// let calendar = Calendar::new(
///     NaiveDate::from_ymd_opt(2019, 8, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2019, 8, 31).unwrap(),
///     DayMask::WEEKDAYS,
///     BankHolidayPolicy::RunsOnBankHoliday,
/// )
/// .unwrap();
///
/// let holidays = BankHolidays::default();
/// assert!(calendar.runs_on(NaiveDate::from_ymd_opt(2019, 8, 12).unwrap(), &holidays)); // Monday
/// assert!(!calendar.runs_on(NaiveDate::from_ymd_opt(2019, 8, 11).unwrap(), &holidays)); // Sunday
/// assert!(!calendar.runs_on(NaiveDate::from_ymd_opt(2019, 9, 2).unwrap(), &holidays)); // out of range
/// ```
#[derive(Clone)]
pub struct Calendar {
    runs_from: NaiveDate,
    runs_to: NaiveDate,
    days: DayMask,
    bank_holidays: BankHolidayPolicy,
    lookup: OnceLock<Vec<bool>>,
}

impl Calendar {
    /// Create a calendar. Fails if `runs_from` is after `runs_to`.
    pub fn new(
        runs_from: NaiveDate,
        runs_to: NaiveDate,
        days: DayMask,
        bank_holidays: BankHolidayPolicy,
    ) -> Result<Self, CalendarError> {
        if runs_from > runs_to {
            return Err(CalendarError::InvalidRange {
                from: runs_from,
                to: runs_to,
            });
        }

        Ok(Self {
            runs_from,
            runs_to,
            days,
            bank_holidays,
            lookup: OnceLock::new(),
        })
    }

    /// A calendar covering exactly one date.
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            runs_from: date,
            runs_to: date,
            days: DayMask::only(date.weekday()),
            bank_holidays: BankHolidayPolicy::RunsOnBankHoliday,
            lookup: OnceLock::new(),
        }
    }

    pub fn runs_from(&self) -> NaiveDate {
        self.runs_from
    }

    pub fn runs_to(&self) -> NaiveDate {
        self.runs_to
    }

    pub fn days(&self) -> DayMask {
        self.days
    }

    pub fn bank_holiday_policy(&self) -> BankHolidayPolicy {
        self.bank_holidays
    }

    /// Build the per-date lookup. Safe to call any number of times.
    ///
    /// Covers at most [`LOOKUP_DAYS`] days from `runs_from`; later dates in
    /// the range are answered from the weekday mask directly.
    pub fn generate(&self) -> &[bool] {
        self.lookup.get_or_init(|| {
            let span = (self.runs_to - self.runs_from).num_days().min(LOOKUP_DAYS - 1);
            let mut weekday = self.runs_from.weekday();
            (0..=span)
                .map(|_| {
                    let runs = self.days.contains(weekday);
                    weekday = weekday.succ();
                    runs
                })
                .collect()
        })
    }

    /// Whether the pattern includes `date`, honouring the bank holiday rule.
    pub fn runs_on(&self, date: NaiveDate, holidays: &BankHolidays) -> bool {
        if date < self.runs_from || date > self.runs_to {
            return false;
        }

        let Ok(idx) = usize::try_from((date - self.runs_from).num_days()) else {
            return false;
        };

        let in_pattern = match self.generate().get(idx) {
            Some(runs) => *runs,
            None => self.days.contains(date.weekday()),
        };
        in_pattern && !holidays.excludes(self.bank_holidays, date)
    }

    fn key(&self) -> (NaiveDate, NaiveDate, DayMask, BankHolidayPolicy) {
        (self.runs_from, self.runs_to, self.days, self.bank_holidays)
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Calendar {}

impl Hash for Calendar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for Calendar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Calendar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calendar({}..={} {} {:?})",
            self.runs_from, self.runs_to, self.days, self.bank_holidays
        )
    }
}

/// Load-time map from calendar value to one shared instance.
#[derive(Debug, Default)]
pub struct CalendarInterner {
    seen: HashMap<Calendar, Arc<Calendar>>,
}

impl CalendarInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance equal to `calendar`, generating its lookup
    /// the first time the pattern is seen.
    pub fn intern(&mut self, calendar: Calendar) -> Arc<Calendar> {
        self.seen
            .entry(calendar)
            .or_insert_with_key(|calendar| {
                let shared = Arc::new(calendar.clone());
                shared.generate();
                shared
            })
            .clone()
    }

    /// Number of distinct patterns seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
