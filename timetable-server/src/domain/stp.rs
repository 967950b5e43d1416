//! Short term planning (STP) indicator.

use serde::Deserialize;
use std::fmt;

/// Error returned when parsing an unknown STP code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid STP indicator: {0:?}")]
pub struct InvalidStpIndicator(String);

/// Which kind of version a schedule or association is.
///
/// Variants are declared in ascending priority, so the derived ordering is
/// the override order: `Cancelled > Overlay > New > Permanent`.
///
/// ```
/// use timetable_server::domain::StpIndicator;
///
/// assert!(StpIndicator::Cancelled > StpIndicator::Overlay);
/// assert!(StpIndicator::Overlay > StpIndicator::New);
/// assert!(StpIndicator::New > StpIndicator::Permanent);
/// assert_eq!(StpIndicator::parse("O").unwrap(), StpIndicator::Overlay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum StpIndicator {
    /// The standing plan.
    Permanent,
    /// A one-off schedule with no permanent counterpart.
    New,
    /// A time-boxed variation of the permanent plan.
    Overlay,
    /// Cancels whatever else would run on the dates it covers.
    Cancelled,
}

impl StpIndicator {
    /// Parse the single letter feed code (`P`, `N`, `O`, `C`).
    pub fn parse(s: &str) -> Result<Self, InvalidStpIndicator> {
        match s {
            "P" => Ok(Self::Permanent),
            "N" => Ok(Self::New),
            "O" => Ok(Self::Overlay),
            "C" => Ok(Self::Cancelled),
            other => Err(InvalidStpIndicator(other.to_string())),
        }
    }

    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Permanent => "P",
            Self::New => "N",
            Self::Overlay => "O",
            Self::Cancelled => "C",
        }
    }
}

impl TryFrom<String> for StpIndicator {
    type Error = InvalidStpIndicator;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for StpIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
