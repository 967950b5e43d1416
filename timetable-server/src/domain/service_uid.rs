//! Service identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing an invalid timetable UID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timetable UID: {reason}")]
pub struct InvalidTimetableUid {
    reason: &'static str,
}

/// Stable identifier for one planned train across all its STP versions.
///
/// A UID is one uppercase letter followed by five digits (e.g. "X12345").
///
/// # Examples
///
/// ```
/// use timetable_server::domain::TimetableUid;
///
/// let uid = TimetableUid::parse("X12345").unwrap();
/// assert_eq!(uid.as_str(), "X12345");
///
/// assert!(TimetableUid::parse("12345X").is_err());
/// assert!(TimetableUid::parse("").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimetableUid([u8; 6]);

impl TimetableUid {
    pub fn parse(s: &str) -> Result<Self, InvalidTimetableUid> {
        let bytes = s.as_bytes();

        if bytes.len() != 6 {
            return Err(InvalidTimetableUid {
                reason: "must be exactly 6 characters",
            });
        }

        if !bytes[0].is_ascii_uppercase() {
            return Err(InvalidTimetableUid {
                reason: "must start with an uppercase letter",
            });
        }

        if !bytes[1..].iter().all(u8::is_ascii_digit) {
            return Err(InvalidTimetableUid {
                reason: "must end with five digits",
            });
        }

        let mut uid = [0u8; 6];
        uid.copy_from_slice(bytes);
        Ok(TimetableUid(uid))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl TryFrom<String> for TimetableUid {
    type Error = InvalidTimetableUid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimetableUid> for String {
    fn from(value: TimetableUid) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for TimetableUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimetableUid({})", self.as_str())
    }
}

impl fmt::Display for TimetableUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an invalid retail service ID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid retail service ID: {reason}")]
pub struct InvalidRetailServiceId {
    reason: &'static str,
}

/// Length of the retail service group prefix shared by all portions.
const RETAIL_GROUP_LEN: usize = 6;

/// Commercial (ticketing) service identifier, e.g. "SW123400".
///
/// The first six characters name the retail service; the last two select
/// a portion. Several timetable UIDs may share one retail service, so the
/// timetable indexes by [`RetailServiceId::service_group`].
///
/// ```
/// use timetable_server::domain::RetailServiceId;
///
/// let id = RetailServiceId::parse("SW123401").unwrap();
/// assert_eq!(id.service_group(), "SW1234");
///
/// // The bare six character group is accepted as well
/// let group = RetailServiceId::parse("SW1234").unwrap();
/// assert_eq!(group.service_group(), id.service_group());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetailServiceId(String);

impl RetailServiceId {
    pub fn parse(s: &str) -> Result<Self, InvalidRetailServiceId> {
        if s.len() != RETAIL_GROUP_LEN && s.len() != RETAIL_GROUP_LEN + 2 {
            return Err(InvalidRetailServiceId {
                reason: "must be 6 or 8 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidRetailServiceId {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        Ok(RetailServiceId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The six character retail service shared by every portion.
    pub fn service_group(&self) -> &str {
        &self.0[..RETAIL_GROUP_LEN]
    }
}

impl TryFrom<String> for RetailServiceId {
    type Error = InvalidRetailServiceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RetailServiceId> for String {
    fn from(value: RetailServiceId) -> Self {
        value.0
    }
}

impl fmt::Debug for RetailServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetailServiceId({})", self.0)
    }
}

impl fmt::Display for RetailServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
