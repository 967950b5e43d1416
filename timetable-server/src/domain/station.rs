//! Location code types.
//!
//! Physical timing points are identified by TIPLOC codes. Passenger-facing
//! stations are identified by CRS codes, and one station may group several
//! TIPLOCs (e.g. separate codes for different platform groups).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing an invalid CRS code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CRS code: {reason}")]
pub struct InvalidCrs {
    reason: &'static str,
}

/// A valid 3-letter CRS (Computer Reservation System) station code.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::Crs;
///
/// let sur = Crs::parse("SUR").unwrap();
/// assert_eq!(sur.as_str(), "SUR");
///
/// assert!(Crs::parse("sur").is_err());
/// assert!(Crs::parse("SU").is_err());
/// assert_eq!(Crs::parse_normalized(" sur ").unwrap(), sur);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs([u8; 3]);

impl Crs {
    /// Parse a CRS code. The input must be exactly 3 uppercase ASCII letters.
    pub fn parse(s: &str) -> Result<Self, InvalidCrs> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidCrs {
                reason: "must be exactly 3 characters",
            });
        }

        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidCrs {
                reason: "must be uppercase ASCII letters A-Z",
            });
        }

        Ok(Crs([bytes[0], bytes[1], bytes[2]]))
    }

    /// Parse user input, trimming whitespace and uppercasing first.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidCrs> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl TryFrom<String> for Crs {
    type Error = InvalidCrs;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crs({})", self.as_str())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an invalid TIPLOC.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid TIPLOC: {reason}")]
pub struct InvalidTiploc {
    reason: &'static str,
}

const TIPLOC_MAX_LEN: usize = 7;

/// A timing point location code (TIPLOC), 1 to 7 uppercase alphanumerics.
///
/// ```
/// use timetable_server::domain::Tiploc;
///
/// let clj = Tiploc::parse("CLPHMJN").unwrap();
/// assert_eq!(clj.as_str(), "CLPHMJN");
///
/// assert!(Tiploc::parse("").is_err());
/// assert!(Tiploc::parse("CLAPHAMJ").is_err());
/// assert!(Tiploc::parse("clj").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tiploc {
    bytes: [u8; TIPLOC_MAX_LEN],
    len: u8,
}

impl Tiploc {
    pub fn parse(s: &str) -> Result<Self, InvalidTiploc> {
        let raw = s.as_bytes();

        if raw.is_empty() || raw.len() > TIPLOC_MAX_LEN {
            return Err(InvalidTiploc {
                reason: "must be 1 to 7 characters",
            });
        }

        if !raw
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidTiploc {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        let mut bytes = [0u8; TIPLOC_MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Tiploc {
            bytes,
            // length checked above
            len: raw.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }
}

impl TryFrom<String> for Tiploc {
    type Error = InvalidTiploc;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tiploc> for String {
    fn from(value: Tiploc) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for Tiploc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tiploc({})", self.as_str())
    }
}

impl fmt::Display for Tiploc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
