//! Train operating company (TOC) code type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing an invalid TOC code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid TOC code: {reason}")]
pub struct InvalidToc {
    reason: &'static str,
}

/// A 2-character train operating company code (e.g. "SW", "GW").
///
/// Timetable feeds use letters almost everywhere, but a handful of
/// non-passenger operators carry digits, so both are accepted.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::Toc;
///
/// let sw = Toc::parse("SW").unwrap();
/// assert_eq!(sw.as_str(), "SW");
///
/// assert!(Toc::parse("sw").is_err());
/// assert!(Toc::parse("SWR").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Toc([u8; 2]);

impl Toc {
    /// Parse a TOC code: exactly 2 uppercase ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidToc> {
        let bytes = s.as_bytes();

        if bytes.len() != 2 {
            return Err(InvalidToc {
                reason: "must be exactly 2 characters",
            });
        }

        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidToc {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        Ok(Toc([bytes[0], bytes[1]]))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl TryFrom<String> for Toc {
    type Error = InvalidToc;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Toc> for String {
    fn from(value: Toc) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for Toc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Toc({})", self.as_str())
    }
}

impl fmt::Display for Toc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
