//! Stop activity codes.

use serde::Deserialize;
use std::fmt;

/// What a train does at a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Activity {
    /// `TB`: train begins.
    TrainBegins,
    /// `TF`: train finishes.
    TrainFinishes,
    /// `T`: stops to take up and set down passengers.
    StopsToTakeUpAndSetDown,
    /// `D`: stops to set down only.
    SetDownOnly,
    /// `U`: stops to take up only.
    TakeUpOnly,
    /// `R`: request stop.
    RequestStop,
    /// Any other (operational) code, kept verbatim.
    Other(String),
}

impl Activity {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "TB" => Self::TrainBegins,
            "TF" => Self::TrainFinishes,
            "T" => Self::StopsToTakeUpAndSetDown,
            "D" => Self::SetDownOnly,
            "U" => Self::TakeUpOnly,
            "R" => Self::RequestStop,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether passengers may join or leave here.
    pub fn is_passenger(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrainBegins => f.write_str("TB"),
            Self::TrainFinishes => f.write_str("TF"),
            Self::StopsToTakeUpAndSetDown => f.write_str("T"),
            Self::SetDownOnly => f.write_str("D"),
            Self::TakeUpOnly => f.write_str("U"),
            Self::RequestStop => f.write_str("R"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// The activity codes for one stop, e.g. `"TB"` or `"T OP"`.
///
/// Accepts either a list of codes or a single whitespace separated string.
///
/// ```
/// use timetable_server::domain::{Activities, Activity};
///
/// let activities = Activities::parse("T  OP");
/// assert!(activities.contains(&Activity::StopsToTakeUpAndSetDown));
/// assert!(activities.has_passenger_activity());
/// assert_eq!(activities.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "ActivitiesRepr")]
pub struct Activities(Vec<Activity>);

#[derive(Deserialize)]
#[serde(untagged)]
enum ActivitiesRepr {
    Joined(String),
    List(Vec<String>),
}

impl From<ActivitiesRepr> for Activities {
    fn from(value: ActivitiesRepr) -> Self {
        match value {
            ActivitiesRepr::Joined(s) => Activities::parse(&s),
            ActivitiesRepr::List(codes) => codes.iter().map(|c| Activity::parse(c)).collect(),
        }
    }
}

impl Activities {
    pub fn parse(s: &str) -> Self {
        s.split_whitespace().map(Activity::parse).collect()
    }

    pub fn contains(&self, activity: &Activity) -> bool {
        self.0.contains(activity)
    }

    pub fn has_passenger_activity(&self) -> bool {
        self.0.iter().any(Activity::is_passenger)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Activity> for Activities {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        Activities(iter.into_iter().collect())
    }
}
