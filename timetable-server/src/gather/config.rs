//! Gather configuration.

use crate::domain::Toc;

/// Calls before the target time on a default board.
pub const DEFAULT_BEFORE: usize = 0;

/// Calls at or after the target time on a default board.
pub const DEFAULT_AFTER: usize = 5;

/// Which calls around the target time make up a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The `before` nearest calls strictly earlier than the target and the
    /// `after` nearest at or later than it.
    Around { before: usize, after: usize },
    /// Every call on the query date.
    FullDay,
}

/// Query-side knobs for a departures or arrivals board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherConfig {
    pub window: Window,

    /// Only services run by one of these operators. Empty means any.
    pub tocs: Vec<Toc>,

    /// Station code the train must continue to (departures) or have come
    /// from (arrivals).
    pub via: Option<String>,

    /// Show cancelled calls, marked as cancelled.
    pub include_cancelled: bool,
}

impl GatherConfig {
    /// A board of `before` earlier and `after` later calls.
    pub fn new(before: usize, after: usize) -> Self {
        Self {
            window: Window::Around { before, after },
            ..Self::default()
        }
    }

    pub fn full_day() -> Self {
        Self {
            window: Window::FullDay,
            ..Self::default()
        }
    }

    pub fn with_toc(mut self, toc: Toc) -> Self {
        self.tocs.push(toc);
        self
    }

    pub fn with_via(mut self, via: impl Into<String>) -> Self {
        self.via = Some(via.into());
        self
    }

    pub fn including_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }

    pub(crate) fn accepts_toc(&self, toc: Option<Toc>) -> bool {
        self.tocs.is_empty() || toc.is_some_and(|t| self.tocs.contains(&t))
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            window: Window::Around {
                before: DEFAULT_BEFORE,
                after: DEFAULT_AFTER,
            },
            tocs: Vec::new(),
            via: None,
            include_cancelled: false,
        }
    }
}
