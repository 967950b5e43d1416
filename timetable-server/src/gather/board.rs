//! Windowing a time-ordered set of calls.

use chrono::NaiveDateTime;

use super::config::Window;

/// Select the calls `window` keeps around `at`.
///
/// `calls` must already be sorted by `key`. The result keeps that order.
pub(crate) fn select_window<T>(
    mut calls: Vec<T>,
    key: impl Fn(&T) -> NaiveDateTime,
    at: NaiveDateTime,
    window: Window,
) -> Vec<T> {
    let Window::Around { before, after } = window else {
        return calls;
    };

    let split = calls.partition_point(|c| key(c) < at);
    let start = split.saturating_sub(before);
    let end = split.saturating_add(after).min(calls.len());

    calls.truncate(end);
    calls.drain(..start);
    calls
}
