//! Rail timetable server.
//!
//! Loads a schedule archive into an immutable in-memory snapshot, resolves
//! which version of each service runs on a given date (short-term planning
//! overlays, cancellations, joins and splits), and answers departures and
//! arrivals boards for a station around a point in time.

pub mod config;
pub mod domain;
pub mod gather;
pub mod load;
pub mod location;
pub mod timetable;
pub mod web;
