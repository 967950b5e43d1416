//! Web layer for the timetable server.
//!
//! JSON endpoints for service lookups and station boards.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
