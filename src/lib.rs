//! Timed team competition portal.
//!
//! Participants authenticate, the first scan by any member starts a shared
//! 24 hour clock for the whole team, and the team submits its answers before
//! the deadline or is locked out.

pub mod config;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
