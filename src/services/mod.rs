// src/services/mod.rs
pub mod access_gate;
pub mod countdown;
pub mod submission_recorder;
pub mod timer_engine;
