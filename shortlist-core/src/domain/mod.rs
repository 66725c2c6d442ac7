//! Core domain types
//!
//! These types describe what the harness submits, what it waits for and what it
//! observes on disk. They carry no I/O; the runner owns processes and files.

pub mod job;
pub mod params;
pub mod perf;
pub mod poll;
pub mod probe;
