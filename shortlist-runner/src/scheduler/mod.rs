//! Scheduler layer for the runner
//!
//! This layer submits batch jobs and waits for the artifacts they produce.
//! It owns the lifecycle of a wait, from submission to completion or timeout.

pub mod poller;

pub use poller::JobPoller;
