//! Shortlist Core
//!
//! Core types shared by the shortlist pipeline harness.
//!
//! This crate contains:
//! - Domain types: job submissions, poll state, probe results, pipeline parameters
//!   and performance records
//! - Error types: typed failures for submission, probing, archives and workspaces

pub mod domain;
pub mod error;
