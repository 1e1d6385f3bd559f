//! Minimal bubblejail manager service.
//!
//! Serves the read-only part of `org.bubblejail.Manager.Unstable` so the
//! config client can be run against real instance directories.

pub mod instances;
pub mod service;
