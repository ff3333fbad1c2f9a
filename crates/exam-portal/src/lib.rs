//! Scholarship eligibility engine for the national examination administration portal.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod telemetry;
