//! scout-core: scouting reports from canonical per-match tables.
//!
//! Pipeline: CanonicalTables → PreparedTables → MetricsBundle →
//! rule candidates → ranked insights → ScoutingReport.

pub mod capabilities;
pub mod config;
pub mod economy;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod insight;
pub mod metrics;
pub mod mock_data;
pub mod ranking;
pub mod report;
pub mod rng;
pub mod rules;
pub mod store;
pub mod tables;
pub mod types;
