//! Process-level concerns: logging setup and host resource snapshots

pub mod host_stats;
pub mod logging;
