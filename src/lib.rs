//! Condensr - link shortening and click analytics service
//!
//! The JSON backend behind the Condensr dashboard: short links with aliases,
//! expiry, click limits, passwords and per-device targets, plus click
//! analytics rolled up per link, per account and system-wide.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **system-stats**: host CPU / memory / disk usage in admin stats
//! - **full**: All features enabled
//!
//! # Architecture
//! - `storage`: SeaORM storage (SQLite / MySQL / PostgreSQL)
//! - `services`: link, redirect, analytics and user business logic
//! - `analytics`: click event buffering and aggregation
//! - `api`: HTTP handlers, JWT and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: logging and host resource snapshots

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
