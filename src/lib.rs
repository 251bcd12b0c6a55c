//! DeFi Metrics Studio
//!
//! Aggregation of DeFi metric time series and per-chain protocol
//! summaries into the rows a dashboard displays.
//!
//! This crate provides the core implementation for the
//! `defi-metrics` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! cargo install defi-metrics-studio
//! defi-metrics --help
//! ```
//!
//! The aggregation routines are plain functions over parsed records and can
//! be used directly:
//!
//! ```ignore
//! use defi_metrics_studio::aggregator::join_series;
//! let rows = join_series(&series);
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
