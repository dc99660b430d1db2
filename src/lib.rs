//! Order Analysis ETL Library
//!
//! Daily batch pipeline that extracts order, customer, and product data from
//! a remote API, flattens and joins it, and upserts the result into a
//! relational store keyed by (order_id, customer_id, product_id).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod api_client;
pub mod artifacts;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod models;
pub mod retry;
pub mod stages;

pub use api_client::ApiClient;
pub use artifacts::ArtifactStore;
pub use config::AppConfig;
pub use errors::EtlError;
pub use stages::{run_pipeline, PipelineReport, StageOutcome};
