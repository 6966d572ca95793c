//! Phishing-detection feature extraction for URLs.
//!
//! `pipeline::FeatureExtractor` turns one URL into a `features::FeatureRecord`;
//! `batch::run_batch` drives a list of URLs through it in bounded batches.

pub mod aggregate;
pub mod batch;
pub mod brands;
pub mod cli;
pub mod config;
pub mod domain_utils;
pub mod export;
pub mod features;
pub mod fetch;
pub mod lexical;
pub mod logger;
pub mod pipeline;
pub mod probes;
pub mod rate_limit;
pub mod resources;

pub use features::{COLUMNS, FeatureRecord};
pub use pipeline::FeatureExtractor;
