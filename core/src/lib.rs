//! Churn risk scoring for ISP customer operations.
//!
//! Pure scoring lives in `scoring`, `bucket` and `rollup`; everything
//! else feeds them signals and tenant configuration.

pub mod bucket;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod event;
pub mod rng;
pub mod rollup;
pub mod scoring;
pub mod signal;
pub mod source;
pub mod store;
pub mod tenant_config;
pub mod types;
