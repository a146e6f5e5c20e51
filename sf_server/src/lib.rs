//! HTTP front end for the storefront wallet backend.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
