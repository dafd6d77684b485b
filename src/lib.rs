//! Stitcher — per-request HLS VOD ad-stitching manifest service
//!
//! Library interface for integration tests.
//! The binary entry point is in main.rs.

pub mod cache;
pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod payload;
pub mod server;
pub mod splice;
