//! Manifest splicing: creative loading and per-request VOD assembly.

pub mod fetch;
pub mod session;
pub mod vod;
