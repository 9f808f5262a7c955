//! Utility functions and helpers
//!
//! This module contains timestamp bucketing and formatting helpers.

pub mod time;

pub use time::{bucket_label, elapsed_secs, heatmap_coordinates, hour_bucket};
