//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of every random draw the pipeline makes.
pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    /// `true` with probability `p` (clamped to `0.0..=1.0`).
    fn gen_bool(&self, p: f64) -> bool;
}
