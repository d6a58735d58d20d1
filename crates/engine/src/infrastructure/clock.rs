//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_bool(&self, p: f64) -> bool {
        use rand::Rng;
        rand::thread_rng().gen_bool(p.clamp(0.0, 1.0))
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing.
///
/// `gen_range` returns `roll` clamped into the requested range; `gen_bool`
/// always answers `coin`.
#[cfg(test)]
pub struct FixedRandom {
    pub roll: i32,
    pub coin: bool,
}

#[cfg(test)]
impl FixedRandom {
    pub fn new(roll: i32, coin: bool) -> Self {
        Self { roll, coin }
    }
}

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.roll.clamp(min, max.max(min))
    }

    fn gen_bool(&self, _p: f64) -> bool {
        self.coin
    }
}
