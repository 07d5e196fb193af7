use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// A point in virtual simulation time, measured in seconds since the epoch of
/// a run.
///
/// Mirrors the `env.now` float used throughout the process this simulator
/// replaces; kept as a newtype so it can't be accidentally mixed with a
/// plain `f64` duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualTime(f64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0.0);

    pub fn new(seconds: f64) -> Self {
        assert!(seconds.is_finite(), "virtual time must be finite");
        Self(seconds)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    pub fn advance(self, dt: f64) -> Self {
        Self::new(self.0 + dt)
    }
}

impl Eq for VirtualTime {}

impl Ord for VirtualTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .expect("virtual time is never NaN")
    }
}

impl PartialOrd for VirtualTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<f64> for VirtualTime {
    type Output = VirtualTime;

    fn add(self, dt: f64) -> VirtualTime {
        self.advance(dt)
    }
}

impl Sub for VirtualTime {
    type Output = f64;

    fn sub(self, other: VirtualTime) -> f64 {
        self.0 - other.0
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
