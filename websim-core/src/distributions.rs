use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution as _, Exp, Gamma, Normal};
use serde::{Deserialize, Serialize};

/// A sampleable delay distribution, configured per-component.
///
/// `Burst` is a degenerate distribution that always returns its fixed value;
/// it exists so a client's think-time set can include a constant alongside
/// the statistical ones, matching the configured distribution family used
/// for inter-request think time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std_dev: f64 },
    Exponential { mean: f64 },
    Uniform { low: f64, high: f64 },
    Gamma { shape: f64, scale: f64 },
    ChiSquared { degrees_of_freedom: f64 },
    Burst { value: f64 },
}

impl Distribution {
    /// Draws a sample, clamped to be non-negative. Every use of these delays
    /// is a duration, so a negative draw (possible from the normal
    /// distribution) is floored at zero rather than propagated.
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        let raw = match *self {
            Distribution::Normal { mean, std_dev } => {
                Normal::new(mean, std_dev)
                    .expect("normal distribution parameters must be valid")
                    .sample(rng)
            }
            Distribution::Exponential { mean } => {
                Exp::new(1.0 / mean)
                    .expect("exponential mean must be positive")
                    .sample(rng)
            }
            Distribution::Uniform { low, high } => {
                if low == high {
                    low
                } else {
                    Uniform::new(low, high).sample(rng)
                }
            }
            Distribution::Gamma { shape, scale } => Gamma::new(shape, scale)
                .expect("gamma distribution parameters must be valid")
                .sample(rng),
            Distribution::ChiSquared { degrees_of_freedom } => {
                // chi-squared(k) is gamma(k/2, 2)
                Gamma::new(degrees_of_freedom / 2.0, 2.0)
                    .expect("chi-squared degrees of freedom must be positive")
                    .sample(rng)
            }
            Distribution::Burst { value } => value,
        };
        raw.max(0.0)
    }
}

/// Picks one distribution from a configured set uniformly at random.
///
/// Used for the client think-time family, where each cycle independently
/// re-rolls which distribution shape governs the wait.
pub fn choose_uniformly<'a>(set: &'a [Distribution], rng: &mut StdRng) -> &'a Distribution {
    assert!(!set.is_empty(), "distribution set must not be empty");
    let idx = rng.gen_range(0..set.len());
    &set[idx]
}
