//! Delay samplers for interarrival gaps and dwell times.
//!
//! The arrival scheduler only needs "give me the next delay"; everything
//! about the distribution lives behind [DelaySampler].

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Uniform};

use crate::clock::SimTime;
use crate::error::SamplerError;

/// Source of non-negative simulated delays.
pub trait DelaySampler: Send + Sync + fmt::Debug {
    /// Sample the next delay. Implementations may return any value; callers
    /// validate it with [checked_delay].
    fn sample(&mut self) -> Result<SimTime, SamplerError>;
}

/// Reject negative and non-finite delays.
pub fn checked_delay(delay: SimTime) -> Result<SimTime, SamplerError> {
    if !delay.is_finite() {
        return Err(SamplerError::NotFinite(delay));
    }
    if delay < 0.0 {
        return Err(SamplerError::Negative(delay));
    }
    Ok(delay)
}

/// Independent sub-seeds for the random streams of one run.
///
/// Drawn from a generator seeded with the run seed, so runs with adjacent
/// seeds never share a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSeeds {
    pub plan: u64,
    pub interarrival: u64,
    pub dwell: u64,
}

impl StreamSeeds {
    pub fn derive(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            plan: rng.gen(),
            interarrival: rng.gen(),
            dwell: rng.gen(),
        }
    }
}

/// Draw one exponential sample with the given mean from `rng`.
pub fn sample_exponential<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> Result<SimTime, SamplerError> {
    let dist = exp_with_mean(mean)?;
    Ok(dist.sample(rng))
}

fn exp_with_mean(mean: f64) -> Result<Exp<f64>, SamplerError> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(SamplerError::Distribution(format!(
            "exponential mean must be positive and finite, got {mean}"
        )));
    }
    Exp::new(1.0 / mean).map_err(|e| SamplerError::Distribution(e.to_string()))
}

/// Constant interarrival time.
#[derive(Debug, Clone)]
pub struct FixedInterArrival {
    pub interval: SimTime,
}

impl FixedInterArrival {
    pub fn new(interval: SimTime) -> Self {
        Self { interval }
    }
}

impl DelaySampler for FixedInterArrival {
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        Ok(self.interval)
    }
}

/// Exponential distribution: Poisson arrivals.
#[derive(Debug, Clone)]
pub struct ExponentialInterArrival {
    mean: f64,
    dist: Exp<f64>,
    rng: StdRng,
}

impl ExponentialInterArrival {
    /// Exponential gaps with the given mean, seeded for reproducibility.
    pub fn with_seed(mean: f64, seed: u64) -> Result<Self, SamplerError> {
        Ok(Self {
            mean,
            dist: exp_with_mean(mean)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Exponential gaps seeded from OS entropy.
    pub fn from_entropy(mean: f64) -> Result<Self, SamplerError> {
        Ok(Self {
            mean,
            dist: exp_with_mean(mean)?,
            rng: StdRng::from_entropy(),
        })
    }

    /// Create from rate (arrivals per time unit).
    pub fn from_rate(rate: f64, seed: u64) -> Result<Self, SamplerError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SamplerError::Distribution(format!(
                "arrival rate must be positive and finite, got {rate}"
            )));
        }
        Self::with_seed(1.0 / rate, seed)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl DelaySampler for ExponentialInterArrival {
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        Ok(self.dist.sample(&mut self.rng))
    }
}

/// Uniform gaps in `[low, high]`.
#[derive(Debug, Clone)]
pub struct UniformInterArrival {
    dist: Uniform<f64>,
    rng: StdRng,
}

impl UniformInterArrival {
    pub fn with_seed(low: f64, high: f64, seed: u64) -> Result<Self, SamplerError> {
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(SamplerError::Distribution(format!(
                "uniform bounds must satisfy 0 <= low <= high, got [{low}, {high}]"
            )));
        }
        Ok(Self {
            dist: Uniform::new_inclusive(low, high),
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl DelaySampler for UniformInterArrival {
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        Ok(self.dist.sample(&mut self.rng))
    }
}

/// Replays a recorded sequence of gaps, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ReplayInterArrival {
    delays: VecDeque<SimTime>,
}

impl ReplayInterArrival {
    pub fn new(delays: impl IntoIterator<Item = SimTime>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.delays.len()
    }
}

impl DelaySampler for ReplayInterArrival {
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        self.delays.pop_front().ok_or(SamplerError::Exhausted)
    }
}

/// Adapter for a plain closure.
pub struct FnInterArrival<F>(pub F);

impl<F> fmt::Debug for FnInterArrival<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnInterArrival")
    }
}

impl<F> DelaySampler for FnInterArrival<F>
where
    F: FnMut() -> SimTime + Send + Sync,
{
    fn sample(&mut self) -> Result<SimTime, SamplerError> {
        Ok((self.0)())
    }
}
