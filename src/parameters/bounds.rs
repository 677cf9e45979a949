//! Parameter bounds implementation
//!
//! Closed intervals `[low, high]` used by [`ParameterSpace`](crate::parameters::ParameterSpace)
//! for containment checks, clipping, and grid/random sampling.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MorError, Result};

/// A closed, finite interval `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    /// Lower end of the interval
    pub low: f64,

    /// Upper end of the interval
    pub high: f64,
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            low: f64,
            high: f64,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Bounds::new(helper.low, helper.high).map_err(serde::de::Error::custom)
    }
}

impl Bounds {
    /// Create a new interval
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if both ends are finite and `low <= high`
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.1, 1.0).unwrap();
    /// assert!(bounds.contains(0.5));
    /// assert_eq!(bounds.clamp(1.5), 1.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(MorError::InvalidBounds { low, high });
        }

        Ok(Self { low, high })
    }

    /// Check if a value lies within the interval (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Check if a value lies within the interval widened by `tolerance`
    pub fn contains_with_tolerance(&self, value: f64, tolerance: f64) -> bool {
        value >= self.low - tolerance && value <= self.high + tolerance
    }

    /// Clamp a value to be within the interval
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    /// Whether the whole interval is strictly positive
    pub fn is_positive(&self) -> bool {
        self.low > 0.0
    }

    /// `count` equally spaced points; the first is `low` and the last is `high`
    pub fn grid(&self, count: usize) -> Vec<f64> {
        spaced(self.low, self.high, count)
            .into_iter()
            .map(|v| self.clamp(v))
            .collect()
    }

    /// `count` points equally spaced in `ln(value)`
    ///
    /// # Returns
    ///
    /// A `DomainError` unless `low > 0`
    pub fn log_grid(&self, count: usize) -> Result<Vec<f64>> {
        let (log_low, log_high) = self.log_bounds()?;
        let mut points: Vec<f64> = spaced(log_low, log_high, count)
            .into_iter()
            .map(|v| self.clamp(v.exp()))
            .collect();
        // Pin the ends so the bounds themselves are sampled exactly
        if let Some(first) = points.first_mut() {
            *first = self.low;
        }
        if count > 1 {
            if let Some(last) = points.last_mut() {
                *last = self.high;
            }
        }
        Ok(points)
    }

    /// A uniformly distributed point of the interval
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.clamp(interpolate(self.low, self.high, rng.gen::<f64>()))
    }

    /// A point whose logarithm is uniformly distributed
    pub fn sample_log<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let (log_low, log_high) = self.log_bounds()?;
        Ok(self.clamp(rng.gen_range(log_low..=log_high).exp()))
    }

    fn log_bounds(&self) -> Result<(f64, f64)> {
        if !self.is_positive() {
            return Err(MorError::DomainError(format!(
                "logarithmic sampling requires positive bounds, got [{}, {}]",
                self.low, self.high
            )));
        }
        Ok((self.low.ln(), self.high.ln()))
    }
}

/// The point at fraction `s` of `[low, high]`
///
/// Never forms `high - low`, which overflows for intervals wider than `f64::MAX`.
fn interpolate(low: f64, high: f64, s: f64) -> f64 {
    low * (1.0 - s) + high * s
}

fn spaced(low: f64, high: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let last = count - 1;
            (0..count)
                .map(|i| {
                    if i == last {
                        high
                    } else {
                        interpolate(low, high, i as f64 / last as f64)
                    }
                })
                .collect()
        }
    }
}
