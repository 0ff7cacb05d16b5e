//! Jittered pacing between send attempts.
//!
//! Every attempt, including the first, is preceded by a wait drawn
//! uniformly from the job's [`DelayBounds`].

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower delay bound used when a submission does not specify one.
pub const DEFAULT_MIN_DELAY_SECS: f64 = 30.0;

/// Upper delay bound used when a submission does not specify one.
pub const DEFAULT_MAX_DELAY_SECS: f64 = 60.0;

/// Neither bound may exceed one day.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// DelayBounds
// ---------------------------------------------------------------------------

/// Closed interval `[min_secs, max_secs]` a pre-attempt wait is drawn from.
///
/// Only constructible through [`DelayBounds::new`], so every value in
/// circulation satisfies `0 <= min_secs <= max_secs <= MAX_DELAY_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayBounds {
    min_secs: f64,
    max_secs: f64,
}

impl DelayBounds {
    /// Validate and build a pair of bounds.
    ///
    /// Rules:
    /// - Both values must be finite and non-negative.
    /// - Neither may exceed [`MAX_DELAY_SECS`].
    /// - `min_secs` must not exceed `max_secs`.
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self, CoreError> {
        for (name, value) in [("min_delay", min_secs), ("max_delay", max_secs)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "{name} must be a non-negative number of seconds"
                )));
            }
            if value > MAX_DELAY_SECS {
                return Err(CoreError::Validation(format!(
                    "{name} must not exceed {MAX_DELAY_SECS} seconds"
                )));
            }
        }
        if min_secs > max_secs {
            return Err(CoreError::Validation(
                "min_delay must not exceed max_delay".to_string(),
            ));
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs)
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs)
    }

    /// Whether `delay` lies inside the closed interval.
    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min() && delay <= self.max()
    }
}

impl Default for DelayBounds {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_DELAY_SECS,
            max_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Draw the next pre-attempt wait using the thread-local RNG.
pub fn next_delay(bounds: &DelayBounds) -> Duration {
    next_delay_with(bounds, &mut rand::rng())
}

/// Draw the next pre-attempt wait from a caller-supplied RNG.
pub fn next_delay_with<R: Rng + ?Sized>(bounds: &DelayBounds, rng: &mut R) -> Duration {
    let secs = if bounds.min_secs == bounds.max_secs {
        bounds.min_secs
    } else {
        rng.random_range(bounds.min_secs..=bounds.max_secs)
    };
    Duration::from_secs_f64(secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
