//! Seasonal-trend decomposition using loess (STL).
//!
//! Thin wrapper over [`stlrs`] configured like the classic robust STL of
//! Cleveland et al. (1990): seasonal smoother 7, degree-1 loess
//! everywhere, no jumps, and either 5 inner iterations or 2 inner plus 15
//! robustness iterations.
//!
//! ```text
//! y = trend + seasonal + remainder
//! ```

use thiserror::Error;

/// Seasonal smoother length.
pub const SEASONAL_SMOOTHER: usize = 7;

/// Errors returned by [`Stl::decompose`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StlError {
    /// The seasonal period must be at least 2.
    #[error("Seasonal period must be at least 2, got {period}")]
    InvalidPeriod {
        /// The rejected period.
        period: usize,
    },

    /// The series does not cover two full seasonal cycles.
    #[error("Seasonal decomposition needs at least {required} points, got {points}")]
    InsufficientData {
        /// Points in the series.
        points: usize,
        /// Points required.
        required: usize,
    },

    /// The series contains `NaN` or infinite values.
    #[error("Series contains non-finite values")]
    NonFinite,

    /// The decomposition itself failed.
    #[error("STL fit failed: {message}")]
    Fit {
        /// Message from the decomposition backend.
        message: String,
    },
}

/// Components of a decomposed series. All vectors have the input length.
#[derive(Debug, Clone, PartialEq)]
pub struct StlResult {
    /// Smooth long-run component.
    pub trend: Vec<f64>,
    /// Periodic component.
    pub seasonal: Vec<f64>,
    /// What is left: `y - trend - seasonal`.
    pub remainder: Vec<f64>,
}

/// STL decomposition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stl {
    period: usize,
    robust: bool,
}

impl Stl {
    /// Non-robust STL for the given seasonal period.
    #[must_use]
    pub const fn new(period: usize) -> Self {
        Self {
            period,
            robust: false,
        }
    }

    /// Switches to robust fitting: 2 inner and 15 outer iterations.
    #[must_use]
    pub const fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    /// Minimum number of points [`Self::decompose`] accepts.
    #[must_use]
    pub const fn min_points(&self) -> usize {
        2 * self.period
    }

    /// Trend smoother length: the smallest odd integer
    /// `>= 1.5 * period / (1 - 1.5 / seasonal)`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn trend_smoother(&self) -> usize {
        let raw = (1.5 * self.period as f64 / (1.0 - 1.5 / SEASONAL_SMOOTHER as f64)).ceil();
        make_odd(raw as usize)
    }

    /// Low-pass smoother length: the smallest odd integer `>= period`.
    #[must_use]
    pub const fn low_pass_smoother(&self) -> usize {
        make_odd(self.period)
    }

    const fn iterations(&self) -> (usize, usize) {
        if self.robust { (2, 15) } else { (5, 0) }
    }

    /// Decomposes `series` into trend, seasonal, and remainder.
    ///
    /// # Errors
    ///
    /// * [`StlError::InvalidPeriod`] if the period is below 2
    /// * [`StlError::InsufficientData`] if the series is shorter than two periods
    /// * [`StlError::NonFinite`] if the series contains `NaN` or infinities
    /// * [`StlError::Fit`] if the backend rejects the input
    #[allow(clippy::cast_possible_truncation)]
    pub fn decompose(&self, series: &[f64]) -> Result<StlResult, StlError> {
        self.validate(series)?;

        let (inner, outer) = self.iterations();
        let input: Vec<f32> = series.iter().map(|v| *v as f32).collect();

        let fit = stlrs::params()
            .seasonal_length(SEASONAL_SMOOTHER)
            .trend_length(self.trend_smoother())
            .low_pass_length(self.low_pass_smoother())
            .seasonal_degree(1)
            .trend_degree(1)
            .low_pass_degree(1)
            .seasonal_jump(1)
            .trend_jump(1)
            .low_pass_jump(1)
            .inner_loops(inner)
            .outer_loops(outer)
            .robust(self.robust)
            .fit(&input, self.period)
            .map_err(|e| StlError::Fit {
                message: e.to_string(),
            })?;

        let trend: Vec<f64> = fit.trend().iter().map(|v| f64::from(*v)).collect();
        let seasonal: Vec<f64> = fit.seasonal().iter().map(|v| f64::from(*v)).collect();
        let remainder = series
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((y, t), s)| y - t - s)
            .collect();

        Ok(StlResult {
            trend,
            seasonal,
            remainder,
        })
    }

    fn validate(&self, series: &[f64]) -> Result<(), StlError> {
        if self.period < 2 {
            return Err(StlError::InvalidPeriod {
                period: self.period,
            });
        }
        if series.len() < self.min_points() {
            return Err(StlError::InsufficientData {
                points: series.len(),
                required: self.min_points(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(StlError::NonFinite);
        }
        Ok(())
    }
}

const fn make_odd(value: usize) -> usize {
    if value % 2 == 0 { value + 1 } else { value }
}
