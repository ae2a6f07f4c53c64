//! One-dimensional interpolants for tabulated rate coefficients and
//! cross-sections.
//!
//! Values outside the sampled range are extrapolated linearly from the
//! nearest bracketing pair.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("interpolation requires at least one sample")]
    EmptyTable,
    #[error("abscissa and values length mismatch: {abscissa} vs {values}")]
    LengthMismatch { abscissa: usize, values: usize },
    #[error("abscissa must be strictly increasing (violated at index {index})")]
    NonMonotonicAbscissa { index: usize },
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
    #[error("axis scaling ratio must be positive and finite, got {ratio}")]
    InvalidScaling { ratio: f64 },
}

/// Temperature (eV) to rate coefficient mapping realised as a piecewise
/// linear interpolant.
#[derive(Debug, Clone, PartialEq)]
pub struct RateFunction {
    abscissa: Vec<f64>,
    values: Vec<f64>,
}

impl RateFunction {
    pub fn new(abscissa: Vec<f64>, values: Vec<f64>) -> Result<Self, InterpolationError> {
        if abscissa.is_empty() {
            return Err(InterpolationError::EmptyTable);
        }
        if abscissa.len() != values.len() {
            return Err(InterpolationError::LengthMismatch {
                abscissa: abscissa.len(),
                values: values.len(),
            });
        }
        for (index, (x, y)) in abscissa.iter().zip(values.iter()).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(InterpolationError::NonFiniteSample { index });
            }
        }
        if let Some(index) = abscissa
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(InterpolationError::NonMonotonicAbscissa { index: index + 1 });
        }

        Ok(Self { abscissa, values })
    }

    pub fn zero(abscissa: &[f64]) -> Result<Self, InterpolationError> {
        Self::new(abscissa.to_vec(), vec![0.0; abscissa.len()])
    }

    pub fn abscissa(&self) -> &[f64] {
        &self.abscissa
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        interp_extrapolate_one(x, &self.abscissa, &self.values)
    }

    pub fn evaluate_many(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.evaluate(xi)).collect()
    }

    /// Stretches the abscissa by `ratio`; querying the result at `x * ratio`
    /// reproduces `self` at `x`.
    pub fn with_scaled_axis(&self, ratio: f64) -> Result<Self, InterpolationError> {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(InterpolationError::InvalidScaling { ratio });
        }
        Ok(Self {
            abscissa: self.abscissa.iter().map(|x| x * ratio).collect(),
            values: self.values.clone(),
        })
    }

    pub fn with_scaled_values(&self, factor: f64) -> Self {
        Self {
            abscissa: self.abscissa.clone(),
            values: self.values.iter().map(|y| y * factor).collect(),
        }
    }
}

/// Linear interpolation with linear extrapolation beyond both ends.
pub fn interp_extrapolate_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    match xp.len() {
        0 => 0.0,
        1 => fp[0],
        count => {
            let upper = xp.partition_point(|&v| v < x).clamp(1, count - 1);
            let lower = upper - 1;
            let t = (x - xp[lower]) / (xp[upper] - xp[lower]);
            fp[lower] + t * (fp[upper] - fp[lower])
        }
    }
}

/// Log-log interpolation, used for cross-sections that span decades.
///
/// Falls back to linear interpolation when any sample is non-positive.
pub fn interp_loglog_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let positive = x > 0.0
        && xp.iter().all(|value| *value > 0.0)
        && fp.iter().all(|value| *value > 0.0);
    if !positive {
        return interp_extrapolate_one(x, xp, fp);
    }

    let log_xp: Vec<f64> = xp.iter().map(|v| v.ln()).collect();
    let log_fp: Vec<f64> = fp.iter().map(|v| v.ln()).collect();
    interp_extrapolate_one(x.ln(), &log_xp, &log_fp).exp()
}
