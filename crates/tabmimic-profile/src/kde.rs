use crate::errors::ProfileError;

/// One-dimensional Gaussian kernel density estimate.
///
/// Bandwidth follows Scott's rule: `h = sigma * n^(-1/5)` with `sigma` the
/// sample standard deviation (one degree of freedom).
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    pub fn new(points: Vec<f64>) -> Result<Self, ProfileError> {
        let bandwidth = scott_bandwidth(&points);
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            let mut distinct = points.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            return Err(ProfileError::DegenerateContinuous {
                distinct: distinct.len(),
            });
        }
        Ok(Self { points, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`.
    pub fn density(&self, x: f64) -> f64 {
        let n = self.points.len() as f64;
        let sum: f64 = self
            .points
            .iter()
            .map(|&point| {
                let z = (x - point) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        sum / ((2.0 * std::f64::consts::PI).sqrt() * self.bandwidth * n)
    }

    /// Definite integral of the density over `[low, high]`.
    pub fn integrate_box(&self, low: f64, high: f64) -> f64 {
        let n = self.points.len() as f64;
        let mass: f64 = self
            .points
            .iter()
            .map(|&point| {
                normal_cdf((high - point) / self.bandwidth)
                    - normal_cdf((low - point) / self.bandwidth)
            })
            .sum();
        (mass / n).max(0.0)
    }
}

fn scott_bandwidth(points: &[f64]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean = points.iter().sum::<f64>() / n;
    let variance = points.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() * n.powf(-0.2)
}

/// Standard normal CDF.
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz and Stegun 7.1.26 (absolute error < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
