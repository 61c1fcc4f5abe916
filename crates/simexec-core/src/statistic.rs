//! Running statistics over a stream of samples.

/// Running mean, variance, extrema and RMS of `f64` samples.
///
/// Uses Welford's online update, so no samples are retained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistic {
    n: u64,
    mean: f64,
    m2: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

impl Statistic {
    /// Empty statistic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample.
    pub fn sample(&mut self, v: f64) {
        if self.n == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.n += 1;
        let delta = v - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (v - self.mean);
        self.sum_sq += v * v;
    }

    /// Number of samples.
    pub fn count(&self) -> u64 {
        self.n
    }

    /// Arithmetic mean (`0.0` when empty).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (`0.0` with fewer than two samples).
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            self.m2 / self.n as f64
        }
    }

    /// Population standard deviation.
    pub fn sigma(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest sample (`0.0` when empty).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample (`0.0` when empty).
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Root mean square (`0.0` when empty).
    pub fn rms(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.sum_sq / self.n as f64).sqrt()
        }
    }

    /// Discard all samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
