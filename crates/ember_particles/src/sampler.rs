//! Randomized value sampling

use rand::Rng;

/// Draw `value` perturbed uniformly within `±variance`
///
/// A zero or non-finite variance returns `value` untouched. A negative
/// variance spans the same symmetric range as its absolute value.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, value: f64, variance: f64) -> f64 {
    if variance == 0.0 || !variance.is_finite() {
        return value;
    }
    value + (rng.gen::<f64>() - 0.5) * 2.0 * variance
}

/// A nominal value with symmetric variance
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ranged {
    pub value: f64,
    pub var: f64,
}

impl Ranged {
    pub const fn new(value: f64, var: f64) -> Self {
        Self { value, var }
    }

    /// A value that never varies
    pub const fn fixed(value: f64) -> Self {
        Self { value, var: 0.0 }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        sample(rng, self.value, self.var)
    }

    /// Smallest value `sample` can return
    pub fn min(&self) -> f64 {
        self.value - self.var.abs()
    }

    /// Largest value `sample` can return
    pub fn max(&self) -> f64 {
        self.value + self.var.abs()
    }
}

impl From<f64> for Ranged {
    fn from(value: f64) -> Self {
        Self::fixed(value)
    }
}
