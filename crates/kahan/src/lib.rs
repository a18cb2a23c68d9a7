#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
#![deny(missing_docs, unused_must_use)]

//! Compensated (Kahan-Neumaier) summation for `f64` sequences.
//!
//! Contract: the running correction term keeps the error of `total()` bounded by a
//! couple of ulps of the exact sum, independent of how many terms were added.

/// Running compensated sum.
///
/// `total()` may be called any number of times; it never mutates the accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KahanSum {
    sum: f64,
    // low-order bits lost by `sum`
    compensation: f64,
}

impl KahanSum {
    /// Create an accumulator at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one term into the sum.
    pub fn add(&mut self, term: f64) {
        let next = self.sum + term;
        if next.is_finite() {
            // Neumaier: recover the bits of whichever operand was smaller.
            if self.sum.abs() >= term.abs() {
                self.compensation += (self.sum - next) + term;
            } else {
                self.compensation += (term - next) + self.sum;
            }
        }
        self.sum = next;
    }

    /// Best estimate of the sum of every term added so far.
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for KahanSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for term in iter {
            self.add(term);
        }
    }
}

impl FromIterator<f64> for KahanSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::new();
        sum.extend(iter);
        sum
    }
}

/// Compensated dot product of two slices, left open so further terms can be added.
///
/// Extra elements of the longer slice are ignored.
pub fn dot(a: &[f64], b: &[f64]) -> KahanSum {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

/// Compensated sum of squares (squared Euclidean norm).
pub fn sum_squares<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().map(|x| x * x).collect::<KahanSum>().total()
}
