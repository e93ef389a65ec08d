/*!
Defines target distributions for exercising the samplers: isotropic and
diagonal Gaussians plus a heavy-tailed isotropic Student-t.

Every distribution here implements [`Target`](crate::core::Target) with an
unnormalized log-density; normalizing constants cancel in slice acceptance
tests, so they are dropped. The module is generic over the floating-point
precision (e.g., `f32` or `f64`) using the [`num_traits::Float`] trait.

# Examples

```rust
use slice_mcmc::core::Target;
use slice_mcmc::distributions::{IsotropicGaussian, IsotropicStudentT};

// A 2D standard Gaussian target.
let gauss: IsotropicGaussian<f64> = IsotropicGaussian::new(1.0, 2);
println!("Unnormalized log-density: {}", gauss.log_density(&[0.5, -0.5]));

// A heavy-tailed alternative on the same space.
let heavy: IsotropicStudentT<f64> = IsotropicStudentT::new(1.0, 2);
println!("Unnormalized log-density: {}", heavy.log_density(&[0.5, -0.5]));
```
*/

use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::core::{SliceError, Target};

/**
An isotropic Gaussian distribution with standard deviation `std` in every
coordinate.

# Examples

```rust
use slice_mcmc::core::Target;
use slice_mcmc::distributions::IsotropicGaussian;

let gauss: IsotropicGaussian<f64> = IsotropicGaussian::new(1.0, 1);
assert_eq!(gauss.log_density(&[1.0]), -0.5);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsotropicGaussian<T> {
    pub std: T,
    pub dim: usize,
}

impl<T: Float> IsotropicGaussian<T> {
    /// Creates a new isotropic Gaussian with the specified standard deviation.
    ///
    /// # Panics
    ///
    /// Panics if `std` is not strictly positive.
    pub fn new(std: T, dim: usize) -> Self {
        assert!(
            std > T::zero(),
            "Expected a strictly positive standard deviation."
        );
        Self { std, dim }
    }
}

impl<T> Target<T> for IsotropicGaussian<T>
where
    T: Float,
    StandardNormal: Distribution<T>,
{
    fn log_density(&self, position: &[T]) -> T {
        let mut sum = T::zero();
        for &x in position.iter() {
            sum = sum + x * x
        }
        -T::from(0.5).unwrap() * sum / (self.std * self.std)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn initial_sample<R: Rng>(&self, rng: &mut R) -> Result<Vec<T>, SliceError> {
        let normal = Normal::new(T::zero(), self.std)
            .expect("Expecting creation of normal distribution to succeed.");
        Ok(normal.sample_iter(rng).take(self.dim).collect())
    }
}

/**
A Gaussian distribution with independent coordinates, given by a mean vector
and a per-coordinate standard deviation.

# Examples

```rust
use slice_mcmc::core::Target;
use slice_mcmc::distributions::DiagGaussian;

let gauss = DiagGaussian::new(vec![1.0, -2.0], vec![1.0, 0.5]);
assert_eq!(gauss.dimension(), 2);
assert_eq!(gauss.log_density(&[2.0, -1.0]), -2.5);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct DiagGaussian<T> {
    pub mean: Vec<T>,
    pub std: Vec<T>,
}

impl<T: Float> DiagGaussian<T> {
    /// Creates a new diagonal Gaussian from a mean vector and a vector of
    /// per-coordinate standard deviations.
    ///
    /// # Panics
    ///
    /// Panics if the vectors differ in length or any standard deviation is
    /// not strictly positive.
    pub fn new(mean: Vec<T>, std: Vec<T>) -> Self {
        assert_eq!(
            mean.len(),
            std.len(),
            "Expected mean and std to have equal lengths."
        );
        assert!(
            std.iter().all(|&s| s > T::zero()),
            "Expected all standard deviations to be strictly positive."
        );
        Self { mean, std }
    }
}

impl<T> Target<T> for DiagGaussian<T>
where
    T: Float,
    StandardNormal: Distribution<T>,
{
    fn log_density(&self, position: &[T]) -> T {
        let mut sum = T::zero();
        for ((&x, &m), &s) in position.iter().zip(&self.mean).zip(&self.std) {
            let z = (x - m) / s;
            sum = sum + z * z;
        }
        -T::from(0.5).unwrap() * sum
    }

    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn initial_sample<R: Rng>(&self, rng: &mut R) -> Result<Vec<T>, SliceError> {
        Ok(self
            .mean
            .iter()
            .zip(&self.std)
            .map(|(&m, &s)| m + s * rng.sample(StandardNormal))
            .collect())
    }
}

/**
An isotropic Student-t distribution with `df` degrees of freedom; `df = 1`
gives a multivariate Cauchy.

The tails are heavy enough that low-order moments stop existing for small
`df`, which makes this the standard stress target for samplers that claim to
handle heavy tails. It deliberately does not override
[`Target::initial_sample`](crate::core::Target::initial_sample): callers must
supply a starting position.

# Examples

```rust
use slice_mcmc::core::Target;
use slice_mcmc::distributions::IsotropicStudentT;

let cauchy: IsotropicStudentT<f64> = IsotropicStudentT::new(1.0, 1);
let expected = -(2.0f64).ln();
assert!((cauchy.log_density(&[1.0]) - expected).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsotropicStudentT<T> {
    pub df: T,
    pub dim: usize,
}

impl<T: Float> IsotropicStudentT<T> {
    /// Creates a new isotropic Student-t distribution.
    ///
    /// # Panics
    ///
    /// Panics if `df` is not strictly positive.
    pub fn new(df: T, dim: usize) -> Self {
        assert!(
            df > T::zero(),
            "Expected strictly positive degrees of freedom."
        );
        Self { df, dim }
    }
}

impl<T: Float> Target<T> for IsotropicStudentT<T> {
    fn log_density(&self, position: &[T]) -> T {
        let mut sum = T::zero();
        for &x in position.iter() {
            sum = sum + x * x;
        }
        let half = T::from(0.5).unwrap();
        let d = T::from(self.dim).unwrap();
        -half * (self.df + d) * (T::one() + sum / self.df).ln()
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod distributions_tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    /**
    A helper function to normalize the unnormalized log probability of an
    isotropic Gaussian into a proper probability value (by applying the
    appropriate constant).

    # Arguments

    * `x` - The unnormalized log probability.
    * `d` - The dimensionality of the state.
    * `std` - The standard deviation used in the isotropic Gaussian.

    # Returns

    Returns the normalized probability as an `f64`.
    */
    fn normalize_isogauss(x: f64, d: usize, std: f64) -> f64 {
        let log_normalizer = -((d as f64) / 2.0) * ((2.0_f64).ln() + PI.ln() + 2.0 * std.ln());
        (x + log_normalizer).exp()
    }

    #[test]
    fn iso_gauss_log_density_test_1() {
        let distr = IsotropicGaussian::new(1.0, 1);
        let p = normalize_isogauss(distr.log_density(&[1.0]), 1, distr.std);
        let true_p = 0.24197072451914337;
        let diff = (p - true_p).abs();
        assert!(
            diff < 1e-7,
            "Expected diff < 1e-7, got {diff} with p={p} (expected ~{true_p})."
        );
    }

    #[test]
    fn iso_gauss_log_density_test_2() {
        let distr = IsotropicGaussian::new(2.0, 2);
        let p = normalize_isogauss(distr.log_density(&[0.42, 9.6]), 2, distr.std);
        let true_p = 3.864661987252467e-7;
        let diff = (p - true_p).abs();
        assert!(
            diff < 1e-15,
            "Expected diff < 1e-15, got {diff} with p={p} (expected ~{true_p})"
        );
    }

    #[test]
    fn iso_gauss_log_density_test_3() {
        let distr = IsotropicGaussian::new(3.0, 3);
        let p = normalize_isogauss(distr.log_density(&[1.0, 2.0, 3.0]), 3, distr.std);
        let true_p = 0.001080393185560214;
        let diff = (p - true_p).abs();
        assert!(
            diff < 1e-8,
            "Expected diff < 1e-8, got {diff} with p={p} (expected ~{true_p})"
        );
    }

    #[test]
    fn diag_gauss_log_density_is_a_scaled_distance() {
        let distr = DiagGaussian::new(vec![1.0, -2.0], vec![1.0, 0.5]);
        let lp = distr.log_density(&[2.0, -1.0]);
        assert!(
            (lp - (-2.5)).abs() < 1e-12,
            "Expected log-density -2.5, got {lp}."
        );
    }

    #[test]
    fn student_t_log_density_matches_cauchy_in_one_dimension() {
        let distr = IsotropicStudentT::new(1.0, 1);
        let lp = distr.log_density(&[1.0]);
        let expected = -(2.0f64).ln();
        assert!(
            (lp - expected).abs() < 1e-12,
            "Expected log-density {expected}, got {lp}."
        );
    }

    #[test]
    fn student_t_log_density_test_2() {
        let distr = IsotropicStudentT::new(3.0, 2);
        let lp = distr.log_density(&[1.0, 2.0]);
        let expected = -2.5 * (8.0f64 / 3.0).ln();
        assert!(
            (lp - expected).abs() < 1e-12,
            "Expected log-density {expected}, got {lp}."
        );
    }

    #[test]
    fn iso_gauss_initial_sample_matches_its_own_scale() {
        let distr = IsotropicGaussian::new(2.0, 1000);
        let mut rng = SmallRng::seed_from_u64(42);
        let draw = distr.initial_sample(&mut rng).unwrap();
        assert_eq!(draw.len(), 1000);

        let n = draw.len() as f64;
        let mean = draw.iter().sum::<f64>() / n;
        let var = draw.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
        assert!(
            mean.abs() < 0.25,
            "Empirical mean {mean} deviates too much from 0."
        );
        assert!(
            (3.2..4.9).contains(&var),
            "Empirical variance {var} deviates too much from 4."
        );
    }

    #[test]
    fn diag_gauss_initial_sample_stays_near_its_mean() {
        let distr = DiagGaussian::new(vec![5.0, -5.0], vec![0.01, 0.01]);
        let mut rng = SmallRng::seed_from_u64(42);
        let draw = distr.initial_sample(&mut rng).unwrap();
        assert!(
            (draw[0] - 5.0).abs() < 0.1 && (draw[1] + 5.0).abs() < 0.1,
            "Expected a draw near the mean, got {draw:?}."
        );
    }

    #[test]
    fn student_t_has_no_initial_sample() {
        let distr: IsotropicStudentT<f64> = IsotropicStudentT::new(1.0, 3);
        let mut rng = SmallRng::seed_from_u64(42);
        assert_eq!(
            distr.initial_sample(&mut rng).unwrap_err(),
            SliceError::MissingInitialPosition
        );
    }
}
