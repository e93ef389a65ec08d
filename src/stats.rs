//! Provides functions for computing MCMC summary statistics and convergence
//! diagnostics.

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use num_traits::ToPrimitive;
use rustfft::{num_complex::Complex, FftPlanner};
use std::error::Error;

use crate::core::Transition;

/// Streaming per-chain summary: running per-coordinate mean and raw second
/// moment, plus the total proposal work reported by the transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTracker {
    n_params: usize,
    n: u64,
    n_proposals: u64,
    mean: Array1<f64>,    // n_params
    mean_sq: Array1<f64>, // n_params
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub n: u64,
    pub n_proposals: u64,
    pub mean: Array1<f64>, // n_params
    pub sm2: Array1<f64>,  // n_params
}

impl ChainTracker {
    pub fn new(n_params: usize) -> Self {
        Self {
            n_params,
            n: 0,
            n_proposals: 0,
            mean: Array1::<f64>::zeros(n_params),
            mean_sq: Array1::<f64>::zeros(n_params),
        }
    }

    pub fn step<T>(&mut self, transition: &Transition<T>) -> Result<(), Box<dyn Error>>
    where
        T: std::clone::Clone + ToPrimitive,
    {
        self.n += 1;
        self.n_proposals += transition.info.num_proposals.iter().sum::<u64>();

        let n = self.n as f64;
        let x_arr = ndarray::ArrayView1::<T>::from_shape(self.n_params, &transition.params)?
            .mapv(|x| x.to_f64().unwrap());

        self.mean = (self.mean.clone() * (n - 1.0) + x_arr.clone()) / n;
        if self.n == 1 {
            self.mean_sq = x_arr.pow2();
        } else {
            self.mean_sq = (self.mean_sq.clone() * (n - 1.0) + (x_arr.pow2())) / n;
        };

        Ok(())
    }

    pub fn sm2(&self) -> Array1<f64> {
        let n = self.n as f64;
        (self.mean_sq.clone() - self.mean.pow2()) * n / (n - 1.0)
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            n: self.n,
            n_proposals: self.n_proposals,
            mean: self.mean.clone(),
            sm2: self.sm2(),
        }
    }
}

/// Effective sample size of a single scalar chain, from the FFT
/// autocovariance with Geyer's initial monotone truncation.
///
/// Chains shorter than 4 draws are returned as-is.
pub fn ess(draws: &[f64]) -> f64 {
    let n = draws.len();
    if n < 4 {
        return n as f64;
    }

    let mean = draws.iter().sum::<f64>() / n as f64;
    let m = (2 * n).next_power_of_two();
    let mut buf: Vec<Complex<f64>> = Vec::with_capacity(m);
    buf.extend(draws.iter().map(|&x| Complex::new(x - mean, 0.0)));
    buf.resize(m, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(m).process(&mut buf);
    for v in buf.iter_mut() {
        *v = Complex::new(v.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(m).process(&mut buf);

    // rustfft scales neither transform, so the round trip gains a factor
    // of m; dividing by n on top gives the biased autocovariances.
    let acov: Vec<f64> = buf[..n]
        .iter()
        .map(|v| v.re / m as f64 / n as f64)
        .collect();
    if acov[0] <= 0.0 {
        return n as f64;
    }

    // Sum autocorrelations over Geyer pairs while the pair sums stay
    // positive and non-increasing.
    let mut tau = -1.0;
    let mut prev = f64::INFINITY;
    let mut k = 0;
    while k + 1 < n {
        let pair = (acov[k] + acov[k + 1]) / acov[0];
        if pair <= 0.0 {
            break;
        }
        let pair = pair.min(prev);
        tau += 2.0 * pair;
        prev = pair;
        k += 2;
    }

    n as f64 / tau.max(f64::EPSILON)
}

/// Per-coordinate split-R̂ of a single chain given as an `n_steps x n_params`
/// matrix: the two halves are treated as independent chains and compared via
/// the usual variance-ratio statistic. Values near 1 indicate the halves
/// agree; a common acceptance threshold is 1.05.
pub fn split_rhat(draws: &Array2<f64>) -> Result<Array1<f64>, Box<dyn Error>> {
    let n_steps = draws.nrows();
    if n_steps < 4 {
        return Err("Expected at least 4 draws to compute split-Rhat.".into());
    }
    let half = n_steps / 2;
    // An odd chain length drops the middle draw.
    let first = draws.slice(s![..half, ..]);
    let second = draws.slice(s![n_steps - half.., ..]);

    let n = half as f64;
    let mean_first = first
        .mean_axis(Axis(0))
        .ok_or("Mean reduction over the first half failed.")?;
    let mean_second = second
        .mean_axis(Axis(0))
        .ok_or("Mean reduction over the second half failed.")?;
    let within = (first.var_axis(Axis(0), 1.0) + second.var_axis(Axis(0), 1.0)) / 2.0;
    let grand = (&mean_first + &mean_second) / 2.0;
    let between = ((mean_first - &grand).pow2() + (mean_second - &grand).pow2()) * n;
    let var_plus = within.clone() * ((n - 1.0) / n) + between / n;
    Ok((var_plus / within).sqrt())
}

/// The largest per-coordinate split-R̂, for a single go/no-go check.
pub fn split_rhat_max(draws: &Array2<f64>) -> Result<f64, Box<dyn Error>> {
    let all: Array1<f64> = split_rhat(draws)?;
    let max = *all.max()?;
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransitionInfo;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    fn transition(params: Vec<f64>, num_proposals: Vec<u64>) -> Transition<f64> {
        Transition {
            params,
            log_density: 0.0,
            info: TransitionInfo { num_proposals },
        }
    }

    #[test]
    fn test_tracker_matches_hand_computed_summaries() {
        let mut tracker = ChainTracker::new(1);
        for (x, props) in [(0.0, 2), (1.0, 3), (4.0, 0), (5.0, 5)] {
            tracker.step(&transition(vec![x], vec![props])).unwrap();
        }

        let stats = tracker.stats();
        assert_eq!(stats.n, 4);
        assert_eq!(stats.n_proposals, 10);
        let mean_diff = (stats.mean[0] - 2.5).abs();
        assert!(
            mean_diff < 1e-12,
            "Expected mean 2.5, got {} (diff {mean_diff}).",
            stats.mean[0]
        );
        let sm2_diff = (stats.sm2[0] - 17.0 / 3.0).abs();
        assert!(
            sm2_diff < 1e-12,
            "Expected sample variance 17/3, got {} (diff {sm2_diff}).",
            stats.sm2[0]
        );
    }

    #[test]
    fn test_tracker_rejects_wrong_width_transitions() {
        let mut tracker = ChainTracker::new(2);
        let res = tracker.step(&transition(vec![1.0], vec![1]));
        assert!(res.is_err(), "Expected a shape error for a 1D transition.");
    }

    #[test]
    fn test_ess_of_short_chains_is_their_length() {
        assert_eq!(ess(&[1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_ess_of_iid_draws_is_near_the_sample_size() {
        let mut rng = SmallRng::seed_from_u64(42);
        let n = 2000;
        let draws: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();

        let e = ess(&draws);
        assert!(
            e > 0.5 * n as f64 && e < 2.0 * n as f64,
            "Expected ESS near {n} for iid draws, got {e}."
        );
    }

    #[test]
    fn test_ess_sees_through_repeated_blocks() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut draws = Vec::with_capacity(2000);
        for _ in 0..200 {
            let x: f64 = rng.sample(StandardNormal);
            draws.extend(std::iter::repeat(x).take(10));
        }

        let e = ess(&draws);
        let n = draws.len() as f64;
        assert!(
            e > n / 20.0 && e < n / 5.0,
            "Expected ESS near {} for 10-fold repeated draws, got {e}.",
            n / 10.0
        );
    }

    #[test]
    fn test_split_rhat_matches_hand_computed_value() {
        let draws = arr2(&[[0.0], [1.0], [4.0], [5.0]]);
        let rhat = split_rhat(&draws).unwrap();
        let expected = 16.5f64.sqrt();
        let diff = (rhat[0] - expected).abs();
        assert!(
            diff < 1e-12,
            "Expected split-Rhat {expected}, got {} (diff {diff}).",
            rhat[0]
        );
    }

    #[test]
    fn test_split_rhat_is_near_one_for_iid_draws() {
        let mut rng = SmallRng::seed_from_u64(7);
        let draws = Array2::from_shape_fn((1000, 2), |_| rng.sample(StandardNormal));
        let max = split_rhat_max(&draws).unwrap();
        assert!(
            max < 1.05,
            "Expected split-Rhat near 1 for iid draws, got {max}."
        );
    }

    #[test]
    fn test_split_rhat_flags_a_drifting_chain() {
        let draws = Array2::from_shape_fn((100, 1), |(i, _)| i as f64);
        let max = split_rhat_max(&draws).unwrap();
        assert!(
            max > 1.5,
            "Expected split-Rhat to flag a linear drift, got {max}."
        );
    }

    #[test]
    fn test_split_rhat_needs_at_least_four_draws() {
        let draws = arr2(&[[0.0], [1.0]]);
        assert!(split_rhat(&draws).is_err());
    }
}
