/*!
# Latent Slice Sampling

Implements the latent slice sampler of Li & Walker (2023), a multivariate
slice sampler that augments the target with per-coordinate bracket widths `s`
and bracket centers `l`, then runs a blocked Gibbs sweep:

1. `l_i ~ Uniform(y_i - s_i/2, y_i + s_i/2)` given the position `y`,
2. `s_i = 2 |l_i - y_i| + Exponential(rate = beta)`, the complete conditional
   of a `Gamma(2, beta)` width prior,
3. a joint shrinkage update of `y` over the box with sides
   `(l_i - s_i/2, l_i + s_i/2)` under a single slice threshold.

Step 2 guarantees `y` lies inside the box of step 3, so shrinkage towards the
current position always terminates. The widths adapt themselves to the scale
of the target; `beta` sets how quickly they shrink back down.

The auxiliary variables are genuine chain state ([`LatentState`] carries them
between steps), and the marginal chain on the position alone is not
reversible. That is by construction and harmless for ergodic averages.
*/

use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma};

use crate::core::{
    check_dimension, init_position, Component, Sampler, SliceError, Target, Transition,
    TransitionInfo,
};

/**
The latent slice sampler.

# Examples

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::latent::LatentSlice;

let target = IsotropicGaussian::new(1.0, 5);
let sampler = LatentSlice::new(0.5);

let mut rng = SmallRng::seed_from_u64(42);
let (_, mut state) = sampler.initialize(&mut rng, &target, None).unwrap();
for _ in 0..50 {
    let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
    assert_eq!(transition.info.num_proposals.len(), 1);
    state = next;
}
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatentSlice<T> {
    /// Rate of the exponential tail of the width prior.
    pub beta: T,
    /// Proposal budget for the joint shrinkage update.
    pub max_proposals: u64,
}

impl<T: Float> LatentSlice<T> {
    /// Creates a latent slice sampler with an unbounded proposal budget.
    ///
    /// # Panics
    ///
    /// Panics if `beta` is not strictly positive.
    pub fn new(beta: T) -> Self {
        assert!(beta > T::zero(), "Expected a strictly positive rate beta.");
        Self {
            beta,
            max_proposals: u64::MAX,
        }
    }

    /// Replaces the proposal budget.
    pub fn set_max_proposals(mut self, max_proposals: u64) -> Self {
        self.max_proposals = max_proposals;
        self
    }
}

/// The chain state of the latent slice sampler: the position plus the latent
/// bracket geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentState<T> {
    /// The current position of the chain.
    pub position: Vec<T>,
    /// The cached target log-density at `position`.
    pub log_density: T,
    /// Per-coordinate bracket widths, strictly positive at all times.
    pub widths: Vec<T>,
    /// Per-coordinate bracket centers.
    pub centers: Vec<T>,
}

impl<T: Float> LatentState<T> {
    /// Produces the transition record for this state.
    pub fn transition(&self, num_proposals: Vec<u64>) -> Transition<T> {
        Transition {
            params: self.position.clone(),
            log_density: self.log_density,
            info: TransitionInfo { num_proposals },
        }
    }
}

impl<T, D> Sampler<T, D> for LatentSlice<T>
where
    T: Float,
    D: Target<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
    rand_distr::StandardNormal: rand_distr::Distribution<T>,
    rand_distr::Exp1: rand_distr::Distribution<T>,
    rand_distr::Open01: rand_distr::Distribution<T>,
{
    type State = LatentState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        let position = init_position(rng, target, initial)?;
        check_dimension(target, &position)?;
        let log_density = target.log_density(&position);

        // Widths start from their prior; centers start on the position.
        let gamma = Gamma::new(T::from(2.0).unwrap(), T::one() / self.beta)
            .expect("Expected width prior construction to succeed.");
        let widths: Vec<T> = (0..position.len()).map(|_| gamma.sample(rng)).collect();
        let centers = position.clone();

        let state = LatentState {
            position,
            log_density,
            widths,
            centers,
        };
        Ok((state.transition(Vec::new()), state))
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        check_dimension(target, &state.position)?;
        let dim = state.position.len();
        if state.widths.len() != dim {
            return Err(SliceError::DimensionMismatch {
                expected: dim,
                got: state.widths.len(),
            });
        }
        if state.centers.len() != dim {
            return Err(SliceError::DimensionMismatch {
                expected: dim,
                got: state.centers.len(),
            });
        }

        let position = state.position;
        let mut widths = state.widths;
        let mut centers = state.centers;
        let two = T::from(2.0).unwrap();
        let half = T::from(0.5).unwrap();

        // Blocked Gibbs: centers given widths, widths given centers, then the
        // position by joint shrinkage.
        for i in 0..dim {
            let u: T = rng.gen();
            centers[i] = position[i] - widths[i] * half + u * widths[i];
        }
        let tail = Exp::new(self.beta).expect("Expected exponential tail construction to succeed.");
        for i in 0..dim {
            // Truncated-exponential conditional of the Gamma(2, beta) prior;
            // the floor keeps the current position inside the new box.
            widths[i] = two * (centers[i] - position[i]).abs() + tail.sample(rng);
        }

        let u: T = rng.gen();
        let logy = state.log_density + u.ln();
        let mut lo: Vec<T> = (0..dim).map(|i| centers[i] - widths[i] * half).collect();
        let mut hi: Vec<T> = (0..dim).map(|i| centers[i] + widths[i] * half).collect();
        let mut candidate = vec![T::zero(); dim];
        let mut n_proposals = 0u64;

        let (position, log_density) = loop {
            for i in 0..dim {
                let u: T = rng.gen();
                candidate[i] = lo[i] + u * (hi[i] - lo[i]);
            }
            let log_candidate = target.log_density(&candidate);
            n_proposals += 1;

            if logy < log_candidate {
                break (candidate, log_candidate);
            }
            if n_proposals >= self.max_proposals {
                return Err(SliceError::MaxProposalsExceeded {
                    component: Component::Joint,
                    n_proposals,
                });
            }
            for i in 0..dim {
                if candidate[i] < position[i] {
                    lo[i] = candidate[i];
                } else {
                    hi[i] = candidate[i];
                }
            }
        };

        let state = LatentState {
            position,
            log_density,
            widths,
            centers,
        };
        Ok((state.transition(vec![n_proposals]), state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::IsotropicGaussian;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct EmptySlice;

    impl Target<f64> for EmptySlice {
        fn log_density(&self, _position: &[f64]) -> f64 {
            f64::NEG_INFINITY
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_initialize_sets_up_latent_geometry() {
        let target = IsotropicGaussian::new(1.0, 3);
        let sampler = LatentSlice::new(1.5);
        let mut rng = SmallRng::seed_from_u64(42);

        let start = vec![0.5, -1.0, 2.0];
        let (transition, state) = sampler
            .initialize(&mut rng, &target, Some(start.clone()))
            .unwrap();

        assert!(transition.info.num_proposals.is_empty());
        assert_eq!(state.centers, start);
        assert_eq!(state.widths.len(), 3);
        for (i, &s) in state.widths.iter().enumerate() {
            assert!(s > 0.0, "Expected width {i} to be positive, got {s}.");
        }
    }

    #[test]
    fn test_widths_stay_positive_and_cover_the_position() {
        let target = IsotropicGaussian::new(1.0, 4);
        let sampler = LatentSlice::new(0.5);
        let mut rng = SmallRng::seed_from_u64(7);

        let (_, mut state) = sampler
            .initialize(&mut rng, &target, Some(vec![0.0; 4]))
            .unwrap();
        for _ in 0..200 {
            let (_, next) = sampler.advance(&mut rng, &target, state).unwrap();
            for i in 0..4 {
                assert!(next.widths[i] > 0.0, "Expected width {i} to stay positive.");
                let gap = (next.centers[i] - next.position[i]).abs();
                assert!(
                    gap <= next.widths[i],
                    "Expected the bracket around center {i} to reach the position."
                );
            }
            state = next;
        }
    }

    #[test]
    fn test_cached_log_density_stays_consistent() {
        let target = IsotropicGaussian::new(2.0, 3);
        let sampler = LatentSlice::new(1.0);
        let mut rng = SmallRng::seed_from_u64(11);

        let (_, mut state) = sampler
            .initialize(&mut rng, &target, Some(vec![1.0, 2.0, 3.0]))
            .unwrap();
        for _ in 0..100 {
            let (_, next) = sampler.advance(&mut rng, &target, state).unwrap();
            assert_abs_diff_eq!(
                next.log_density,
                target.log_density(&next.position),
                epsilon = 1e-10
            );
            state = next;
        }
    }

    #[test]
    fn test_budget_exhaustion_is_a_joint_failure() {
        let sampler = LatentSlice::new(1.0).set_max_proposals(9);
        let mut rng = SmallRng::seed_from_u64(3);
        let (_, state) = sampler
            .initialize(&mut rng, &EmptySlice, Some(vec![0.0, 0.0]))
            .unwrap();
        let res = sampler.advance(&mut rng, &EmptySlice, state);
        assert_eq!(
            res.unwrap_err(),
            SliceError::MaxProposalsExceeded {
                component: Component::Joint,
                n_proposals: 9,
            }
        );
    }

    #[test]
    fn test_matches_standard_normal_moments() {
        let target = IsotropicGaussian::new(1.0, 1);
        let sampler = LatentSlice::new(0.5);
        let mut rng = SmallRng::seed_from_u64(42);

        let (_, mut state) = sampler
            .initialize(&mut rng, &target, Some(vec![0.0]))
            .unwrap();
        let n_steps = 4000;
        let mut draws = Vec::with_capacity(n_steps);
        for _ in 0..n_steps {
            let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
            draws.push(transition.params[0]);
            state = next;
        }

        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let var = draws.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
        assert!(
            mean.abs() < 0.15,
            "Empirical mean {mean} deviates too much from 0."
        );
        assert!(
            (0.75..1.35).contains(&var),
            "Empirical variance {var} deviates too much from 1."
        );
    }

    #[test]
    fn test_fixed_seed_chains_are_reproducible() {
        let target = IsotropicGaussian::new(1.0, 3);
        let sampler = LatentSlice::new(1.0);

        let run = |seed: u64| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let (_, mut state) = sampler
                .initialize(&mut rng, &target, Some(vec![0.0; 3]))
                .unwrap();
            let mut draws = Vec::new();
            for _ in 0..10 {
                let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
                draws.push(transition.params);
                state = next;
            }
            draws
        };

        assert_eq!(run(5), run(5), "Expected identical draws for identical seeds.");
    }
}
