/*!
# Random-Permutation Gibbs Embedding

Lifts any univariate kernel from [`crate::univariate`] to multivariate targets
by coordinate-wise Gibbs sampling: one step draws a uniformly random
permutation of the coordinates and slice-samples each full conditional in that
order, holding the other coordinates fixed.

## Overview

- Every coordinate is updated exactly once per step, in random order.
- The cached joint log-density threads through the scan, so a sweep costs only
  the evaluations the univariate kernels spend themselves.
- Coordinates may share one kernel ([`RandPermGibbs::new`]) or carry their own
  ([`RandPermGibbs::per_coordinate`]), e.g. different window widths for
  differently scaled coordinates. A per-coordinate kernel vector whose length
  differs from the target dimension fails with
  [`SliceError::KernelCountMismatch`].

## Example Usage

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::gibbs::RandPermGibbs;
use slice_mcmc::univariate::SliceSteppingOut;

let target = IsotropicGaussian::new(1.0, 3);
let sampler = RandPermGibbs::new(SliceSteppingOut::new(2.0));

let mut rng = SmallRng::seed_from_u64(42);
// No explicit start: the target draws one itself.
let (_, mut state) = sampler.initialize(&mut rng, &target, None).unwrap();
for _ in 0..50 {
    let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
    assert_eq!(transition.info.num_proposals.len(), 3);
    state = next;
}
```
*/

use num_traits::Float;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::{
    check_dimension, init_position, ChainState, Component, Sampler, SliceError, Target,
    Transition,
};
use crate::univariate::{slice_sampling_univariate, UnivariateSlice};

/// How a coordinate scan maps coordinates to univariate kernels.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateKernels<K> {
    /// One kernel shared by every coordinate.
    Single(K),
    /// One kernel per coordinate, indexed by coordinate.
    PerCoordinate(Vec<K>),
}

impl<K> CoordinateKernels<K> {
    /// The kernel responsible for coordinate `i`.
    pub fn kernel(&self, i: usize) -> &K {
        match self {
            CoordinateKernels::Single(kernel) => kernel,
            CoordinateKernels::PerCoordinate(kernels) => &kernels[i],
        }
    }

    /// Checks the kernel count against the target dimension.
    pub fn check(&self, dimension: usize) -> Result<(), SliceError> {
        match self {
            CoordinateKernels::Single(_) => Ok(()),
            CoordinateKernels::PerCoordinate(kernels) if kernels.len() == dimension => Ok(()),
            CoordinateKernels::PerCoordinate(kernels) => Err(SliceError::KernelCountMismatch {
                expected: dimension,
                got: kernels.len(),
            }),
        }
    }
}

/// Randomized-scan Gibbs sampling with univariate slice kernels as the
/// coordinate updates.
#[derive(Debug, Clone, PartialEq)]
pub struct RandPermGibbs<K> {
    /// The univariate kernel(s) applied coordinate-wise.
    pub unislice: CoordinateKernels<K>,
}

impl<K> RandPermGibbs<K> {
    /// Applies the same kernel to every coordinate.
    pub fn new(kernel: K) -> Self {
        Self {
            unislice: CoordinateKernels::Single(kernel),
        }
    }

    /// Applies `kernels[i]` to coordinate `i`. The vector length must match
    /// the target dimension.
    pub fn per_coordinate(kernels: Vec<K>) -> Self {
        Self {
            unislice: CoordinateKernels::PerCoordinate(kernels),
        }
    }
}

impl<T, D, K> Sampler<T, D> for RandPermGibbs<K>
where
    T: Float,
    D: Target<T>,
    K: UnivariateSlice<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type State = ChainState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        self.unislice.check(target.dimension())?;
        let position = init_position(rng, target, initial)?;
        let state = ChainState::new(target, position)?;
        Ok((state.transition(Vec::new()), state))
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        check_dimension(target, &state.position)?;
        self.unislice.check(state.position.len())?;

        let dim = state.position.len();
        let mut order: Vec<usize> = (0..dim).collect();
        order.shuffle(rng);

        let mut position = state.position;
        let mut log_density = state.log_density;
        let mut num_proposals = vec![0u64; dim];

        for &i in &order {
            let x0 = position[i];
            let kernel = self.unislice.kernel(i);
            let (x1, log_new, n_proposals) = {
                // The full conditional of coordinate i: write the candidate in
                // place and evaluate the joint density.
                let mut g = |x: T| {
                    position[i] = x;
                    target.log_density(&position)
                };
                slice_sampling_univariate(
                    rng,
                    kernel,
                    &mut g,
                    log_density,
                    x0,
                    Component::Coordinate(i),
                )?
            };
            position[i] = x1;
            log_density = log_new;
            num_proposals[i] = n_proposals;
        }

        let state = ChainState {
            position,
            log_density,
        };
        Ok((state.transition(num_proposals), state))
    }
}
