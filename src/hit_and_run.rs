/*!
# Hit-and-Run Embedding

Lifts any univariate kernel from [`crate::univariate`] to multivariate targets
by hit-and-run sampling: one step draws a direction uniformly from the unit
sphere and slice-samples the scalar coordinate along that line, starting from
the current point at zero.

Unlike the Gibbs embedding there is no per-coordinate configuration; a single
kernel serves every randomly drawn line. Works in any dimension, including
one.

## Example Usage

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::hit_and_run::HitAndRun;
use slice_mcmc::univariate::SliceSteppingOut;

let target = IsotropicGaussian::new(1.0, 10);
let sampler = HitAndRun::new(SliceSteppingOut::new(2.0));

let mut rng = SmallRng::seed_from_u64(42);
let (_, mut state) = sampler.initialize(&mut rng, &target, None).unwrap();
for _ in 0..50 {
    let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
    assert_eq!(transition.info.num_proposals.len(), 1);
    state = next;
}
```
*/

use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::{
    check_dimension, init_position, ChainState, Component, Sampler, SliceError, Target,
    Transition,
};
use crate::univariate::{slice_sampling_univariate, UnivariateSlice};

/// Draws a direction uniformly from the unit sphere by normalizing a standard
/// Gaussian vector, redrawing in the (measure-zero) all-zeros case.
pub(crate) fn sample_unit_sphere<T, R>(rng: &mut R, dimension: usize) -> Vec<T>
where
    T: Float,
    R: Rng,
    StandardNormal: rand_distr::Distribution<T>,
{
    loop {
        let mut direction: Vec<T> = (0..dimension).map(|_| rng.sample(StandardNormal)).collect();
        let norm = direction
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt();
        if norm > T::zero() {
            for x in direction.iter_mut() {
                *x = *x / norm;
            }
            return direction;
        }
    }
}

/// Hit-and-run sampling with a univariate slice kernel as the line update.
#[derive(Debug, Clone, PartialEq)]
pub struct HitAndRun<K> {
    /// The univariate kernel applied along each sampled line.
    pub unislice: K,
}

impl<K> HitAndRun<K> {
    /// Creates a hit-and-run sampler around the given line kernel.
    pub fn new(kernel: K) -> Self {
        Self { unislice: kernel }
    }
}

impl<T, D, K> Sampler<T, D> for HitAndRun<K>
where
    T: Float,
    D: Target<T>,
    K: UnivariateSlice<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
    rand_distr::StandardNormal: rand_distr::Distribution<T>,
{
    type State = ChainState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
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
        let dim = state.position.len();
        let direction = sample_unit_sphere(rng, dim);
        let position = state.position;

        let mut line_point = vec![T::zero(); dim];
        let (lambda, log_density, n_proposals) = {
            let mut g = |lambda: T| {
                for j in 0..dim {
                    line_point[j] = position[j] + lambda * direction[j];
                }
                target.log_density(&line_point)
            };
            slice_sampling_univariate(
                rng,
                &self.unislice,
                &mut g,
                state.log_density,
                T::zero(),
                Component::Line,
            )?
        };

        let position: Vec<T> = position
            .iter()
            .zip(direction.iter())
            .map(|(&x, &d)| x + lambda * d)
            .collect();
        let state = ChainState {
            position,
            log_density,
        };
        Ok((state.transition(vec![n_proposals]), state))
    }
}
