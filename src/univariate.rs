/*!
# Univariate Slice Sampling Kernels

This module implements the three interval-building schemes of univariate slice
sampling (Neal, 2003) behind one shared shrinkage loop:

- [`Slice`]: a fixed window placed uniformly at random around the current point.
- [`SliceSteppingOut`]: the window is grown outwards in whole-window steps
  until both ends leave the slice (scheme 3).
- [`SliceDoublingOut`]: the window is repeatedly doubled towards a randomly
  chosen side (scheme 4), with the matching reverse-reachability acceptance
  test.

All three implement the [`UnivariateSlice`] trait, which is what the
multivariate embeddings in [`crate::gibbs`] and [`crate::hit_and_run`] consume,
and all three implement [`Sampler`](crate::core::Sampler) directly for
one-dimensional targets.

## Overview

One update draws a threshold `logy = log_density(x0) + ln(u)`, builds a search
interval around `x0` with the kernel's scheme, and then repeatedly proposes a
uniform point in the interval, accepting as soon as the point lies in the slice
(`logy < g(candidate)`), otherwise shrinking the interval towards `x0`. Points
whose log-density evaluates to NaN or negative infinity fail the strict
comparison and are rejected like any other out-of-slice point.

Each proposal and each interval-construction evaluation counts against the
kernel's proposal budget; an exhausted budget fails the transition with
[`SliceError::MaxProposalsExceeded`] instead of looping forever.

## Example Usage

```rust
use num_traits::Float;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::univariate::SliceSteppingOut;

let target = IsotropicGaussian::new(1.0, 1);
let kernel = SliceSteppingOut::new(2.0).set_max_proposals(10_000);

let mut rng = SmallRng::seed_from_u64(42);
let (_, mut state) = kernel
    .initialize(&mut rng, &target, Some(vec![0.0]))
    .unwrap();
for _ in 0..100 {
    let (transition, next) = kernel.advance(&mut rng, &target, state).unwrap();
    assert!(transition.log_density.is_finite());
    state = next;
}
```
*/

use num_traits::Float;
use rand::Rng;

use crate::core::{
    check_dimension, init_position, ChainState, Component, Sampler, SliceError, Target,
    Transition,
};

/// The interval-building scheme of a univariate slice sampling kernel.
///
/// Implementations only decide how the initial search interval is placed (and,
/// for doubling, whether an in-slice candidate is reachable in reverse); the
/// surrounding threshold/propose/shrink loop lives in
/// [`slice_sampling_univariate`].
pub trait UnivariateSlice<T: Float> {
    /// Proposal budget for one update of one component.
    fn max_proposals(&self) -> u64;

    /// Builds the initial search interval around `x0` under the threshold
    /// `logy`, returning `(lo, hi, n_evals)` with `lo <= x0 <= hi` and the
    /// number of log-density evaluations spent on interval construction.
    fn find_interval<R, G>(&self, rng: &mut R, g: &mut G, logy: T, x0: T) -> (T, T, u64)
    where
        R: Rng,
        G: FnMut(T) -> T,
        rand_distr::Standard: rand_distr::Distribution<T>;

    /// Additional acceptance test for a candidate already known to lie in the
    /// slice. `lo` and `hi` are the interval as returned by
    /// [`UnivariateSlice::find_interval`], before any shrinkage.
    fn is_acceptable<G>(&self, _g: &mut G, _logy: T, _x0: T, _candidate: T, _lo: T, _hi: T) -> bool
    where
        G: FnMut(T) -> T,
    {
        true
    }
}

/**
Runs one univariate slice sampling update along an arbitrary one-dimensional
restriction `g` of a target density.

`log_density` must equal `g(x0)`; passing the cached value saves one
evaluation per update. On success returns the accepted point, its log-density
and the number of proposals spent (interval-construction evaluations
included), so callers can thread the cache and the diagnostics onward.

`component` only labels the [`SliceError::MaxProposalsExceeded`] error if the
budget runs out.

This is the primitive the multivariate embeddings are built from; most callers
want the [`Sampler`](crate::core::Sampler) impls instead.
*/
pub fn slice_sampling_univariate<T, K, G, R>(
    rng: &mut R,
    kernel: &K,
    g: &mut G,
    log_density: T,
    x0: T,
    component: Component,
) -> Result<(T, T, u64), SliceError>
where
    T: Float,
    K: UnivariateSlice<T>,
    G: FnMut(T) -> T,
    R: Rng,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    let u: T = rng.gen();
    let logy = log_density + u.ln();

    let (lo0, hi0, n_evals) = kernel.find_interval(rng, g, logy, x0);
    let (mut lo, mut hi) = (lo0, hi0);
    let mut n_proposals = n_evals;

    loop {
        let u: T = rng.gen();
        let candidate = lo + u * (hi - lo);
        let log_candidate = g(candidate);
        n_proposals += 1;

        if logy < log_candidate && kernel.is_acceptable(g, logy, x0, candidate, lo0, hi0) {
            return Ok((candidate, log_candidate, n_proposals));
        }
        if n_proposals >= kernel.max_proposals() {
            return Err(SliceError::MaxProposalsExceeded {
                component,
                n_proposals,
            });
        }
        if candidate < x0 {
            lo = candidate;
        } else {
            hi = candidate;
        }
    }
}

/**
Fixed-window slice sampling (Neal, 2003, scheme 2).

The search interval is a window of fixed width placed uniformly at random
around the current point; no log-density evaluations are spent on interval
construction. Cheap, but the window has to be sized to the target by hand.

# Examples

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::univariate::Slice;

let kernel = Slice::new(2.0);
let target = IsotropicGaussian::new(1.0, 1);
let mut rng = SmallRng::seed_from_u64(1);

let (_, state) = kernel.initialize(&mut rng, &target, Some(vec![0.5])).unwrap();
let (transition, _) = kernel.advance(&mut rng, &target, state).unwrap();
assert_eq!(transition.info.num_proposals.len(), 1);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice<T> {
    /// Width of the search window.
    pub window: T,
    /// Proposal budget per update.
    pub max_proposals: u64,
}

impl<T: Float> Slice<T> {
    /// Creates a fixed-window kernel with an unbounded proposal budget.
    ///
    /// # Panics
    ///
    /// Panics if `window` is not strictly positive.
    pub fn new(window: T) -> Self {
        assert!(
            window > T::zero(),
            "Expected a strictly positive window width."
        );
        Self {
            window,
            max_proposals: u64::MAX,
        }
    }

    /// Replaces the proposal budget.
    pub fn set_max_proposals(mut self, max_proposals: u64) -> Self {
        self.max_proposals = max_proposals;
        self
    }
}

impl<T: Float> UnivariateSlice<T> for Slice<T> {
    fn max_proposals(&self) -> u64 {
        self.max_proposals
    }

    fn find_interval<R, G>(&self, rng: &mut R, _g: &mut G, _logy: T, x0: T) -> (T, T, u64)
    where
        R: Rng,
        G: FnMut(T) -> T,
        rand_distr::Standard: rand_distr::Distribution<T>,
    {
        let u: T = rng.gen();
        let lo = x0 - self.window * u;
        (lo, lo + self.window, 0)
    }
}

/**
Slice sampling with stepping-out interval construction (Neal, 2003, scheme 3).

The initial window is grown outwards in whole-window steps until both ends lie
outside the slice, each side independently limited to `max_stepping_out`
expansions (32 by default). Robust to a window chosen too small, at the price
of extra log-density evaluations.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceSteppingOut<T> {
    /// Width of the initial search window and of each expansion step.
    pub window: T,
    /// Maximum number of expansions per side.
    pub max_stepping_out: u64,
    /// Proposal budget per update.
    pub max_proposals: u64,
}

impl<T: Float> SliceSteppingOut<T> {
    /// Creates a stepping-out kernel with at most 32 expansions per side and
    /// an unbounded proposal budget.
    ///
    /// # Panics
    ///
    /// Panics if `window` is not strictly positive.
    pub fn new(window: T) -> Self {
        assert!(
            window > T::zero(),
            "Expected a strictly positive window width."
        );
        Self {
            window,
            max_stepping_out: 32,
            max_proposals: u64::MAX,
        }
    }

    /// Replaces the per-side expansion limit.
    pub fn set_max_stepping_out(mut self, max_stepping_out: u64) -> Self {
        self.max_stepping_out = max_stepping_out;
        self
    }

    /// Replaces the proposal budget.
    pub fn set_max_proposals(mut self, max_proposals: u64) -> Self {
        self.max_proposals = max_proposals;
        self
    }
}

impl<T: Float> UnivariateSlice<T> for SliceSteppingOut<T> {
    fn max_proposals(&self) -> u64 {
        self.max_proposals
    }

    fn find_interval<R, G>(&self, rng: &mut R, g: &mut G, logy: T, x0: T) -> (T, T, u64)
    where
        R: Rng,
        G: FnMut(T) -> T,
        rand_distr::Standard: rand_distr::Distribution<T>,
    {
        let u: T = rng.gen();
        let mut lo = x0 - self.window * u;
        let mut hi = lo + self.window;
        let mut n_evals = 0;

        // A NaN evaluation fails the `>` comparison and stops the expansion.
        let mut remaining = self.max_stepping_out;
        while remaining > 0 {
            n_evals += 1;
            if g(lo) > logy {
                lo = lo - self.window;
                remaining -= 1;
            } else {
                break;
            }
        }
        let mut remaining = self.max_stepping_out;
        while remaining > 0 {
            n_evals += 1;
            if g(hi) > logy {
                hi = hi + self.window;
                remaining -= 1;
            } else {
                break;
            }
        }
        (lo, hi, n_evals)
    }
}

/**
Slice sampling with doubling-out interval construction (Neal, 2003, scheme 4).

The initial window is repeatedly doubled towards a side chosen by a fair coin
until both ends lie outside the slice, up to `max_doubling_out` doublings
(8 by default). Reaches far tails in logarithmically many evaluations, but
every in-slice candidate has to pass a reverse-reachability test: walking the
doubling sequence backwards by splitting at midpoints, the candidate is
rejected if it sits across a midpoint whose half-interval has both ends
outside the slice, since the reverse chain could then never have doubled out
to the current point.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceDoublingOut<T> {
    /// Width of the initial search window.
    pub window: T,
    /// Maximum number of doublings.
    pub max_doubling_out: u64,
    /// Proposal budget per update.
    pub max_proposals: u64,
}

impl<T: Float> SliceDoublingOut<T> {
    /// Creates a doubling-out kernel with at most 8 doublings and an
    /// unbounded proposal budget.
    ///
    /// # Panics
    ///
    /// Panics if `window` is not strictly positive.
    pub fn new(window: T) -> Self {
        assert!(
            window > T::zero(),
            "Expected a strictly positive window width."
        );
        Self {
            window,
            max_doubling_out: 8,
            max_proposals: u64::MAX,
        }
    }

    /// Replaces the doubling limit.
    pub fn set_max_doubling_out(mut self, max_doubling_out: u64) -> Self {
        self.max_doubling_out = max_doubling_out;
        self
    }

    /// Replaces the proposal budget.
    pub fn set_max_proposals(mut self, max_proposals: u64) -> Self {
        self.max_proposals = max_proposals;
        self
    }
}

impl<T: Float> UnivariateSlice<T> for SliceDoublingOut<T> {
    fn max_proposals(&self) -> u64 {
        self.max_proposals
    }

    fn find_interval<R, G>(&self, rng: &mut R, g: &mut G, logy: T, x0: T) -> (T, T, u64)
    where
        R: Rng,
        G: FnMut(T) -> T,
        rand_distr::Standard: rand_distr::Distribution<T>,
    {
        let u: T = rng.gen();
        let mut lo = x0 - self.window * u;
        let mut hi = lo + self.window;
        let mut log_lo = g(lo);
        let mut log_hi = g(hi);
        let mut n_evals = 2;

        let mut remaining = self.max_doubling_out;
        while remaining > 0 && (log_lo > logy || log_hi > logy) {
            if rng.gen::<bool>() {
                lo = lo - (hi - lo);
                log_lo = g(lo);
            } else {
                hi = hi + (hi - lo);
                log_hi = g(hi);
            }
            n_evals += 1;
            remaining -= 1;
        }
        (lo, hi, n_evals)
    }

    fn is_acceptable<G>(&self, g: &mut G, logy: T, x0: T, candidate: T, lo: T, hi: T) -> bool
    where
        G: FnMut(T) -> T,
    {
        let two = T::from(2.0).unwrap();
        // 1.1 rather than 1.0 guards against the split interval landing a
        // rounding error short of the original window.
        let guard = T::from(1.1).unwrap() * self.window;
        let (mut lo, mut hi) = (lo, hi);
        let mut crossed = false;

        while hi - lo > guard {
            let mid = (lo + hi) / two;
            if (x0 < mid && candidate >= mid) || (x0 >= mid && candidate < mid) {
                crossed = true;
            }
            if candidate < mid {
                hi = mid;
            } else {
                lo = mid;
            }
            if crossed && logy >= g(lo) && logy >= g(hi) {
                return false;
            }
        }
        true
    }
}

fn univariate_initialize<T, D, R>(
    rng: &mut R,
    target: &D,
    initial: Option<Vec<T>>,
) -> Result<(Transition<T>, ChainState<T>), SliceError>
where
    T: Float,
    D: Target<T>,
    R: Rng,
{
    if target.dimension() != 1 {
        return Err(SliceError::DimensionMismatch {
            expected: 1,
            got: target.dimension(),
        });
    }
    let position = init_position(rng, target, initial)?;
    let state = ChainState::new(target, position)?;
    Ok((state.transition(Vec::new()), state))
}

fn univariate_advance<T, D, K, R>(
    kernel: &K,
    rng: &mut R,
    target: &D,
    state: ChainState<T>,
) -> Result<(Transition<T>, ChainState<T>), SliceError>
where
    T: Float,
    D: Target<T>,
    K: UnivariateSlice<T>,
    R: Rng,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    check_dimension(target, &state.position)?;
    let x0 = state.position[0];
    let mut g = |x: T| target.log_density(&[x]);
    let (x1, log_density, n_proposals) = slice_sampling_univariate(
        rng,
        kernel,
        &mut g,
        state.log_density,
        x0,
        Component::Coordinate(0),
    )?;
    let state = ChainState {
        position: vec![x1],
        log_density,
    };
    Ok((state.transition(vec![n_proposals]), state))
}

impl<T, D> Sampler<T, D> for Slice<T>
where
    T: Float,
    D: Target<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type State = ChainState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_initialize(rng, target, initial)
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_advance(self, rng, target, state)
    }
}

impl<T, D> Sampler<T, D> for SliceSteppingOut<T>
where
    T: Float,
    D: Target<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type State = ChainState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_initialize(rng, target, initial)
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_advance(self, rng, target, state)
    }
}

impl<T, D> Sampler<T, D> for SliceDoublingOut<T>
where
    T: Float,
    D: Target<T>,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type State = ChainState<T>;

    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_initialize(rng, target, initial)
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        univariate_advance(self, rng, target, state)
    }
}
