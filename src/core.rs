/*!
# Core Sampling Interfaces

This module defines the two traits every sampler in this crate is built around,
[`Target`] and [`Sampler`], together with the value types that flow between
them: [`ChainState`] (the caller-owned chain state), [`Transition`] (the record
produced by one update) and [`SliceError`] (everything that can go wrong).

## Overview

- **Target Distribution (`D`)**: Provides the (unnormalized) log-density and
  the dimension of the state space via the [`Target`] trait.
- **Sampler**: A transition kernel. [`Sampler::initialize`] resolves the
  starting position and returns the initial state; [`Sampler::advance`] moves
  the chain by one step. Both return a [`Transition`] describing the step.
- **Caller-owned loop**: There is no built-in chain runner. The caller moves
  the state through `advance` as often as it likes, with whatever RNG it
  likes, which keeps runs reproducible given a seed.

## Example Usage

```rust
use num_traits::Float;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::univariate::Slice;

// A one-dimensional standard normal target.
let target = IsotropicGaussian::new(1.0, 1);

// A fixed-window slice kernel with window width 2.
let kernel = Slice::new(2.0);

let mut rng = SmallRng::seed_from_u64(42);
let (first, mut state) = kernel
    .initialize(&mut rng, &target, Some(vec![0.0]))
    .unwrap();
assert_eq!(first.params, vec![0.0]);

for _ in 0..10 {
    let (transition, next) = kernel.advance(&mut rng, &target, state).unwrap();
    assert!(transition.log_density.is_finite());
    state = next;
}
```
*/

use num_traits::Float;
use rand::Rng;
use thiserror::Error;

/// A trait for continuous target distributions from which we want to sample.
///
/// Implementations provide the log of the unnormalized density; normalizing
/// constants cancel in every acceptance test, so they may be dropped.
pub trait Target<T: Float> {
    /// Returns the log of the unnormalized density at `position`.
    ///
    /// Non-finite return values are tolerated: a candidate whose log-density
    /// evaluates to NaN or negative infinity is rejected like any other point
    /// below the slice threshold.
    fn log_density(&self, position: &[T]) -> T;

    /// The number of coordinates of the state space.
    fn dimension(&self) -> usize;

    /// Draws a starting position when the caller passes none to
    /// [`Sampler::initialize`].
    ///
    /// The default implementation fails with
    /// [`SliceError::MissingInitialPosition`]; targets that know how to draw
    /// from themselves (or from a sensible over-dispersed guess) can override
    /// it.
    fn initial_sample<R: Rng>(&self, _rng: &mut R) -> Result<Vec<T>, SliceError> {
        Err(SliceError::MissingInitialPosition)
    }
}

/**
A Markov transition kernel over states of type [`Sampler::State`].

Both methods take the target and an RNG by reference and the state by value;
the state comes back alongside the [`Transition`] record. On error the state
is dropped, so a failed chain has to be restarted from a fresh
`initialize` call.
*/
pub trait Sampler<T: Float, D: Target<T>> {
    /// The chain state threaded through consecutive calls to [`Sampler::advance`].
    type State;

    /// Resolves the starting position and returns the initial state.
    ///
    /// The position is `initial` if given, otherwise whatever
    /// [`Target::initial_sample`] produces. The returned [`Transition`] records
    /// the starting point itself and carries an empty proposal count.
    fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        initial: Option<Vec<T>>,
    ) -> Result<(Transition<T>, Self::State), SliceError>;

    /// Advances the chain by one transition.
    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError>;
}

/// The chain state shared by every kernel that carries no auxiliary variables.
///
/// `log_density` always equals the target log-density at `position`; kernels
/// maintain it so that no transition re-evaluates the current point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainState<T> {
    /// The current position of the chain.
    pub position: Vec<T>,
    /// The cached target log-density at `position`.
    pub log_density: T,
}

impl<T: Float> ChainState<T> {
    /// Builds a state at `position`, evaluating the target once.
    pub fn new<D: Target<T>>(target: &D, position: Vec<T>) -> Result<Self, SliceError> {
        check_dimension(target, &position)?;
        let log_density = target.log_density(&position);
        Ok(Self {
            position,
            log_density,
        })
    }

    /// Produces the transition record for this state.
    pub fn transition(&self, num_proposals: Vec<u64>) -> Transition<T>
    where
        T: Clone,
    {
        Transition {
            params: self.position.clone(),
            log_density: self.log_density,
            info: TransitionInfo { num_proposals },
        }
    }
}

/// The record produced by one call to [`Sampler::initialize`] or
/// [`Sampler::advance`]. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    /// The position after the transition.
    pub params: Vec<T>,
    /// The target log-density at `params`.
    pub log_density: T,
    /// Per-transition diagnostics.
    pub info: TransitionInfo,
}

/// Diagnostics attached to a [`Transition`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionInfo {
    /// Number of rejected-and-shrunk proposals per updated component: one
    /// entry per coordinate for a Gibbs scan (indexed by coordinate, not by
    /// scan order), `[direction, radius]` for the polar sampler, a single
    /// entry otherwise. Empty for the initial transition.
    pub num_proposals: Vec<u64>,
}

/// Names the part of the state a shrinkage loop was updating when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// A single coordinate of a Gibbs scan, or the sole coordinate of a
    /// univariate chain.
    Coordinate(usize),
    /// The scalar position along a hit-and-run line.
    Line,
    /// A joint update of the full position vector.
    Joint,
    /// The direction update of the polar sampler.
    Direction,
    /// The radius update of the polar sampler.
    Radius,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Coordinate(i) => write!(f, "coordinate {i}"),
            Component::Line => write!(f, "the hit-and-run line"),
            Component::Joint => write!(f, "the joint position"),
            Component::Direction => write!(f, "the direction"),
            Component::Radius => write!(f, "the radius"),
        }
    }
}

/// Everything a sampler in this crate can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// A shrinkage loop spent its whole proposal budget without accepting.
    #[error("exceeded {n_proposals} proposals while updating {component}")]
    MaxProposalsExceeded {
        component: Component,
        n_proposals: u64,
    },
    /// A per-coordinate kernel vector whose length differs from the target
    /// dimension.
    #[error("got {got} coordinate kernels for a {expected}-dimensional target")]
    KernelCountMismatch { expected: usize, got: usize },
    /// A position whose length differs from the target dimension.
    #[error("position has {got} coordinates but the target has {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    /// The polar sampler was given a target with fewer than two dimensions.
    #[error("polar slice sampling requires at least two dimensions, the target has {0}")]
    NeedsMultivariate(usize),
    /// No initial position was passed and the target provides none.
    #[error("no initial position given and the target does not provide one")]
    MissingInitialPosition,
}

/// Resolves the starting position for `initialize`: the caller's choice if
/// given, the target's own draw otherwise.
pub(crate) fn init_position<T, D, R>(
    rng: &mut R,
    target: &D,
    initial: Option<Vec<T>>,
) -> Result<Vec<T>, SliceError>
where
    T: Float,
    D: Target<T>,
    R: Rng,
{
    match initial {
        Some(position) => Ok(position),
        None => target.initial_sample(rng),
    }
}

/// Checks the `position.len() == target.dimension()` invariant.
pub(crate) fn check_dimension<T, D>(target: &D, position: &[T]) -> Result<(), SliceError>
where
    T: Float,
    D: Target<T>,
{
    if position.len() != target.dimension() {
        return Err(SliceError::DimensionMismatch {
            expected: target.dimension(),
            got: position.len(),
        });
    }
    Ok(())
}
