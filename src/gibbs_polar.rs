/*!
# Gibbsian Polar Slice Sampling

Implements the Gibbsian polar slice sampler of Schär, Habeck & Rudolf (2023).
Each step decomposes the position into a radius `r = ‖x‖` and a direction
`θ = x/r`, draws one slice threshold under the polar density
`ρ(x) = ‖x‖^(d-1) · π(x)`, and then runs a blocked Gibbs sweep over the two
polar components:

1. a new direction by geodesic shrinkage on a uniformly random great circle
   through `θ`, at the current radius,
2. a new radius by stepping-out and shrinkage on the half-line, seeded with a
   window of width `w` along the accepted direction.

The `‖x‖^(d-1)` factor is the Jacobian of the polar decomposition, so the
sweep leaves the target invariant while mixing well on targets whose scale
varies strongly with direction, heavy tails included.

The sampler requires `d >= 2` and is degenerate at the origin: `ρ(0) = 0`, so
a zero radius can never be accepted and `‖x‖ > 0` is preserved from any valid
starting point. Starting at (or within `1e-5` of) the origin is reported with
a warning; a chain truly stuck there fails once the proposal budget runs out.

# Example Usage

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::Sampler;
use slice_mcmc::distributions::IsotropicGaussian;
use slice_mcmc::gibbs_polar::GibbsPolarSlice;

let target = IsotropicGaussian::new(1.0, 3);
let sampler = GibbsPolarSlice::new(5.0);

let mut rng = SmallRng::seed_from_u64(42);
let (_, mut state) = sampler
    .initialize(&mut rng, &target, Some(vec![1.0, 1.0, 1.0]))
    .unwrap();
for _ in 0..50 {
    let (transition, next) = sampler.advance(&mut rng, &target, state).unwrap();
    assert_eq!(transition.info.num_proposals.len(), 2);
    state = next;
}
```
*/

use num_traits::{Float, ToPrimitive};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::{
    check_dimension, init_position, ChainState, Component, Sampler, SliceError, Target,
    Transition,
};

fn l2_norm<T: Float>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt()
}

/// Draws a unit vector orthogonal to `theta`, uniformly among such vectors,
/// by orthogonalizing a standard Gaussian draw. Together with `theta` it
/// spans a uniformly random great circle through `theta`.
fn orthonormal_partner<T, R>(rng: &mut R, theta: &[T]) -> Vec<T>
where
    T: Float,
    R: Rng,
    StandardNormal: rand_distr::Distribution<T>,
{
    loop {
        let mut partner: Vec<T> = (0..theta.len()).map(|_| rng.sample(StandardNormal)).collect();
        let dot = partner
            .iter()
            .zip(theta)
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
        // A non-finite dot product means theta itself is degenerate; keep the
        // raw Gaussian draw so the caller can burn its budget instead of
        // spinning here forever.
        if dot.is_finite() {
            for (a, &b) in partner.iter_mut().zip(theta) {
                *a = *a - dot * b;
            }
        }
        let norm = l2_norm(&partner);
        if norm > T::zero() && norm.is_finite() {
            for a in partner.iter_mut() {
                *a = *a / norm;
            }
            return partner;
        }
    }
}

/// The Gibbsian polar slice sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GibbsPolarSlice<T> {
    /// Initial window width for the radius shrinkage procedure.
    pub w: T,
    /// Proposal budget for each of the direction and radius updates.
    pub max_proposals: u64,
}

impl<T: Float> GibbsPolarSlice<T> {
    /// Creates a polar slice sampler with an unbounded proposal budget.
    ///
    /// # Panics
    ///
    /// Panics if `w` is not strictly positive.
    pub fn new(w: T) -> Self {
        assert!(w > T::zero(), "Expected a strictly positive window width.");
        Self {
            w,
            max_proposals: u64::MAX,
        }
    }

    /// Replaces the proposal budget.
    pub fn set_max_proposals(mut self, max_proposals: u64) -> Self {
        self.max_proposals = max_proposals;
        self
    }
}

impl<T, D> Sampler<T, D> for GibbsPolarSlice<T>
where
    T: Float + ToPrimitive,
    D: Target<T>,
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
        if target.dimension() < 2 {
            return Err(SliceError::NeedsMultivariate(target.dimension()));
        }
        let position = init_position(rng, target, initial)?;
        let norm = l2_norm(&position);
        if norm <= T::from(1e-5).unwrap() {
            log::warn!(
                "Initial position has near-zero norm {:.3e}; the polar decomposition is ill-defined there.",
                norm.to_f64().unwrap_or(f64::NAN)
            );
        }
        let state = ChainState::new(target, position)?;
        Ok((state.transition(Vec::new()), state))
    }

    fn advance<R: Rng>(
        &self,
        rng: &mut R,
        target: &D,
        state: Self::State,
    ) -> Result<(Transition<T>, Self::State), SliceError> {
        if target.dimension() < 2 {
            return Err(SliceError::NeedsMultivariate(target.dimension()));
        }
        check_dimension(target, &state.position)?;
        let dim = state.position.len();
        let dm1 = T::from(dim - 1).unwrap();

        let r = l2_norm(&state.position);
        let theta: Vec<T> = state.position.iter().map(|&x| x / r).collect();

        // One threshold under the polar density serves both updates.
        let u: T = rng.gen();
        let logt = dm1 * r.ln() + state.log_density + u.ln();

        // Direction update: shrink on the great-circle angle, evaluating
        // candidates at the current radius. Angle zero recovers the current
        // direction, so the bracket always contains an acceptable point.
        let partner = orthonormal_partner(rng, &theta);
        let two_pi = T::from(2.0 * std::f64::consts::PI).unwrap();
        let mut angle_hi: T = rng.gen::<T>() * two_pi;
        let mut angle_lo = angle_hi - two_pi;
        let log_r_term = dm1 * r.ln();
        let mut point = vec![T::zero(); dim];
        let mut n_direction = 0u64;

        let theta = loop {
            let u: T = rng.gen();
            let angle = angle_lo + u * (angle_hi - angle_lo);
            let (sin, cos) = angle.sin_cos();
            for j in 0..dim {
                point[j] = (theta[j] * cos + partner[j] * sin) * r;
            }
            let log_rho = log_r_term + target.log_density(&point);
            n_direction += 1;

            if logt < log_rho {
                break (0..dim)
                    .map(|j| theta[j] * cos + partner[j] * sin)
                    .collect::<Vec<T>>();
            }
            if n_direction >= self.max_proposals {
                return Err(SliceError::MaxProposalsExceeded {
                    component: Component::Direction,
                    n_proposals: n_direction,
                });
            }
            if angle < T::zero() {
                angle_lo = angle;
            } else {
                angle_hi = angle;
            }
        };

        // Radius update: place a window of width w around r, step it out,
        // then shrink toward r. The direction update accepted its candidate
        // at radius r, so r itself still satisfies the threshold.
        let u: T = rng.gen();
        let mut r_lo = r - u * self.w;
        let mut r_hi = r_lo + self.w;
        let mut n_radius = 0u64;

        loop {
            // ln 0 = -inf puts a zero radius outside every slice, so the
            // window never needs to extend below it.
            if r_lo <= T::zero() {
                r_lo = T::zero();
                break;
            }
            for j in 0..dim {
                point[j] = theta[j] * r_lo;
            }
            let log_rho = dm1 * r_lo.ln() + target.log_density(&point);
            n_radius += 1;
            if log_rho > logt {
                if n_radius >= self.max_proposals {
                    return Err(SliceError::MaxProposalsExceeded {
                        component: Component::Radius,
                        n_proposals: n_radius,
                    });
                }
                r_lo = r_lo - self.w;
            } else {
                break;
            }
        }
        loop {
            for j in 0..dim {
                point[j] = theta[j] * r_hi;
            }
            let log_rho = dm1 * r_hi.ln() + target.log_density(&point);
            n_radius += 1;
            if log_rho > logt {
                if n_radius >= self.max_proposals {
                    return Err(SliceError::MaxProposalsExceeded {
                        component: Component::Radius,
                        n_proposals: n_radius,
                    });
                }
                r_hi = r_hi + self.w;
            } else {
                break;
            }
        }

        let (position, log_density) = loop {
            let u: T = rng.gen();
            let r_new = r_lo + u * (r_hi - r_lo);
            for j in 0..dim {
                point[j] = theta[j] * r_new;
            }
            let log_target = target.log_density(&point);
            n_radius += 1;

            if logt < dm1 * r_new.ln() + log_target {
                break (point, log_target);
            }
            if n_radius >= self.max_proposals {
                return Err(SliceError::MaxProposalsExceeded {
                    component: Component::Radius,
                    n_proposals: n_radius,
                });
            }
            if r_new < r {
                r_lo = r_new;
            } else {
                r_hi = r_new;
            }
        };

        let state = ChainState {
            position,
            log_density,
        };
        Ok((state.transition(vec![n_direction, n_radius]), state))
    }
}
