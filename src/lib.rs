pub mod core;
pub mod distributions;
pub mod gibbs;
pub mod gibbs_polar;
pub mod hit_and_run;
pub mod latent;
pub mod stats;
pub mod univariate;
