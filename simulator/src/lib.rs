//! Forward simulation of point sources on a CCD
//!
//! This crate renders synthetic frames by integrating analytic point spread
//! functions over each pixel's footprint and accumulating the result on a
//! [`photometry::Grid`], which can then be measured with the `photometry`
//! crate.

pub mod ccd;
pub mod integrate;
pub mod noise;
pub mod psf;
pub mod shared_args;

// Re-exports for easier access
pub use ccd::{index_frame_center, CcdError, PointSource, SyntheticCcd, DEFAULT_WINDOW_RADIUS};
pub use integrate::{integrate, integrate_2d, IntegrationError, IntegrationTolerance};
pub use psf::{Profile, Psf, PsfError, RadialProfile};
