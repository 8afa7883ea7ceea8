//! Photon flux models evaluated on an energy grid.

pub mod powerlaw;

pub use powerlaw::Powerlaw;

use crate::error::Result;

/// A source model producing one integrated flux value per energy bin.
pub trait FluxModel {
    fn calculate(&self, energy_lo: &[f64], energy_hi: &[f64]) -> Result<Vec<f64>>;
}
