use super::FluxModel;
use crate::error::{ResponseError, Result};

/// Power-law photon spectrum `norm * E^-phoindex`, integrated over each bin.
///
/// `norm` is in phot cm⁻² s⁻¹ keV⁻¹ at 1 keV; the result per bin is in
/// phot cm⁻² s⁻¹.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Powerlaw {
    pub norm: f64,
    pub phoindex: f64,
}

impl Default for Powerlaw {
    fn default() -> Self {
        Self {
            norm: 1.0,
            phoindex: 2.0,
        }
    }
}

impl Powerlaw {
    pub fn new(norm: f64, phoindex: f64) -> Self {
        Self { norm, phoindex }
    }

    fn bin_integral(&self, lo: f64, hi: f64) -> f64 {
        if self.phoindex == 1.0 {
            self.norm * (hi.ln() - lo.ln())
        } else {
            let k = 1.0 - self.phoindex;
            self.norm * (hi.powf(k) - lo.powf(k)) / k
        }
    }
}

impl FluxModel for Powerlaw {
    fn calculate(&self, energy_lo: &[f64], energy_hi: &[f64]) -> Result<Vec<f64>> {
        if energy_lo.len() != energy_hi.len() {
            return Err(ResponseError::dimension_mismatch(
                energy_lo.len(),
                energy_hi.len(),
            ));
        }
        if !self.norm.is_finite() || !self.phoindex.is_finite() {
            return Err(ResponseError::InvalidModel(format!(
                "non-finite parameters norm={} phoindex={}",
                self.norm, self.phoindex
            )));
        }
        if let Some(i) = energy_lo
            .iter()
            .zip(energy_hi)
            .position(|(&lo, &hi)| !(lo > 0.0 && hi >= lo && hi.is_finite()))
        {
            return Err(ResponseError::InvalidModel(format!(
                "bin {i}: power law needs 0 < lo <= hi, got [{}, {}]",
                energy_lo[i], energy_hi[i]
            )));
        }

        Ok(energy_lo
            .iter()
            .zip(energy_hi)
            .map(|(&lo, &hi)| self.bin_integral(lo, hi))
            .collect())
    }
}
