//! Effective area (ARF): a per-bin multiplicative sensitivity curve.

use crate::data::model::{Extension, TableFile};
use crate::error::{ResponseError, Result};

pub const SPECRESP_EXTENSION: &str = "SPECRESP";

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveArea {
    pub energy_lo: Vec<f64>,
    pub energy_hi: Vec<f64>,
    pub energy_unit: Option<String>,
    /// Effective area per bin.
    pub response_values: Vec<f64>,
    /// `EXPOSURE` keyword, when the file states one.
    pub exposure_seconds: Option<f64>,
}

impl EffectiveArea {
    pub fn from_table(file: &TableFile) -> Result<Self> {
        let ext = file.extension_any(&[SPECRESP_EXTENSION])?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &Extension) -> Result<Self> {
        let energ_lo = ext.column("ENERG_LO")?;
        let arf = EffectiveArea {
            energy_lo: energ_lo.to_f64()?,
            energy_hi: ext.column("ENERG_HI")?.to_f64()?,
            energy_unit: energ_lo.unit.clone(),
            response_values: ext.column("SPECRESP")?.to_f64()?,
            exposure_seconds: ext.keyword_f64("EXPOSURE"),
        };

        let n = arf.response_values.len();
        for len in [arf.energy_lo.len(), arf.energy_hi.len()] {
            if len != n {
                return Err(ResponseError::shape_mismatch(format!(
                    "{n} SPECRESP values but {len} energy edges"
                )));
            }
        }
        log::debug!(
            "loaded ARF: {n} bins, exposure {:?}",
            arf.exposure_seconds
        );
        Ok(arf)
    }

    /// Multiply `mflux` by the effective area, then by an exposure.
    ///
    /// `exposure` overrides the stored `EXPOSURE`; with neither, the result is
    /// an unscaled count rate.
    pub fn apply_arf(&self, mflux: &[f64], exposure: Option<f64>) -> Result<Vec<f64>> {
        if mflux.len() != self.response_values.len() {
            return Err(ResponseError::dimension_mismatch(
                self.response_values.len(),
                mflux.len(),
            ));
        }

        let rate = mflux.iter().zip(&self.response_values).map(|(f, a)| f * a);
        Ok(match exposure.or(self.exposure_seconds) {
            Some(t) => rate.map(|r| r * t).collect(),
            None => rate.collect(),
        })
    }

    pub fn num_bins(&self) -> usize {
        self.response_values.len()
    }
}
