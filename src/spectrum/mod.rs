//! Observed count spectra and their presentation in energy or wavelength.

pub mod group;
pub mod units;

pub use group::{group_counts, GroupMethod};
pub use units::{SpectralUnit, CONST_HC};

use crate::data::model::{Column, Extension, TableFile};
use crate::error::{ResponseError, Result};
use units::invert_bins;

pub const SPECTRUM_EXTENSION: &str = "SPECTRUM";
/// Exposure assumed when a spectrum file does not state one.
pub const DEFAULT_EXPOSURE: f64 = 1.0;

/// A binned count spectrum as read from a spectrum file.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub bin_lo: Vec<f64>,
    pub bin_hi: Vec<f64>,
    /// Unit tag of the bin edges, propagated from the `BIN_LO` column.
    pub bin_unit: Option<String>,
    pub counts: Vec<f64>,
    pub channel: Option<Vec<i64>>,
    pub exposure_seconds: f64,
    /// Associated redistribution matrix file (`RESPFILE`).
    pub respfile: Option<String>,
    /// Associated effective-area file (`ANCRFILE`).
    pub ancrfile: Option<String>,
}

/// Bins and counts expressed in a requested unit, without touching the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumView {
    pub unit: SpectralUnit,
    pub lo: Vec<f64>,
    pub hi: Vec<f64>,
    pub mid: Vec<f64>,
    pub counts: Vec<f64>,
}

impl Spectrum {
    /// Read the `SPECTRUM` extension, or the first extension when the file
    /// does not name one that way.
    pub fn from_table(file: &TableFile) -> Result<Self> {
        let ext = file
            .extension(SPECTRUM_EXTENSION)
            .or_else(|| file.first())
            .ok_or_else(|| ResponseError::MissingExtension {
                tried: vec![SPECTRUM_EXTENSION.to_string()],
            })?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &Extension) -> Result<Self> {
        let bin_lo_col = ext.column("BIN_LO")?;
        let spectrum = Spectrum {
            bin_lo: bin_lo_col.to_f64()?,
            bin_hi: ext.column("BIN_HI")?.to_f64()?,
            bin_unit: bin_lo_col.unit.clone(),
            counts: ext.column("COUNTS")?.to_f64()?,
            channel: ext
                .has_column("CHANNEL")
                .then(|| ext.column("CHANNEL").and_then(Column::to_i64))
                .transpose()?,
            exposure_seconds: ext.keyword_f64("EXPOSURE").unwrap_or(DEFAULT_EXPOSURE),
            respfile: file_keyword(ext, "RESPFILE"),
            ancrfile: file_keyword(ext, "ANCRFILE"),
        };

        let n = spectrum.counts.len();
        for len in [spectrum.bin_lo.len(), spectrum.bin_hi.len()] {
            if len != n {
                return Err(ResponseError::shape_mismatch(format!(
                    "{n} COUNTS values but {len} bin edges"
                )));
            }
        }
        Ok(spectrum)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn bin_mid(&self) -> Vec<f64> {
        midpoints(&self.bin_lo, &self.bin_hi)
    }

    /// The spectrum's current unit, parsed from its unit tag.
    pub fn unit(&self) -> Result<SpectralUnit> {
        self.bin_unit.as_deref().unwrap_or("").parse()
    }

    /// Bins and counts in `unit`, leaving `self` untouched.
    pub fn in_units(&self, unit: SpectralUnit) -> Result<SpectrumView> {
        let current = self.unit()?;
        let (lo, hi, counts) = if current == unit {
            (self.bin_lo.clone(), self.bin_hi.clone(), self.counts.clone())
        } else {
            let converted = invert_bins(&self.bin_lo, &self.bin_hi, &self.counts);
            (converted.lo, converted.hi, converted.values)
        };
        Ok(SpectrumView {
            unit,
            mid: midpoints(&lo, &hi),
            lo,
            hi,
            counts,
        })
    }

    /// Convert the spectrum to `unit` in place. A no-op when already there.
    pub fn hard_set_units(&mut self, unit: SpectralUnit) -> Result<()> {
        let current = self.unit()?;
        if current == unit {
            return Ok(());
        }

        let converted = invert_bins(&self.bin_lo, &self.bin_hi, &self.counts);
        self.bin_lo = converted.lo;
        self.bin_hi = converted.hi;
        self.counts = converted.values;
        if converted.reversed {
            if let Some(channel) = &mut self.channel {
                channel.reverse();
            }
        }
        self.bin_unit = Some(unit.as_str().to_string());
        log::debug!("spectrum converted from {current} to {unit}");
        Ok(())
    }

    /// Combine counts over channel groups.
    pub fn group_counts(&self, grouping: &[i32], method: GroupMethod) -> Result<Vec<f64>> {
        group::group_counts(&self.counts, grouping, method)
    }
}

fn midpoints(lo: &[f64], hi: &[f64]) -> Vec<f64> {
    lo.iter().zip(hi).map(|(l, h)| 0.5 * (l + h)).collect()
}

/// File-name keyword; `none` and empty values mean "no file".
fn file_keyword(ext: &Extension, key: &str) -> Option<String> {
    ext.keyword_str(key)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}
