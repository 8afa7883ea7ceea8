use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::loader::load_file;
use crate::error::ResponseError;
use crate::models::FluxModel;
use crate::response::{apply_resp, EffectiveArea, ResponseMatrix};
use crate::spectrum::Spectrum;

// ---------------------------------------------------------------------------
// Unit advisories
// ---------------------------------------------------------------------------

/// Which calibration product disagrees with the spectrum's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    ResponseMatrix,
    EffectiveArea,
}

/// Non-fatal notice that a spectrum and one of its calibration products
/// carry different unit tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitAdvisory {
    pub product: Product,
    pub spectrum_unit: Option<String>,
    pub product_unit: Option<String>,
}

impl fmt::Display for UnitAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.product {
            Product::ResponseMatrix => "RMF",
            Product::EffectiveArea => "ARF",
        };
        write!(
            f,
            "{name} units ({}) and spectrum units ({}) are not the same",
            self.product_unit.as_deref().unwrap_or("none"),
            self.spectrum_unit.as_deref().unwrap_or("none")
        )
    }
}

// ---------------------------------------------------------------------------
// Observation – a spectrum with its calibration
// ---------------------------------------------------------------------------

/// A spectrum together with the response it was recorded through.
#[derive(Debug, Clone)]
pub struct Observation {
    pub spectrum: Spectrum,
    pub rmf: ResponseMatrix,
    /// Absent when the spectrum names no effective-area file.
    pub arf: Option<EffectiveArea>,
    /// Unit disagreements found when the observation was assembled.
    pub advisories: Vec<UnitAdvisory>,
}

impl Observation {
    /// Assemble an observation from already loaded parts.
    pub fn new(spectrum: Spectrum, rmf: ResponseMatrix, arf: Option<EffectiveArea>) -> Self {
        let advisories = unit_advisories(&spectrum, &rmf, arf.as_ref());
        for advisory in &advisories {
            log::warn!("{advisory}");
        }
        Self {
            spectrum,
            rmf,
            arf,
            advisories,
        }
    }

    /// Load a spectrum file and the `RESPFILE`/`ANCRFILE` it names, resolved
    /// relative to the spectrum's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let spectrum = Spectrum::from_table(&load_file(path)?)
            .with_context(|| format!("decoding spectrum {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let respfile = spectrum
            .respfile
            .as_deref()
            .context("spectrum names no RESPFILE")?;
        let rmf_path = resolve(base, respfile);
        let rmf = ResponseMatrix::from_table(&load_file(&rmf_path)?)
            .with_context(|| format!("decoding response matrix {}", rmf_path.display()))?;

        let arf = match spectrum.ancrfile.as_deref() {
            Some(ancrfile) => {
                let arf_path = resolve(base, ancrfile);
                let arf = EffectiveArea::from_table(&load_file(&arf_path)?)
                    .with_context(|| format!("decoding effective area {}", arf_path.display()))?;
                Some(arf)
            }
            None => None,
        };

        log::info!(
            "loaded {}: {} channels, {} response bins, ARF {}",
            path.display(),
            spectrum.len(),
            rmf.num_bins(),
            if arf.is_some() { "present" } else { "absent" }
        );
        Ok(Self::new(spectrum, rmf, arf))
    }

    /// Forward-model a flux vector on the response matrix grid.
    pub fn apply_resp(
        &self,
        model_flux: &[f64],
        exposure: Option<f64>,
    ) -> std::result::Result<Vec<f64>, ResponseError> {
        apply_resp(model_flux, &self.rmf, self.arf.as_ref(), exposure)
    }

    /// Evaluate `model` on the response matrix grid and fold it.
    pub fn predict<M: FluxModel>(
        &self,
        model: &M,
        exposure: Option<f64>,
    ) -> std::result::Result<Vec<f64>, ResponseError> {
        let flux = model.calculate(self.rmf.energy_lo(), self.rmf.energy_hi())?;
        self.apply_resp(&flux, exposure)
    }
}

fn resolve(base: &Path, name: &str) -> PathBuf {
    let p = Path::new(name);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn unit_advisories(
    spectrum: &Spectrum,
    rmf: &ResponseMatrix,
    arf: Option<&EffectiveArea>,
) -> Vec<UnitAdvisory> {
    let spectrum_unit = spectrum.bin_unit.as_deref();
    let mut advisories = Vec::new();

    if let Some(arf) = arf {
        if arf.energy_unit.as_deref() != spectrum_unit {
            advisories.push(UnitAdvisory {
                product: Product::EffectiveArea,
                spectrum_unit: spectrum.bin_unit.clone(),
                product_unit: arf.energy_unit.clone(),
            });
        }
    }
    if rmf.energy_unit() != spectrum_unit {
        advisories.push(UnitAdvisory {
            product: Product::ResponseMatrix,
            spectrum_unit: spectrum.bin_unit.clone(),
            product_unit: rmf.energy_unit().map(str::to_string),
        });
    }
    advisories
}
