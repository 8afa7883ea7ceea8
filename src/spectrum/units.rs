use std::fmt;
use std::str::FromStr;

use crate::error::ResponseError;

/// Energy·wavelength product, keV·Å.
pub const CONST_HC: f64 = 12.398418573430595;

/// The two spectral axes a spectrum can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralUnit {
    Kev,
    Angstrom,
}

impl SpectralUnit {
    /// Canonical unit tag as written in calibration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpectralUnit::Kev => "keV",
            SpectralUnit::Angstrom => "angs",
        }
    }

    /// Axis label for plots and reports.
    pub fn label(&self) -> &'static str {
        match self {
            SpectralUnit::Kev => "Energy (keV)",
            SpectralUnit::Angstrom => "Wavelength (angs)",
        }
    }
}

impl fmt::Display for SpectralUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectralUnit {
    type Err = ResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "keV" | "kev" | "KEV" => Ok(SpectralUnit::Kev),
            "angs" | "Angstrom" | "angstrom" | "A" => Ok(SpectralUnit::Angstrom),
            other => Err(ResponseError::UnsupportedUnit(other.to_string())),
        }
    }
}

/// Per-bin arrays after an energy↔wavelength conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedBins {
    pub lo: Vec<f64>,
    pub hi: Vec<f64>,
    pub values: Vec<f64>,
    /// Whether storage order was reversed.
    pub reversed: bool,
}

/// Map bins through `x -> CONST_HC / x`.
///
/// The relation swaps low and high edges and inverts their order, so storage
/// is reversed whenever the incoming low edges strictly increase. The check
/// runs on every call; a round trip therefore restores the original order.
pub fn invert_bins(lo: &[f64], hi: &[f64], values: &[f64]) -> ConvertedBins {
    let reversed = strictly_increasing(lo);
    let order: Vec<usize> = if reversed {
        (0..lo.len()).rev().collect()
    } else {
        (0..lo.len()).collect()
    };

    ConvertedBins {
        lo: order.iter().map(|&i| CONST_HC / hi[i]).collect(),
        hi: order.iter().map(|&i| CONST_HC / lo[i]).collect(),
        values: order.iter().map(|&i| values[i]).collect(),
        reversed,
    }
}

fn strictly_increasing(x: &[f64]) -> bool {
    x.windows(2).all(|w| w[1] > w[0])
}
