//! Detector response folding for X-ray spectra.
//!
//! A photon flux model evaluated on an energy grid is turned into predicted
//! counts per detector channel by applying the effective area (ARF) and then
//! the redistribution matrix (RMF):
//!
//! ```text
//!  flux per bin ──► EffectiveArea::apply_arf ──► ResponseMatrix::apply_rmf ──► counts per channel
//! ```
//!
//! Calibration tables come in through [`data::load_file`], which reads the
//! columnar containers the decoders in [`response`] and [`spectrum`] consume.

pub mod data;
pub mod error;
pub mod models;
pub mod observation;
pub mod response;
pub mod spectrum;

pub use error::{ResponseError, Result};
pub use observation::{Observation, UnitAdvisory};
pub use response::{apply_resp, EffectiveArea, ResponseMatrix};
pub use spectrum::{SpectralUnit, Spectrum};
