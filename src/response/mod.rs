//! Instrument response: effective area, redistribution and their composition.

pub mod arf;
pub mod pipeline;
pub mod rmf;

pub use arf::EffectiveArea;
pub use pipeline::apply_resp;
pub use rmf::{ChannelBounds, MatrixParts, RawMatrixRows, ResponseMatrix};
