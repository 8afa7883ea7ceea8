use super::arf::EffectiveArea;
use super::rmf::ResponseMatrix;
use crate::error::Result;

/// Forward-model a flux vector evaluated on the matrix's energy grid into
/// predicted counts per channel: effective area first (when present), then
/// redistribution.
///
/// `exposure` is passed through to [`EffectiveArea::apply_arf`]; without an
/// effective area the flux reaches the matrix unchanged.
pub fn apply_resp(
    model_flux: &[f64],
    rmf: &ResponseMatrix,
    arf: Option<&EffectiveArea>,
    exposure: Option<f64>,
) -> Result<Vec<f64>> {
    match arf {
        Some(arf) => {
            let rate = arf.apply_arf(model_flux, exposure)?;
            rmf.apply_rmf(&rate)
        }
        None => rmf.apply_rmf(model_flux),
    }
}
