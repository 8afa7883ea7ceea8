use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rusty_fold::models::Powerlaw;
use rusty_fold::Observation;

/// Fold a power-law source through an observation's response and print
/// predicted counts per channel as CSV.
#[derive(Parser, Debug)]
#[command(name = "rusty-fold", version)]
struct Args {
    /// Spectrum file (json, csv or parquet); RESPFILE/ANCRFILE resolve next to it.
    spectrum: PathBuf,

    /// Power-law normalisation at 1 keV.
    #[arg(default_value_t = 1.0)]
    norm: f64,

    /// Power-law photon index.
    #[arg(default_value_t = 2.0)]
    phoindex: f64,

    /// Exposure override in seconds; falls back to the ARF's EXPOSURE.
    exposure: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let obs = Observation::load(&args.spectrum)?;
    let model = Powerlaw::new(args.norm, args.phoindex);
    let counts = obs
        .predict(&model, args.exposure)
        .context("folding power law through the response")?;

    log::info!(
        "folded power law (norm {}, index {}): {:.4} total counts",
        args.norm,
        args.phoindex,
        counts.iter().sum::<f64>()
    );

    let offset = obs.rmf.channel_offset();
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["channel", "counts"])?;
    for (i, c) in counts.iter().enumerate() {
        writer.write_record([(i as i64 + offset).to_string(), c.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
