use std::path::Path;

use rusty_fold::data::{write_parquet, Cell, Column, Extension, HeaderValue, TableFile};
use rusty_fold::models::{FluxModel, Powerlaw};
use rusty_fold::{apply_resp, EffectiveArea, ResponseMatrix};

const N_BINS: usize = 200;
const N_CHANNELS: usize = 200;
const E_MIN: f64 = 0.3;
const E_MAX: f64 = 10.3;
/// Silicon escape peak shift, keV.
const ESCAPE_SHIFT: f64 = 1.74;
const EXPOSURE: f64 = 2.0e4;

fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Zero-based first channel and weights of a Gaussian group spanning ±4σ,
/// with the weights normalised to `fraction`.
fn channel_group(centre: f64, sigma: f64, width: f64, fraction: f64) -> Option<(usize, Vec<f64>)> {
    let lo = ((centre - 4.0 * sigma - E_MIN) / width).floor().max(0.0) as usize;
    let hi = (((centre + 4.0 * sigma - E_MIN) / width).ceil() as usize).min(N_CHANNELS);
    if lo >= hi {
        return None;
    }
    let raw: Vec<f64> = (lo..hi)
        .map(|ch| gaussian(E_MIN + (ch as f64 + 0.5) * width, centre, sigma))
        .collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some((lo, raw.iter().map(|w| fraction * w / total).collect()))
}

fn main() {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let width = (E_MAX - E_MIN) / N_BINS as f64;

    let energ_lo: Vec<f64> = (0..N_BINS).map(|i| E_MIN + i as f64 * width).collect();
    let energ_hi: Vec<f64> = energ_lo.iter().map(|e| e + width).collect();

    // Redistribution: a Gaussian photopeak, plus an escape peak above 2 keV.
    let mut n_grp = Vec::with_capacity(N_BINS);
    let mut f_chan = Vec::with_capacity(N_BINS);
    let mut n_chan = Vec::with_capacity(N_BINS);
    let mut matrix = Vec::with_capacity(N_BINS);

    for (lo, hi) in energ_lo.iter().zip(&energ_hi) {
        let centre = 0.5 * (lo + hi);
        let sigma = 0.05 * centre.sqrt();
        let mut groups = Vec::new();
        if centre > 2.0 {
            groups.extend(channel_group(centre - ESCAPE_SHIFT, sigma, width, 0.05));
            groups.extend(channel_group(centre, sigma, width, 0.95));
        } else {
            groups.extend(channel_group(centre, sigma, width, 1.0));
        }

        n_grp.push(groups.len() as f64);
        // channel numbers are one-based on disk
        let firsts: Vec<f64> = groups.iter().map(|(first, _)| (*first + 1) as f64).collect();
        let counts: Vec<f64> = groups.iter().map(|(_, w)| w.len() as f64).collect();
        let weights: Vec<f64> = groups.into_iter().flat_map(|(_, w)| w).collect();
        f_chan.push(Cell::Array(firsts));
        n_chan.push(Cell::Array(counts));
        matrix.push(Cell::Array(weights));
    }

    let rmf_ext = Extension::new("MATRIX")
        .with_keyword("DETCHANS", HeaderValue::Integer(N_CHANNELS as i64))
        .with_keyword("TLMIN4", HeaderValue::Integer(1))
        .with_column(Column::scalars("ENERG_LO", Some("keV"), &energ_lo))
        .with_column(Column::scalars("ENERG_HI", Some("keV"), &energ_hi))
        .with_column(Column::scalars("N_GRP", None, &n_grp))
        .with_column(Column::new("F_CHAN", None, f_chan))
        .with_column(Column::new("N_CHAN", None, n_chan))
        .with_column(Column::new("MATRIX", None, matrix));

    // Effective area: rising edge, broad plateau, high-energy roll-off.
    let specresp: Vec<f64> = energ_lo
        .iter()
        .zip(&energ_hi)
        .map(|(lo, hi)| {
            let e = 0.5 * (lo + hi);
            400.0 * (1.0 - (-e / 0.8).exp()) * (-e / 7.0).exp()
        })
        .collect();
    let arf_ext = Extension::new("SPECRESP")
        .with_keyword("EXPOSURE", HeaderValue::Float(EXPOSURE))
        .with_column(Column::scalars("ENERG_LO", Some("keV"), &energ_lo))
        .with_column(Column::scalars("ENERG_HI", Some("keV"), &energ_hi))
        .with_column(Column::scalars("SPECRESP", Some("cm**2"), &specresp));

    // Fold a power law and draw noisy counts.
    let rmf = ResponseMatrix::from_table(&TableFile::from_extensions(vec![rmf_ext.clone()]))
        .expect("Failed to decode generated RMF");
    let arf = EffectiveArea::from_extension(&arf_ext).expect("Failed to decode generated ARF");
    let flux = Powerlaw::new(0.01, 1.7)
        .calculate(rmf.energy_lo(), rmf.energy_hi())
        .expect("Failed to evaluate power law");
    let predicted = apply_resp(&flux, &rmf, Some(&arf), None).expect("Failed to fold model");

    let counts: Vec<f64> = predicted
        .iter()
        .map(|&mu| rng.gauss(mu, mu.sqrt()).round().max(0.0))
        .collect();
    let channel: Vec<f64> = (1..=N_CHANNELS).map(|c| c as f64).collect();
    let bin_lo: Vec<f64> = (0..N_CHANNELS).map(|c| E_MIN + c as f64 * width).collect();
    let bin_hi: Vec<f64> = bin_lo.iter().map(|e| e + width).collect();

    let spectrum_ext = Extension::new("SPECTRUM")
        .with_keyword("EXPOSURE", HeaderValue::Float(EXPOSURE))
        .with_keyword("RESPFILE", HeaderValue::String("sample_rmf.parquet".into()))
        .with_keyword("ANCRFILE", HeaderValue::String("sample_arf.parquet".into()))
        .with_column(Column::scalars("CHANNEL", None, &channel))
        .with_column(Column::scalars("BIN_LO", Some("keV"), &bin_lo))
        .with_column(Column::scalars("BIN_HI", Some("keV"), &bin_hi))
        .with_column(Column::scalars("COUNTS", None, &counts));

    for (name, ext) in [
        ("sample_rmf.parquet", &rmf_ext),
        ("sample_arf.parquet", &arf_ext),
        ("sample_spectrum.parquet", &spectrum_ext),
    ] {
        write_parquet(Path::new(name), ext).expect("Failed to write parquet file");
        log::info!("wrote {name} ({} rows)", ext.num_rows());
    }

    println!(
        "Wrote {N_BINS}-bin response, {N_CHANNELS}-channel spectrum with {} counts to sample_spectrum.parquet",
        counts.iter().sum::<f64>()
    );
}
