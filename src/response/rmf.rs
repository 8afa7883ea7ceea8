//! Redistribution matrix (RMF): decoding and folding.
//!
//! On disk the matrix is stored compactly. Each energy bin row carries
//! `N_GRP` channel groups; `F_CHAN` and `N_CHAN` give the first channel and
//! width of each group, and `MATRIX` holds one weight per channel covered.
//! A row with a single group stores bare scalars in `F_CHAN`/`N_CHAN`, a row
//! with several stores arrays. Decoding flattens all of this into four
//! sequences so the fold is a single forward pass with two cursors.

use std::ops::Range;

use crate::data::model::{integral, Cell, Extension, Header, TableFile};
use crate::error::{ResponseError, Result};

/// Extension names accepted for the redistribution table, in lookup order.
pub const MATRIX_EXTENSIONS: [&str; 2] = ["MATRIX", "SPECRESP MATRIX"];
/// Optional extension holding the energy bounds of each detector channel.
pub const EBOUNDS_EXTENSION: &str = "EBOUNDS";
/// Header keyword fragment identifying the channel offset (`TLMINn`).
pub const OFFSET_KEYWORD: &str = "TLMIN";

// ---------------------------------------------------------------------------
// Raw rows – the table as stored
// ---------------------------------------------------------------------------

/// Per-row columns of a redistribution table before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatrixRows {
    pub energy_lo: Vec<f64>,
    pub energy_hi: Vec<f64>,
    pub energy_unit: Option<String>,
    pub detector_channels: usize,
    pub header: Header,
    pub n_grp: Vec<i64>,
    pub f_chan: Vec<Cell>,
    pub n_chan: Vec<Cell>,
    pub matrix: Vec<Cell>,
}

impl RawMatrixRows {
    /// Pull the required columns and `DETCHANS` out of a matrix extension.
    pub fn from_extension(ext: &Extension) -> Result<Self> {
        let energ_lo = ext.column("ENERG_LO")?;
        let detchans = ext.keyword_i64("DETCHANS")?;
        let detector_channels =
            usize::try_from(detchans).map_err(|_| ResponseError::MissingKeyword {
                extension: ext.name.clone(),
                keyword: "DETCHANS".to_string(),
                expected: "a non-negative integer",
            })?;

        Ok(RawMatrixRows {
            energy_lo: energ_lo.to_f64()?,
            energy_hi: ext.column("ENERG_HI")?.to_f64()?,
            energy_unit: energ_lo.unit.clone(),
            detector_channels,
            header: ext.header.clone(),
            n_grp: ext.column("N_GRP")?.to_i64()?,
            f_chan: ext.column("F_CHAN")?.cells.clone(),
            n_chan: ext.column("N_CHAN")?.cells.clone(),
            matrix: ext.column("MATRIX")?.cells.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// ResponseMatrix – normalised, immutable
// ---------------------------------------------------------------------------

/// Energy bounds of each detector channel (`EBOUNDS`).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBounds {
    pub e_min: Vec<f64>,
    pub e_max: Vec<f64>,
}

/// The flattened pieces of a response matrix, validated by
/// [`ResponseMatrix::from_parts`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixParts {
    pub energy_lo: Vec<f64>,
    pub energy_hi: Vec<f64>,
    pub energy_unit: Option<String>,
    pub detector_channels: usize,
    pub channel_offset: i64,
    pub groups_per_bin: Vec<usize>,
    pub group_first_channel: Vec<i64>,
    pub group_channel_count: Vec<usize>,
    pub matrix_values: Vec<f64>,
}

/// Sparse redistribution matrix in flattened group form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMatrix {
    energy_lo: Vec<f64>,
    energy_hi: Vec<f64>,
    energy_unit: Option<String>,
    detector_channels: usize,
    channel_offset: i64,
    groups_per_bin: Vec<usize>,
    group_first_channel: Vec<i64>,
    group_channel_count: Vec<usize>,
    matrix_values: Vec<f64>,
    channel_bounds: Option<ChannelBounds>,
}

impl ResponseMatrix {
    /// Validate the length relationships between the flattened sequences.
    pub fn from_parts(parts: MatrixParts) -> Result<Self> {
        let n_bins = parts.groups_per_bin.len();
        if parts.energy_lo.len() != n_bins || parts.energy_hi.len() != n_bins {
            return Err(ResponseError::shape_mismatch(format!(
                "{n_bins} bins but {} ENERG_LO and {} ENERG_HI edges",
                parts.energy_lo.len(),
                parts.energy_hi.len()
            )));
        }
        if let Some(i) = parts
            .energy_lo
            .iter()
            .zip(&parts.energy_hi)
            .position(|(lo, hi)| lo > hi)
        {
            return Err(ResponseError::shape_mismatch(format!(
                "bin {i}: lower edge {} above upper edge {}",
                parts.energy_lo[i], parts.energy_hi[i]
            )));
        }
        if parts.group_first_channel.len() != parts.group_channel_count.len() {
            return Err(ResponseError::shape_mismatch(format!(
                "{} first channels but {} channel counts",
                parts.group_first_channel.len(),
                parts.group_channel_count.len()
            )));
        }
        let total_groups = checked_total(&parts.groups_per_bin, "groups_per_bin")?;
        if total_groups != parts.group_first_channel.len() {
            return Err(ResponseError::shape_mismatch(format!(
                "bins declare {total_groups} groups but {} were stored",
                parts.group_first_channel.len()
            )));
        }
        if let Some(g) = parts.group_channel_count.iter().position(|&n| n == 0) {
            return Err(ResponseError::shape_mismatch(format!(
                "group {g} covers zero channels"
            )));
        }
        let total_channels = checked_total(&parts.group_channel_count, "group_channel_count")?;
        if total_channels != parts.matrix_values.len() {
            return Err(ResponseError::shape_mismatch(format!(
                "groups cover {total_channels} channels but {} matrix values were stored",
                parts.matrix_values.len()
            )));
        }

        Ok(ResponseMatrix {
            energy_lo: parts.energy_lo,
            energy_hi: parts.energy_hi,
            energy_unit: parts.energy_unit,
            detector_channels: parts.detector_channels,
            channel_offset: parts.channel_offset,
            groups_per_bin: parts.groups_per_bin,
            group_first_channel: parts.group_first_channel,
            group_channel_count: parts.group_channel_count,
            matrix_values: parts.matrix_values,
            channel_bounds: None,
        })
    }

    /// Flatten raw per-row columns into a [`ResponseMatrix`].
    ///
    /// Rows with `N_GRP == 0` keep their zero in `groups_per_bin` but add
    /// nothing to the flattened sequences.
    pub fn decode(raw: RawMatrixRows) -> Result<Self> {
        let channel_offset = channel_offset(&raw.header)?;

        let n_rows = raw.n_grp.len();
        for (name, len) in [
            ("F_CHAN", raw.f_chan.len()),
            ("N_CHAN", raw.n_chan.len()),
            ("MATRIX", raw.matrix.len()),
        ] {
            if len != n_rows {
                return Err(ResponseError::shape_mismatch(format!(
                    "N_GRP has {n_rows} rows but {name} has {len}"
                )));
            }
        }

        let mut groups_per_bin = Vec::with_capacity(n_rows);
        let mut group_first_channel = Vec::new();
        let mut group_channel_count = Vec::new();
        let mut matrix_values = Vec::new();
        let mut empty_rows = 0usize;

        for (row, &n_grp) in raw.n_grp.iter().enumerate() {
            let n_grp = usize::try_from(n_grp).map_err(|_| {
                ResponseError::shape_mismatch(format!("row {row}: negative N_GRP {n_grp}"))
            })?;
            groups_per_bin.push(n_grp);
            if n_grp == 0 {
                empty_rows += 1;
                continue;
            }

            let (f_chan, n_chan) = (raw.f_chan[row].as_slice(), raw.n_chan[row].as_slice());
            if f_chan.len() != n_grp || n_chan.len() != n_grp {
                return Err(ResponseError::shape_mismatch(format!(
                    "row {row}: N_GRP is {n_grp} but F_CHAN has {} and N_CHAN has {} entries",
                    f_chan.len(),
                    n_chan.len()
                )));
            }

            for &v in f_chan {
                group_first_channel.push(to_index(v, row, "F_CHAN")?);
            }
            let mut row_width = 0usize;
            for &v in n_chan {
                let width = usize::try_from(to_index(v, row, "N_CHAN")?).map_err(|_| {
                    ResponseError::shape_mismatch(format!("row {row}: negative N_CHAN {v}"))
                })?;
                row_width = row_width.checked_add(width).ok_or_else(|| {
                    ResponseError::shape_mismatch(format!("row {row}: N_CHAN total overflows"))
                })?;
                group_channel_count.push(width);
            }

            let values = raw.matrix[row].as_slice();
            if values.len() != row_width {
                return Err(ResponseError::shape_mismatch(format!(
                    "row {row}: groups cover {row_width} channels but MATRIX has {} values",
                    values.len()
                )));
            }
            matrix_values.extend_from_slice(values);
        }

        log::debug!(
            "decoded RMF: {n_rows} bins ({empty_rows} without groups), {} groups, {} matrix values, offset {channel_offset}",
            group_first_channel.len(),
            matrix_values.len()
        );

        Self::from_parts(MatrixParts {
            energy_lo: raw.energy_lo,
            energy_hi: raw.energy_hi,
            energy_unit: raw.energy_unit,
            detector_channels: raw.detector_channels,
            channel_offset,
            groups_per_bin,
            group_first_channel,
            group_channel_count,
            matrix_values,
        })
    }

    /// Locate the matrix extension (primary name, then legacy alias), decode
    /// it and attach `EBOUNDS` when the file has one.
    pub fn from_table(file: &TableFile) -> Result<Self> {
        let ext = file.extension_any(&MATRIX_EXTENSIONS)?;
        let rmf = Self::decode(RawMatrixRows::from_extension(ext)?)?;

        match file.extension(EBOUNDS_EXTENSION) {
            Some(ebounds) => {
                let bounds = ChannelBounds {
                    e_min: ebounds.column("E_MIN")?.to_f64()?,
                    e_max: ebounds.column("E_MAX")?.to_f64()?,
                };
                rmf.with_channel_bounds(bounds)
            }
            None => Ok(rmf),
        }
    }

    /// Attach channel energy bounds; both arrays must have one entry per channel.
    pub fn with_channel_bounds(mut self, bounds: ChannelBounds) -> Result<Self> {
        for len in [bounds.e_min.len(), bounds.e_max.len()] {
            if len != self.detector_channels {
                return Err(ResponseError::dimension_mismatch(self.detector_channels, len));
            }
        }
        self.channel_bounds = Some(bounds);
        Ok(self)
    }

    // -- Folding --

    /// Fold a per-bin flux vector into counts per detector channel.
    ///
    /// Each bin's flux is spread over its channel groups, weighted per
    /// channel by the matrix values. Any group falling outside the detector
    /// aborts the whole fold with [`ResponseError::OutOfRangeChannel`].
    pub fn apply_rmf(&self, source: &[f64]) -> Result<Vec<f64>> {
        let n_bins = self.groups_per_bin.len();
        if source.len() != n_bins {
            return Err(ResponseError::dimension_mismatch(n_bins, source.len()));
        }

        let mut counts = vec![CompensatedSum::default(); self.detector_channels];
        let mut group_cursor = 0;
        let mut value_cursor = 0;

        for (&flux, &n_groups) in source.iter().zip(&self.groups_per_bin) {
            for _ in 0..n_groups {
                let channels = self.channel_range(group_cursor)?;
                let width = channels.len();
                let weights = &self.matrix_values[value_cursor..value_cursor + width];

                for (slot, &w) in counts[channels].iter_mut().zip(weights) {
                    slot.add(w * flux);
                }

                group_cursor += 1;
                value_cursor += width;
            }
        }

        Ok(counts.iter().map(CompensatedSum::total).collect())
    }

    /// Zero-based channel range covered by flattened group `group`.
    fn channel_range(&self, group: usize) -> Result<Range<usize>> {
        let first = self.group_first_channel[group];
        let width = self.group_channel_count[group];
        let out_of_range = |start: i64| ResponseError::OutOfRangeChannel {
            group,
            start,
            width,
            channels: self.detector_channels,
        };

        let start = first
            .checked_sub(self.channel_offset)
            .ok_or_else(|| out_of_range(first))?;
        let begin = usize::try_from(start).map_err(|_| out_of_range(start))?;
        match begin.checked_add(width) {
            Some(end) if end <= self.detector_channels => Ok(begin..end),
            _ => Err(out_of_range(start)),
        }
    }

    // -- Accessors --

    pub fn energy_lo(&self) -> &[f64] {
        &self.energy_lo
    }

    pub fn energy_hi(&self) -> &[f64] {
        &self.energy_hi
    }

    pub fn energy_unit(&self) -> Option<&str> {
        self.energy_unit.as_deref()
    }

    pub fn detector_channels(&self) -> usize {
        self.detector_channels
    }

    pub fn channel_offset(&self) -> i64 {
        self.channel_offset
    }

    pub fn groups_per_bin(&self) -> &[usize] {
        &self.groups_per_bin
    }

    pub fn group_first_channel(&self) -> &[i64] {
        &self.group_first_channel
    }

    pub fn group_channel_count(&self) -> &[usize] {
        &self.group_channel_count
    }

    pub fn matrix_values(&self) -> &[f64] {
        &self.matrix_values
    }

    pub fn channel_bounds(&self) -> Option<&ChannelBounds> {
        self.channel_bounds.as_ref()
    }

    /// Number of energy bins.
    pub fn num_bins(&self) -> usize {
        self.groups_per_bin.len()
    }
}

/// Read the integer channel offset from the unique `TLMIN*` keyword.
fn channel_offset(header: &Header) -> Result<i64> {
    let (key, value) = header.find_unique(OFFSET_KEYWORD, |k| k.contains(OFFSET_KEYWORD))?;
    value.as_i64().ok_or_else(|| {
        ResponseError::MalformedHeader(format!("{key} = {value} is not an integer"))
    })
}

fn checked_total(counts: &[usize], what: &str) -> Result<usize> {
    counts
        .iter()
        .try_fold(0usize, |acc, &n| acc.checked_add(n))
        .ok_or_else(|| ResponseError::shape_mismatch(format!("{what} total overflows")))
}

fn to_index(v: f64, row: usize, column: &str) -> Result<i64> {
    integral(v).ok_or_else(|| {
        ResponseError::shape_mismatch(format!("row {row}: {column} value {v} is not an integer"))
    })
}

/// Neumaier running sum, one per output channel.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, HeaderValue};
    use approx::assert_relative_eq;

    fn two_bin_matrix(channel_offset: i64) -> ResponseMatrix {
        ResponseMatrix::from_parts(MatrixParts {
            energy_lo: vec![1.0, 2.0],
            energy_hi: vec![2.0, 3.0],
            energy_unit: Some("keV".into()),
            detector_channels: 6,
            channel_offset,
            groups_per_bin: vec![1, 1],
            group_first_channel: vec![1, 3],
            group_channel_count: vec![2, 2],
            matrix_values: vec![0.5, 0.5, 1.0, 1.0],
        })
        .unwrap()
    }

    fn offset_header(offset: i64) -> Header {
        let mut header = Header::new();
        header.insert("DETCHANS", HeaderValue::Integer(8));
        header.insert("TLMIN4", HeaderValue::Integer(offset));
        header
    }

    /// Three bins: one group, two groups, no groups.
    fn raw_rows() -> RawMatrixRows {
        RawMatrixRows {
            energy_lo: vec![1.0, 2.0, 3.0],
            energy_hi: vec![2.0, 3.0, 4.0],
            energy_unit: Some("keV".into()),
            detector_channels: 8,
            header: offset_header(1),
            n_grp: vec![1, 2, 0],
            f_chan: vec![
                Cell::Scalar(1.0),
                Cell::Array(vec![2.0, 6.0]),
                Cell::Array(vec![]),
            ],
            n_chan: vec![
                Cell::Scalar(3.0),
                Cell::Array(vec![2.0, 3.0]),
                Cell::Array(vec![]),
            ],
            matrix: vec![
                Cell::Array(vec![0.2, 0.6, 0.2]),
                Cell::Array(vec![0.1, 0.4, 0.3, 0.1, 0.1]),
                Cell::Array(vec![]),
            ],
        }
    }

    #[test]
    fn test_fold_two_bin_scenario() {
        let counts = two_bin_matrix(0).apply_rmf(&[2.0, 3.0]).unwrap();
        assert_eq!(counts, vec![0.0, 1.0, 1.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn test_fold_subtracts_channel_offset() {
        let counts = two_bin_matrix(1).apply_rmf(&[2.0, 3.0]).unwrap();
        assert_eq!(counts, vec![1.0, 1.0, 3.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fold_zero_flux_is_zero() {
        let rmf = ResponseMatrix::decode(raw_rows()).unwrap();
        let counts = rmf.apply_rmf(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(counts, vec![0.0; 8]);
    }

    #[test]
    fn test_fold_is_linear() {
        let rmf = ResponseMatrix::decode(raw_rows()).unwrap();
        let x = [1.5, -0.25, 4.0];
        let y = [0.3, 2.0, 7.0];
        let (a, b) = (2.5, -1.25);
        let combined: Vec<f64> = x.iter().zip(&y).map(|(x, y)| a * x + b * y).collect();

        let lhs = rmf.apply_rmf(&combined).unwrap();
        let fx = rmf.apply_rmf(&x).unwrap();
        let fy = rmf.apply_rmf(&y).unwrap();
        for (i, value) in lhs.iter().enumerate() {
            assert_relative_eq!(*value, a * fx[i] + b * fy[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fold_uses_per_channel_weights() {
        let rmf = ResponseMatrix::decode(raw_rows()).unwrap();
        let counts = rmf.apply_rmf(&[10.0, 1.0, 5.0]).unwrap();
        // bin 0 -> channels 0..3, bin 1 -> channels 1..3 and 5..8
        let expected = [2.0, 6.1, 2.4, 0.0, 0.0, 0.3, 0.1, 0.1];
        for (got, want) in counts.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fold_rejects_wrong_length() {
        let err = two_bin_matrix(1).apply_rmf(&[1.0]).unwrap_err();
        assert_eq!(err, ResponseError::dimension_mismatch(2, 1));
    }

    #[test]
    fn test_fold_rejects_group_past_last_channel() {
        let mut raw = raw_rows();
        raw.detector_channels = 7;
        let rmf = ResponseMatrix::decode(raw).unwrap();
        let err = rmf.apply_rmf(&[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            ResponseError::OutOfRangeChannel {
                group: 2,
                start: 5,
                width: 3,
                channels: 7
            }
        );
    }

    #[test]
    fn test_fold_rejects_channel_below_offset() {
        let mut raw = raw_rows();
        raw.header = offset_header(2);
        let rmf = ResponseMatrix::decode(raw).unwrap();
        assert!(matches!(
            rmf.apply_rmf(&[1.0, 1.0, 1.0]),
            Err(ResponseError::OutOfRangeChannel { group: 0, start: -1, .. })
        ));
    }

    #[test]
    fn test_fold_offset_overflow_is_out_of_range() {
        let rmf = ResponseMatrix::from_parts(MatrixParts {
            energy_lo: vec![1.0],
            energy_hi: vec![2.0],
            energy_unit: None,
            detector_channels: 4,
            channel_offset: -1,
            groups_per_bin: vec![1],
            group_first_channel: vec![i64::MAX],
            group_channel_count: vec![1],
            matrix_values: vec![1.0],
        })
        .unwrap();
        assert_eq!(
            rmf.apply_rmf(&[1.0]).unwrap_err(),
            ResponseError::OutOfRangeChannel {
                group: 0,
                start: i64::MAX,
                width: 1,
                channels: 4
            }
        );
    }

    #[test]
    fn test_from_parts_rejects_overflowing_group_total() {
        let err = ResponseMatrix::from_parts(MatrixParts {
            energy_lo: vec![1.0, 2.0],
            energy_hi: vec![2.0, 3.0],
            energy_unit: None,
            detector_channels: 4,
            channel_offset: 0,
            groups_per_bin: vec![usize::MAX, 1],
            group_first_channel: vec![0],
            group_channel_count: vec![1],
            matrix_values: vec![1.0],
        })
        .unwrap_err();
        assert!(matches!(err, ResponseError::ShapeMismatch(_)), "{err}");
    }

    #[test]
    fn test_decode_rejects_out_of_range_integers() {
        let mut raw = raw_rows();
        raw.f_chan[0] = Cell::Scalar(1e19);
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));

        let mut raw = raw_rows();
        raw.n_grp = vec![i64::MAX; 3];
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_decode_rejects_groups_shifted_between_rows() {
        // totals still balance: 3 groups, 8 values
        let mut raw = raw_rows();
        raw.f_chan[0] = Cell::Array(vec![1.0, 2.0]);
        raw.f_chan[1] = Cell::Scalar(6.0);
        raw.n_chan[0] = Cell::Array(vec![3.0, 2.0]);
        raw.n_chan[1] = Cell::Scalar(3.0);
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));

        let mut raw = raw_rows();
        raw.matrix[0] = Cell::Array(vec![0.2, 0.6, 0.2, 0.1]);
        raw.matrix[1] = Cell::Array(vec![0.4, 0.3, 0.1, 0.1]);
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_decode_flattens_rows() {
        let rmf = ResponseMatrix::decode(raw_rows()).unwrap();
        assert_eq!(rmf.groups_per_bin(), &[1, 2, 0]);
        assert_eq!(rmf.group_first_channel(), &[1, 2, 6]);
        assert_eq!(rmf.group_channel_count(), &[3, 2, 3]);
        assert_eq!(rmf.matrix_values().len(), 8);
        assert_eq!(rmf.channel_offset(), 1);
        assert_eq!(rmf.energy_unit(), Some("keV"));

        let total: usize = rmf.group_channel_count().iter().sum();
        assert_eq!(total, rmf.matrix_values().len());
        let groups: usize = rmf.groups_per_bin().iter().sum();
        assert_eq!(groups, rmf.group_first_channel().len());
    }

    #[test]
    fn test_decode_rejects_shortened_channel_counts() {
        let mut raw = raw_rows();
        raw.n_chan[1] = Cell::Scalar(2.0);
        let err = ResponseMatrix::decode(raw).unwrap_err();
        assert!(matches!(err, ResponseError::ShapeMismatch(_)), "{err}");
    }

    #[test]
    fn test_decode_rejects_matrix_length_mismatch() {
        let mut raw = raw_rows();
        raw.matrix[0] = Cell::Array(vec![0.2, 0.6]);
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_row() {
        let mut raw = raw_rows();
        raw.n_chan.pop();
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_decode_requires_single_offset_keyword() {
        let mut raw = raw_rows();
        raw.header = Header::new();
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::MalformedHeader(_))
        ));

        let mut raw = raw_rows();
        raw.header.insert("TLMIN5", HeaderValue::Integer(0));
        assert!(matches!(
            ResponseMatrix::decode(raw),
            Err(ResponseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_from_table_accepts_legacy_extension_name() {
        let ext = Extension::new("SPECRESP MATRIX")
            .with_keyword("DETCHANS", HeaderValue::Integer(6))
            .with_keyword("TLMIN4", HeaderValue::Integer(1))
            .with_column(Column::scalars("ENERG_LO", Some("keV"), &[1.0, 2.0]))
            .with_column(Column::scalars("ENERG_HI", Some("keV"), &[2.0, 3.0]))
            .with_column(Column::scalars("N_GRP", None, &[1.0, 1.0]))
            .with_column(Column::scalars("F_CHAN", None, &[1.0, 3.0]))
            .with_column(Column::scalars("N_CHAN", None, &[2.0, 2.0]))
            .with_column(Column::new(
                "MATRIX",
                None,
                vec![Cell::Array(vec![0.5, 0.5]), Cell::Array(vec![1.0, 1.0])],
            ));
        let ebounds = Extension::new("EBOUNDS")
            .with_column(Column::scalars("E_MIN", Some("keV"), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]))
            .with_column(Column::scalars("E_MAX", Some("keV"), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let file = TableFile::from_extensions(vec![ext, ebounds]);

        let rmf = ResponseMatrix::from_table(&file).unwrap();
        let expected = two_bin_matrix(1)
            .with_channel_bounds(ChannelBounds {
                e_min: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
                e_max: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            })
            .unwrap();
        assert_eq!(rmf, expected);
    }

    #[test]
    fn test_from_table_without_matrix_extension() {
        let file = TableFile::from_extensions(vec![Extension::new("SPECRESP")]);
        assert!(matches!(
            ResponseMatrix::from_table(&file),
            Err(ResponseError::MissingExtension { .. })
        ));
    }

    #[test]
    fn test_channel_bounds_must_cover_every_channel() {
        let err = two_bin_matrix(0)
            .with_channel_bounds(ChannelBounds {
                e_min: vec![0.0],
                e_max: vec![1.0],
            })
            .unwrap_err();
        assert_eq!(err, ResponseError::dimension_mismatch(6, 1));
    }
}
