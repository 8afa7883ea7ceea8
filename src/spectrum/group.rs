use crate::error::{ResponseError, Result};

// ---------------------------------------------------------------------------
// Channel grouping: combine runs of adjacent channels
// ---------------------------------------------------------------------------

/// How the channels of one group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMethod {
    Sum,
    Min,
    Max,
    /// Midpoint of the group's minimum and maximum.
    Middle,
}

/// Index ranges of each group, as `start..stop` pairs into the data.
///
/// * a flag `>= 0` opens a new group at that channel
/// * a flag `< 0` extends the group currently open
/// * the first channel must open a group
pub fn group_bounds(grouping: &[i32]) -> Result<Vec<(usize, usize)>> {
    if grouping.first().is_some_and(|&g| g < 0) {
        return Err(ResponseError::shape_mismatch(
            "first channel continues a group that was never opened",
        ));
    }

    let mut starts: Vec<usize> = grouping
        .iter()
        .enumerate()
        .filter(|(_, &g)| g >= 0)
        .map(|(i, _)| i)
        .collect();
    starts.push(grouping.len());

    Ok(starts.windows(2).map(|w| (w[0], w[1])).collect())
}

/// Combine `data` per group, returning one value per group.
pub fn group_counts(data: &[f64], grouping: &[i32], method: GroupMethod) -> Result<Vec<f64>> {
    if data.len() != grouping.len() {
        return Err(ResponseError::dimension_mismatch(data.len(), grouping.len()));
    }

    let grouped = group_bounds(grouping)?
        .into_iter()
        .map(|(start, stop)| {
            let chunk = &data[start..stop];
            let min = || chunk.iter().copied().fold(f64::INFINITY, f64::min);
            let max = || chunk.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            match method {
                GroupMethod::Sum => chunk.iter().sum(),
                GroupMethod::Min => min(),
                GroupMethod::Max => max(),
                GroupMethod::Middle => (min() + max()) / 2.0,
            }
        })
        .collect();
    Ok(grouped)
}
