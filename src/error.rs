use thiserror::Error;

/// input validation failures surfaced at the API boundary.
///
/// interior numerics never raise: they clamp. the only failures a caller
/// can observe are malformed inputs rejected before any work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("non-finite value in {field}")]
    NonFinite { field: &'static str },
    #[error("negative mass at index {index}")]
    NegativeMass { index: usize },
    #[error("empty distribution")]
    EmptyDistribution,
    #[error("matrix is {rows}x{cols} but marginal has length {len}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        len: usize,
    },
    #[error("position out of site bounds at placement {index}")]
    PositionOutOfBounds { index: usize },
    #[error("index out of range at entry {index}")]
    IndexOutOfRange { index: usize },
}

impl InputError {
    /// reject any non-finite entry in a dense buffer
    pub fn finite(field: &'static str, values: &[f64]) -> Result<(), Self> {
        match values.iter().all(|x| x.is_finite()) {
            true => Ok(()),
            false => Err(Self::NonFinite { field }),
        }
    }
}
