//! LUT error types.

use crate::CurveKind;
use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur when installing curve tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LutError {
    /// Table length does not match the curve resolution.
    #[error("invalid {kind:?} size: expected {expected}, got {got}")]
    InvalidSize {
        /// Curve kind
        kind: CurveKind,
        /// Required length
        expected: usize,
        /// Supplied length
        got: usize,
    },

    /// A sample does not fit the curve's fixed-point format.
    #[error("sample {index} = {value} outside {min}..={max}")]
    SampleOutOfRange {
        /// Position in the table
        index: usize,
        /// Offending code
        value: i32,
        /// Smallest code
        min: i32,
        /// Largest code
        max: i32,
    },

    /// The library does not hold curves of this kind.
    #[error("{0:?} curves are not catalogued")]
    NotCatalogued(CurveKind),
}
