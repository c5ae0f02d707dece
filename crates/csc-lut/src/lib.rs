//! # csc-lut
//!
//! Tone curve tables for the HDR/SDR conversion engine.
//!
//! # Curve kinds
//!
//! | Kind | Length | Format | Grid |
//! |------|--------|--------|------|
//! | [`CurveKind::Eotf`] | 143 | u30.30 | 16 fine + 127 coarse codes |
//! | [`CurveKind::Oetf`] | 149 | u12.12 | piecewise log-spaced linear bins |
//! | [`CurveKind::OotfGain`] | 149 | u13.12 | same bins as OETF |
//! | [`CurveKind::InverseEotf`] | 65 | u12.12 | uniform linear |
//! | [`CurveKind::SaturationGain`] | 65 | u13.10 | uniform encoded |
//! | [`CurveKind::Knee`] | 289 | u10.10 | knee control points |
//!
//! Lengths are fixed by the hardware LUT dimensions and exposed as an
//! abstract curve resolution.
//!
//! # Usage
//!
//! ```rust
//! use csc_lut::{CurveKind, ToneCurveLibrary, luminance_bucket};
//! use csc_transfer::TransferFunction;
//!
//! let lib = ToneCurveLibrary::new();
//! let bucket = luminance_bucket(500);
//! let eotf = lib.get(CurveKind::Eotf, TransferFunction::Pq, bucket).unwrap();
//! assert_eq!(eotf.len(), 143);
//! assert_eq!(eotf.iter().count(), 143);
//! ```
//!
//! # Dependencies
//!
//! - `csc-transfer` - analytic curves the tables are baked from
//! - `csc-math` - fixed-point formats, cubic interpolation
//! - [`thiserror`] - error handling
//!
//! # Used By
//!
//! - `csc-engine` - tone curve selection per pipeline mode

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod curve;
mod error;
pub mod knee;
mod library;

pub use curve::{CurveKind, ToneCurve};
pub use error::{LutError, LutResult};
pub use library::{
    bucket_nits, luminance_bucket, CurveKey, ToneCurveLibrary, ToneCurveSet, LUMINANCE_BUCKETS,
};
