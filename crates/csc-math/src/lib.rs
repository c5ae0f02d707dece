//! # csc-math
//!
//! Math primitives for the colour-space conversion engine.
//!
//! - [`Mat3`] - 3x3 matrices for primaries and Y'CbCr conversions
//! - [`Vec3`] - XYZ/RGB triplets
//! - Bradford chromatic adaptation ([`adapt_matrix`])
//! - Interpolation ([`lerp`], [`cubic_phase`], [`linear_phase`])
//! - [`FixedFormat`] - explicit fixed-point encodings for hardware coefficients
//!
//! # Design
//!
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! Values are `f64` so that quantizing to 12-bit fractions is dominated by
//! the fixed-point step and not by float error. Inversion goes through
//! [`glam::DMat3`].
//!
//! # Usage
//!
//! ```rust
//! use csc_math::{FixedFormat, Mat3, Vec3};
//!
//! let m = Mat3::diagonal(0.5, 1.0, 2.0);
//! let v = m * Vec3::new(1.0, 1.0, 1.0);
//! assert_eq!(v, Vec3::new(0.5, 1.0, 2.0));
//!
//! let q = FixedFormat::signed(13, 12);
//! assert_eq!(q.quantize(0.5), 2048);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - matrix inversion
//!
//! # Used By
//!
//! - `csc-primaries` - gamut matrix solver
//! - `csc-lut` - knee interpolation, curve quantization
//! - `csc-engine` - contrast interpolation

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod adapt;
mod fixed;
mod interp;
mod mat3;
mod vec3;

pub use adapt::*;
pub use fixed::*;
pub use interp::*;
pub use mat3::*;
pub use vec3::*;
