//! Chromatic adaptation between white points.
//!
//! The gamut solver composes a Bradford adaptation between the source and
//! destination white points so that the source white always lands exactly
//! on the destination white, even when the two gamuts disagree on white.
//!
//! # Usage
//!
//! ```rust
//! use csc_math::{adapt_matrix, BRADFORD, D65, Vec3};
//!
//! let d50 = Vec3::new(0.96422, 1.0, 0.82521);
//! let m = adapt_matrix(BRADFORD, D65, d50);
//! assert!((m * D65).max_abs_diff(d50) < 1e-9);
//! ```

use crate::{Mat3, Vec3};

/// CIE Standard Illuminant D65 (XYZ, Y = 1).
///
/// White point of BT.601, BT.709 and BT.2020.
pub const D65: Vec3 = Vec3::new(0.95047, 1.0, 1.08883);

/// Bradford cone-response matrix.
///
/// # Reference
///
/// Lam, K.M. (1985). Metamerism and Colour Constancy.
pub const BRADFORD: Mat3 = Mat3::from_rows([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// XYZ scaling (no cone space).
pub const XYZ_SCALING: Mat3 = Mat3::IDENTITY;

/// Computes a chromatic adaptation matrix between two XYZ white points.
///
/// The result maps `src_white` onto `dst_white` exactly (up to float
/// error) and reduces to identity when the white points match.
pub fn adapt_matrix(method: Mat3, src_white: Vec3, dst_white: Vec3) -> Mat3 {
    let method_inv = method.inverse().unwrap_or(Mat3::IDENTITY);

    let src_cone = method * src_white;
    let dst_cone = method * dst_white;

    let scale = Mat3::diagonal(
        dst_cone.x / src_cone.x,
        dst_cone.y / src_cone.y,
        dst_cone.z / src_cone.z,
    );

    // M^-1 * S * M
    method_inv * scale * method
}
