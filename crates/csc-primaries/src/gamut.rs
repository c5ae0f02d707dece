//! Gamut matrix solver.
//!
//! Produces the fixed-point 3x3 RGB-to-RGB matrix handed to the display
//! pipeline, with explicit pre/post offsets and a right-shift scale.
//!
//! # Fixed-point layout
//!
//! Coefficients use [`GAMUT_FORMAT`] (13-bit signed, 12 fractional bits)
//! and are stored divided by `2^right_shift`; the hardware restores the
//! scale after the multiply. The base shift is [`BASE_RIGHT_SHIFT`], which
//! gives a coefficient range of [-2, 2). The configured display gain adds
//! up to two more steps:
//!
//! | display gain (2048 = 1.0) | extra steps |
//! |---------------------------|-------------|
//! | <= 2048                   | 0           |
//! | 2049 ..= 4096             | 1           |
//! | > 4096                    | 2           |

use crate::{rgb_to_rgb_matrix, Primaries, BT2020};
use csc_core::Result;
use csc_math::{FixedFormat, Mat3, Vec3};
use tracing::{trace, warn};

/// Coefficient format: 13-bit signed, 12 fractional bits.
pub const GAMUT_FORMAT: FixedFormat = FixedFormat::signed(13, 12);

/// Shift always applied to stored coefficients.
pub const BASE_RIGHT_SHIFT: u32 = 1;

/// Largest right shift the hardware supports.
pub const MAX_RIGHT_SHIFT: u32 = 4;

/// Display gain meaning 1.0.
pub const UNITY_GAIN: u32 = 2048;

/// Full-scale code of the 12-bit offset domain.
pub const OFFSET_FULL_SCALE: i32 = 4096;

/// A 3x3 fixed-point matrix stage.
///
/// `out = (coeffs * (in + pre_offset)) * 2^right_shift + post_offset`,
/// clipped to the 12-bit range when `clip` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamutMatrix {
    /// Row-major coefficients in `format`, stored divided by `2^right_shift`.
    pub coeffs: [[i32; 3]; 3],
    /// Offsets added before the multiply, 12-bit code units.
    pub pre_offset: [i32; 3],
    /// Offsets added after the multiply, 12-bit code units.
    pub post_offset: [i32; 3],
    /// Scale exponent of the stored coefficients.
    pub right_shift: u32,
    /// Clip the output to the code range.
    pub clip: bool,
    /// Coefficient encoding.
    pub format: FixedFormat,
}

impl GamutMatrix {
    /// Identity stage.
    pub fn identity() -> Self {
        Self::from_mat3(&Mat3::IDENTITY, 0)
    }

    /// Quantizes `m` with `extra_shift` steps on top of the base shift.
    ///
    /// Coefficients outside the representable range saturate.
    pub fn from_mat3(m: &Mat3, extra_shift: u32) -> Self {
        let right_shift = (BASE_RIGHT_SHIFT + extra_shift).min(MAX_RIGHT_SHIFT);
        let scale = (1u32 << right_shift) as f64;
        let mut coeffs = [[0; 3]; 3];
        for (row, src) in coeffs.iter_mut().zip(m.m.iter()) {
            for (c, v) in row.iter_mut().zip(src) {
                *c = GAMUT_FORMAT.quantize(v / scale);
            }
        }
        Self {
            coeffs,
            pre_offset: [0; 3],
            post_offset: [0; 3],
            right_shift,
            clip: true,
            format: GAMUT_FORMAT,
        }
    }

    /// Quantizes `m` with the smallest shift that represents every coefficient.
    pub fn fit(m: &Mat3) -> Self {
        let max = m.max_abs();
        let extra = (0..=MAX_RIGHT_SHIFT - BASE_RIGHT_SHIFT)
            .find(|&e| max < (1u32 << (BASE_RIGHT_SHIFT + e)) as f64)
            .unwrap_or(MAX_RIGHT_SHIFT - BASE_RIGHT_SHIFT);
        Self::from_mat3(m, extra)
    }

    /// Sets offsets.
    pub fn with_offsets(mut self, pre: [i32; 3], post: [i32; 3]) -> Self {
        self.pre_offset = pre;
        self.post_offset = post;
        self
    }

    /// Real-valued matrix the coefficients encode.
    pub fn to_mat3(&self) -> Mat3 {
        let scale = (1u32 << self.right_shift) as f64;
        let mut m = Mat3::ZERO;
        for (dst, src) in m.m.iter_mut().zip(self.coeffs.iter()) {
            for (d, &c) in dst.iter_mut().zip(src) {
                *d = self.format.dequantize(c) * scale;
            }
        }
        m
    }

    /// Applies the stage to a value in normalized units (1.0 = full scale).
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let full = OFFSET_FULL_SCALE as f64;
        let pre = Vec3::new(
            self.pre_offset[0] as f64 / full,
            self.pre_offset[1] as f64 / full,
            self.pre_offset[2] as f64 / full,
        );
        let post = Vec3::new(
            self.post_offset[0] as f64 / full,
            self.post_offset[1] as f64 / full,
            self.post_offset[2] as f64 / full,
        );
        let out = self.to_mat3() * (v + pre) + post;
        if self.clip {
            let c = |x: f64| x.clamp(0.0, 1.0);
            Vec3::new(c(out.x), c(out.y), c(out.z))
        } else {
            out
        }
    }

    /// True when the stage is an exact identity with zero offsets.
    pub fn is_identity(&self) -> bool {
        self.pre_offset == [0; 3] && self.post_offset == [0; 3] && self.to_mat3().is_identity(0.0)
    }
}

impl Default for GamutMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Extra shift steps for a display gain in 2048 = 1.0 units.
///
/// # Example
///
/// ```rust
/// use csc_primaries::gamut::display_gain_shift;
///
/// assert_eq!(display_gain_shift(2048), 0);
/// assert_eq!(display_gain_shift(3000), 1);
/// assert_eq!(display_gain_shift(5000), 2);
/// ```
pub const fn display_gain_shift(gain: u32) -> u32 {
    if gain > 2 * UNITY_GAIN {
        2
    } else if gain > UNITY_GAIN {
        1
    } else {
        0
    }
}

/// Solves the source-to-destination matrix, scaled by `display_gain`.
///
/// Returns an error when either set of primaries is implausible. The result
/// maps linear source RGB to linear destination RGB; swap the arguments for
/// the inverse direction.
pub fn solve(src: &Primaries, dst: &Primaries, display_gain: u32) -> Result<GamutMatrix> {
    src.validate()?;
    dst.validate()?;
    let m = rgb_to_rgb_matrix(src, dst)?;
    let gain = display_gain as f64 / UNITY_GAIN as f64;
    let scaled = Mat3::diagonal(gain, gain, gain) * m;
    trace!(src = src.name, dst = dst.name, display_gain, "gamut matrix solved");
    Ok(GamutMatrix::from_mat3(&scaled, display_gain_shift(display_gain)))
}

/// Like [`solve`], but never fails.
///
/// Implausible primaries on either side are replaced by BT.2020 with a
/// warning. If the system is still unsolvable the identity is returned.
pub fn solve_or_reference(src: &Primaries, dst: &Primaries, display_gain: u32) -> GamutMatrix {
    let src = checked_or_reference(src);
    let dst = checked_or_reference(dst);
    match solve(&src, &dst, display_gain) {
        Ok(m) => m,
        Err(e) => {
            warn!("gamut solve failed, using identity: {}", e);
            GamutMatrix::identity()
        }
    }
}

fn checked_or_reference(p: &Primaries) -> Primaries {
    match p.validate() {
        Ok(()) => *p,
        Err(e) => {
            warn!(name = p.name, "{}, substituting BT.2020", e);
            BT2020
        }
    }
}
