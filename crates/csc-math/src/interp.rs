//! Interpolation helpers for float and fixed-point curves.
//!
//! - [`lerp`], [`inverse_lerp`], [`clamp`] - float helpers
//! - [`linear_phase`] - integer linear interpolation with a power-of-two span
//! - [`cubic_phase`] - 4-tap cubic interpolation over 64 phases, 8-bit kernel

/// Linear interpolation between two values.
///
/// # Example
///
/// ```rust
/// use csc_math::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// ```
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse linear interpolation. Returns 0 for a degenerate span.
#[inline]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < 1e-12 {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Clamps a value to the range [min, max].
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Integer linear interpolation: `a + ((b - a) * num >> shift)`.
///
/// `num` is the position inside a span of `1 << shift` steps.
#[inline]
pub fn linear_phase(a: i32, b: i32, num: i32, shift: u32) -> i32 {
    a + (((b - a) * num) >> shift)
}

/// Number of phases covered by [`cubic_phase`] (exclusive upper bound + 1).
pub const CUBIC_PHASE_SPAN: u32 = 64;

/// Half-span cubic kernel, one row per phase 0..=32 in 1/64 steps.
///
/// Coefficients apply to `[p(k-1), p(k), p(k+1), p(k+2)]` and sum to 256.
/// Phases above 32 reuse the table mirrored.
const CUBIC_KERNEL: [[i32; 4]; 33] = [
    [0, 256, 0, 0],
    [-2, 256, 2, 0],
    [-4, 256, 4, 0],
    [-5, 254, 7, 0],
    [-7, 254, 10, -1],
    [-8, 252, 13, -1],
    [-10, 251, 16, -1],
    [-11, 249, 19, -1],
    [-12, 247, 23, -2],
    [-13, 244, 27, -2],
    [-14, 242, 31, -3],
    [-15, 239, 35, -3],
    [-16, 236, 40, -4],
    [-17, 233, 44, -4],
    [-17, 229, 49, -5],
    [-18, 226, 53, -5],
    [-18, 222, 58, -6],
    [-18, 218, 63, -7],
    [-19, 214, 68, -7],
    [-19, 210, 73, -8],
    [-19, 205, 79, -9],
    [-19, 201, 83, -9],
    [-19, 196, 89, -10],
    [-19, 191, 94, -10],
    [-19, 186, 100, -11],
    [-18, 181, 105, -12],
    [-18, 176, 111, -13],
    [-18, 171, 116, -13],
    [-18, 166, 122, -14],
    [-17, 160, 127, -14],
    [-17, 155, 133, -15],
    [-16, 149, 138, -15],
    [-16, 144, 144, -16],
];

/// 4-tap cubic interpolation between `p[1]` and `p[2]`.
///
/// `mu` is the phase in 1/64 steps (clamped to `0..=64`); `mu = 0` returns
/// `p[1]` and `mu = 64` returns `p[2]`.
///
/// # Example
///
/// ```rust
/// use csc_math::cubic_phase;
///
/// assert_eq!(cubic_phase([0, 100, 200, 300], 0), 100);
/// assert_eq!(cubic_phase([0, 100, 200, 300], 32), 150);
/// ```
pub fn cubic_phase(p: [i32; 4], mu: u32) -> i32 {
    let mu = mu.min(CUBIC_PHASE_SPAN) as usize;
    let (kernel, taps) = if mu <= 32 {
        (&CUBIC_KERNEL[mu], p)
    } else {
        (&CUBIC_KERNEL[CUBIC_PHASE_SPAN as usize - mu], [p[3], p[2], p[1], p[0]])
    };
    let acc: i32 = kernel.iter().zip(taps).map(|(c, v)| c * v).sum();
    (acc + 128) >> 8
}
