//! SMPTE ST 2084 Perceptual Quantizer (PQ) transfer function.
//!
//! # Range
//!
//! - Encoded: [0, 1]
//! - Linear: [0, 10000] cd/m2 (nits)
//!
//! # Reference
//!
//! SMPTE ST 2084:2014

/// Maximum luminance in cd/m2 (nits).
pub const L_MAX: f64 = 10000.0;

// PQ constants from SMPTE ST 2084
const M1: f64 = 2610.0 / 16384.0;
const M2: f64 = 2523.0 / 4096.0 * 128.0;
const C1: f64 = 3424.0 / 4096.0;
const C2: f64 = 2413.0 / 4096.0 * 32.0;
const C3: f64 = 2392.0 / 4096.0 * 32.0;

/// PQ EOTF: decodes a PQ signal to absolute luminance (cd/m2).
///
/// # Example
///
/// ```rust
/// use csc_transfer::pq::eotf;
///
/// // Reference white (100 nits)
/// let nits = eotf(0.508);
/// assert!((nits - 100.0).abs() < 1.0);
/// ```
#[inline]
pub fn eotf(v: f64) -> f64 {
    if v <= 0.0 {
        return 0.0;
    }

    let vp = v.powf(1.0 / M2);
    let num = (vp - C1).max(0.0);
    let den = C2 - C3 * vp;

    L_MAX * (num / den).powf(1.0 / M1)
}

/// PQ inverse EOTF: encodes absolute luminance to a PQ signal.
#[inline]
pub fn oetf(l: f64) -> f64 {
    if l <= 0.0 {
        return 0.0;
    }

    let y = (l / L_MAX).clamp(0.0, 1.0);
    let yp = y.powf(M1);
    let num = C1 + C2 * yp;
    let den = 1.0 + C3 * yp;

    (num / den).powf(M2)
}
