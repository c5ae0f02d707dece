//! Hybrid Log-Gamma (HLG) transfer function and OOTF.
//!
//! # Range
//!
//! - Encoded: [0, 1]
//! - Linear: [0, 1] (scene-referred, relative)
//!
//! # Reference
//!
//! ITU-R BT.2100-2

/// Nominal display peak for HLG, in cd/m2.
pub const NOMINAL_PEAK: f64 = 1000.0;

// HLG constants
const A: f64 = 0.17883277;
const B: f64 = 0.28466892; // 1 - 4*A
const C: f64 = 0.55991073; // 0.5 - A*ln(4*A)

/// HLG OETF: encodes linear scene light to an HLG signal.
///
/// ```text
/// if E <= 1/12:
///     E' = sqrt(3 * E)
/// else:
///     E' = A * ln(12*E - B) + C
/// ```
#[inline]
pub fn oetf(e: f64) -> f64 {
    if e <= 0.0 {
        0.0
    } else if e <= 1.0 / 12.0 {
        (3.0 * e).sqrt()
    } else {
        A * (12.0 * e - B).ln() + C
    }
}

/// HLG inverse OETF: decodes an HLG signal to linear scene light.
#[inline]
pub fn eotf(ep: f64) -> f64 {
    if ep <= 0.0 {
        0.0
    } else if ep <= 0.5 {
        ep * ep / 3.0
    } else {
        (((ep - C) / A).exp() + B) / 12.0
    }
}

/// System gamma for a display of `peak_nits` (BT.2100 extended model).
///
/// 1.2 at 1000 cd/m2, never below 1.0.
#[inline]
pub fn system_gamma(peak_nits: f64) -> f64 {
    let peak = peak_nits.max(1.0);
    (1.2 + 0.42 * (peak / NOMINAL_PEAK).log10()).max(1.0)
}

/// HLG OOTF: scene linear to display linear with system gamma.
#[inline]
pub fn ootf(y: f64, gamma: f64) -> f64 {
    if y <= 0.0 { 0.0 } else { y.powf(gamma) }
}

/// Multiplicative OOTF gain `Y^(gamma - 1)` applied per pixel.
#[inline]
pub fn ootf_gain(y: f64, gamma: f64) -> f64 {
    if y <= 0.0 {
        if gamma > 1.0 { 0.0 } else { 1.0 }
    } else {
        y.powf(gamma - 1.0)
    }
}
