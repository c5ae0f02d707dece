//! Pure power-law transfer functions for SDR.
//!
//! # Range
//!
//! - Input/Output: [0, 1]

/// SDR reference white, in cd/m2.
pub const SDR_REFERENCE_WHITE: f64 = 100.0;

/// EOTF for arbitrary gamma: `v^gamma`
#[inline]
pub fn gamma_eotf(v: f64, gamma: f64) -> f64 {
    if v <= 0.0 { 0.0 } else { v.powf(gamma) }
}

/// OETF for arbitrary gamma: `l^(1/gamma)`
///
/// # Example
///
/// ```rust
/// use csc_transfer::gamma::gamma_oetf;
///
/// let encoded = gamma_oetf(0.218, 2.2);
/// assert!((encoded - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn gamma_oetf(l: f64, gamma: f64) -> f64 {
    if l <= 0.0 { 0.0 } else { l.powf(1.0 / gamma) }
}

/// Gamma 2.2 EOTF.
#[inline]
pub fn eotf_22(v: f64) -> f64 {
    gamma_eotf(v, 2.2)
}

/// Gamma 2.2 OETF.
#[inline]
pub fn oetf_22(l: f64) -> f64 {
    gamma_oetf(l, 2.2)
}
