//! Explicit fixed-point encodings.
//!
//! Hardware coefficients and curve samples are integers with a known
//! bit-width and fraction. [`FixedFormat`] carries both so that callers never
//! hard-code shifts at the point of use.

/// A two's-complement or unsigned fixed-point encoding.
///
/// # Example
///
/// ```rust
/// use csc_math::FixedFormat;
///
/// // 13-bit signed, 12 fractional bits: range [-1, 1)
/// let f = FixedFormat::signed(13, 12);
/// assert_eq!(f.quantize(0.25), 1024);
/// assert_eq!(f.quantize(3.0), f.max_code());
/// assert_eq!(f.dequantize(2048), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedFormat {
    /// Total bits including the sign bit.
    pub width: u32,
    /// Fractional bits.
    pub frac_bits: u32,
    /// Two's-complement when true.
    pub signed: bool,
}

impl FixedFormat {
    /// Signed format with `width` total bits.
    pub const fn signed(width: u32, frac_bits: u32) -> Self {
        Self { width, frac_bits, signed: true }
    }

    /// Unsigned format with `width` total bits.
    pub const fn unsigned(width: u32, frac_bits: u32) -> Self {
        Self { width, frac_bits, signed: false }
    }

    /// Code representing 1.0 (may exceed [`max_code`](Self::max_code)).
    #[inline]
    pub const fn one(&self) -> i64 {
        1i64 << self.frac_bits
    }

    /// Smallest representable code.
    #[inline]
    pub const fn min_code(&self) -> i32 {
        if self.signed {
            -(1i32 << (self.width - 1))
        } else {
            0
        }
    }

    /// Largest representable code.
    #[inline]
    pub const fn max_code(&self) -> i32 {
        if self.signed {
            (1i32 << (self.width - 1)) - 1
        } else {
            ((1i64 << self.width) - 1) as i32
        }
    }

    /// Value of one least significant bit.
    #[inline]
    pub fn resolution(&self) -> f64 {
        1.0 / self.one() as f64
    }

    /// Saturates an integer to the representable range.
    #[inline]
    pub fn saturate(&self, code: i64) -> i32 {
        code.clamp(self.min_code() as i64, self.max_code() as i64) as i32
    }

    /// Rounds `value` to the nearest code, saturating. NaN maps to 0.
    #[inline]
    pub fn quantize(&self, value: f64) -> i32 {
        if value.is_nan() {
            return 0;
        }
        self.saturate((value * self.one() as f64).round() as i64)
    }

    /// Converts a code back to a real value.
    #[inline]
    pub fn dequantize(&self, code: i32) -> f64 {
        code as f64 / self.one() as f64
    }

    /// Same width with `shift` fewer fractional bits (range grows by `2^shift`).
    #[inline]
    pub const fn shifted(&self, shift: u32) -> Self {
        Self {
            width: self.width,
            frac_bits: self.frac_bits.saturating_sub(shift),
            signed: self.signed,
        }
    }
}
