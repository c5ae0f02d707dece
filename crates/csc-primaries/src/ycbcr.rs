//! Y'CbCr decode and encode matrices.
//!
//! Offsets are expressed in 12-bit code units: limited range puts black at
//! 256 with a luma span of 3504 and chroma centred on 2048 with a span of
//! 3584; full range uses the whole 4096-code span.

use crate::gamut::{GamutMatrix, OFFSET_FULL_SCALE};
use csc_core::{ColorPrimaries, SignalRange};
use csc_math::Mat3;

const LIMITED_BLACK: i32 = 256;
const LIMITED_LUMA_SPAN: f64 = 3504.0;
const LIMITED_CHROMA_SPAN: f64 = 3584.0;
const CHROMA_CENTER: i32 = OFFSET_FULL_SCALE / 2;

/// Luma coefficient sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YcbcrMatrix {
    /// BT.601: Kr 0.299, Kb 0.114.
    Bt601,
    /// BT.709: Kr 0.2126, Kb 0.0722.
    Bt709,
    /// BT.2020 non-constant luminance: Kr 0.2627, Kb 0.0593.
    Bt2020,
}

impl YcbcrMatrix {
    /// Matrix implied by the signalled primaries family.
    pub const fn for_primaries(primaries: ColorPrimaries) -> Self {
        match primaries {
            ColorPrimaries::Bt601 => Self::Bt601,
            ColorPrimaries::Bt2020 => Self::Bt2020,
            ColorPrimaries::Bt709 | ColorPrimaries::Other(_) => Self::Bt709,
        }
    }

    /// (Kr, Kb).
    pub const fn kr_kb(self) -> (f64, f64) {
        match self {
            Self::Bt601 => (0.299, 0.114),
            Self::Bt709 => (0.2126, 0.0722),
            Self::Bt2020 => (0.2627, 0.0593),
        }
    }

    /// Normalized Y'CbCr (chroma centred on 0) to R'G'B'.
    pub fn to_rgb_mat3(self) -> Mat3 {
        let (kr, kb) = self.kr_kb();
        let kg = 1.0 - kr - kb;
        Mat3::from_rows([
            [1.0, 0.0, 2.0 * (1.0 - kr)],
            [1.0, -2.0 * kb * (1.0 - kb) / kg, -2.0 * kr * (1.0 - kr) / kg],
            [1.0, 2.0 * (1.0 - kb), 0.0],
        ])
    }

    /// R'G'B' to normalized Y'CbCr.
    pub fn from_rgb_mat3(self) -> Mat3 {
        let (kr, kb) = self.kr_kb();
        let kg = 1.0 - kr - kb;
        Mat3::from_rows([
            [kr, kg, kb],
            [-kr / (2.0 * (1.0 - kb)), -kg / (2.0 * (1.0 - kb)), 0.5],
            [0.5, -kg / (2.0 * (1.0 - kr)), -kb / (2.0 * (1.0 - kr))],
        ])
    }

    /// Input stage: coded Y'CbCr to R'G'B'.
    pub fn decode(self, range: SignalRange) -> GamutMatrix {
        let (scale, pre) = match range {
            SignalRange::Limited => (
                range_scale(OFFSET_FULL_SCALE as f64 / LIMITED_LUMA_SPAN, OFFSET_FULL_SCALE as f64 / LIMITED_CHROMA_SPAN),
                [-LIMITED_BLACK, -CHROMA_CENTER, -CHROMA_CENTER],
            ),
            SignalRange::Full => (Mat3::IDENTITY, [0, -CHROMA_CENTER, -CHROMA_CENTER]),
        };
        GamutMatrix::fit(&(self.to_rgb_mat3() * scale)).with_offsets(pre, [0; 3])
    }

    /// Output stage: R'G'B' to coded Y'CbCr.
    pub fn encode(self, range: SignalRange) -> GamutMatrix {
        let (scale, post) = match range {
            SignalRange::Limited => (
                range_scale(LIMITED_LUMA_SPAN / OFFSET_FULL_SCALE as f64, LIMITED_CHROMA_SPAN / OFFSET_FULL_SCALE as f64),
                [LIMITED_BLACK, CHROMA_CENTER, CHROMA_CENTER],
            ),
            SignalRange::Full => (Mat3::IDENTITY, [0, CHROMA_CENTER, CHROMA_CENTER]),
        };
        GamutMatrix::fit(&(scale * self.from_rgb_mat3())).with_offsets([0; 3], post)
    }

    /// Re-encodes coded Y'CbCr from one matrix to another in the same range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use csc_core::SignalRange;
    /// use csc_primaries::ycbcr::YcbcrMatrix;
    ///
    /// let same = YcbcrMatrix::conversion(YcbcrMatrix::Bt709, YcbcrMatrix::Bt709, SignalRange::Limited);
    /// assert!(same.to_mat3().is_identity(1e-3));
    /// ```
    pub fn conversion(from: Self, to: Self, range: SignalRange) -> GamutMatrix {
        let dec = from.decode(range);
        let enc = to.encode(range);
        let m = enc.to_mat3() * dec.to_mat3();
        GamutMatrix::fit(&m).with_offsets(dec.pre_offset, enc.post_offset)
    }
}

fn range_scale(luma: f64, chroma: f64) -> Mat3 {
    Mat3::diagonal(luma, chroma, chroma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csc_math::Vec3;

    fn code(y: i32, cb: i32, cr: i32) -> Vec3 {
        let f = OFFSET_FULL_SCALE as f64;
        Vec3::new(y as f64 / f, cb as f64 / f, cr as f64 / f)
    }

    #[test]
    fn test_matrices_are_inverse() {
        for m in [YcbcrMatrix::Bt601, YcbcrMatrix::Bt709, YcbcrMatrix::Bt2020] {
            assert!((m.to_rgb_mat3() * m.from_rgb_mat3()).is_identity(1e-9));
        }
    }

    #[test]
    fn test_limited_white_and_black() {
        let dec = YcbcrMatrix::Bt709.decode(SignalRange::Limited);
        let white = dec.apply(code(3760, 2048, 2048));
        assert!(white.max_abs_diff(Vec3::ONE) < 2e-3, "{:?}", white);
        let black = dec.apply(code(256, 2048, 2048));
        assert!(black.max_abs_diff(Vec3::ZERO) < 2e-3);
    }

    #[test]
    fn test_full_range_grey() {
        let dec = YcbcrMatrix::Bt601.decode(SignalRange::Full);
        let grey = dec.apply(code(2048, 2048, 2048));
        assert!(grey.max_abs_diff(Vec3::new(0.5, 0.5, 0.5)) < 1e-3);
        assert_eq!(dec.pre_offset, [0, -2048, -2048]);
    }

    #[test]
    fn test_sd_to_hd_conversion_keeps_grey() {
        let conv = YcbcrMatrix::conversion(YcbcrMatrix::Bt601, YcbcrMatrix::Bt709, SignalRange::Limited);
        assert!(!conv.to_mat3().is_identity(1e-3));
        let grey = code(2008, 2048, 2048);
        let out = conv.apply(grey);
        assert!(out.max_abs_diff(grey) < 2e-3, "{:?}", out);
    }

    #[test]
    fn test_for_primaries() {
        assert_eq!(YcbcrMatrix::for_primaries(ColorPrimaries::Bt2020), YcbcrMatrix::Bt2020);
        assert_eq!(YcbcrMatrix::for_primaries(ColorPrimaries::Other(2)), YcbcrMatrix::Bt709);
    }
}
