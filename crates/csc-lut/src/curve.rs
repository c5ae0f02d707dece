//! Fixed-length tone curve tables.
//!
//! A [`ToneCurve`] is a table of fixed-point samples taken at the positions
//! its [`CurveKind`] defines. Readers never index out of bounds: any index
//! past either end reads the nearest valid sample.

use csc_math::FixedFormat;
use csc_transfer::TransferFunction;

/// Number of samples in an EOTF table.
pub const EOTF_LEN: usize = 143;
/// Number of samples in an OETF or OOTF gain table.
pub const OETF_LEN: usize = 149;
/// Number of samples in an inverse-EOTF or saturation gain table.
pub const UNIFORM_LEN: usize = 65;
/// Number of samples in a knee table.
pub const KNEE_LEN: usize = 289;

/// Which table a curve fills, fixing its length, format and sample grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// Encoded input to linear light.
    Eotf,
    /// Linear light to encoded output.
    Oetf,
    /// Per-pixel luminance gain in linear light.
    OotfGain,
    /// Linear light back to the input encoding.
    InverseEotf,
    /// Chroma gain over encoded luminance.
    SaturationGain,
    /// Knee adjustment of the output luma code.
    Knee,
}

impl CurveKind {
    /// Kinds held by the curve library.
    pub const CATALOGUED: [CurveKind; 5] = [
        Self::Eotf,
        Self::Oetf,
        Self::OotfGain,
        Self::InverseEotf,
        Self::SaturationGain,
    ];

    /// Sample count.
    pub const fn len(self) -> usize {
        match self {
            Self::Eotf => EOTF_LEN,
            Self::Oetf | Self::OotfGain => OETF_LEN,
            Self::InverseEotf | Self::SaturationGain => UNIFORM_LEN,
            Self::Knee => KNEE_LEN,
        }
    }

    /// Sample encoding.
    pub const fn format(self) -> FixedFormat {
        match self {
            Self::Eotf => FixedFormat::unsigned(30, 30),
            Self::Oetf | Self::InverseEotf => FixedFormat::unsigned(12, 12),
            Self::OotfGain => FixedFormat::unsigned(13, 12),
            Self::SaturationGain => FixedFormat::unsigned(13, 10),
            Self::Knee => FixedFormat::unsigned(10, 10),
        }
    }

    /// Normalized input position of every sample, ascending, ending at 1.0.
    pub fn positions(self) -> Vec<f64> {
        match self {
            Self::Eotf => eotf_positions(),
            Self::Oetf | Self::OotfGain => linear_bin_positions(),
            Self::InverseEotf | Self::SaturationGain => uniform_positions(UNIFORM_LEN),
            Self::Knee => uniform_positions(KNEE_LEN),
        }
    }

    /// True when the table differs per panel luminance bucket for `function`.
    pub const fn depends_on_panel(self, function: TransferFunction) -> bool {
        matches!(
            (self, function),
            (Self::OotfGain, TransferFunction::Pq) | (Self::OotfGain, TransferFunction::Hlg)
        )
    }

    /// True when the table is the same for every transfer function.
    pub const fn is_function_independent(self) -> bool {
        matches!(self, Self::SaturationGain | Self::Knee)
    }
}

// ============================================================================
// Sample grids
// ============================================================================

/// 16 fine steps of 1/1024 near black, then 127 steps of 1/128.
fn eotf_positions() -> Vec<f64> {
    let mut out = Vec::with_capacity(EOTF_LEN);
    out.extend((0..16).map(|i| i as f64 / 1024.0));
    out.extend((2..=128).map(|i| i as f64 / 128.0));
    out
}

/// Piecewise log-spaced bins over a 32-bit linear range.
///
/// Dense near black where PQ and HLG need resolution, sparse near peak.
fn linear_bin_positions() -> Vec<f64> {
    let mut bins: Vec<u64> = Vec::with_capacity(OETF_LEN);
    bins.push(0);
    bins.extend((0..7).map(|i| 16u64 << i));
    for j in 11..20u32 {
        bins.extend((0..4u64).map(|k| (k << (j - 2)) + (1 << j)));
    }
    for j in 20..31u32 {
        bins.extend((0..8u64).map(|k| (k << (j - 3)) + (1 << j)));
    }
    bins.extend((0..16u64).map(|k| (k << 27) + (1 << 31)));
    bins.push(1 << 32);

    let full = (1u64 << 32) as f64;
    bins.into_iter().map(|b| b as f64 / full).collect()
}

fn uniform_positions(len: usize) -> Vec<f64> {
    let last = (len - 1) as f64;
    (0..len).map(|i| i as f64 / last).collect()
}

// ============================================================================
// ToneCurve
// ============================================================================

/// An immutable fixed-length table of fixed-point samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurve {
    kind: CurveKind,
    function: TransferFunction,
    samples: Vec<i32>,
}

impl ToneCurve {
    /// Wraps `samples`, which the caller guarantees match `kind`.
    pub(crate) fn from_trusted(kind: CurveKind, function: TransferFunction, samples: Vec<i32>) -> Self {
        debug_assert_eq!(samples.len(), kind.len());
        Self { kind, function, samples }
    }

    /// Validates and wraps an externally supplied table.
    pub fn from_samples(
        kind: CurveKind,
        function: TransferFunction,
        samples: Vec<i32>,
    ) -> crate::LutResult<Self> {
        if samples.len() != kind.len() {
            return Err(crate::LutError::InvalidSize {
                kind,
                expected: kind.len(),
                got: samples.len(),
            });
        }
        let format = kind.format();
        let (min, max) = (format.min_code(), format.max_code());
        if let Some((index, &value)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !(min..=max).contains(*v))
        {
            return Err(crate::LutError::SampleOutOfRange { index, value, min, max });
        }
        Ok(Self { kind, function, samples })
    }

    /// Bakes a table by evaluating `f` at every sample position.
    pub fn bake(kind: CurveKind, function: TransferFunction, f: impl Fn(f64) -> f64) -> Self {
        let format = kind.format();
        let samples = kind.positions().into_iter().map(|x| format.quantize(f(x))).collect();
        Self::from_trusted(kind, function, samples)
    }

    /// Table kind.
    #[inline]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Transfer function this table was baked for.
    #[inline]
    pub fn function(&self) -> TransferFunction {
        self.function
    }

    /// Sample encoding.
    #[inline]
    pub fn format(&self) -> FixedFormat {
        self.kind.format()
    }

    /// Sample count; always `kind().len()`.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; tables have a fixed non-zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`, clamped to the table ends.
    #[inline]
    pub fn sample(&self, index: usize) -> i32 {
        match self.samples.get(index) {
            Some(&v) => v,
            None => self.samples.last().copied().unwrap_or(0),
        }
    }

    /// Sample at `index` as a real value.
    #[inline]
    pub fn value(&self, index: usize) -> f64 {
        self.format().dequantize(self.sample(index))
    }

    /// Restartable iterator over the samples in order.
    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, i32>> {
        self.samples.iter().copied()
    }

    /// Raw samples.
    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }

    /// Piecewise-linear lookup at normalized input `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let positions = self.kind.positions();
        let x = x.clamp(0.0, 1.0);
        let hi = positions.partition_point(|&p| p < x).min(positions.len() - 1);
        if hi == 0 {
            return self.value(0);
        }
        let lo = hi - 1;
        let t = csc_math::inverse_lerp(positions[lo], positions[hi], x);
        csc_math::lerp(self.value(lo), self.value(hi), t)
    }
}

impl<'a> IntoIterator for &'a ToneCurve {
    type Item = i32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, i32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_grid_lengths() {
        for kind in CurveKind::CATALOGUED.into_iter().chain([CurveKind::Knee]) {
            let pos = kind.positions();
            assert_eq!(pos.len(), kind.len(), "{kind:?}");
            assert_eq!(pos[0], 0.0);
            assert_eq!(*pos.last().unwrap(), 1.0);
            assert!(pos.windows(2).all(|w| w[0] < w[1]), "{kind:?} not ascending");
        }
    }

    #[test]
    fn test_linear_bins_dense_near_black() {
        let pos = CurveKind::Oetf.positions();
        // 1024 / 2^32 is the last of the fine steps
        assert_abs_diff_eq!(pos[7], 1024.0 / 4294967296.0);
        assert_abs_diff_eq!(pos[OETF_LEN - 2], 0.9687, epsilon = 1e-3);
    }

    #[test]
    fn test_clamped_sample() {
        let c = ToneCurve::bake(CurveKind::InverseEotf, TransferFunction::Linear, |x| x);
        assert_eq!(c.sample(0), 0);
        assert_eq!(c.sample(64), 4095);
        assert_eq!(c.sample(10_000), 4095);
    }

    #[test]
    fn test_iter_restartable() {
        let c = ToneCurve::bake(CurveKind::InverseEotf, TransferFunction::Linear, |x| x);
        let a: Vec<i32> = c.iter().collect();
        let b: Vec<i32> = (&c).into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 65);
    }

    #[test]
    fn test_from_samples_rejects_length() {
        let err = ToneCurve::from_samples(CurveKind::Eotf, TransferFunction::Pq, vec![0; 10]);
        assert!(matches!(err, Err(crate::LutError::InvalidSize { expected: 143, got: 10, .. })));
    }

    #[test]
    fn test_from_samples_rejects_range() {
        let mut s = vec![0; 65];
        s[3] = 5000;
        let err = ToneCurve::from_samples(CurveKind::InverseEotf, TransferFunction::Pq, s);
        assert!(matches!(err, Err(crate::LutError::SampleOutOfRange { index: 3, .. })));
    }

    #[test]
    fn test_evaluate_interpolates() {
        let c = ToneCurve::bake(CurveKind::InverseEotf, TransferFunction::Linear, |x| x);
        assert_abs_diff_eq!(c.evaluate(0.5), 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(c.evaluate(2.0), c.value(64));
    }
}
