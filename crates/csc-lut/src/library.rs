//! The pre-baked tone curve catalogue.
//!
//! Every (kind, transfer function, panel luminance bucket) combination is
//! baked once when the library is built. Tables are shared through [`Arc`],
//! so handing a curve to a configuration bundle never copies samples.

use std::sync::Arc;

use csc_transfer::{hlg, TransferFunction};
use tracing::{debug, info};

use crate::{CurveKind, LutError, LutResult, ToneCurve};

/// Number of panel luminance buckets.
pub const LUMINANCE_BUCKETS: usize = 18;

/// Maps a panel peak luminance in cd/m2 to its curve bucket.
///
/// 20 cd/m2 steps from 250 to 500, then 100 cd/m2 steps up to 1000.
/// Values outside that range land in the first or last bucket.
pub fn luminance_bucket(nits: u32) -> usize {
    if nits <= 500 {
        ((nits.max(250) - 250) / 20) as usize
    } else {
        12 + ((nits.min(1000) - 500) / 100) as usize
    }
}

/// Representative panel luminance a bucket is baked for.
pub fn bucket_nits(bucket: usize) -> u32 {
    let bucket = bucket.min(LUMINANCE_BUCKETS - 1) as u32;
    if bucket <= 12 {
        250 + bucket * 20
    } else {
        500 + (bucket - 12) * 100
    }
}

/// Address of one table in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveKey {
    /// Table kind.
    pub kind: CurveKind,
    /// Transfer function.
    pub function: TransferFunction,
    /// Panel luminance bucket, `0..LUMINANCE_BUCKETS`.
    pub bucket: usize,
}

impl CurveKey {
    /// Creates a key.
    pub const fn new(kind: CurveKind, function: TransferFunction, bucket: usize) -> Self {
        Self { kind, function, bucket }
    }
}

/// The tone curves one pipeline mode programs, by stage.
///
/// Absent entries leave the corresponding hardware stage disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToneCurveSet {
    /// Input linearization.
    pub eotf: Option<Arc<ToneCurve>>,
    /// Luminance gain in linear light.
    pub ootf_gain: Option<Arc<ToneCurve>>,
    /// Output encoding.
    pub oetf: Option<Arc<ToneCurve>>,
    /// Re-encoding into the input function.
    pub inverse_eotf: Option<Arc<ToneCurve>>,
    /// Chroma gain.
    pub saturation_gain: Option<Arc<ToneCurve>>,
}

impl ToneCurveSet {
    /// True when no stage is programmed.
    pub fn is_empty(&self) -> bool {
        self.eotf.is_none()
            && self.ootf_gain.is_none()
            && self.oetf.is_none()
            && self.inverse_eotf.is_none()
            && self.saturation_gain.is_none()
    }

    /// Programmed stages in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = &Arc<ToneCurve>> {
        [
            &self.eotf,
            &self.ootf_gain,
            &self.oetf,
            &self.inverse_eotf,
            &self.saturation_gain,
        ]
        .into_iter()
        .flatten()
    }
}

/// Immutable after construction apart from explicit overrides.
#[derive(Debug, Clone)]
pub struct ToneCurveLibrary {
    /// Indexed by kind, then function, then bucket.
    curves: Vec<Arc<ToneCurve>>,
}

const FUNCTIONS: usize = TransferFunction::ALL.len();

fn kind_index(kind: CurveKind) -> Option<usize> {
    CurveKind::CATALOGUED.iter().position(|&k| k == kind)
}

fn function_index(function: TransferFunction) -> usize {
    match function {
        TransferFunction::Pq => 0,
        TransferFunction::Hlg => 1,
        TransferFunction::Gamma22 => 2,
        TransferFunction::Linear => 3,
    }
}

fn slot(kind: usize, function: usize, bucket: usize) -> usize {
    (kind * FUNCTIONS + function) * LUMINANCE_BUCKETS + bucket
}

impl ToneCurveLibrary {
    /// Bakes every table.
    pub fn new() -> Self {
        let mut curves = Vec::with_capacity(CurveKind::CATALOGUED.len() * FUNCTIONS * LUMINANCE_BUCKETS);
        let saturation = Arc::new(bake_saturation_gain());
        for kind in CurveKind::CATALOGUED {
            for function in TransferFunction::ALL {
                if kind == CurveKind::SaturationGain {
                    curves.extend(std::iter::repeat_n(saturation.clone(), LUMINANCE_BUCKETS));
                } else if kind.depends_on_panel(function) {
                    curves.extend((0..LUMINANCE_BUCKETS).map(|b| Arc::new(bake(kind, function, b))));
                } else {
                    let shared = Arc::new(bake(kind, function, 0));
                    curves.extend(std::iter::repeat_n(shared, LUMINANCE_BUCKETS));
                }
            }
        }
        info!(tables = curves.len(), "tone curve library baked");
        Self { curves }
    }

    /// Looks up a table. Out-of-range buckets clamp to the last bucket.
    ///
    /// Knee tables are generated per policy rather than catalogued; see
    /// [`crate::knee`].
    pub fn get(
        &self,
        kind: CurveKind,
        function: TransferFunction,
        bucket: usize,
    ) -> LutResult<Arc<ToneCurve>> {
        self.lookup(CurveKey::new(kind, function, bucket))
    }

    /// Looks up a table by key.
    pub fn lookup(&self, key: CurveKey) -> LutResult<Arc<ToneCurve>> {
        let kind = kind_index(key.kind).ok_or(LutError::NotCatalogued(key.kind))?;
        let bucket = key.bucket.min(LUMINANCE_BUCKETS - 1);
        Ok(self.curves[slot(kind, function_index(key.function), bucket)].clone())
    }

    /// Replaces a table with externally supplied samples.
    ///
    /// Tables that do not depend on panel luminance are replaced for every
    /// bucket; saturation gain is replaced for every function.
    pub fn override_curve(&mut self, key: CurveKey, samples: Vec<i32>) -> LutResult<()> {
        let kind = kind_index(key.kind).ok_or(LutError::NotCatalogued(key.kind))?;
        let curve = Arc::new(ToneCurve::from_samples(key.kind, key.function, samples)?);
        let functions: Vec<usize> = if key.kind.is_function_independent() {
            (0..FUNCTIONS).collect()
        } else {
            vec![function_index(key.function)]
        };
        let buckets = if key.kind.depends_on_panel(key.function) {
            let b = key.bucket.min(LUMINANCE_BUCKETS - 1);
            b..b + 1
        } else {
            0..LUMINANCE_BUCKETS
        };
        for f in functions {
            for b in buckets.clone() {
                self.curves[slot(kind, f, b)] = curve.clone();
            }
        }
        debug!(kind = ?key.kind, function = %key.function, bucket = key.bucket, "tone curve overridden");
        Ok(())
    }
}

impl Default for ToneCurveLibrary {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Baking
// ============================================================================

fn bake(kind: CurveKind, function: TransferFunction, bucket: usize) -> ToneCurve {
    match kind {
        CurveKind::Eotf => ToneCurve::bake(kind, function, |x| function.eotf(x)),
        CurveKind::Oetf | CurveKind::InverseEotf => {
            ToneCurve::bake(kind, function, |x| function.oetf(x))
        }
        CurveKind::OotfGain => {
            let panel = f64::from(bucket_nits(bucket));
            ToneCurve::bake(kind, function, |x| ootf_gain(function, x, panel))
        }
        CurveKind::SaturationGain | CurveKind::Knee => bake_saturation_gain(),
    }
}

/// Luminance gain relative to panel-normalized light.
///
/// PQ is compressed with an extended Reinhard curve whose white point is
/// the source peak, so 10000 cd/m2 lands exactly on panel peak. HLG applies
/// the system gamma for the panel. Gain is 1 at black for PQ and never
/// exceeds 1.
fn ootf_gain(function: TransferFunction, x: f64, panel_nits: f64) -> f64 {
    match function {
        TransferFunction::Pq => {
            let white = function.peak_nits() / panel_nits;
            let s = x * white;
            (1.0 + s / (white * white)) / (1.0 + s)
        }
        TransferFunction::Hlg => hlg::ootf_gain(x, hlg::system_gamma(panel_nits)),
        TransferFunction::Gamma22 | TransferFunction::Linear => 1.0,
    }
}

/// Highlight chroma boost: unity up to `e/4`, logarithmic above.
fn bake_saturation_gain() -> ToneCurve {
    ToneCurve::bake(CurveKind::SaturationGain, TransferFunction::Linear, |x| {
        let boost = ((4.0 * x).ln() - 1.0).max(0.0);
        (3.0 + 1.2 * boost) / 3.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_luminance_bucket_edges() {
        assert_eq!(luminance_bucket(0), 0);
        assert_eq!(luminance_bucket(250), 0);
        assert_eq!(luminance_bucket(270), 1);
        assert_eq!(luminance_bucket(500), 12);
        assert_eq!(luminance_bucket(600), 13);
        assert_eq!(luminance_bucket(1000), 17);
        assert_eq!(luminance_bucket(4000), 17);
    }

    #[test]
    fn test_bucket_nits_maps_back() {
        for b in 0..LUMINANCE_BUCKETS {
            assert_eq!(luminance_bucket(bucket_nits(b)), b);
        }
    }

    #[test]
    fn test_every_table_has_its_length() {
        let lib = ToneCurveLibrary::new();
        for kind in CurveKind::CATALOGUED {
            for function in TransferFunction::ALL {
                for bucket in 0..LUMINANCE_BUCKETS {
                    let c = lib.get(kind, function, bucket).unwrap();
                    assert_eq!(c.len(), kind.len());
                    assert_eq!(c.iter().count(), kind.len());
                }
            }
        }
    }

    #[test]
    fn test_pq_eotf_shape() {
        let lib = ToneCurveLibrary::new();
        let c = lib.get(CurveKind::Eotf, TransferFunction::Pq, 0).unwrap();
        assert_eq!(c.sample(0), 0);
        assert_abs_diff_eq!(c.value(c.len() - 1), 1.0, epsilon = 1e-8);
        // 0.508 PQ is about 100 cd/m2
        assert_abs_diff_eq!(c.evaluate(0.508), 0.01, epsilon = 5e-4);
        assert!(c.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pq_ootf_gain_per_bucket() {
        let lib = ToneCurveLibrary::new();
        let dim = lib.get(CurveKind::OotfGain, TransferFunction::Pq, 0).unwrap();
        let bright = lib.get(CurveKind::OotfGain, TransferFunction::Pq, 17).unwrap();
        assert_ne!(dim, bright);
        assert_abs_diff_eq!(dim.value(0), 1.0, epsilon = 1e-3);
        // Dimmer panels compress harder
        let mid = CurveKind::OotfGain.len() / 2;
        assert!(dim.sample(mid) < bright.sample(mid));
        assert!(dim.as_slice().windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_pq_peak_lands_on_panel_peak() {
        let panel = 500.0;
        let white = 10000.0 / panel;
        let g = ootf_gain(TransferFunction::Pq, 1.0, panel);
        assert_abs_diff_eq!(g * white, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_independent_tables_shared() {
        let lib = ToneCurveLibrary::new();
        let a = lib.get(CurveKind::Oetf, TransferFunction::Gamma22, 0).unwrap();
        let b = lib.get(CurveKind::Oetf, TransferFunction::Gamma22, 9).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let s1 = lib.get(CurveKind::SaturationGain, TransferFunction::Pq, 3).unwrap();
        let s2 = lib.get(CurveKind::SaturationGain, TransferFunction::Hlg, 11).unwrap();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn test_saturation_gain_unity_then_boost() {
        let lib = ToneCurveLibrary::new();
        let c = lib.get(CurveKind::SaturationGain, TransferFunction::Linear, 0).unwrap();
        assert_eq!(c.sample(0), 1024);
        assert_eq!(c.sample(32), 1024);
        assert!(c.sample(64) > 1024);
    }

    #[test]
    fn test_bucket_clamps() {
        let lib = ToneCurveLibrary::new();
        let a = lib.get(CurveKind::OotfGain, TransferFunction::Hlg, 17).unwrap();
        let b = lib.get(CurveKind::OotfGain, TransferFunction::Hlg, 99).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_override_curve() {
        let mut lib = ToneCurveLibrary::new();
        let key = CurveKey::new(CurveKind::Oetf, TransferFunction::Gamma22, 4);
        lib.override_curve(key, vec![7; 149]).unwrap();
        assert_eq!(lib.get(CurveKind::Oetf, TransferFunction::Gamma22, 0).unwrap().sample(10), 7);
        assert_ne!(lib.get(CurveKind::Oetf, TransferFunction::Pq, 0).unwrap().sample(10), 7);

        let bad = lib.override_curve(key, vec![7; 10]);
        assert!(matches!(bad, Err(LutError::InvalidSize { .. })));
        assert!(matches!(
            lib.lookup(CurveKey::new(CurveKind::Knee, TransferFunction::Linear, 0)),
            Err(LutError::NotCatalogued(CurveKind::Knee))
        ));
    }
}
