//! Luminance-dependent contrast and saturation offsets.
//!
//! Offsets are applied by the video adjustment block after the colour
//! pipeline. Both are zero unless the active mode remaps HDR content.

use csc_core::{ExtraContrast, MasterDisplayInfo, PipelineMode, Platform, PolicyConfig};

/// Mastering luminance above which no extra adjustment is applied.
pub const ADJUST_MAX_NITS: u32 = 1200;

/// Representable contrast range, centred on 1024.
const CONTRAST_CODES: i32 = 2047;
const CONTRAST_CENTRE: i32 = 1024;

/// Contrast ratio for a mastering peak of `nits`, in `table.norm` units.
///
/// Below the first threshold the first ratio holds, at or above the last
/// threshold the last ratio holds, and in between the ratio is
/// interpolated linearly in integer arithmetic. The result is monotone in
/// `nits` in the direction the table is ordered.
pub fn contrast_ratio(table: &ExtraContrast, nits: u32) -> i32 {
    let t = &table.thresholds;
    let r = &table.ratios;
    let k = t.iter().position(|&th| nits < th).unwrap_or(t.len());
    if k == 0 {
        return r[0];
    }
    if k == t.len() {
        return r[t.len() - 1];
    }
    let (left, right) = (i64::from(r[k - 1]), i64::from(r[k]));
    let norm = i64::from(t[k] - t[k - 1]);
    let alph = i64::from(nits - t[k - 1]);
    let step = (alph * (right - left) + (norm >> 1)) / norm;
    // between two i32 endpoints
    (left + step) as i32
}

/// Contrast offset relative to `base` for a mastering peak of `nits`.
///
/// The target contrast `(base + 1024) * ratio / norm` is clamped to the
/// 11-bit contrast range before the base is subtracted again.
pub fn contrast_offset(table: &ExtraContrast, base: i32, nits: u32) -> i32 {
    let ratio = i64::from(contrast_ratio(table, nits));
    let norm = i64::from(table.norm.max(1));
    let base = i64::from(base);
    let centre = i64::from(CONTRAST_CENTRE);
    let target = ((base + centre) * ratio + norm / 2) / norm;
    let target = target.clamp(0, i64::from(CONTRAST_CODES));
    (target - centre - base).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Contrast and saturation offsets for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustment {
    /// Added to the video contrast.
    pub contrast: i32,
    /// Added to the video saturation.
    pub saturation: i32,
}

impl Adjustment {
    /// No adjustment.
    pub const NONE: Self = Self { contrast: 0, saturation: 0 };
}

/// Mastering peak in whole cd/m2 when it falls in the adjustable range.
fn adjustable_peak(master: Option<&MasterDisplayInfo>) -> Option<u32> {
    let nits = master?.max_luminance_nits() as u32;
    (nits > 0 && nits <= ADJUST_MAX_NITS).then_some(nits)
}

/// Computes the offsets for `mode`.
///
/// Legacy platforms tone map through the 289-sample knee table and take no
/// extra contrast.
pub fn adjust(
    mode: PipelineMode,
    master: Option<&MasterDisplayInfo>,
    policy: &PolicyConfig,
    platform: Platform,
) -> Adjustment {
    match mode {
        PipelineMode::Hdr2Sdr | PipelineMode::Hlg2Sdr => {
            let flags = policy.hdr_flags;
            let peak = adjustable_peak(master);
            let contrast = match peak {
                Some(nits) if flags.adjust_contrast && !platform.is_legacy() => {
                    contrast_offset(&policy.extra_contrast, policy.video_contrast, nits)
                }
                _ => 0,
            };
            let saturation = match (flags.adjust_saturation, peak) {
                (false, _) => 0,
                (true, Some(_)) => policy.extra_saturation[1],
                (true, None) => policy.extra_saturation[0],
            };
            Adjustment { contrast, saturation }
        }
        PipelineMode::Sdr2Hdr if platform.is_television() => {
            Adjustment { contrast: 0, saturation: policy.sdr_saturation_offset }
        }
        _ => Adjustment::NONE,
    }
}
