//! Operator policy.
//!
//! A [`PolicyConfig`] is written by a control surface at arbitrary times and
//! read as a fresh snapshot at the start of each evaluation. Fields are
//! independent; no cross-field atomicity is assumed.
//!
//! All fields have defaults, so partial documents deserialize:
//!
//! ```rust
//! use csc_core::{ModePolicy, PolicyConfig};
//!
//! let p = PolicyConfig { hdr_mode: ModePolicy::ForceOff, ..Default::default() };
//! assert!(p.validate().is_ok());
//! assert_eq!(p.debounce_threshold, 1);
//! ```

use crate::error::{Error, Result};
use crate::master::MasterDisplayInfo;
use serde::{Deserialize, Serialize};

/// Per-family routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePolicy {
    /// Decide from sink capability.
    #[default]
    Auto,
    /// Keep HDR sources native; upconvert SDR sources.
    ForceOn,
    /// Convert HDR sources to SDR; never upconvert SDR.
    ForceOff,
}

impl ModePolicy {
    /// All policies.
    pub const ALL: [ModePolicy; 3] = [Self::Auto, Self::ForceOn, Self::ForceOff];
}

/// Processing flags for HDR down-conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HdrFlags {
    /// Take source primaries from mastering metadata.
    pub use_source_primaries: bool,
    /// Take target primaries from the sink when reported.
    pub use_display_primaries: bool,
    /// Apply the extra contrast table.
    pub adjust_contrast: bool,
    /// Apply the extra saturation table.
    pub adjust_saturation: bool,
}

impl HdrFlags {
    /// Unpacks the bit layout used by control surfaces
    /// (bit 0 source primaries, bit 1 display primaries, bit 2 contrast,
    /// bit 3 saturation).
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            use_source_primaries: bits & 0x1 != 0,
            use_display_primaries: bits & 0x2 != 0,
            adjust_contrast: bits & 0x4 != 0,
            adjust_saturation: bits & 0x8 != 0,
        }
    }

    /// Packs into the control surface layout.
    pub const fn bits(&self) -> u32 {
        (self.use_source_primaries as u32)
            | (self.use_display_primaries as u32) << 1
            | (self.adjust_contrast as u32) << 2
            | (self.adjust_saturation as u32) << 3
    }
}

impl Default for HdrFlags {
    fn default() -> Self {
        Self::from_bits(0b0011)
    }
}

/// Knee curve interpolation between control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KneeInterpolation {
    /// Straight segments.
    Linear,
    /// 4-tap cubic.
    #[default]
    Cubic,
}

/// Contrast ratio table over mastering luminance.
///
/// `ratios[i]` applies at `thresholds[i]` nits; above the last threshold the
/// last ratio holds. `norm` is the ratio meaning 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraContrast {
    /// Luminance breakpoints in cd/m2, strictly increasing.
    pub thresholds: [u32; 5],
    /// Ratio at each breakpoint.
    pub ratios: [i32; 5],
    /// Unity ratio.
    pub norm: i32,
}

impl Default for ExtraContrast {
    fn default() -> Self {
        Self {
            thresholds: [512, 1024, 2048, 4096, 8192],
            ratios: [144, 136, 132, 130, 128],
            norm: 128,
        }
    }
}

/// White balance stage: `out = (in + pre) * gain / 1024 + post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteBalance {
    /// Stage enabled.
    pub enabled: bool,
    /// R, G, B offsets before gain.
    pub pre_offset: [i32; 3],
    /// R, G, B gains, 1024 = 1.0.
    pub gain: [i32; 3],
    /// R, G, B offsets after gain.
    pub post_offset: [i32; 3],
}

impl WhiteBalance {
    /// Unity gain of the stage.
    pub const UNITY_GAIN: i32 = 1024;
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self {
            enabled: false,
            pre_offset: [0; 3],
            gain: [Self::UNITY_GAIN; 3],
            post_offset: [0; 3],
        }
    }
}

/// Operator settings read once per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Engine enabled. When false every evaluation selects bypass.
    pub enabled: bool,
    /// HDR10 routing.
    pub hdr_mode: ModePolicy,
    /// HLG routing.
    pub hlg_mode: ModePolicy,
    /// SDR routing.
    pub sdr_mode: ModePolicy,
    /// Down-conversion flags.
    pub hdr_flags: HdrFlags,
    /// Knee blend weight, 0..=256.
    pub knee_factor: u32,
    /// Knee interpolation.
    pub knee_interpolation: KneeInterpolation,
    /// Contrast table.
    pub extra_contrast: ExtraContrast,
    /// Saturation offsets: `[0]` when requested, `[1]` when mastering
    /// luminance is known and at most 1200 cd/m2.
    pub extra_saturation: [i32; 2],
    /// Base video contrast the extra contrast is applied on top of.
    pub video_contrast: i32,
    /// "No frame" ticks before the neutral fallback is applied.
    pub debounce_threshold: u32,
    /// Substitute a fixed BT.2020/ST 2084 profile when frames carry no
    /// mastering metadata.
    pub primaries_override: bool,
    /// Replaces the static metadata sent to the sink.
    pub outbound_override: Option<MasterDisplayInfo>,
    /// Display gain, 2048 = 1.0.
    pub display_gain: u32,
    /// Panel peak luminance in cd/m2 used to pick tone curves when the sink
    /// reports none.
    pub panel_luminance: u32,
    /// Graphics white in cd/m2 when the OSD plane is mapped to an HDR output.
    pub osd_white_nits: u32,
    /// Saturation offset for SDR to HDR on televisions.
    pub sdr_saturation_offset: i32,
    /// Signal BT.2020 colorimetry for SDR output to HDR-capable sinks.
    pub sdr_output_bt2020: bool,
    /// Keep HLG on sinks that support HDR10 but not HLG.
    pub force_pure_hlg: bool,
    /// White balance.
    pub white_balance: WhiteBalance,
}

impl PolicyConfig {
    /// Maximum knee factor (1.0).
    pub const KNEE_FACTOR_MAX: u32 = 256;
    /// Display gain meaning 1.0.
    pub const UNITY_DISPLAY_GAIN: u32 = 2048;
    /// Graphics white on HDR outputs, the BT.2408 reference white.
    pub const OSD_WHITE_DEFAULT: u32 = 203;
    /// Largest contrast ratio or norm accepted.
    pub const CONTRAST_RATIO_MAX: i32 = 4096;

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.knee_factor > Self::KNEE_FACTOR_MAX {
            return Err(Error::InvalidPolicy(format!(
                "knee_factor {} exceeds {}",
                self.knee_factor,
                Self::KNEE_FACTOR_MAX
            )));
        }
        if self.debounce_threshold == 0 {
            return Err(Error::InvalidPolicy("debounce_threshold must be at least 1".into()));
        }
        if self.display_gain == 0 {
            return Err(Error::InvalidPolicy("display_gain must be positive".into()));
        }
        if self.panel_luminance == 0 {
            return Err(Error::InvalidPolicy("panel_luminance must be positive".into()));
        }
        if !(1..=1000).contains(&self.osd_white_nits) {
            return Err(Error::InvalidPolicy("osd_white_nits out of 1..=1000".into()));
        }
        if !(-1024..=1023).contains(&self.video_contrast) {
            return Err(Error::InvalidPolicy("video_contrast out of -1024..=1023".into()));
        }
        let ec = &self.extra_contrast;
        if !(1..=Self::CONTRAST_RATIO_MAX).contains(&ec.norm) {
            return Err(Error::InvalidPolicy(format!(
                "extra_contrast.norm out of 1..={}",
                Self::CONTRAST_RATIO_MAX
            )));
        }
        if ec.ratios.iter().any(|r| !(0..=Self::CONTRAST_RATIO_MAX).contains(r)) {
            return Err(Error::InvalidPolicy(format!(
                "extra_contrast.ratios out of 0..={}",
                Self::CONTRAST_RATIO_MAX
            )));
        }
        if !self.extra_contrast.thresholds.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidPolicy(
                "extra_contrast.thresholds must be strictly increasing".into(),
            ));
        }
        let wb = &self.white_balance;
        if wb.gain.iter().any(|g| !(0..=4095).contains(g)) {
            return Err(Error::InvalidPolicy("white_balance.gain out of 0..=4095".into()));
        }
        if wb.pre_offset.iter().chain(&wb.post_offset).any(|o| !(-1024..=1023).contains(o)) {
            return Err(Error::InvalidPolicy("white_balance offset out of -1024..=1023".into()));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hdr_mode: ModePolicy::Auto,
            hlg_mode: ModePolicy::Auto,
            sdr_mode: ModePolicy::Auto,
            hdr_flags: HdrFlags::default(),
            knee_factor: 0,
            knee_interpolation: KneeInterpolation::Cubic,
            extra_contrast: ExtraContrast::default(),
            extra_saturation: [16, 32],
            video_contrast: 0,
            debounce_threshold: 1,
            primaries_override: false,
            outbound_override: None,
            display_gain: Self::UNITY_DISPLAY_GAIN,
            panel_luminance: 500,
            osd_white_nits: Self::OSD_WHITE_DEFAULT,
            sdr_saturation_offset: 20,
            sdr_output_bt2020: false,
            force_pure_hlg: false,
            white_balance: WhiteBalance::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let p = PolicyConfig::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.hdr_flags.bits(), 0b0011);
        assert!(!p.hdr_flags.adjust_saturation);
    }

    #[test]
    fn test_flag_bits_roundtrip() {
        for bits in 0..16 {
            assert_eq!(HdrFlags::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        let p = PolicyConfig { knee_factor: 300, ..Default::default() };
        assert!(matches!(p.validate(), Err(Error::InvalidPolicy(_))));

        let p = PolicyConfig { debounce_threshold: 0, ..Default::default() };
        assert!(p.validate().is_err());

        let mut p = PolicyConfig::default();
        p.extra_contrast.thresholds = [512, 512, 2048, 4096, 8192];
        assert!(p.validate().is_err());

        let mut p = PolicyConfig::default();
        p.white_balance.post_offset[1] = 5000;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_rejects_contrast_out_of_range() {
        for v in [i32::MIN, -1025, 1024, i32::MAX] {
            let p = PolicyConfig { video_contrast: v, ..Default::default() };
            assert!(p.validate().is_err(), "video_contrast {v}");
        }
        let p = PolicyConfig { video_contrast: -1024, ..Default::default() };
        assert!(p.validate().is_ok());

        let mut p = PolicyConfig::default();
        p.extra_contrast.ratios[2] = -1;
        assert!(p.validate().is_err());
        p.extra_contrast.ratios[2] = i32::MAX;
        assert!(p.validate().is_err());

        let mut p = PolicyConfig::default();
        p.extra_contrast.norm = 0;
        assert!(p.validate().is_err());
    }
}
