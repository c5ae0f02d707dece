//! Hardware configuration bundles and per-mode plans.
//!
//! Each [`PipelineMode`] maps to a small [`ModePlan`]: which transfer
//! functions linearize and re-encode, whether a luminance gain and chroma
//! gain are applied, and which gamut the output targets. The configurator
//! resolves a plan into a [`HardwareConfigBundle`].
//!
//! Stages run in this order:
//!
//! ```text
//! input decode -> EOTF -> gamut -> OOTF gain -> OETF | inverse EOTF
//!     -> saturation gain -> knee -> output encode -> SD/HD conversion
//!     -> white balance
//! ```
//!
//! The graphics (OSD) plane is blended after the video pipeline and has its
//! own EOTF, gamut matrix and OETF. [`OsdConfig`] maps SDR graphics onto
//! an HDR output so the UI matches the video.

use std::sync::Arc;

use csc_core::{ChangeState, ColorPrimaries, PipelineMode, WhiteBalance};
use csc_lut::{ToneCurve, ToneCurveSet};
use csc_primaries::GamutMatrix;
use csc_transfer::TransferFunction;

use crate::classify::CscType;

// ============================================================================
// Plans
// ============================================================================

/// Gamut the output is expressed in when the sink does not report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetGamut {
    /// Keep the source gamut.
    Source,
    /// BT.709.
    Sdr,
    /// BT.2020.
    Hdr,
}

/// Panel luminance an OOTF gain table is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OotfTarget {
    /// No luminance gain.
    None,
    /// The output panel.
    Panel,
    /// A fixed peak in cd/m2.
    Fixed(u32),
}

/// Transform recipe for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModePlan {
    /// Function the source is encoded with.
    pub input: TransferFunction,
    /// Function the output is encoded with.
    pub output: TransferFunction,
    /// Luminance gain.
    pub ootf: OotfTarget,
    /// Default output gamut.
    pub target: TargetGamut,
    /// Source gamut is read from mastering metadata rather than the signalled
    /// container. Only conversions remap mastering primaries; native
    /// passthrough keeps the container.
    pub mastering_source: bool,
    /// Apply the highlight chroma gain.
    pub saturation_gain: bool,
    /// Output is SDR and may take the knee curve.
    pub sdr_target: bool,
    /// Decode to RGB even without a gamut change.
    pub needs_rgb: bool,
}

impl ModePlan {
    /// Plan for `mode`.
    pub const fn for_mode(mode: PipelineMode) -> Self {
        use TransferFunction::{Gamma22, Hlg, Pq};
        const fn plan(input: TransferFunction, output: TransferFunction, target: TargetGamut) -> ModePlan {
            ModePlan {
                input,
                output,
                ootf: OotfTarget::None,
                target,
                mastering_source: false,
                saturation_gain: false,
                sdr_target: false,
                needs_rgb: true,
            }
        }
        match mode {
            PipelineMode::Bypass => {
                let mut p = plan(Gamma22, Gamma22, TargetGamut::Source);
                p.needs_rgb = false;
                p
            }
            PipelineMode::Sdr2Sdr => {
                let mut p = plan(Gamma22, Gamma22, TargetGamut::Source);
                p.needs_rgb = false;
                p.sdr_target = true;
                p
            }
            PipelineMode::Hdr2Hdr | PipelineMode::Hdr10Plus => plan(Pq, Pq, TargetGamut::Hdr),
            PipelineMode::Hlg2Hlg => plan(Hlg, Hlg, TargetGamut::Hdr),
            PipelineMode::Sdr2Hdr => plan(Gamma22, Pq, TargetGamut::Hdr),
            PipelineMode::Hlg2Hdr => {
                let mut p = plan(Hlg, Pq, TargetGamut::Hdr);
                p.ootf = OotfTarget::Fixed(1000);
                p.mastering_source = true;
                p
            }
            PipelineMode::Hdr2Sdr => {
                let mut p = plan(Pq, Gamma22, TargetGamut::Sdr);
                p.ootf = OotfTarget::Panel;
                p.mastering_source = true;
                p.saturation_gain = true;
                p.sdr_target = true;
                p
            }
            PipelineMode::Hlg2Sdr => {
                let mut p = plan(Hlg, Gamma22, TargetGamut::Sdr);
                p.ootf = OotfTarget::Panel;
                p.mastering_source = true;
                p.saturation_gain = true;
                p.sdr_target = true;
                p
            }
        }
    }

    /// True when the source keeps its transfer function end to end.
    pub fn is_passthrough(&self) -> bool {
        self.needs_rgb && !self.mastering_source && self.input == self.output
    }

    /// Ratio between the linear light of the input and output curves.
    ///
    /// PQ tone mapping to a panel works in panel-relative light, so its
    /// scale is the PQ peak over the panel peak.
    pub fn linear_scale(&self, panel_nits: u32) -> f64 {
        match (self.input, self.output, self.ootf) {
            (TransferFunction::Pq, _, OotfTarget::Panel) => {
                self.input.peak_nits() / f64::from(panel_nits.max(1))
            }
            (TransferFunction::Hlg, _, OotfTarget::Panel) => 1.0,
            (i, o, _) if i == o => 1.0,
            (i, o, _) => i.peak_nits() / o.peak_nits(),
        }
    }
}

// ============================================================================
// Graphics plane
// ============================================================================

/// How the graphics plane is matched to the video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OsdMapping {
    /// Graphics pass through untouched.
    #[default]
    Bypass,
    /// SDR graphics re-encoded as PQ.
    SdrToPq,
    /// SDR graphics re-encoded as HLG.
    SdrToHlg,
}

impl OsdMapping {
    /// Mapping for a video output encoded with `output`.
    pub const fn for_output(output: TransferFunction) -> Self {
        match output {
            TransferFunction::Pq => Self::SdrToPq,
            TransferFunction::Hlg => Self::SdrToHlg,
            TransferFunction::Gamma22 | TransferFunction::Linear => Self::Bypass,
        }
    }

    /// Function graphics are encoded with after mapping.
    pub const fn output(self) -> TransferFunction {
        match self {
            Self::Bypass => TransferFunction::Gamma22,
            Self::SdrToPq => TransferFunction::Pq,
            Self::SdrToHlg => TransferFunction::Hlg,
        }
    }
}

/// Graphics plane configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OsdConfig {
    /// Selected mapping.
    pub mapping: OsdMapping,
    /// BT.709 to output gamut, in linear light.
    pub gamut: GamutMatrix,
    /// Graphics linearization.
    pub eotf: Option<Arc<ToneCurve>>,
    /// Re-encoding into the output function.
    pub oetf: Option<Arc<ToneCurve>>,
    /// Graphics white relative to the output peak.
    pub linear_scale: f64,
}

impl OsdConfig {
    /// Graphics untouched.
    pub fn bypass() -> Self {
        Self {
            mapping: OsdMapping::Bypass,
            gamut: GamutMatrix::identity(),
            eotf: None,
            oetf: None,
            linear_scale: 1.0,
        }
    }

    /// True when the graphics plane is not remapped.
    pub fn is_bypass(&self) -> bool {
        self.mapping == OsdMapping::Bypass
    }
}

impl Default for OsdConfig {
    fn default() -> Self {
        Self::bypass()
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// One hardware stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Y'CbCr to R'G'B'.
    InputDecode,
    /// Linearization.
    Eotf,
    /// Gamut matrix.
    Gamut,
    /// Luminance gain.
    OotfGain,
    /// Output encoding.
    Oetf,
    /// Re-encoding into the input function.
    InverseEotf,
    /// Chroma gain.
    SaturationGain,
    /// Knee LUT.
    Knee,
    /// R'G'B' to Y'CbCr.
    OutputEncode,
    /// SD/HD Y'CbCr conversion.
    YcbcrConversion,
    /// White balance.
    WhiteBalance,
}

/// Everything the display driver needs to program for one configuration.
///
/// Disabled stages keep their last content; the driver only programs what
/// is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareConfigBundle {
    /// Mode this bundle realizes.
    pub mode: PipelineMode,
    /// Input conversion type.
    pub csc_type: CscType,
    /// What triggered the bundle.
    pub changes: ChangeState,
    /// Emitted by an idle fallback tick.
    pub toggle: bool,
    /// Input Y'CbCr decode.
    pub input_decode: Option<GamutMatrix>,
    /// Linear-light gamut matrix.
    pub gamut: GamutMatrix,
    /// Tone curves.
    pub curves: ToneCurveSet,
    /// Scale between the input and output curves' linear light.
    pub linear_scale: f64,
    /// Knee LUT.
    pub knee: Option<Arc<ToneCurve>>,
    /// Output Y'CbCr encode.
    pub output_encode: Option<GamutMatrix>,
    /// SD/HD matrix conversion for Y'CbCr passthrough.
    pub ycbcr_conversion: Option<GamutMatrix>,
    /// White balance stage.
    pub white_balance: Option<WhiteBalance>,
    /// Contrast offset.
    pub contrast_offset: i32,
    /// Saturation offset.
    pub saturation_offset: i32,
    /// Primaries the video leaves the pipeline in.
    pub output_primaries: ColorPrimaries,
    /// Graphics plane.
    pub osd: OsdConfig,
}

impl HardwareConfigBundle {
    /// True when `stage` is programmed.
    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::InputDecode => self.input_decode.is_some(),
            Stage::Eotf => self.curves.eotf.is_some(),
            Stage::Gamut => !self.gamut.is_identity(),
            Stage::OotfGain => self.curves.ootf_gain.is_some(),
            Stage::Oetf => self.curves.oetf.is_some(),
            Stage::InverseEotf => self.curves.inverse_eotf.is_some(),
            Stage::SaturationGain => self.curves.saturation_gain.is_some(),
            Stage::Knee => self.knee.is_some(),
            Stage::OutputEncode => self.output_encode.is_some(),
            Stage::YcbcrConversion => self.ycbcr_conversion.is_some(),
            Stage::WhiteBalance => self.white_balance.is_some(),
        }
    }

    /// Enabled stages in pipeline order.
    pub fn enabled_stages(&self) -> Vec<Stage> {
        const ORDER: [Stage; 11] = [
            Stage::InputDecode,
            Stage::Eotf,
            Stage::Gamut,
            Stage::OotfGain,
            Stage::Oetf,
            Stage::InverseEotf,
            Stage::SaturationGain,
            Stage::Knee,
            Stage::OutputEncode,
            Stage::YcbcrConversion,
            Stage::WhiteBalance,
        ];
        ORDER.into_iter().filter(|&s| self.is_enabled(s)).collect()
    }

    /// Checks the bundle is self-consistent.
    ///
    /// - a non-identity gamut runs in linear light, between an EOTF and a
    ///   re-encoding curve
    /// - the tone-mapping curves only run after linearization
    /// - exactly one of OETF and inverse EOTF closes a linear section
    /// - every curve has its kind's length
    /// - a remapped graphics plane has both of its curves, a bypassed one
    ///   has neither
    pub fn validate(&self) -> Result<(), &'static str> {
        let linear = self.curves.eotf.is_some();
        let reencoded = self.curves.oetf.is_some() || self.curves.inverse_eotf.is_some();
        if self.curves.oetf.is_some() && self.curves.inverse_eotf.is_some() {
            return Err("OETF and inverse EOTF both enabled");
        }
        if linear != reencoded {
            return Err("linear section not closed");
        }
        if !self.gamut.is_identity() && !linear {
            return Err("gamut matrix outside linear light");
        }
        if (self.curves.ootf_gain.is_some() || self.curves.saturation_gain.is_some()) && !linear {
            return Err("tone curve before linearization");
        }
        if self.curves.stages().any(|c| c.len() != c.kind().len()) {
            return Err("curve length mismatch");
        }
        if self.ycbcr_conversion.is_some() && self.input_decode.is_some() {
            return Err("Y'CbCr conversion on an RGB path");
        }
        let osd = &self.osd;
        if osd.is_bypass() {
            if osd.eotf.is_some() || osd.oetf.is_some() || !osd.gamut.is_identity() {
                return Err("bypassed OSD plane programmed");
            }
        } else if osd.eotf.is_none() || osd.oetf.is_none() {
            return Err("OSD mapping without curves");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn test_plan_families() {
        for mode in PipelineMode::ALL {
            let plan = ModePlan::for_mode(mode);
            assert_eq!(plan.output.is_hdr(), mode.output_is_hdr(), "{mode}");
            assert_eq!(plan.saturation_gain, mode.is_down_conversion(), "{mode}");
        }
    }

    #[test]
    fn test_only_conversions_read_mastering_primaries() {
        for mode in PipelineMode::ALL {
            let plan = ModePlan::for_mode(mode);
            let converts = matches!(
                mode,
                PipelineMode::Hdr2Sdr | PipelineMode::Hlg2Sdr | PipelineMode::Hlg2Hdr
            );
            assert_eq!(plan.mastering_source, converts, "{mode}");
        }
        for mode in [PipelineMode::Hdr2Hdr, PipelineMode::Hdr10Plus, PipelineMode::Hlg2Hlg] {
            assert!(ModePlan::for_mode(mode).is_passthrough(), "{mode}");
        }
        assert!(!ModePlan::for_mode(PipelineMode::Sdr2Sdr).is_passthrough());
    }

    #[test]
    fn test_osd_mapping_follows_output() {
        assert_eq!(OsdMapping::for_output(TransferFunction::Pq), OsdMapping::SdrToPq);
        assert_eq!(OsdMapping::for_output(TransferFunction::Hlg), OsdMapping::SdrToHlg);
        assert_eq!(OsdMapping::for_output(TransferFunction::Gamma22), OsdMapping::Bypass);
        assert_eq!(OsdMapping::SdrToHlg.output(), TransferFunction::Hlg);
    }

    #[test]
    fn test_validate_osd_plane() {
        let lib = csc_lut::ToneCurveLibrary::new();
        let mut b = empty_bundle();
        b.osd.mapping = OsdMapping::SdrToPq;
        assert_eq!(b.validate(), Err("OSD mapping without curves"));
        b.osd.eotf = Some(lib.get(csc_lut::CurveKind::Eotf, TransferFunction::Gamma22, 0).unwrap());
        b.osd.oetf = Some(lib.get(csc_lut::CurveKind::Oetf, TransferFunction::Pq, 0).unwrap());
        assert!(b.validate().is_ok());
        b.osd.mapping = OsdMapping::Bypass;
        assert_eq!(b.validate(), Err("bypassed OSD plane programmed"));
    }

    #[test]
    fn test_linear_scale() {
        let hdr2sdr = ModePlan::for_mode(PipelineMode::Hdr2Sdr);
        assert_eq!(hdr2sdr.linear_scale(500), 20.0);
        assert_eq!(ModePlan::for_mode(PipelineMode::Sdr2Hdr).linear_scale(500), 0.01);
        assert_eq!(ModePlan::for_mode(PipelineMode::Hlg2Hdr).linear_scale(500), 0.1);
        assert_eq!(ModePlan::for_mode(PipelineMode::Hlg2Sdr).linear_scale(500), 1.0);
        assert_eq!(ModePlan::for_mode(PipelineMode::Hdr2Hdr).linear_scale(500), 1.0);
    }

    pub(crate) fn empty_bundle() -> HardwareConfigBundle {
        HardwareConfigBundle {
            mode: PipelineMode::Bypass,
            csc_type: CscType::Yuv709Limited,
            changes: ChangeState::empty(),
            toggle: false,
            input_decode: None,
            gamut: GamutMatrix::identity(),
            curves: ToneCurveSet::default(),
            linear_scale: 1.0,
            knee: None,
            output_encode: None,
            ycbcr_conversion: None,
            white_balance: None,
            contrast_offset: 0,
            saturation_offset: 0,
            output_primaries: ColorPrimaries::Bt709,
            osd: OsdConfig::bypass(),
        }
    }

    #[test]
    fn test_validate_rejects_gamut_without_linear() {
        let mut b = empty_bundle();
        assert!(b.validate().is_ok());
        assert!(b.enabled_stages().is_empty());
        b.gamut = GamutMatrix::fit(&csc_math::Mat3::diagonal(0.5, 0.5, 0.5));
        assert_eq!(b.validate(), Err("gamut matrix outside linear light"));
    }

    #[test]
    fn test_validate_rejects_open_section() {
        let lib = csc_lut::ToneCurveLibrary::new();
        let mut b = empty_bundle();
        b.curves.eotf = Some(lib.get(csc_lut::CurveKind::Eotf, TransferFunction::Pq, 0).unwrap());
        assert_eq!(b.validate(), Err("linear section not closed"));
        b.curves.oetf = Some(lib.get(csc_lut::CurveKind::Oetf, TransferFunction::Gamma22, 0).unwrap());
        assert!(b.validate().is_ok());
        assert_eq!(b.enabled_stages(), vec![Stage::Eotf, Stage::Oetf]);
    }
}
