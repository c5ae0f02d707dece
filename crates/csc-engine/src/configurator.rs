//! The per-frame orchestrator.
//!
//! [`Configurator::evaluate`] runs once per displayed frame. It classifies
//! the frame, selects a mode, and returns a new [`HardwareConfigBundle`]
//! only when something changed; the common case is the no-op path, which
//! is a snapshot, a classification and a handful of comparisons.
//!
//! A configurator owns the last observed state, so calls take `&mut self`
//! and are serialized by construction. Policy is read from a
//! [`PolicyHandle`] snapshot at the start of every call.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use csc_core::{MasterDisplayInfo, Platform, RawSignalType, SignalRange, SinkCapability, SourceKind};
//! use csc_engine::{Configurator, FrameInfo, PolicyHandle};
//! use csc_lut::ToneCurveLibrary;
//!
//! let mut engine = Configurator::new(
//!     Platform::SET_TOP_BOX,
//!     Arc::new(ToneCurveLibrary::new()),
//!     PolicyHandle::default(),
//! );
//! let frame = FrameInfo::new(
//!     RawSignalType::compose(9, 16, 9, SignalRange::Limited),
//!     SourceKind::Other,
//!     3840,
//!     2160,
//! )
//! .with_master(MasterDisplayInfo::with_max_nits(1000));
//!
//! let sink = SinkCapability::hdr10();
//! assert!(engine.evaluate(Some(&frame), false, &sink).is_some());
//! assert!(engine.evaluate(Some(&frame), false, &sink).is_none());
//! ```

use std::sync::Arc;

use csc_core::{
    ChangeState, ColorPrimaries, KneeInterpolation, PipelineMode, Platform, PolicyConfig,
    SignalRange, SinkCapability,
};
use csc_lut::{knee, luminance_bucket, CurveKind, ToneCurve, ToneCurveLibrary, ToneCurveSet};
use csc_primaries::gamut::{self, UNITY_GAIN};
use csc_primaries::ycbcr::YcbcrMatrix;
use csc_primaries::{GamutMatrix, Primaries, BT2020, BT709};
use csc_transfer::TransferFunction;
use tracing::{debug, trace, warn};

use crate::adjust::adjust;
use crate::bundle::{
    HardwareConfigBundle, ModePlan, OotfTarget, OsdConfig, OsdMapping, TargetGamut,
};
use crate::classify::{
    classify_frame, ChangeTracker, Classification, Environment, FrameInfo, SourceOutputConversion,
    HD_LINES,
};
use crate::config::PolicyHandle;
use crate::hysteresis::{Hysteresis, IdleAction};
use crate::metadata::{outbound_for, SinkNotifier};
use crate::select::select_mode;

/// Chromaticity tolerance for treating two gamuts as the same.
const SAME_GAMUT_TOL: f64 = 1e-4;

/// Knee table built for one policy setting.
#[derive(Debug, Clone)]
struct KneeCache {
    factor: u32,
    interpolation: KneeInterpolation,
    curve: Arc<ToneCurve>,
}

/// Per-frame HDR/SDR pipeline orchestrator.
pub struct Configurator {
    platform: Platform,
    library: Arc<ToneCurveLibrary>,
    policy: PolicyHandle,
    tracker: ChangeTracker,
    hysteresis: Hysteresis,
    notifier: Option<Box<dyn SinkNotifier>>,
    /// Environment changes committed on idle ticks but not yet emitted.
    pending: ChangeState,
    knee: Option<KneeCache>,
}

impl std::fmt::Debug for Configurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configurator")
            .field("platform", &self.platform)
            .field("last_mode", &self.tracker.last_mode())
            .field("idle_ticks", &self.hysteresis.idle_ticks())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Configurator {
    /// Creates an orchestrator with no observed state.
    pub fn new(platform: Platform, library: Arc<ToneCurveLibrary>, policy: PolicyHandle) -> Self {
        Self {
            platform,
            library,
            policy,
            tracker: ChangeTracker::new(),
            hysteresis: Hysteresis::new(),
            notifier: None,
            pending: ChangeState::empty(),
            knee: None,
        }
    }

    /// Attaches the collaborator informed of outbound HDR metadata.
    pub fn with_notifier(mut self, notifier: Box<dyn SinkNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Platform the engine was built for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Shared policy handle.
    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// Mode of the last emitted or observed configuration.
    pub fn current_mode(&self) -> Option<PipelineMode> {
        self.tracker.last_mode()
    }

    /// Consecutive "no frame" ticks.
    pub fn idle_ticks(&self) -> u32 {
        self.hysteresis.idle_ticks()
    }

    /// Forgets all observed state; the next evaluation emits.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.hysteresis.reset();
        self.pending = ChangeState::empty();
    }

    /// Evaluates one vsync against a fresh policy snapshot.
    ///
    /// `frame` is `None` when no new frame was queued; `repeat` marks that
    /// the previous frame is shown again. Returns a bundle only when the
    /// hardware must be reprogrammed.
    pub fn evaluate(
        &mut self,
        frame: Option<&FrameInfo>,
        repeat: bool,
        sink: &SinkCapability,
    ) -> Option<HardwareConfigBundle> {
        let policy = self.policy.snapshot();
        self.evaluate_with_policy(frame, repeat, sink, &policy)
    }

    /// Like [`evaluate`](Self::evaluate) with an explicit policy.
    pub fn evaluate_with_policy(
        &mut self,
        frame: Option<&FrameInfo>,
        repeat: bool,
        sink: &SinkCapability,
        policy: &PolicyConfig,
    ) -> Option<HardwareConfigBundle> {
        match frame {
            Some(frame) => {
                self.hysteresis.reset();
                let classification = classify_frame(frame, policy);
                self.process(classification, sink, policy, false)
            }
            None if repeat => {
                self.hysteresis.reset();
                trace!("repeated frame");
                None
            }
            None => {
                let changes = self.tracker.observe_environment(Environment::capture(sink, policy));
                self.pending |= changes;
                match self.hysteresis.tick(changes, policy.debounce_threshold) {
                    IdleAction::Hold => None,
                    IdleAction::Fallback => {
                        let mut idle = classify_frame(&FrameInfo::idle(), policy);
                        idle.active_video = false;
                        self.process(idle, sink, policy, true)
                    }
                }
            }
        }
    }

    fn process(
        &mut self,
        classification: Classification,
        sink: &SinkCapability,
        policy: &PolicyConfig,
        toggle: bool,
    ) -> Option<HardwareConfigBundle> {
        let mode = select_mode(
            &classification.descriptor,
            classification.active_video,
            sink,
            policy,
            self.platform,
        );
        let prev_mode = self.tracker.last_mode();
        let prev_csc = self.tracker.last_csc_type();
        let env = Environment::capture(sink, policy);
        let changes = self.tracker.observe(&classification, sink, env, mode)
            | std::mem::take(&mut self.pending);

        let mode_changed = prev_mode != Some(mode);
        let csc_changed = prev_csc != Some(classification.csc_type);
        if !toggle && !changes.intersects(ChangeState::REPROCESS) && !mode_changed && !csc_changed {
            trace!(%mode, "no change");
            return None;
        }
        if mode_changed {
            debug!(from = ?prev_mode, to = %mode, "mode transition");
        }

        let bundle = self.assemble(&classification, mode, sink, policy, changes, toggle);

        if !sink.drives_panel() {
            if let Some(notifier) = self.notifier.as_mut() {
                let outbound = outbound_for(
                    &bundle,
                    &classification.descriptor,
                    classification.master.as_ref(),
                    classification.dynamic.as_ref(),
                    sink,
                    policy,
                );
                notifier.notify(&outbound);
            }
        }

        debug!(
            mode = %bundle.mode,
            csc = ?bundle.csc_type,
            %changes,
            toggle,
            stages = bundle.enabled_stages().len(),
            "bundle emitted"
        );
        Some(bundle)
    }

    /// Builds and checks the bundle for `mode`, falling back to bypass when
    /// the result is inconsistent.
    fn assemble(
        &mut self,
        c: &Classification,
        mode: PipelineMode,
        sink: &SinkCapability,
        policy: &PolicyConfig,
        changes: ChangeState,
        toggle: bool,
    ) -> HardwareConfigBundle {
        let bundle = self.build(c, mode, sink, policy, changes, toggle);
        match bundle.validate() {
            Ok(()) => bundle,
            Err(reason) if mode != PipelineMode::Bypass => {
                warn!(%mode, reason, "inconsistent configuration, using bypass");
                self.build(c, PipelineMode::Bypass, sink, policy, changes, toggle)
            }
            Err(reason) => {
                warn!(reason, "inconsistent bypass configuration");
                bundle
            }
        }
    }

    fn build(
        &mut self,
        c: &Classification,
        mode: PipelineMode,
        sink: &SinkCapability,
        policy: &PolicyConfig,
        changes: ChangeState,
        toggle: bool,
    ) -> HardwareConfigBundle {
        let plan = ModePlan::for_mode(mode);
        let panel_nits = sink.max_luminance.unwrap_or(policy.panel_luminance);
        let bucket = luminance_bucket(panel_nits);
        let range = c.descriptor.range;

        let (gamut, output_gamut) = if plan.needs_rgb {
            self.gamut_for(&plan, c, sink, policy)
        } else {
            (GamutMatrix::identity(), Primaries::for_code(c.descriptor.primaries))
        };
        // a panel gamut without a code is signalled as the plan's container
        let output_primaries = match (plan.needs_rgb, plan.target) {
            (false, _) | (true, TargetGamut::Source) => c.descriptor.primaries,
            (true, TargetGamut::Sdr) => {
                output_gamut.standard_code(SAME_GAMUT_TOL).unwrap_or(ColorPrimaries::Bt709)
            }
            (true, TargetGamut::Hdr) => {
                output_gamut.standard_code(SAME_GAMUT_TOL).unwrap_or(ColorPrimaries::Bt2020)
            }
        };
        let osd = self.osd_for(&plan, c, sink, policy, &output_gamut, bucket);
        let curves = if plan.needs_rgb {
            self.curves_for(&plan, &gamut, bucket)
        } else {
            ToneCurveSet::default()
        };
        let linear_scale = if curves.is_empty() { 1.0 } else { plan.linear_scale(panel_nits) };

        let rgb_path = plan.needs_rgb || sink.drives_panel();
        let input_decode = rgb_path.then(|| ycbcr_matrix(c.descriptor.matrix_code).decode(range));
        let output_encode = (rgb_path && !sink.drives_panel()).then(|| {
            let out_range = if mode.output_is_hdr() { range } else { SignalRange::Limited };
            output_matrix(mode, sink, policy).encode(out_range)
        });
        let ycbcr_conversion = if rgb_path {
            None
        } else {
            match SourceOutputConversion::for_heights(c.height, sink) {
                SourceOutputConversion::None => None,
                SourceOutputConversion::SdToHd => {
                    Some(YcbcrMatrix::conversion(YcbcrMatrix::Bt601, YcbcrMatrix::Bt709, range))
                }
                SourceOutputConversion::HdToSd => {
                    Some(YcbcrMatrix::conversion(YcbcrMatrix::Bt709, YcbcrMatrix::Bt601, range))
                }
            }
        };

        let knee = (plan.sdr_target && self.platform.is_legacy() && policy.knee_factor > 0)
            .then(|| self.knee_curve(policy));
        let adjustment = adjust(mode, c.master.as_ref(), policy, self.platform);

        HardwareConfigBundle {
            mode,
            csc_type: c.csc_type,
            changes,
            toggle,
            input_decode,
            gamut,
            curves,
            linear_scale,
            knee,
            output_encode,
            ycbcr_conversion,
            white_balance: policy.white_balance.enabled.then_some(policy.white_balance),
            contrast_offset: adjustment.contrast,
            saturation_offset: adjustment.saturation,
            output_primaries,
            osd,
        }
    }

    /// Solves the linear-light gamut matrix for a plan, with the primaries
    /// the output ends up in.
    ///
    /// Passthrough plans take the signalled container as the source;
    /// conversions may take the mastering display instead.
    fn gamut_for(
        &self,
        plan: &ModePlan,
        c: &Classification,
        sink: &SinkCapability,
        policy: &PolicyConfig,
    ) -> (GamutMatrix, Primaries) {
        let flags = policy.hdr_flags;
        let signalled = Primaries::for_code(c.descriptor.primaries);
        let src = match c.master.as_ref() {
            Some(m) if flags.use_source_primaries && plan.mastering_source => {
                Primaries::from_display(&m.display, "mastering display").unwrap_or_else(|e| {
                    warn!("{}, using signalled primaries", e);
                    signalled
                })
            }
            _ => signalled,
        };
        let target = match plan.target {
            TargetGamut::Source => src,
            TargetGamut::Sdr => BT709,
            TargetGamut::Hdr => BT2020,
        };
        let dst = match sink.primaries.as_ref() {
            Some(d) if flags.use_display_primaries => {
                Primaries::from_display(d, "sink").unwrap_or_else(|e| {
                    warn!("{}, using {}", e, target.name);
                    target
                })
            }
            _ => target,
        };

        let display_gain = if self.platform.is_legacy() { UNITY_GAIN } else { policy.display_gain };
        if src.same_gamut(&dst, SAME_GAMUT_TOL) && display_gain == UNITY_GAIN {
            return (GamutMatrix::identity(), dst);
        }
        (gamut::solve_or_reference(&src, &dst, display_gain), dst)
    }

    /// Maps the graphics plane onto HDR outputs.
    ///
    /// Graphics follow the video when the output is an HDR signal on a
    /// capable sink and the video is either BT.2020 or converted into HDR.
    /// Panels and SDR outputs leave graphics alone.
    fn osd_for(
        &self,
        plan: &ModePlan,
        c: &Classification,
        sink: &SinkCapability,
        policy: &PolicyConfig,
        output_gamut: &Primaries,
        bucket: usize,
    ) -> OsdConfig {
        let follows = plan.output.is_hdr()
            && !sink.drives_panel()
            && (sink.supports_hdr10 || sink.supports_hlg)
            && (c.csc_type.is_bt2020() || plan.input != plan.output);
        if !follows {
            return OsdConfig::bypass();
        }

        let mapping = OsdMapping::for_output(plan.output);
        let output = mapping.output();
        let (Some(eotf), Some(oetf)) = (
            self.curve(CurveKind::Eotf, TransferFunction::Gamma22, bucket),
            self.curve(CurveKind::Oetf, output, bucket),
        ) else {
            return OsdConfig::bypass();
        };
        let gamut = if BT709.same_gamut(output_gamut, SAME_GAMUT_TOL) {
            GamutMatrix::identity()
        } else {
            gamut::solve_or_reference(&BT709, output_gamut, UNITY_GAIN)
        };
        trace!(?mapping, to = output_gamut.name, "graphics plane mapped");
        OsdConfig {
            mapping,
            gamut,
            eotf: Some(eotf),
            oetf: Some(oetf),
            linear_scale: f64::from(policy.osd_white_nits) / output.peak_nits(),
        }
    }

    /// Selects the tone curves for a plan.
    ///
    /// Curves stay off when nothing needs linear light. A gamut change
    /// between identical transfer functions re-encodes with the inverse
    /// EOTF; a change of function goes through the OOTF gain and OETF.
    fn curves_for(&self, plan: &ModePlan, gamut: &GamutMatrix, bucket: usize) -> ToneCurveSet {
        let same_function = plan.input == plan.output;
        if same_function
            && gamut.is_identity()
            && plan.ootf == OotfTarget::None
            && !plan.saturation_gain
        {
            return ToneCurveSet::default();
        }

        let mut set = ToneCurveSet {
            eotf: self.curve(CurveKind::Eotf, plan.input, bucket),
            ..Default::default()
        };
        if same_function {
            set.inverse_eotf = self.curve(CurveKind::InverseEotf, plan.input, bucket);
        } else {
            set.ootf_gain = match plan.ootf {
                OotfTarget::None => None,
                OotfTarget::Panel => self.curve(CurveKind::OotfGain, plan.input, bucket),
                OotfTarget::Fixed(nits) => {
                    self.curve(CurveKind::OotfGain, plan.input, luminance_bucket(nits))
                }
            };
            set.oetf = self.curve(CurveKind::Oetf, plan.output, bucket);
        }
        if plan.saturation_gain {
            set.saturation_gain = self.curve(CurveKind::SaturationGain, plan.input, bucket);
        }
        set
    }

    fn curve(&self, kind: CurveKind, function: TransferFunction, bucket: usize) -> Option<Arc<ToneCurve>> {
        match self.library.get(kind, function, bucket) {
            Ok(curve) => Some(curve),
            Err(e) => {
                warn!(%function, bucket, "{}", e);
                None
            }
        }
    }

    /// Knee table for the current policy, rebuilt only when it changes.
    fn knee_curve(&mut self, policy: &PolicyConfig) -> Arc<ToneCurve> {
        let factor = policy.knee_factor;
        let interpolation = policy.knee_interpolation;
        match &self.knee {
            Some(k) if k.factor == factor && k.interpolation == interpolation => k.curve.clone(),
            _ => {
                let curve = Arc::new(knee::build(factor, interpolation));
                debug!(factor, ?interpolation, "knee table built");
                self.knee = Some(KneeCache { factor, interpolation, curve: curve.clone() });
                curve
            }
        }
    }
}

/// Y'CbCr matrix for a signalled matrix-coefficients code.
fn ycbcr_matrix(code: u8) -> YcbcrMatrix {
    match code {
        // BT.2020 constant luminance is decoded as non-constant.
        10 => YcbcrMatrix::Bt2020,
        other => YcbcrMatrix::for_primaries(ColorPrimaries::from_code(other)),
    }
}

/// Y'CbCr matrix of the output signal.
fn output_matrix(mode: PipelineMode, sink: &SinkCapability, policy: &PolicyConfig) -> YcbcrMatrix {
    if mode.output_is_hdr() || (policy.sdr_output_bt2020 && sink.supports_hdr10) {
        YcbcrMatrix::Bt2020
    } else if sink.output_height >= HD_LINES {
        YcbcrMatrix::Bt709
    } else {
        YcbcrMatrix::Bt601
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Stage;
    use csc_core::{
        Generation, MasterDisplayInfo, ModePolicy, OutputColorFormat, RawSignalType, SourceKind,
    };

    fn engine(platform: Platform) -> Configurator {
        Configurator::new(platform, Arc::new(ToneCurveLibrary::new()), PolicyHandle::default())
    }

    fn pq_frame() -> FrameInfo {
        FrameInfo::new(
            RawSignalType::compose(9, 16, 9, SignalRange::Limited),
            SourceKind::Other,
            3840,
            2160,
        )
        .with_master(MasterDisplayInfo::with_max_nits(1000))
    }

    fn sdr_frame(height: u32) -> FrameInfo {
        let code = if height >= HD_LINES { 1 } else { 6 };
        FrameInfo::new(
            RawSignalType::compose(code, 1, code, SignalRange::Limited),
            SourceKind::Other,
            height * 16 / 9,
            height,
        )
    }

    #[test]
    fn test_first_frame_emits_then_quiet() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let sink = SinkCapability::hdr10();
        let b = e.evaluate(Some(&pq_frame()), false, &sink).unwrap();
        assert_eq!(b.mode, PipelineMode::Hdr2Hdr);
        assert_eq!(b.changes, ChangeState::REPROCESS);
        assert!(e.evaluate(Some(&pq_frame()), false, &sink).is_none());
        assert_eq!(e.current_mode(), Some(PipelineMode::Hdr2Hdr));
    }

    #[test]
    fn test_hdr2sdr_curves() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let b = e.evaluate(Some(&pq_frame()), false, &SinkCapability::sdr()).unwrap();
        assert_eq!(b.mode, PipelineMode::Hdr2Sdr);
        assert_eq!(
            b.enabled_stages(),
            vec![
                Stage::InputDecode,
                Stage::Eotf,
                Stage::Gamut,
                Stage::OotfGain,
                Stage::Oetf,
                Stage::SaturationGain,
                Stage::OutputEncode,
            ]
        );
        assert_eq!(b.curves.eotf.as_ref().unwrap().function(), TransferFunction::Pq);
        assert_eq!(b.curves.oetf.as_ref().unwrap().function(), TransferFunction::Gamma22);
        assert_eq!(b.linear_scale, 20.0);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn test_bt709_pq_reencodes_with_inverse_eotf() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let frame = FrameInfo::new(
            RawSignalType::compose(1, 16, 1, SignalRange::Limited),
            SourceKind::Other,
            1920,
            1080,
        );
        let b = e.evaluate(Some(&frame), false, &SinkCapability::hdr10()).unwrap();
        assert_eq!(b.mode, PipelineMode::Hdr2Hdr);
        assert!(!b.gamut.is_identity());
        assert!(b.curves.inverse_eotf.is_some());
        assert!(b.curves.oetf.is_none());
        assert!(b.validate().is_ok());
    }

    #[test]
    fn test_sdr_passthrough_conversion() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let b = e.evaluate(Some(&sdr_frame(480)), false, &SinkCapability::sdr()).unwrap();
        assert_eq!(b.mode, PipelineMode::Sdr2Sdr);
        assert!(b.input_decode.is_none());
        assert!(b.ycbcr_conversion.is_some());
        assert_eq!(b.enabled_stages(), vec![Stage::YcbcrConversion]);

        let mut e = engine(Platform::SET_TOP_BOX);
        let b = e.evaluate(Some(&sdr_frame(1080)), false, &SinkCapability::sdr()).unwrap();
        assert!(b.enabled_stages().is_empty());
    }

    #[test]
    fn test_panel_output_decodes_without_encode() {
        let mut e = engine(Platform::TELEVISION);
        let mut sink = SinkCapability::sdr();
        sink.output_format = OutputColorFormat::Rgb444;
        let b = e.evaluate(Some(&sdr_frame(1080)), false, &sink).unwrap();
        assert!(b.input_decode.is_some());
        assert!(b.output_encode.is_none());
        assert!(b.ycbcr_conversion.is_none());
    }

    #[test]
    fn test_knee_only_on_legacy_sdr_targets() {
        let policy = PolicyConfig { knee_factor: 128, ..Default::default() };
        let mut sink = SinkCapability::sdr();
        sink.output_format = OutputColorFormat::Rgb444;

        let mut current = engine(Platform::TELEVISION);
        let b = current.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert!(b.knee.is_none());

        let legacy = Platform { generation: Generation::Legacy, ..Platform::TELEVISION };
        let mut e = engine(legacy);
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert_eq!(b.mode, PipelineMode::Hdr2Sdr);
        let first = b.knee.unwrap();
        assert_eq!(first.kind(), CurveKind::Knee);

        // same setting reuses the table
        e.reset();
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert!(Arc::ptr_eq(&first, b.knee.as_ref().unwrap()));

        let off = PolicyConfig { knee_factor: 0, ..policy };
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &off).unwrap();
        assert!(b.changes.contains(ChangeState::KNEE));
        assert!(b.knee.is_none());
    }

    #[test]
    fn test_display_gain_ignored_on_legacy() {
        let policy = PolicyConfig { display_gain: 3072, ..Default::default() };
        let sink = SinkCapability::hdr10();

        let mut e = engine(Platform::SET_TOP_BOX);
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert_eq!(b.gamut.right_shift, 2);

        let legacy = Platform { generation: Generation::Legacy, ..Platform::SET_TOP_BOX };
        let mut e = engine(legacy);
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert!(b.gamut.is_identity());
    }

    #[test]
    fn test_graphics_white_change_reprograms() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let sink = SinkCapability::hdr10();
        let policy = PolicyConfig::default();
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).unwrap();
        assert_eq!(b.osd.mapping, OsdMapping::SdrToPq);
        assert!(e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &policy).is_none());

        let dim = PolicyConfig { osd_white_nits: 100, ..policy };
        let b = e.evaluate_with_policy(Some(&pq_frame()), false, &sink, &dim).unwrap();
        assert!(b.changes.contains(ChangeState::KNEE));
        assert!((b.osd.linear_scale - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_repeat_frame_is_quiet() {
        let mut e = engine(Platform::SET_TOP_BOX);
        let sink = SinkCapability::hdr10();
        e.evaluate(Some(&pq_frame()), false, &sink);
        for _ in 0..10 {
            assert!(e.evaluate(None, true, &sink).is_none());
        }
        assert_eq!(e.idle_ticks(), 0);
    }

    #[test]
    fn test_idle_fallback_is_bypass() {
        let handle = PolicyHandle::default();
        handle.update(|p| p.debounce_threshold = 3).unwrap();
        let mut e = Configurator::new(
            Platform::SET_TOP_BOX,
            Arc::new(ToneCurveLibrary::new()),
            handle,
        );
        let sink = SinkCapability::sdr();
        e.evaluate(Some(&pq_frame()), false, &sink);
        assert!(e.evaluate(None, false, &sink).is_none());
        assert!(e.evaluate(None, false, &sink).is_none());
        let b = e.evaluate(None, false, &sink).unwrap();
        assert!(b.toggle);
        assert_eq!(b.mode, PipelineMode::Bypass);
        assert!(e.evaluate(None, false, &sink).is_none());
    }

    #[test]
    fn test_idle_sink_change_reaches_next_frame() {
        let handle = PolicyHandle::default();
        handle.update(|p| p.debounce_threshold = 5).unwrap();
        let mut e = Configurator::new(
            Platform::SET_TOP_BOX,
            Arc::new(ToneCurveLibrary::new()),
            handle,
        );
        let frame = sdr_frame(1080);
        e.evaluate(Some(&frame), false, &SinkCapability::sdr());

        let mut sink = SinkCapability::sdr();
        sink.max_luminance = Some(400);
        assert!(e.evaluate(None, false, &sink).is_none());

        let b = e.evaluate(Some(&frame), false, &sink).unwrap();
        assert!(b.changes.contains(ChangeState::SINK_SUPPORT));
        assert!(e.evaluate(Some(&frame), false, &sink).is_none());
    }

    #[test]
    fn test_notifier_skips_panels() {
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let mut e = engine(Platform::SET_TOP_BOX).with_notifier(Box::new(
            move |m: &crate::metadata::OutboundHdrMetadata| log.lock().unwrap().push(m.mode),
        ));
        e.evaluate(Some(&pq_frame()), false, &SinkCapability::hdr10());
        assert_eq!(*seen.lock().unwrap(), vec![PipelineMode::Hdr2Hdr]);

        let mut panel = SinkCapability::hdr10();
        panel.output_format = OutputColorFormat::Rgb444;
        e.evaluate(Some(&pq_frame()), false, &panel);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_disabled_engine_bypasses() {
        let policy = PolicyConfig { enabled: false, hdr_mode: ModePolicy::ForceOff, ..Default::default() };
        let mut e = engine(Platform::SET_TOP_BOX);
        let b = e
            .evaluate_with_policy(Some(&pq_frame()), false, &SinkCapability::sdr(), &policy)
            .unwrap();
        assert_eq!(b.mode, PipelineMode::Bypass);
        assert!(b.curves.is_empty());
        assert_eq!(b.contrast_offset, 0);
        assert_eq!(b.saturation_offset, 0);
    }
}
