//! Signal classification and change detection.
//!
//! [`classify`] turns the raw per-frame signal word into a
//! [`SignalDescriptor`], filling in defaults when the decoder did not
//! signal colorimetry. [`ChangeTracker`] owns the last observed inputs and
//! reports which categories changed as a [`ChangeState`].

use csc_core::{
    ChangeState, ColorPrimaries, Error, MasterDisplayInfo, OutputColorFormat, PipelineMode,
    PolicyConfig, RawSignalType, SignalDescriptor, SignalRange, SinkCapability, SourceKind,
    TransferCharacteristic,
};
use tracing::{debug, warn};

use crate::metadata::Hdr10PlusMetadata;

/// Lines at and above which content is treated as HD.
pub const HD_LINES: u32 = 720;

// ============================================================================
// Frame input
// ============================================================================

/// Everything the engine reads from one decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Packed signal word.
    pub signal: RawSignalType,
    /// Mastering display metadata, if the stream carries it.
    pub master: Option<MasterDisplayInfo>,
    /// Where the frame came from.
    pub source_kind: SourceKind,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in lines.
    pub height: u32,
    /// ITU-T T.35 payload carrying HDR10+ metadata.
    pub dynamic_metadata: Option<Vec<u8>>,
    /// Never substitute the fixed primaries profile for this frame.
    pub suppress_primaries_override: bool,
}

impl FrameInfo {
    /// A frame with no side data.
    pub fn new(signal: RawSignalType, source_kind: SourceKind, width: u32, height: u32) -> Self {
        Self {
            signal,
            master: None,
            source_kind,
            width,
            height,
            dynamic_metadata: None,
            suppress_primaries_override: false,
        }
    }

    /// Attaches mastering metadata.
    pub fn with_master(mut self, master: MasterDisplayInfo) -> Self {
        self.master = Some(master);
        self
    }

    /// Attaches an HDR10+ payload.
    pub fn with_dynamic_metadata(mut self, payload: Vec<u8>) -> Self {
        self.dynamic_metadata = Some(payload);
        self
    }

    /// The synthetic frame used when video stops: unsignalled SDR at
    /// 1920x1080 from local playback, override suppressed.
    pub fn idle() -> Self {
        let mut frame = Self::new(RawSignalType(0), SourceKind::Other, 1920, 1080);
        frame.suppress_primaries_override = true;
        frame
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Descriptor for a signal the decoder did not describe.
fn default_descriptor(source_kind: SourceKind, frame_height: u32) -> SignalDescriptor {
    let hd = source_kind.is_capture() || frame_height >= HD_LINES;
    let (transfer, primaries) = if hd {
        (TransferCharacteristic::Bt709, ColorPrimaries::Bt709)
    } else {
        (TransferCharacteristic::Bt601, ColorPrimaries::Bt601)
    };
    SignalDescriptor::new(transfer, primaries, SignalRange::Limited, source_kind)
}

/// Normalizes the raw signal word.
///
/// When the signal is unavailable, or available without a colour
/// description, capture sources default to BT.709 limited and local
/// playback to BT.709 (720 lines and up) or BT.601 limited.
pub fn classify(raw: RawSignalType, source_kind: SourceKind, frame_height: u32) -> SignalDescriptor {
    if !raw.is_available() || !raw.has_description() {
        let mut d = default_descriptor(source_kind, frame_height);
        d.available = raw.is_available();
        if raw.is_available() && raw.full_range() {
            d.range = SignalRange::Full;
        }
        return d;
    }
    let range = if raw.full_range() { SignalRange::Full } else { SignalRange::Limited };
    let transfer = TransferCharacteristic::from_code(raw.transfer_code());
    let mut d = SignalDescriptor::new(
        transfer,
        ColorPrimaries::from_code(raw.primaries_code()),
        range,
        source_kind,
    );
    d.matrix_code = raw.matrix_code();
    d.dynamic_metadata = transfer == TransferCharacteristic::Hdr10Plus;
    d
}

/// A classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Normalized colorimetry.
    pub descriptor: SignalDescriptor,
    /// Effective mastering metadata after any override.
    pub master: Option<MasterDisplayInfo>,
    /// Decoded HDR10+ metadata.
    pub dynamic: Option<Hdr10PlusMetadata>,
    /// Input colour-space conversion.
    pub csc_type: CscType,
    /// Frame height in lines.
    pub height: u32,
    /// True for real video, false for the idle fallback.
    pub active_video: bool,
}

/// Classifies a frame under `policy`.
///
/// Applies the primaries override and decodes any HDR10+ payload. A
/// payload that fails to decode is logged and the frame is treated as
/// static HDR10.
pub fn classify_frame(frame: &FrameInfo, policy: &PolicyConfig) -> Classification {
    let mut descriptor = classify(frame.signal, frame.source_kind, frame.height);
    let mut master = frame.master;

    if policy.primaries_override && master.is_none() && !frame.suppress_primaries_override {
        master = Some(MasterDisplayInfo::OVERRIDE_PROFILE);
        descriptor.transfer = TransferCharacteristic::Pq;
        descriptor.primaries = ColorPrimaries::Bt2020;
        descriptor.matrix_code = ColorPrimaries::Bt2020.code();
        descriptor.range = SignalRange::Limited;
        descriptor.available = true;
    }

    let dynamic = match &frame.dynamic_metadata {
        Some(payload) if descriptor.hdr_kind() == csc_core::HdrSourceKind::Hdr10 => {
            match Hdr10PlusMetadata::parse(payload) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("{}, treating frame as static HDR10", e);
                    None
                }
            }
        }
        _ => None,
    };
    descriptor.dynamic_metadata =
        descriptor.transfer == TransferCharacteristic::Hdr10Plus || dynamic.is_some();

    Classification {
        csc_type: CscType::select(&descriptor).csc_type,
        descriptor,
        master,
        dynamic,
        height: frame.height,
        active_video: true,
    }
}

// ============================================================================
// Input conversion type
// ============================================================================

/// Input colour-space conversion the pipeline is set up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CscType {
    /// BT.601 limited range.
    Yuv601Limited,
    /// BT.601 full range.
    Yuv601Full,
    /// BT.709 limited range.
    Yuv709Limited,
    /// BT.709 full range.
    Yuv709Full,
    /// BT.2020 signalled with the 10-bit transfer code.
    Bt2020,
    /// BT.2020 with ST 2084.
    Bt2020Pq,
    /// BT.2020 with HLG.
    Bt2020Hlg,
    /// BT.2020 with ST 2084 and dynamic metadata.
    Bt2020PqDynamic,
}

/// Result of [`CscType::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CscSelection {
    /// Selected type.
    pub csc_type: CscType,
    /// Why a fallback was taken, when one was.
    pub fallback: Option<Error>,
}

impl CscType {
    fn yuv709(range: SignalRange) -> Self {
        match range {
            SignalRange::Limited => Self::Yuv709Limited,
            SignalRange::Full => Self::Yuv709Full,
        }
    }

    fn yuv601(range: SignalRange) -> Self {
        match range {
            SignalRange::Limited => Self::Yuv601Limited,
            SignalRange::Full => Self::Yuv601Full,
        }
    }

    /// Picks the conversion for a descriptor.
    pub fn select(d: &SignalDescriptor) -> CscSelection {
        let transfer = d.transfer.code();
        let pick = |csc_type| CscSelection { csc_type, fallback: None };
        match d.primaries {
            ColorPrimaries::Bt709 if transfer < 14 => pick(Self::yuv709(d.range)),
            ColorPrimaries::Bt601 if transfer < 14 => pick(Self::yuv601(d.range)),
            _ if d.primaries == ColorPrimaries::Bt2020 || transfer >= 14 => match d.transfer {
                TransferCharacteristic::Pq => pick(Self::Bt2020Pq),
                TransferCharacteristic::Bt2020Ten => pick(Self::Bt2020),
                TransferCharacteristic::Hlg => pick(Self::Bt2020Hlg),
                TransferCharacteristic::Hdr10Plus => pick(Self::Bt2020PqDynamic),
                TransferCharacteristic::Bt2020Twelve => pick(Self::yuv709(d.range)),
                other => CscSelection {
                    csc_type: Self::yuv709(d.range),
                    fallback: Some(Error::UnsupportedTransferCharacteristic { code: other.code() }),
                },
            },
            other => CscSelection {
                csc_type: Self::yuv601(d.range),
                fallback: Some(Error::MalformedPrimaries {
                    reason: match other {
                        ColorPrimaries::Other(_) => "unknown primaries code",
                        _ => "transfer code does not match primaries",
                    },
                }),
            },
        }
    }

    /// True for the BT.2020 family.
    pub fn is_bt2020(self) -> bool {
        matches!(self, Self::Bt2020 | Self::Bt2020Pq | Self::Bt2020Hlg | Self::Bt2020PqDynamic)
    }
}

// ============================================================================
// SD/HD conversion
// ============================================================================

/// Y'CbCr matrix conversion between source and output timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceOutputConversion {
    /// Same side of 720 lines, or RGB output.
    #[default]
    None,
    /// BT.601 source on an HD output.
    SdToHd,
    /// BT.709 source on an SD output.
    HdToSd,
}

impl SourceOutputConversion {
    /// Decides the conversion for a source height on `sink`.
    pub fn for_heights(source_height: u32, sink: &SinkCapability) -> Self {
        if sink.output_format == OutputColorFormat::Rgb444 {
            return Self::None;
        }
        match (source_height >= HD_LINES, sink.output_height >= HD_LINES) {
            (false, true) => Self::SdToHd,
            (true, false) => Self::HdToSd,
            _ => Self::None,
        }
    }
}

// ============================================================================
// Change tracking
// ============================================================================

/// Inputs that do not come from the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    sink_bits: u8,
    sink_primaries: Option<csc_core::DisplayPrimaries>,
    sink_luminance: Option<u32>,
    output_format: OutputColorFormat,
    output_height: u32,
    policy: PolicyConfig,
}

impl Environment {
    /// Captures the sink and policy.
    pub fn capture(sink: &SinkCapability, policy: &PolicyConfig) -> Self {
        Self {
            sink_bits: sink.support_bits(),
            sink_primaries: sink.primaries,
            sink_luminance: sink.max_luminance,
            output_format: sink.output_format,
            output_height: sink.output_height,
            policy: policy.clone(),
        }
    }

    fn diff(&self, prev: &Self) -> ChangeState {
        let (p, q) = (&self.policy, &prev.policy);
        let mut c = ChangeState::empty();
        c.set_if(
            ChangeState::SINK_SUPPORT,
            self.sink_bits != prev.sink_bits
                || self.sink_primaries != prev.sink_primaries
                || self.sink_luminance != prev.sink_luminance,
        );
        c.set_if(ChangeState::OUTPUT_FORMAT, self.output_format != prev.output_format);
        c.set_if(
            ChangeState::PRIMARIES,
            p.hdr_flags.use_source_primaries != q.hdr_flags.use_source_primaries
                || p.hdr_flags.use_display_primaries != q.hdr_flags.use_display_primaries
                || p.primaries_override != q.primaries_override
                || p.display_gain != q.display_gain,
        );
        c.set_if(
            ChangeState::KNEE,
            p.knee_factor != q.knee_factor
                || p.knee_interpolation != q.knee_interpolation
                || p.panel_luminance != q.panel_luminance
                || p.osd_white_nits != q.osd_white_nits,
        );
        c.set_if(
            ChangeState::HDR_MODE,
            p.enabled != q.enabled
                || p.hdr_mode != q.hdr_mode
                || p.hdr_flags.adjust_contrast != q.hdr_flags.adjust_contrast
                || p.hdr_flags.adjust_saturation != q.hdr_flags.adjust_saturation
                || p.extra_contrast != q.extra_contrast
                || p.extra_saturation != q.extra_saturation
                || p.video_contrast != q.video_contrast
                || p.outbound_override != q.outbound_override,
        );
        c.set_if(
            ChangeState::HLG_MODE,
            p.enabled != q.enabled || p.hlg_mode != q.hlg_mode || p.force_pure_hlg != q.force_pure_hlg,
        );
        c.set_if(
            ChangeState::SDR_MODE,
            p.enabled != q.enabled
                || p.sdr_mode != q.sdr_mode
                || p.sdr_saturation_offset != q.sdr_saturation_offset
                || p.sdr_output_bt2020 != q.sdr_output_bt2020,
        );
        c.set_if(ChangeState::WHITE_BALANCE, p.white_balance != q.white_balance);
        c
    }
}

/// Frame-side inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameState {
    descriptor: SignalDescriptor,
    master: Option<MasterDisplayInfo>,
    csc_type: CscType,
    conversion: SourceOutputConversion,
    hdr10plus: Option<Hdr10PlusMetadata>,
    mode: PipelineMode,
}

/// Owns the last observed inputs.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    env: Option<Environment>,
    frame: Option<FrameState>,
}

impl ChangeTracker {
    /// Empty tracker; the first observation reports every category.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment changes since the last commit, without committing.
    pub fn environment_changes(&self, env: &Environment) -> ChangeState {
        match &self.env {
            Some(prev) => env.diff(prev),
            None => ChangeState::REPROCESS,
        }
    }

    /// Records the environment seen on a tick without a frame and returns
    /// what changed since the last commit.
    pub fn observe_environment(&mut self, env: Environment) -> ChangeState {
        let changes = self.environment_changes(&env);
        self.env = Some(env);
        changes
    }

    /// Compares a classified frame and its environment against the last
    /// observation, records them, and returns what changed.
    ///
    /// `mode` is the mode selected for the frame; an HDR10+ metadata change
    /// only counts while HDR10+ is active.
    pub fn observe(
        &mut self,
        frame: &Classification,
        sink: &SinkCapability,
        env: Environment,
        mode: PipelineMode,
    ) -> ChangeState {
        let hdr10plus = match mode {
            PipelineMode::Hdr10Plus => frame.dynamic.clone(),
            _ => None,
        };
        let now = FrameState {
            descriptor: frame.descriptor,
            master: frame.master,
            csc_type: frame.csc_type,
            conversion: SourceOutputConversion::for_heights(frame.height, sink),
            hdr10plus,
            mode,
        };

        let mut changes = self.environment_changes(&env);
        match &self.frame {
            None => changes |= ChangeState::REPROCESS,
            Some(prev) => {
                let (d, e) = (&now.descriptor, &prev.descriptor);
                changes.set_if(
                    ChangeState::SIGNAL,
                    d.transfer != e.transfer
                        || d.primaries != e.primaries
                        || d.matrix_code != e.matrix_code
                        || d.range != e.range
                        || d.available != e.available
                        || now.csc_type != prev.csc_type,
                );
                changes.set_if(ChangeState::SOURCE, d.source_kind != e.source_kind);
                changes.set_if(ChangeState::PRIMARIES, now.master != prev.master);
                changes.set_if(ChangeState::SOURCE_OUTPUT, now.conversion != prev.conversion);
                changes.set_if(
                    ChangeState::HDR10PLUS_MODE,
                    d.dynamic_metadata != e.dynamic_metadata || now.hdr10plus != prev.hdr10plus,
                );
            }
        }

        if changes.contains(ChangeState::SIGNAL) {
            let selection = CscType::select(&now.descriptor);
            if let Some(e) = selection.fallback {
                warn!(
                    transfer = now.descriptor.transfer.code(),
                    primaries = now.descriptor.primaries.code(),
                    csc = ?selection.csc_type,
                    "{}, using fallback conversion",
                    e
                );
            }
        }
        if !changes.is_empty() {
            debug!(%changes, "inputs changed");
        }

        self.env = Some(env);
        self.frame = Some(now);
        changes
    }

    /// Mode recorded by the last observation.
    pub fn last_mode(&self) -> Option<PipelineMode> {
        self.frame.as_ref().map(|f| f.mode)
    }

    /// Conversion type recorded by the last observation.
    pub fn last_csc_type(&self) -> Option<CscType> {
        self.frame.as_ref().map(|f| f.csc_type)
    }

    /// Forgets everything; the next observation reports every category.
    pub fn reset(&mut self) {
        self.env = None;
        self.frame = None;
    }
}
