//! Metadata exchanged with the sink.
//!
//! Two directions:
//!
//! - **Inbound**: [`Hdr10PlusMetadata::parse`] decodes the ST 2094-40
//!   dynamic metadata a frame may carry as an ITU-T T.35 payload.
//! - **Outbound**: [`OutboundHdrMetadata`] describes the colorimetry the
//!   sink should be told about after a mode change, delivered through a
//!   [`SinkNotifier`].

use csc_core::{
    ColorPrimaries, Error, MasterDisplayInfo, PipelineMode, PolicyConfig, SignalDescriptor,
    SignalRange, SinkCapability, TransferCharacteristic,
};
use tracing::debug;

use crate::bundle::HardwareConfigBundle;
use crate::error::{EngineError, EngineResult};

// ============================================================================
// Bit reader
// ============================================================================

/// MSB-first bit reader over a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Starts at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Reads `n` bits (at most 32) as an unsigned value.
    pub fn read(&mut self, n: u32) -> EngineResult<u32> {
        debug_assert!(n <= 32);
        if n as usize > self.remaining() {
            return Err(EngineError::DynamicMetadata { reason: "payload truncated" });
        }
        let mut value = 0u64;
        for _ in 0..n {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | bit as u64;
            self.pos += 1;
        }
        Ok(value as u32)
    }

    /// Reads a single flag bit.
    pub fn read_flag(&mut self) -> EngineResult<bool> {
        Ok(self.read(1)? == 1)
    }

    /// Skips `n` bits.
    pub fn skip(&mut self, n: usize) -> EngineResult<()> {
        if n > self.remaining() {
            return Err(EngineError::DynamicMetadata { reason: "payload truncated" });
        }
        self.pos += n;
        Ok(())
    }
}

// ============================================================================
// HDR10+ (SMPTE ST 2094-40)
// ============================================================================

/// ITU-T T.35 country code for the United States.
pub const T35_COUNTRY_CODE: u8 = 0xB5;
/// T.35 terminal provider code registered for HDR10+.
pub const T35_PROVIDER_CODE: u16 = 0x003C;
/// T.35 provider-oriented code for ST 2094-40.
pub const T35_PROVIDER_ORIENTED_CODE: u16 = 0x0001;
/// ST 2094 application identifier for ST 2094-40.
pub const APPLICATION_IDENTIFIER: u8 = 4;
/// Highest application version understood.
pub const MAX_APPLICATION_VERSION: u8 = 1;

/// One entry of the maxRGB distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistributionPoint {
    /// Percentage of pixels, 0..=100.
    pub percentage: u8,
    /// Linearized maxRGB value at that percentage, in 0.00001 units.
    pub percentile: u32,
}

/// Tone mapping curve hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToneMappingCurve {
    /// Knee point x in 1/4095 units.
    pub knee_x: u16,
    /// Knee point y in 1/4095 units.
    pub knee_y: u16,
    /// Bezier curve anchors in 1/1023 units.
    pub anchors: Vec<u16>,
}

/// Decoded single-window HDR10+ metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hdr10PlusMetadata {
    /// Application version of the payload.
    pub application_version: u8,
    /// Luminance of the targeted display in cd/m2.
    pub targeted_max_luminance: u32,
    /// Per-channel maximum of the scene, 0.00001 units.
    pub maxscl: [u32; 3],
    /// Average of maxRGB over the scene, 0.00001 units.
    pub average_maxrgb: u32,
    /// maxRGB distribution.
    pub distribution: Vec<DistributionPoint>,
    /// Fraction of bright pixels in 1/1000 units.
    pub fraction_bright_pixels: u16,
    /// Optional tone mapping hint.
    pub tone_mapping: Option<ToneMappingCurve>,
    /// Optional colour saturation weight in 1/8 units.
    pub color_saturation_weight: Option<u8>,
}

fn malformed(reason: &'static str) -> EngineError {
    EngineError::DynamicMetadata { reason }
}

/// Skips an actual-peak-luminance matrix.
fn skip_peak_luminance_matrix(r: &mut BitReader<'_>) -> EngineResult<()> {
    let rows = r.read(5)? as usize;
    let cols = r.read(5)? as usize;
    r.skip(rows * cols * 4)
}

impl Hdr10PlusMetadata {
    /// Decodes a T.35 payload, starting at the country code.
    ///
    /// Only single-window payloads are accepted. Targeted-display and
    /// mastering-display peak luminance matrices are skipped.
    pub fn parse(payload: &[u8]) -> EngineResult<Self> {
        let mut r = BitReader::new(payload);

        if r.read(8)? != T35_COUNTRY_CODE as u32 {
            return Err(malformed("country code"));
        }
        if r.read(16)? != T35_PROVIDER_CODE as u32 {
            return Err(malformed("terminal provider code"));
        }
        if r.read(16)? != T35_PROVIDER_ORIENTED_CODE as u32 {
            return Err(malformed("provider oriented code"));
        }
        if r.read(8)? != APPLICATION_IDENTIFIER as u32 {
            return Err(malformed("application identifier"));
        }
        let application_version = r.read(8)? as u8;
        if application_version > MAX_APPLICATION_VERSION {
            return Err(malformed("application version"));
        }
        if r.read(2)? != 1 {
            return Err(malformed("only single-window metadata is supported"));
        }

        let targeted_max_luminance = r.read(27)?;
        if r.read_flag()? {
            skip_peak_luminance_matrix(&mut r)?;
        }

        let maxscl = [r.read(17)?, r.read(17)?, r.read(17)?];
        let average_maxrgb = r.read(17)?;
        let count = r.read(4)?;
        let mut distribution = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let percentage = r.read(7)? as u8;
            let percentile = r.read(17)?;
            if percentage > 100 {
                return Err(malformed("distribution percentage above 100"));
            }
            distribution.push(DistributionPoint { percentage, percentile });
        }
        let fraction_bright_pixels = r.read(10)? as u16;

        if r.read_flag()? {
            skip_peak_luminance_matrix(&mut r)?;
        }

        let tone_mapping = if r.read_flag()? {
            let knee_x = r.read(12)? as u16;
            let knee_y = r.read(12)? as u16;
            let anchors = r.read(4)?;
            let anchors = (0..anchors)
                .map(|_| r.read(10).map(|a| a as u16))
                .collect::<EngineResult<Vec<_>>>()?;
            Some(ToneMappingCurve { knee_x, knee_y, anchors })
        } else {
            None
        };

        let color_saturation_weight = if r.read_flag()? { Some(r.read(6)? as u8) } else { None };

        Ok(Self {
            application_version,
            targeted_max_luminance,
            maxscl,
            average_maxrgb,
            distribution,
            fraction_bright_pixels,
            tone_mapping,
            color_saturation_weight,
        })
    }
}

// ============================================================================
// Outbound metadata
// ============================================================================

/// Colorimetry the sink should be informed of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundHdrMetadata {
    /// Mode the bundle was built for.
    pub mode: PipelineMode,
    /// Transfer characteristics code.
    pub transfer: u8,
    /// Colour primaries code.
    pub primaries: u8,
    /// Matrix coefficients code.
    pub matrix: u8,
    /// Quantization range.
    pub range: SignalRange,
    /// Static mastering metadata.
    pub static_metadata: Option<MasterDisplayInfo>,
    /// Per-scene metadata forwarded in HDR10+ mode.
    pub dynamic_metadata: Option<Hdr10PlusMetadata>,
    /// Signal BT.2020 colorimetry.
    pub bt2020_colorimetry: bool,
}

/// Receives outbound metadata whenever a new configuration is emitted.
pub trait SinkNotifier: Send {
    /// Called once per emitted bundle for non-panel outputs.
    fn notify(&mut self, metadata: &OutboundHdrMetadata);
}

impl<F: FnMut(&OutboundHdrMetadata) + Send> SinkNotifier for F {
    fn notify(&mut self, metadata: &OutboundHdrMetadata) {
        self(metadata)
    }
}

/// Mastering metadata, or the nominal BT.2020/ST 2084 profile when absent.
pub fn master_or_nominal(master: Option<&MasterDisplayInfo>) -> MasterDisplayInfo {
    match master {
        Some(m) => *m,
        None => {
            debug!("{}, sending nominal profile", Error::MissingMasterDisplayInfo);
            MasterDisplayInfo::NOMINAL
        }
    }
}

const BT2020_CODE: u8 = ColorPrimaries::Bt2020.code();
const BT709_CODE: u8 = ColorPrimaries::Bt709.code();
const PQ_CODE: u8 = TransferCharacteristic::Pq.code();

/// Builds the outbound description for an emitted bundle.
///
/// HDR outputs and down-conversions report the primaries the bundle
/// converted into. HDR outputs are encoded with the BT.2020 matrix.
pub fn outbound_for(
    bundle: &HardwareConfigBundle,
    descriptor: &SignalDescriptor,
    master: Option<&MasterDisplayInfo>,
    dynamic: Option<&Hdr10PlusMetadata>,
    sink: &SinkCapability,
    policy: &PolicyConfig,
) -> OutboundHdrMetadata {
    let mode = bundle.mode;
    let output_primaries = bundle.output_primaries.code();
    let (transfer, primaries, matrix, static_metadata) = match mode {
        PipelineMode::Sdr2Hdr | PipelineMode::Hlg2Hdr => {
            (PQ_CODE, output_primaries, BT2020_CODE, Some(MasterDisplayInfo::NOMINAL))
        }
        PipelineMode::Hdr2Hdr | PipelineMode::Hdr10Plus => {
            (PQ_CODE, output_primaries, BT2020_CODE, Some(master_or_nominal(master)))
        }
        PipelineMode::Hlg2Hlg => {
            (descriptor.transfer.code(), output_primaries, BT2020_CODE, master.copied())
        }
        PipelineMode::Hdr2Sdr | PipelineMode::Hlg2Sdr | PipelineMode::Sdr2Sdr | PipelineMode::Bypass => {
            let tc = TransferCharacteristic::Bt709.code();
            if policy.sdr_output_bt2020 && sink.supports_hdr10 {
                (tc, BT2020_CODE, BT2020_CODE, None)
            } else if mode.is_down_conversion() {
                (tc, output_primaries, BT709_CODE, None)
            } else {
                (tc, BT709_CODE, BT709_CODE, None)
            }
        }
    };

    let static_metadata = match (static_metadata, policy.outbound_override) {
        (Some(_), Some(forced)) => Some(forced),
        (m, _) => m,
    };
    let dynamic_metadata = match mode {
        PipelineMode::Hdr10Plus => dynamic.cloned(),
        _ => None,
    };

    OutboundHdrMetadata {
        mode,
        transfer,
        primaries,
        matrix,
        range: if mode.output_is_hdr() { descriptor.range } else { SignalRange::Limited },
        static_metadata,
        dynamic_metadata,
        bt2020_colorimetry: primaries == BT2020_CODE,
    }
}
