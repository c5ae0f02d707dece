//! Output-side capabilities.

use crate::master::DisplayPrimaries;
use serde::{Deserialize, Serialize};

/// IEEE OUI identifying the HDR10+ vendor-specific data block.
pub const HDR10PLUS_IEEE_OUI: u32 = 0x90848B;

/// Pixel encoding on the output link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputColorFormat {
    /// RGB 4:4:4. On television devices this is the internal panel path.
    Rgb444,
    /// Y'CbCr 4:4:4.
    #[default]
    Ycbcr444,
    /// Y'CbCr 4:2:2.
    Ycbcr422,
    /// Y'CbCr 4:2:0.
    Ycbcr420,
}

/// HDR10+ vendor-specific data block advertised by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hdr10PlusVsdb {
    /// IEEE OUI of the block.
    pub ieee_oui: u32,
    /// Application version.
    pub application_version: u8,
}

impl Hdr10PlusVsdb {
    /// A valid HDR10+ block.
    pub const SUPPORTED: Self = Self { ieee_oui: HDR10PLUS_IEEE_OUI, application_version: 1 };

    /// True when the block identifies a usable HDR10+ sink.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.ieee_oui == HDR10PLUS_IEEE_OUI && self.application_version >= 1
    }
}

/// What the connected display (or internal panel) accepts.
///
/// # Example
///
/// ```rust
/// use csc_core::SinkCapability;
///
/// let tv = SinkCapability::hdr10();
/// assert!(tv.supports_hdr10);
/// assert!(!tv.supports_hdr10plus());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SinkCapability {
    /// Accepts SMPTE ST 2084.
    pub supports_hdr10: bool,
    /// Accepts HLG.
    pub supports_hlg: bool,
    /// HDR10+ vendor block, if advertised.
    pub hdr10plus: Option<Hdr10PlusVsdb>,
    /// Output pixel encoding.
    pub output_format: OutputColorFormat,
    /// Active lines of the output timing.
    pub output_height: u32,
    /// Display primaries, if reported.
    pub primaries: Option<DisplayPrimaries>,
    /// Display peak luminance in cd/m2, if reported.
    pub max_luminance: Option<u32>,
}

impl SinkCapability {
    /// An SDR-only 1080p sink.
    pub const fn sdr() -> Self {
        Self {
            supports_hdr10: false,
            supports_hlg: false,
            hdr10plus: None,
            output_format: OutputColorFormat::Ycbcr444,
            output_height: 1080,
            primaries: None,
            max_luminance: None,
        }
    }

    /// A 1080p sink accepting HDR10 only.
    pub const fn hdr10() -> Self {
        let mut sink = Self::sdr();
        sink.supports_hdr10 = true;
        sink
    }

    /// True when the HDR10+ block is present and valid.
    #[inline]
    pub fn supports_hdr10plus(&self) -> bool {
        self.hdr10plus.is_some_and(|vsdb| vsdb.is_valid())
    }

    /// True when output goes to an RGB panel path rather than an HDMI sink.
    #[inline]
    pub fn drives_panel(&self) -> bool {
        self.output_format == OutputColorFormat::Rgb444
    }

    /// Support bits packed for change detection (hdr10, hlg, hdr10+).
    pub fn support_bits(&self) -> u8 {
        (self.supports_hdr10 as u8)
            | (self.supports_hlg as u8) << 1
            | (self.supports_hdr10plus() as u8) << 2
    }
}

impl Default for SinkCapability {
    fn default() -> Self {
        Self::sdr()
    }
}
