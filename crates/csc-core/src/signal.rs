//! Per-frame signal colorimetry.
//!
//! The decoder hands over a packed 32-bit word ([`RawSignalType`]) that
//! mirrors the H.273 / video-usability fields. [`SignalDescriptor`] is the
//! normalized form the rest of the engine works with.
//!
//! # Raw layout
//!
//! ```text
//! bit 29      video signal available
//! bits 26-28  video format (5 = unspecified)
//! bit 25      full range
//! bit 24      colour description present
//! bits 16-23  colour primaries
//! bits 8-15   transfer characteristics
//! bits 0-7    matrix coefficients
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw signal word
// ============================================================================

/// Packed per-frame signal type as delivered by the decoder.
///
/// # Example
///
/// ```rust
/// use csc_core::{RawSignalType, SignalRange};
///
/// let raw = RawSignalType::compose(9, 16, 9, SignalRange::Limited);
/// assert!(raw.is_available());
/// assert_eq!(raw.primaries_code(), 9);
/// assert_eq!(raw.transfer_code(), 16);
/// assert!(!raw.full_range());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawSignalType(pub u32);

impl RawSignalType {
    /// Video signal available.
    pub const AVAILABLE: u32 = 1 << 29;
    /// Full range flag.
    pub const FULL_RANGE: u32 = 1 << 25;
    /// Colour description present.
    pub const DESCRIPTION: u32 = 1 << 24;
    /// Video format value meaning "unspecified".
    pub const FORMAT_UNSPECIFIED: u32 = 5;

    const FORMAT_SHIFT: u32 = 26;

    /// Builds a word with the available and description bits set.
    pub const fn compose(primaries: u8, transfer: u8, matrix: u8, range: SignalRange) -> Self {
        let range_bit = match range {
            SignalRange::Full => Self::FULL_RANGE,
            SignalRange::Limited => 0,
        };
        Self(
            Self::AVAILABLE
                | (Self::FORMAT_UNSPECIFIED << Self::FORMAT_SHIFT)
                | range_bit
                | Self::DESCRIPTION
                | ((primaries as u32) << 16)
                | ((transfer as u32) << 8)
                | matrix as u32,
        )
    }

    /// Video signal available bit.
    #[inline]
    pub const fn is_available(self) -> bool {
        self.0 & Self::AVAILABLE != 0
    }

    /// Video format field.
    #[inline]
    pub const fn video_format(self) -> u32 {
        (self.0 >> Self::FORMAT_SHIFT) & 0x7
    }

    /// Full range bit.
    #[inline]
    pub const fn full_range(self) -> bool {
        self.0 & Self::FULL_RANGE != 0
    }

    /// Colour description present bit.
    #[inline]
    pub const fn has_description(self) -> bool {
        self.0 & Self::DESCRIPTION != 0
    }

    /// Colour primaries code.
    #[inline]
    pub const fn primaries_code(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Transfer characteristics code.
    #[inline]
    pub const fn transfer_code(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Matrix coefficients code.
    #[inline]
    pub const fn matrix_code(self) -> u8 {
        self.0 as u8
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Quantization range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRange {
    /// 16-235 (8-bit) studio swing.
    #[default]
    Limited,
    /// 0-255 (8-bit) full swing.
    Full,
}

/// Transfer characteristics (H.273 codes plus the platform HDR10+ marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferCharacteristic {
    /// 1: BT.709.
    Bt709,
    /// 6: BT.601 (SMPTE 170M).
    Bt601,
    /// 14: BT.2020 10-bit.
    Bt2020Ten,
    /// 15: BT.2020 12-bit.
    Bt2020Twelve,
    /// 16: SMPTE ST 2084 (PQ).
    Pq,
    /// 18: ARIB STD-B67 (HLG).
    Hlg,
    /// 0x30: PQ with per-scene dynamic metadata.
    Hdr10Plus,
    /// Any other code.
    Other(u8),
}

impl TransferCharacteristic {
    /// Maps a raw code; unknown codes are kept as [`Other`](Self::Other).
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Bt709,
            6 => Self::Bt601,
            14 => Self::Bt2020Ten,
            15 => Self::Bt2020Twelve,
            16 => Self::Pq,
            18 => Self::Hlg,
            0x30 => Self::Hdr10Plus,
            other => Self::Other(other),
        }
    }

    /// Raw code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Bt709 => 1,
            Self::Bt601 => 6,
            Self::Bt2020Ten => 14,
            Self::Bt2020Twelve => 15,
            Self::Pq => 16,
            Self::Hlg => 18,
            Self::Hdr10Plus => 0x30,
            Self::Other(code) => code,
        }
    }

    /// HDR family implied by the code: 16 (and 0x30) is HDR10, 18 or 14 is
    /// HLG, everything else is SDR.
    pub const fn hdr_kind(self) -> HdrSourceKind {
        match self {
            Self::Pq | Self::Hdr10Plus => HdrSourceKind::Hdr10,
            Self::Hlg | Self::Bt2020Ten => HdrSourceKind::Hlg,
            _ => HdrSourceKind::Sdr,
        }
    }
}

impl TryFrom<u8> for TransferCharacteristic {
    type Error = Error;

    /// Strict mapping that rejects codes outside the known families.
    fn try_from(code: u8) -> Result<Self> {
        match Self::from_code(code) {
            Self::Other(code) => Err(Error::UnsupportedTransferCharacteristic { code }),
            known => Ok(known),
        }
    }
}

/// Colour primaries family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorPrimaries {
    /// 1: BT.709.
    Bt709,
    /// 3, 5 or 6: BT.601 (525 or 625).
    Bt601,
    /// 9: BT.2020.
    Bt2020,
    /// Any other code.
    Other(u8),
}

impl ColorPrimaries {
    /// Maps a raw code.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Bt709,
            3 | 5 | 6 => Self::Bt601,
            9 => Self::Bt2020,
            other => Self::Other(other),
        }
    }

    /// Raw code. BT.601 is reported as 3.
    pub const fn code(self) -> u8 {
        match self {
            Self::Bt709 => 1,
            Self::Bt601 => 3,
            Self::Bt2020 => 9,
            Self::Other(code) => code,
        }
    }
}

/// Where the frame comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Local playback and anything not listed below.
    #[default]
    Other,
    /// Broadcast tuner.
    Tuner,
    /// Composite video input.
    Cvbs,
    /// Component video input.
    Component,
    /// HDMI receiver.
    HdmiIn,
}

impl SourceKind {
    /// External capture inputs that default to BT.709 regardless of size.
    pub const fn is_capture(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// HDR family of the incoming signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrSourceKind {
    /// Standard dynamic range.
    #[default]
    Sdr,
    /// PQ-coded HDR.
    Hdr10,
    /// Hybrid Log-Gamma.
    Hlg,
}

impl HdrSourceKind {
    /// All kinds.
    pub const ALL: [HdrSourceKind; 3] = [Self::Sdr, Self::Hdr10, Self::Hlg];
}

// ============================================================================
// Descriptor
// ============================================================================

/// Normalized colorimetry of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalDescriptor {
    /// Transfer characteristics.
    pub transfer: TransferCharacteristic,
    /// Colour primaries.
    pub primaries: ColorPrimaries,
    /// Raw matrix coefficients code.
    pub matrix_code: u8,
    /// Quantization range.
    pub range: SignalRange,
    /// Frame origin.
    pub source_kind: SourceKind,
    /// False when the values were defaulted from source kind and size.
    pub available: bool,
    /// Frame carries parseable per-scene dynamic metadata.
    pub dynamic_metadata: bool,
}

impl SignalDescriptor {
    /// Descriptor for an explicitly signalled stream.
    pub const fn new(
        transfer: TransferCharacteristic,
        primaries: ColorPrimaries,
        range: SignalRange,
        source_kind: SourceKind,
    ) -> Self {
        Self {
            transfer,
            primaries,
            matrix_code: primaries.code(),
            range,
            source_kind,
            available: true,
            dynamic_metadata: false,
        }
    }

    /// HDR family derived from the transfer code.
    #[inline]
    pub const fn hdr_kind(&self) -> HdrSourceKind {
        self.transfer.hdr_kind()
    }

    /// Packs the descriptor back into a raw word.
    pub const fn to_raw(&self) -> RawSignalType {
        RawSignalType::compose(
            self.primaries.code(),
            self.transfer.code(),
            self.matrix_code,
            self.range,
        )
    }
}
