//! Transform regimes.

use crate::signal::HdrSourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The active transform regime.
///
/// Every evaluation maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// All stages disabled.
    #[default]
    Bypass,
    /// HDR10 passed through to an HDR10 sink.
    Hdr2Hdr,
    /// HDR10 tone mapped to SDR.
    Hdr2Sdr,
    /// SDR expanded into an HDR10 container.
    Sdr2Hdr,
    /// HLG passed through to an HLG sink.
    Hlg2Hlg,
    /// HLG converted to HDR10.
    Hlg2Hdr,
    /// HLG tone mapped to SDR.
    Hlg2Sdr,
    /// Active SDR video with input/output conversion only.
    Sdr2Sdr,
    /// HDR10 with forwarded per-scene dynamic metadata.
    Hdr10Plus,
}

impl PipelineMode {
    /// All modes.
    pub const ALL: [PipelineMode; 9] = [
        Self::Bypass,
        Self::Hdr2Hdr,
        Self::Hdr2Sdr,
        Self::Sdr2Hdr,
        Self::Hlg2Hlg,
        Self::Hlg2Hdr,
        Self::Hlg2Sdr,
        Self::Sdr2Sdr,
        Self::Hdr10Plus,
    ];

    /// Source family the mode consumes.
    pub const fn source_kind(self) -> HdrSourceKind {
        match self {
            Self::Hdr2Hdr | Self::Hdr2Sdr | Self::Hdr10Plus => HdrSourceKind::Hdr10,
            Self::Hlg2Hlg | Self::Hlg2Hdr | Self::Hlg2Sdr => HdrSourceKind::Hlg,
            Self::Bypass | Self::Sdr2Hdr | Self::Sdr2Sdr => HdrSourceKind::Sdr,
        }
    }

    /// True when the mode compresses HDR into an SDR output.
    pub const fn is_down_conversion(self) -> bool {
        matches!(self, Self::Hdr2Sdr | Self::Hlg2Sdr)
    }

    /// True when the output link carries an HDR signal.
    pub const fn output_is_hdr(self) -> bool {
        matches!(
            self,
            Self::Hdr2Hdr | Self::Sdr2Hdr | Self::Hlg2Hlg | Self::Hlg2Hdr | Self::Hdr10Plus
        )
    }

    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::Hdr2Hdr => "hdr->hdr",
            Self::Hdr2Sdr => "hdr->sdr",
            Self::Sdr2Hdr => "sdr->hdr",
            Self::Hlg2Hlg => "hlg->hlg",
            Self::Hlg2Hdr => "hlg->hdr",
            Self::Hlg2Sdr => "hlg->sdr",
            Self::Sdr2Sdr => "sdr->sdr",
            Self::Hdr10Plus => "hdr10+",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
