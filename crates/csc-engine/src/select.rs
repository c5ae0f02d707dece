//! Mode selection.
//!
//! Routing is decided per source family from the sink and the family's
//! [`ModePolicy`], then the classified signal picks one of the routes:
//!
//! | Family | Auto | ForceOn | ForceOff |
//! |--------|------|---------|----------|
//! | HDR10 | native if sink has HDR10 | native | to SDR |
//! | HLG | native if sink has HLG, else to HDR10 if it has HDR10 | native | to SDR |
//! | SDR | to HDR10 on set-top boxes with an HDR10 Y'CbCr sink, and on legacy panels | to HDR10 | passthrough |
//!
//! HDR10+ is orthogonal: dynamic HDR10 content on an HDR10+ sink is
//! forwarded unless HDR10 is forced off.

use csc_core::{
    HdrSourceKind, ModePolicy, OutputColorFormat, PipelineMode, Platform, PolicyConfig,
    SignalDescriptor, SinkCapability,
};

/// Routing for HDR10 sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HdrRoute {
    /// Pass through as HDR10.
    Native,
    /// Tone map to SDR.
    ToSdr,
}

/// Routing for HLG sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HlgRoute {
    /// Pass through as HLG.
    Native,
    /// Convert to HDR10.
    ToHdr10,
    /// Tone map to SDR.
    ToSdr,
}

/// Routing for SDR sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdrRoute {
    /// Leave as SDR.
    Passthrough,
    /// Upconvert to HDR10.
    ToHdr,
}

/// Routes for every family under one sink and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteDecision {
    /// HDR10 routing.
    pub hdr: HdrRoute,
    /// HLG routing.
    pub hlg: HlgRoute,
    /// SDR routing.
    pub sdr: SdrRoute,
    /// Dynamic metadata can be forwarded.
    pub hdr10plus: bool,
}

impl RouteDecision {
    /// Decides the routes.
    pub fn decide(sink: &SinkCapability, policy: &PolicyConfig, platform: Platform) -> Self {
        let hdr = match policy.hdr_mode {
            ModePolicy::Auto if sink.supports_hdr10 => HdrRoute::Native,
            ModePolicy::Auto => HdrRoute::ToSdr,
            ModePolicy::ForceOn => HdrRoute::Native,
            ModePolicy::ForceOff => HdrRoute::ToSdr,
        };
        let hlg = match policy.hlg_mode {
            ModePolicy::Auto if sink.supports_hlg => HlgRoute::Native,
            ModePolicy::Auto if sink.supports_hdr10 && policy.force_pure_hlg => HlgRoute::Native,
            ModePolicy::Auto if sink.supports_hdr10 => HlgRoute::ToHdr10,
            ModePolicy::Auto => HlgRoute::ToSdr,
            ModePolicy::ForceOn => HlgRoute::Native,
            ModePolicy::ForceOff => HlgRoute::ToSdr,
        };
        let sdr = match policy.sdr_mode {
            ModePolicy::Auto if sdr_upconverts(sink, platform) => SdrRoute::ToHdr,
            ModePolicy::Auto => SdrRoute::Passthrough,
            ModePolicy::ForceOn => SdrRoute::ToHdr,
            ModePolicy::ForceOff => SdrRoute::Passthrough,
        };
        let hdr10plus = sink.supports_hdr10plus() && policy.hdr_mode != ModePolicy::ForceOff;
        Self { hdr, hlg, sdr, hdr10plus }
    }

    /// Mode for a source family.
    ///
    /// `dynamic` marks HDR10 content carrying dynamic metadata;
    /// `active_video` distinguishes SDR video from an idle output.
    pub fn mode_for(&self, kind: HdrSourceKind, dynamic: bool, active_video: bool) -> PipelineMode {
        match kind {
            HdrSourceKind::Hdr10 if dynamic && self.hdr10plus => PipelineMode::Hdr10Plus,
            HdrSourceKind::Hdr10 => match self.hdr {
                HdrRoute::Native => PipelineMode::Hdr2Hdr,
                HdrRoute::ToSdr => PipelineMode::Hdr2Sdr,
            },
            HdrSourceKind::Hlg => match self.hlg {
                HlgRoute::Native => PipelineMode::Hlg2Hlg,
                HlgRoute::ToHdr10 => PipelineMode::Hlg2Hdr,
                HlgRoute::ToSdr => PipelineMode::Hlg2Sdr,
            },
            HdrSourceKind::Sdr => match self.sdr {
                SdrRoute::ToHdr => PipelineMode::Sdr2Hdr,
                SdrRoute::Passthrough if active_video => PipelineMode::Sdr2Sdr,
                SdrRoute::Passthrough => PipelineMode::Bypass,
            },
        }
    }
}

/// Automatic SDR upconversion rule.
fn sdr_upconverts(sink: &SinkCapability, platform: Platform) -> bool {
    let rgb = sink.output_format == OutputColorFormat::Rgb444;
    if platform.is_television() {
        platform.is_legacy() && rgb
    } else {
        sink.supports_hdr10 && !rgb
    }
}

/// Selects the pipeline mode. Total over every input.
pub fn select_mode(
    descriptor: &SignalDescriptor,
    active_video: bool,
    sink: &SinkCapability,
    policy: &PolicyConfig,
    platform: Platform,
) -> PipelineMode {
    if !policy.enabled {
        return PipelineMode::Bypass;
    }
    RouteDecision::decide(sink, policy, platform).mode_for(
        descriptor.hdr_kind(),
        descriptor.dynamic_metadata,
        active_video,
    )
}
