//! End-to-end scenarios through the orchestrator.
//!
//! Each test feeds frames the way the vsync path would and checks the
//! emitted bundle and the metadata handed to the sink.

use std::sync::{Arc, Mutex};

use csc_core::{
    ColorPrimaries, DisplayPrimaries, HdrFlags, Hdr10PlusVsdb, MasterDisplayInfo,
    OutputColorFormat, PipelineMode, Platform, PolicyConfig, RawSignalType, SignalRange,
    SinkCapability, SourceKind, TransferCharacteristic,
};
use csc_engine::{Configurator, FrameInfo, OsdMapping, OutboundHdrMetadata, PolicyHandle, Stage};
use csc_lut::ToneCurveLibrary;
use csc_math::Vec3;
use csc_primaries::{gamut, BT2020, BT709};

// ============================================================================
// Helpers
// ============================================================================

fn engine_with(policy: PolicyConfig) -> (Configurator, Arc<Mutex<Vec<OutboundHdrMetadata>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let engine = Configurator::new(
        Platform::SET_TOP_BOX,
        Arc::new(ToneCurveLibrary::new()),
        PolicyHandle::new(policy),
    )
    .with_notifier(Box::new(move |m: &OutboundHdrMetadata| {
        log.lock().unwrap().push(m.clone());
    }));
    (engine, seen)
}

/// PQ, BT.2020, limited range, mastered at 1000 cd/m2.
fn pq_1000() -> FrameInfo {
    FrameInfo::new(
        RawSignalType::compose(9, 16, 9, SignalRange::Limited),
        SourceKind::Other,
        3840,
        2160,
    )
    .with_master(MasterDisplayInfo::with_max_nits(1000))
}

/// PQ, BT.2020 container, mastered on a P3 display at 1000 cd/m2.
fn pq_1000_p3() -> FrameInfo {
    let master = MasterDisplayInfo { display: DisplayPrimaries::P3_D65, ..MasterDisplayInfo::with_max_nits(1000) };
    pq_1000().with_master(master)
}

// ============================================================================
// Native HDR10 and down-conversion
// ============================================================================

#[test]
fn test_hdr10_on_hdr10_sink() {
    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let bundle = engine
        .evaluate(Some(&pq_1000()), false, &SinkCapability::hdr10())
        .expect("first frame emits");

    assert_eq!(bundle.mode, PipelineMode::Hdr2Hdr);
    assert!(bundle.gamut.is_identity());
    assert_eq!(bundle.contrast_offset, 0);
    assert_eq!(bundle.saturation_offset, 0);
    assert!(bundle.curves.is_empty());
    assert!(bundle.validate().is_ok());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let out = &seen[0];
    assert_eq!(out.transfer, TransferCharacteristic::Pq.code());
    assert!(out.bt2020_colorimetry);
    assert_eq!(out.static_metadata, Some(MasterDisplayInfo::with_max_nits(1000)));
}

#[test]
fn test_p3_mastered_hdr10_passes_through() {
    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let frame = pq_1000_p3();
    let bundle = engine.evaluate(Some(&frame), false, &SinkCapability::hdr10()).unwrap();

    assert_eq!(bundle.mode, PipelineMode::Hdr2Hdr);
    assert!(bundle.gamut.is_identity());
    assert!(bundle.curves.is_empty());
    assert_eq!(bundle.enabled_stages(), vec![Stage::InputDecode, Stage::OutputEncode]);
    assert_eq!(bundle.output_primaries, ColorPrimaries::Bt2020);

    let out = &seen.lock().unwrap()[0];
    assert_eq!(out.primaries, ColorPrimaries::Bt2020.code());
    assert!(out.bt2020_colorimetry);
    assert_eq!(out.static_metadata, frame.master);
}

#[test]
fn test_p3_mastered_down_conversion_uses_mastering_gamut() {
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let p3 = engine.evaluate(Some(&pq_1000_p3()), false, &SinkCapability::sdr()).unwrap();
    assert_eq!(p3.mode, PipelineMode::Hdr2Sdr);
    assert_eq!(p3.output_primaries, ColorPrimaries::Bt709);

    let (mut engine, _) = engine_with(PolicyConfig::default());
    let wide = engine.evaluate(Some(&pq_1000()), false, &SinkCapability::sdr()).unwrap();
    assert_ne!(p3.gamut, wide.gamut);

    // P3 red sits nearer BT.709 red than BT.2020 red does
    let red_p3 = p3.gamut.to_mat3() * Vec3::new(1.0, 0.0, 0.0);
    let red_2020 = wide.gamut.to_mat3() * Vec3::new(1.0, 0.0, 0.0);
    assert!(red_p3.x < red_2020.x, "{red_p3:?} vs {red_2020:?}");
}

#[test]
fn test_bt709_coded_pq_reports_converted_primaries() {
    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let frame = FrameInfo::new(
        RawSignalType::compose(1, 16, 1, SignalRange::Limited),
        SourceKind::Other,
        1920,
        1080,
    );
    let bundle = engine.evaluate(Some(&frame), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Hdr);
    assert_eq!(bundle.gamut, gamut::solve(&BT709, &BT2020, gamut::UNITY_GAIN).unwrap());
    assert_eq!(bundle.output_primaries, ColorPrimaries::Bt2020);

    let out = &seen.lock().unwrap()[0];
    assert_eq!(out.primaries, ColorPrimaries::Bt2020.code());
    assert_eq!(out.matrix, ColorPrimaries::Bt2020.code());
    assert!(out.bt2020_colorimetry);
}

#[test]
fn test_hdr10_on_sdr_sink() {
    let policy = PolicyConfig {
        hdr_flags: HdrFlags { adjust_saturation: true, ..HdrFlags::default() },
        ..Default::default()
    };
    let (mut engine, seen) = engine_with(policy.clone());
    let bundle = engine
        .evaluate(Some(&pq_1000()), false, &SinkCapability::sdr())
        .expect("first frame emits");

    assert_eq!(bundle.mode, PipelineMode::Hdr2Sdr);
    assert!(!bundle.gamut.is_identity());
    assert_ne!(bundle.saturation_offset, 0);
    assert_eq!(bundle.saturation_offset, policy.extra_saturation[1]);

    // the matrix is the BT.2020 to BT.709 solve
    let expected = gamut::solve(&BT2020, &BT709, gamut::UNITY_GAIN).unwrap();
    assert_eq!(bundle.gamut, expected);
    let red = bundle.gamut.to_mat3() * Vec3::new(1.0, 0.0, 0.0);
    assert!(red.x > 1.0 && red.y < 0.0, "{red:?}");

    let out = &seen.lock().unwrap()[0];
    assert_eq!(out.primaries, ColorPrimaries::Bt709.code());
    assert!(out.static_metadata.is_none());
    assert!(!out.bt2020_colorimetry);
}

#[test]
fn test_saturation_without_master_uses_first_offset() {
    let policy = PolicyConfig {
        hdr_flags: HdrFlags { adjust_saturation: true, ..HdrFlags::default() },
        ..Default::default()
    };
    let (mut engine, _) = engine_with(policy.clone());
    let frame = FrameInfo::new(
        RawSignalType::compose(9, 16, 9, SignalRange::Limited),
        SourceKind::Other,
        3840,
        2160,
    );
    let bundle = engine.evaluate(Some(&frame), false, &SinkCapability::sdr()).unwrap();
    assert_eq!(bundle.saturation_offset, policy.extra_saturation[0]);
}

#[test]
fn test_contrast_on_down_conversion() {
    let policy = PolicyConfig {
        hdr_flags: HdrFlags { adjust_contrast: true, ..HdrFlags::default() },
        ..Default::default()
    };
    let (mut engine, _) = engine_with(policy);
    let bundle = engine.evaluate(Some(&pq_1000()), false, &SinkCapability::sdr()).unwrap();
    assert_ne!(bundle.contrast_offset, 0);

    // mastering peak above the adjustable range leaves contrast alone
    let bright = pq_1000().with_master(MasterDisplayInfo::with_max_nits(4000));
    let bundle = engine.evaluate(Some(&bright), false, &SinkCapability::sdr()).unwrap();
    assert_eq!(bundle.contrast_offset, 0);
}

#[test]
fn test_out_of_range_contrast_is_contained() {
    let handle = PolicyHandle::default();
    let rejected = handle.update(|p| {
        p.video_contrast = i32::MAX;
        p.hdr_flags.adjust_contrast = true;
    });
    assert!(rejected.is_err());
    assert_eq!(handle.snapshot().video_contrast, 0);

    // an unchecked policy handed in directly still evaluates
    let mut engine = Configurator::new(Platform::SET_TOP_BOX, Arc::new(ToneCurveLibrary::new()), handle);
    let mut wild = PolicyConfig {
        video_contrast: i32::MAX,
        hdr_flags: HdrFlags { adjust_contrast: true, ..HdrFlags::default() },
        ..Default::default()
    };
    wild.extra_contrast.ratios = [i32::MAX, i32::MIN, i32::MAX, i32::MIN, i32::MAX];
    let bundle = engine
        .evaluate_with_policy(Some(&pq_1000()), false, &SinkCapability::sdr(), &wild)
        .unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Sdr);
}

// ============================================================================
// Graphics plane
// ============================================================================

#[test]
fn test_graphics_follow_hdr_output() {
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&pq_1000()), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.osd.mapping, OsdMapping::SdrToPq);
    assert_eq!(bundle.osd.gamut, gamut::solve(&BT709, &BT2020, gamut::UNITY_GAIN).unwrap());
    assert!(bundle.osd.eotf.is_some() && bundle.osd.oetf.is_some());
    assert!((bundle.osd.linear_scale - 203.0 / 10000.0).abs() < 1e-12);

    let sdr = FrameInfo::new(RawSignalType::compose(1, 1, 1, SignalRange::Limited), SourceKind::Other, 1920, 1080);
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&sdr), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Sdr2Hdr);
    assert_eq!(bundle.osd.mapping, OsdMapping::SdrToPq);

    let hlg = FrameInfo::new(RawSignalType::compose(9, 18, 9, SignalRange::Limited), SourceKind::Other, 1920, 1080);
    let mut hlg_sink = SinkCapability::hdr10();
    hlg_sink.supports_hlg = true;
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&hlg), false, &hlg_sink).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hlg2Hlg);
    assert_eq!(bundle.osd.mapping, OsdMapping::SdrToHlg);
}

#[test]
fn test_graphics_untouched_on_sdr_and_panels() {
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&pq_1000()), false, &SinkCapability::sdr()).unwrap();
    assert!(bundle.osd.is_bypass());

    let mut panel = SinkCapability::hdr10();
    panel.output_format = OutputColorFormat::Rgb444;
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&pq_1000()), false, &panel).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Hdr);
    assert!(bundle.osd.is_bypass());
}

// ============================================================================
// HLG, SDR and HDR10+
// ============================================================================

#[test]
fn test_hlg_routes() {
    let hlg = FrameInfo::new(
        RawSignalType::compose(9, 18, 9, SignalRange::Limited),
        SourceKind::Other,
        1920,
        1080,
    );

    let mut hlg_sink = SinkCapability::hdr10();
    hlg_sink.supports_hlg = true;
    let (mut engine, _) = engine_with(PolicyConfig::default());
    assert_eq!(engine.evaluate(Some(&hlg), false, &hlg_sink).unwrap().mode, PipelineMode::Hlg2Hlg);

    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&hlg), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hlg2Hdr);
    assert!(bundle.is_enabled(Stage::OotfGain));
    assert_eq!(bundle.linear_scale, 0.1);
    let out = &seen.lock().unwrap()[0];
    assert_eq!(out.transfer, TransferCharacteristic::Pq.code());
    assert_eq!(out.static_metadata, Some(MasterDisplayInfo::NOMINAL));

    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&hlg), false, &SinkCapability::sdr()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hlg2Sdr);
    assert!(bundle.is_enabled(Stage::SaturationGain));
}

#[test]
fn test_sdr_upconversion_on_set_top_box() {
    let sdr = FrameInfo::new(
        RawSignalType::compose(1, 1, 1, SignalRange::Limited),
        SourceKind::Other,
        1920,
        1080,
    );
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&sdr), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Sdr2Hdr);
    assert_eq!(
        bundle.enabled_stages(),
        vec![Stage::InputDecode, Stage::Eotf, Stage::Gamut, Stage::Oetf, Stage::OutputEncode]
    );
    // set-top boxes do not add the SDR saturation offset
    assert_eq!(bundle.saturation_offset, 0);
}

#[test]
fn test_unsignalled_frame_uses_defaults() {
    let (mut engine, _) = engine_with(PolicyConfig::default());
    let sd = FrameInfo::new(RawSignalType(0), SourceKind::Other, 720, 480);
    let bundle = engine.evaluate(Some(&sd), false, &SinkCapability::sdr()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Sdr2Sdr);
    assert_eq!(bundle.csc_type, csc_engine::CscType::Yuv601Limited);
    assert!(bundle.is_enabled(Stage::YcbcrConversion));
}

#[test]
fn test_hdr10plus_requires_sink_block() {
    let frame = FrameInfo::new(
        RawSignalType::compose(9, 0x30, 9, SignalRange::Limited),
        SourceKind::Other,
        3840,
        2160,
    )
    .with_master(MasterDisplayInfo::with_max_nits(1000));

    let (mut engine, _) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&frame), false, &SinkCapability::hdr10()).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Hdr);

    let mut sink = SinkCapability::hdr10();
    sink.hdr10plus = Some(Hdr10PlusVsdb::SUPPORTED);
    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&frame), false, &sink).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr10Plus);
    assert_eq!(seen.lock().unwrap()[0].mode, PipelineMode::Hdr10Plus);
}

// ============================================================================
// Policy and sink changes
// ============================================================================

#[test]
fn test_policy_update_between_frames() {
    let handle = PolicyHandle::default();
    let mut engine = Configurator::new(
        Platform::SET_TOP_BOX,
        Arc::new(ToneCurveLibrary::new()),
        handle.clone(),
    );
    let sink = SinkCapability::hdr10();
    assert!(engine.evaluate(Some(&pq_1000()), false, &sink).is_some());
    assert!(engine.evaluate(Some(&pq_1000()), false, &sink).is_none());

    handle.update(|p| p.hdr_mode = csc_core::ModePolicy::ForceOff).unwrap();
    let bundle = engine.evaluate(Some(&pq_1000()), false, &sink).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Sdr);
    assert!(bundle.changes.contains(csc_core::ChangeState::HDR_MODE));
}

#[test]
fn test_sink_primaries_drive_target() {
    let mut sink = SinkCapability::sdr();
    sink.primaries = Some(csc_core::DisplayPrimaries::BT2020);

    // a BT.2020 panel receiving BT.2020 content needs no gamut change
    let (mut engine, seen) = engine_with(PolicyConfig::default());
    let bundle = engine.evaluate(Some(&pq_1000()), false, &sink).unwrap();
    assert_eq!(bundle.mode, PipelineMode::Hdr2Sdr);
    assert!(bundle.gamut.is_identity());
    assert_eq!(bundle.output_primaries, ColorPrimaries::Bt2020);
    assert_eq!(seen.lock().unwrap()[0].primaries, ColorPrimaries::Bt2020.code());

    let ignore = PolicyConfig {
        hdr_flags: HdrFlags { use_display_primaries: false, ..HdrFlags::default() },
        ..Default::default()
    };
    let (mut engine, _) = engine_with(ignore);
    let bundle = engine.evaluate(Some(&pq_1000()), false, &sink).unwrap();
    assert!(!bundle.gamut.is_identity());
}
