//! # csc-engine
//!
//! HDR/SDR colour-space classification and transform selection.
//!
//! Once per displayed frame the engine classifies the incoming signal,
//! picks a [`PipelineMode`](csc_core::PipelineMode) for the connected sink
//! and, when anything changed, assembles a [`HardwareConfigBundle`] for the
//! display pipeline driver.
//!
//! ```text
//! FrameInfo --> classify --> select_mode --> ChangeTracker
//!                                                |
//!                       (no change) <------------+------------> assemble
//!                                                                  |
//!                   gamut solver + tone curves + adjuster <--------+
//!                                                                  |
//!                            HardwareConfigBundle + SinkNotifier <-+
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use csc_core::{PipelineMode, Platform, RawSignalType, SignalRange, SinkCapability, SourceKind};
//! use csc_engine::{Configurator, FrameInfo, PolicyHandle};
//! use csc_lut::ToneCurveLibrary;
//!
//! let policy = PolicyHandle::default();
//! let mut engine = Configurator::new(
//!     Platform::SET_TOP_BOX,
//!     Arc::new(ToneCurveLibrary::new()),
//!     policy.clone(),
//! );
//!
//! let hlg = FrameInfo::new(
//!     RawSignalType::compose(9, 18, 9, SignalRange::Limited),
//!     SourceKind::Other,
//!     1920,
//!     1080,
//! );
//! let bundle = engine.evaluate(Some(&hlg), false, &SinkCapability::sdr()).unwrap();
//! assert_eq!(bundle.mode, PipelineMode::Hlg2Sdr);
//!
//! // policy writes are picked up on the next evaluation
//! policy.update(|p| p.enabled = false).unwrap();
//! let bundle = engine.evaluate(Some(&hlg), false, &SinkCapability::sdr()).unwrap();
//! assert_eq!(bundle.mode, PipelineMode::Bypass);
//! ```
//!
//! # Loading Policy
//!
//! ```ignore
//! use csc_engine::{config, PolicyHandle};
//!
//! let policy = config::from_file("policy.yaml")?;
//! let handle = PolicyHandle::new(policy);
//! ```
//!
//! # Modules
//!
//! - [`classify`] - signal classification and change tracking
//! - [`select`] - mode selection
//! - [`adjust`] - contrast and saturation offsets
//! - [`hysteresis`] - "no frame" debouncing
//! - [`bundle`] - per-mode plans and the hardware bundle
//! - [`configurator`] - the orchestrator
//! - [`metadata`] - HDR10+ parsing and outbound sink metadata
//! - [`config`] - YAML policy loading and the shared policy handle

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adjust;
pub mod bundle;
pub mod classify;
pub mod config;
pub mod configurator;
mod error;
pub mod hysteresis;
pub mod metadata;
pub mod select;

pub use adjust::{adjust, Adjustment};
pub use bundle::{HardwareConfigBundle, ModePlan, OsdConfig, OsdMapping, Stage};
pub use classify::{classify, classify_frame, ChangeTracker, Classification, CscType, FrameInfo};
pub use config::PolicyHandle;
pub use configurator::Configurator;
pub use error::{EngineError, EngineResult};
pub use hysteresis::{Hysteresis, IdleAction};
pub use metadata::{Hdr10PlusMetadata, OutboundHdrMetadata, SinkNotifier};
pub use select::select_mode;
