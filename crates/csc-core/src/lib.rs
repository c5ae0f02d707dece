//! # csc-core
//!
//! Core vocabulary of the HDR/SDR colour-space conversion engine.
//!
//! - [`RawSignalType`], [`SignalDescriptor`] - per-frame colorimetry
//! - [`MasterDisplayInfo`] - ST 2086 mastering display and content light level
//! - [`SinkCapability`], [`Platform`] - what the output side can do
//! - [`PolicyConfig`] - operator settings
//! - [`PipelineMode`] - the selected transform regime
//! - [`ChangeState`] - which inputs changed since the last evaluation
//! - [`Error`] - recoverable failure taxonomy
//!
//! ## Crate Structure
//!
//! ```text
//! csc-core (this crate)
//!    ^
//!    |
//!    +-- csc-primaries (gamut solver)
//!    +-- csc-lut (tone curves)
//!    +-- csc-engine (classifier, selector, orchestrator)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod change;
pub mod error;
pub mod master;
pub mod mode;
pub mod platform;
pub mod policy;
pub mod signal;
pub mod sink;

pub use change::ChangeState;
pub use error::{Error, Result};
pub use master::{Chromaticity, ContentLightLevel, DisplayPrimaries, MasterDisplayInfo};
pub use mode::PipelineMode;
pub use platform::{DeviceClass, Generation, Platform};
pub use policy::{
    ExtraContrast, HdrFlags, KneeInterpolation, ModePolicy, PolicyConfig, WhiteBalance,
};
pub use signal::{
    ColorPrimaries, HdrSourceKind, RawSignalType, SignalDescriptor, SignalRange, SourceKind,
    TransferCharacteristic,
};
pub use sink::{Hdr10PlusVsdb, OutputColorFormat, SinkCapability};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::change::ChangeState;
    pub use crate::error::{Error, Result};
    pub use crate::master::MasterDisplayInfo;
    pub use crate::mode::PipelineMode;
    pub use crate::platform::Platform;
    pub use crate::policy::{ModePolicy, PolicyConfig};
    pub use crate::signal::{HdrSourceKind, SignalDescriptor, SourceKind};
    pub use crate::sink::SinkCapability;
}
