//! Device class and hardware generation.
//!
//! Register-level differences between generations stay in the display
//! driver. Only the behavioural differences the engine must know about are
//! modelled here.

use serde::{Deserialize, Serialize};

/// What kind of product the engine runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Set-top box driving an HDMI sink.
    #[default]
    SetTopBox,
    /// Television with an internal panel.
    Television,
}

/// Hardware generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Older HDR block: knee LUT available, no display gain shift.
    Legacy,
    /// Current HDR block.
    #[default]
    Current,
}

/// Platform the engine is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Platform {
    /// Product class.
    pub device: DeviceClass,
    /// HDR block generation.
    pub generation: Generation,
}

impl Platform {
    /// Current-generation set-top box.
    pub const SET_TOP_BOX: Self = Self { device: DeviceClass::SetTopBox, generation: Generation::Current };

    /// Current-generation television.
    pub const TELEVISION: Self = Self { device: DeviceClass::Television, generation: Generation::Current };

    /// Legacy television.
    pub const LEGACY_TELEVISION: Self = Self { device: DeviceClass::Television, generation: Generation::Legacy };

    /// True on television products.
    #[inline]
    pub fn is_television(&self) -> bool {
        self.device == DeviceClass::Television
    }

    /// True on the legacy HDR block.
    #[inline]
    pub fn is_legacy(&self) -> bool {
        self.generation == Generation::Legacy
    }
}
