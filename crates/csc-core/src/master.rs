//! Mastering display colour volume (SMPTE ST 2086) and content light level.
//!
//! Chromaticities are kept in their signalled integer units of 0.00002 and
//! luminance in units of 0.0001 cd/m2, so that structural equality is exact
//! and change detection never trips over float noise.

use serde::{Deserialize, Serialize};

/// Chromaticity units per 1.0 (0.00002 per step).
pub const CHROMA_UNITS: u32 = 50000;

/// Luminance units per cd/m2 (0.0001 per step).
pub const LUMINANCE_UNITS: u32 = 10000;

/// A CIE 1931 xy coordinate in 0.00002 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Chromaticity {
    /// x * 50000
    pub x: u32,
    /// y * 50000
    pub y: u32,
}

impl Chromaticity {
    /// Creates from raw units.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Creates from real xy, rounding to the nearest unit.
    pub fn from_xy(x: f64, y: f64) -> Self {
        let scale = CHROMA_UNITS as f64;
        Self::new((x * scale).round().max(0.0) as u32, (y * scale).round().max(0.0) as u32)
    }

    /// Real xy.
    pub fn to_xy(self) -> (f64, f64) {
        let scale = CHROMA_UNITS as f64;
        (self.x as f64 / scale, self.y as f64 / scale)
    }
}

/// Three primaries plus white point, in signalled order.
///
/// ST 2086 signals primaries as G, B, R. Readers accept either that order or
/// R, G, B and detect which one they are looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayPrimaries {
    /// Primaries in signalled order.
    pub primaries: [Chromaticity; 3],
    /// White point.
    pub white_point: Chromaticity,
}

impl DisplayPrimaries {
    /// BT.2020 primaries in G, B, R order with D65 white.
    pub const BT2020: Self = Self {
        primaries: [
            Chromaticity::new(8500, 39850),
            Chromaticity::new(6550, 2300),
            Chromaticity::new(35400, 14600),
        ],
        white_point: Chromaticity::new(15635, 16450),
    };

    /// BT.709 primaries in G, B, R order with D65 white.
    pub const BT709: Self = Self {
        primaries: [
            Chromaticity::new(15000, 30000),
            Chromaticity::new(7500, 3000),
            Chromaticity::new(32000, 16500),
        ],
        white_point: Chromaticity::new(15635, 16450),
    };

    /// P3 primaries in G, B, R order with D65 white, the usual HDR10
    /// mastering display.
    pub const P3_D65: Self = Self {
        primaries: [
            Chromaticity::new(13250, 34500),
            Chromaticity::new(7500, 3000),
            Chromaticity::new(34000, 16000),
        ],
        white_point: Chromaticity::new(15635, 16450),
    };
}

/// Content light level (CTA-861.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentLightLevel {
    /// Values below are meaningful.
    pub present: bool,
    /// MaxCLL in cd/m2.
    pub max_content: u32,
    /// MaxFALL in cd/m2.
    pub max_pic_avg: u32,
}

/// Mastering display metadata attached to a frame.
///
/// # Example
///
/// ```rust
/// use csc_core::MasterDisplayInfo;
///
/// let m = MasterDisplayInfo::with_max_nits(1000);
/// assert_eq!(m.max_luminance_nits(), 1000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterDisplayInfo {
    /// Primaries and white point.
    pub display: DisplayPrimaries,
    /// Maximum display mastering luminance, 0.0001 cd/m2 units.
    pub luminance_max: u32,
    /// Minimum display mastering luminance, 0.0001 cd/m2 units.
    pub luminance_min: u32,
    /// Content light level.
    pub content_light: ContentLightLevel,
}

impl MasterDisplayInfo {
    /// Nominal metadata substituted when an HDR frame carries none:
    /// BT.2020, D65, 5000 cd/m2 peak, 0.005 cd/m2 black, no light level.
    pub const NOMINAL: Self = Self {
        display: DisplayPrimaries::BT2020,
        luminance_max: 5000 * LUMINANCE_UNITS,
        luminance_min: 50,
        content_light: ContentLightLevel { present: false, max_content: 0, max_pic_avg: 0 },
    };

    /// Fixed operator profile used by the primaries override.
    pub const OVERRIDE_PROFILE: Self = Self {
        display: DisplayPrimaries::BT2020,
        luminance_max: 5000 * LUMINANCE_UNITS,
        luminance_min: 50,
        content_light: ContentLightLevel { present: true, max_content: 5000, max_pic_avg: 50 },
    };

    /// BT.2020 metadata with the given peak.
    pub const fn with_max_nits(nits: u32) -> Self {
        let mut info = Self::NOMINAL;
        info.luminance_max = nits * LUMINANCE_UNITS;
        info
    }

    /// Peak luminance in cd/m2.
    #[inline]
    pub fn max_luminance_nits(&self) -> f64 {
        self.luminance_max as f64 / LUMINANCE_UNITS as f64
    }

    /// Black level in cd/m2.
    #[inline]
    pub fn min_luminance_nits(&self) -> f64 {
        self.luminance_min as f64 / LUMINANCE_UNITS as f64
    }
}
