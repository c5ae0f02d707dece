//! Bitmask of inputs that changed since the previous evaluation.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Which input categories changed.
///
/// # Example
///
/// ```rust
/// use csc_core::ChangeState;
///
/// let mut c = ChangeState::empty();
/// c |= ChangeState::SIGNAL;
/// c.insert(ChangeState::KNEE);
/// assert!(c.contains(ChangeState::SIGNAL));
/// assert!(c.intersects(ChangeState::REPROCESS));
/// assert_eq!(c.to_string(), "signal|knee");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeState(u32);

impl ChangeState {
    /// Signal colorimetry.
    pub const SIGNAL: Self = Self(0x001);
    /// Source kind.
    pub const SOURCE: Self = Self(0x002);
    /// Mastering display metadata.
    pub const PRIMARIES: Self = Self(0x004);
    /// Knee factor.
    pub const KNEE: Self = Self(0x008);
    /// HDR10 routing.
    pub const HDR_MODE: Self = Self(0x010);
    /// Sink support bits.
    pub const SINK_SUPPORT: Self = Self(0x020);
    /// White balance.
    pub const WHITE_BALANCE: Self = Self(0x040);
    /// HLG routing.
    pub const HLG_MODE: Self = Self(0x080);
    /// SDR routing.
    pub const SDR_MODE: Self = Self(0x100);
    /// Output colour format.
    pub const OUTPUT_FORMAT: Self = Self(0x200);
    /// SD/HD matrix relation between source and output timing.
    pub const SOURCE_OUTPUT: Self = Self(0x400);
    /// HDR10+ routing.
    pub const HDR10PLUS_MODE: Self = Self(0x800);

    /// Changes that force a new configuration.
    pub const REPROCESS: Self = Self(
        Self::SIGNAL.0
            | Self::SOURCE.0
            | Self::PRIMARIES.0
            | Self::KNEE.0
            | Self::HDR_MODE.0
            | Self::SINK_SUPPORT.0
            | Self::WHITE_BALANCE.0
            | Self::HLG_MODE.0
            | Self::SDR_MODE.0
            | Self::OUTPUT_FORMAT.0
            | Self::SOURCE_OUTPUT.0
            | Self::HDR10PLUS_MODE.0,
    );

    const NAMES: [(Self, &'static str); 12] = [
        (Self::SIGNAL, "signal"),
        (Self::SOURCE, "source"),
        (Self::PRIMARIES, "primaries"),
        (Self::KNEE, "knee"),
        (Self::HDR_MODE, "hdr_mode"),
        (Self::SINK_SUPPORT, "sink_support"),
        (Self::WHITE_BALANCE, "white_balance"),
        (Self::HLG_MODE, "hlg_mode"),
        (Self::SDR_MODE, "sdr_mode"),
        (Self::OUTPUT_FORMAT, "output_format"),
        (Self::SOURCE_OUTPUT, "source_output"),
        (Self::HDR10PLUS_MODE, "hdr10plus_mode"),
    ];

    /// No changes.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when nothing changed.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Bits set in either.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Sets the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Sets the bits of `other` when `cond` holds.
    #[inline]
    pub fn set_if(&mut self, other: Self, cond: bool) {
        if cond {
            self.insert(other);
        }
    }
}

impl BitOr for ChangeState {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeState {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
