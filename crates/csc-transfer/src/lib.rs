//! # csc-transfer
//!
//! Transfer functions (EOTF/OETF) used by the HDR/SDR conversion engine.
//!
//! # Terminology
//!
//! - **EOTF**: encoded value -> linear light
//! - **OETF**: linear light -> encoded value (output side)
//! - **OOTF**: scene light -> display light (HLG system gamma)
//!
//! # Supported Transfer Functions
//!
//! | Function | Use Case | Linear range |
//! |----------|----------|--------------|
//! | [`pq`] | HDR10, HDR10+ | [0, 10000] cd/m2 |
//! | [`hlg`] | Broadcast HDR | [0, 1] scene-relative |
//! | [`gamma`] | SDR panels (2.2) | [0, 1] display-relative |
//!
//! [`TransferFunction`] dispatches over these with linear light normalized
//! to [0, 1] of each function's nominal peak, which is the domain the tone
//! curve tables are baked in.
//!
//! # Usage
//!
//! ```rust
//! use csc_transfer::{pq, TransferFunction};
//!
//! let nits = pq::eotf(0.508);
//! assert!((nits - 100.0).abs() < 1.0);
//!
//! let tf = TransferFunction::Pq;
//! let v = tf.oetf(tf.eotf(0.5));
//! assert!((v - 0.5).abs() < 1e-9);
//! ```
//!
//! # Used By
//!
//! - `csc-lut` - tone curve baking

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod gamma;
pub mod hlg;
pub mod pq;

/// A transfer function addressed by the tone curve library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferFunction {
    /// SMPTE ST 2084.
    Pq,
    /// ITU-R BT.2100 Hybrid Log-Gamma.
    Hlg,
    /// Pure power 2.2 (SDR panels).
    Gamma22,
    /// Identity.
    Linear,
}

impl TransferFunction {
    /// All functions, in catalogue order.
    pub const ALL: [TransferFunction; 4] = [Self::Pq, Self::Hlg, Self::Gamma22, Self::Linear];

    /// Nominal peak luminance of normalized linear 1.0, in cd/m2.
    pub fn peak_nits(self) -> f64 {
        match self {
            Self::Pq => pq::L_MAX,
            Self::Hlg => hlg::NOMINAL_PEAK,
            Self::Gamma22 | Self::Linear => gamma::SDR_REFERENCE_WHITE,
        }
    }

    /// Encoded [0, 1] -> normalized linear [0, 1].
    pub fn eotf(self, v: f64) -> f64 {
        let v = v.clamp(0.0, 1.0);
        match self {
            Self::Pq => pq::eotf(v) / pq::L_MAX,
            Self::Hlg => hlg::eotf(v),
            Self::Gamma22 => gamma::eotf_22(v),
            Self::Linear => v,
        }
    }

    /// Normalized linear [0, 1] -> encoded [0, 1].
    pub fn oetf(self, l: f64) -> f64 {
        let l = l.clamp(0.0, 1.0);
        match self {
            Self::Pq => pq::oetf(l * pq::L_MAX),
            Self::Hlg => hlg::oetf(l),
            Self::Gamma22 => gamma::oetf_22(l),
            Self::Linear => l,
        }
    }

    /// Returns true for the HDR families.
    pub fn is_hdr(self) -> bool {
        matches!(self, Self::Pq | Self::Hlg)
    }
}

impl std::fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pq => "PQ",
            Self::Hlg => "HLG",
            Self::Gamma22 => "gamma-2.2",
            Self::Linear => "linear",
        };
        f.write_str(name)
    }
}
