//! Error types for the conversion engine.
//!
//! Every variant is recoverable: callers log it and substitute a documented
//! fallback (reference gamut, nominal mastering metadata, nearest transfer
//! family). Nothing here aborts an evaluation.
//!
//! # Usage
//!
//! ```rust
//! use csc_core::{Error, Result};
//!
//! fn known_transfer(code: u8) -> Result<u8> {
//!     match code {
//!         1 | 14 | 16 | 18 => Ok(code),
//!         _ => Err(Error::UnsupportedTransferCharacteristic { code }),
//!     }
//! }
//! assert!(known_transfer(99).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failures of classification and matrix derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Chromaticities do not form a usable gamut.
    ///
    /// Recovery: substitute the BT.2020 reference gamut.
    #[error("malformed primaries: {reason}")]
    MalformedPrimaries {
        /// What check failed
        reason: &'static str,
    },

    /// An HDR frame arrived without mastering display metadata.
    ///
    /// Recovery: substitute nominal BT.2020 / ST 2084 metadata.
    #[error("missing mastering display info")]
    MissingMasterDisplayInfo,

    /// Transfer characteristic code outside the supported families.
    ///
    /// Recovery: fall back to BT.709.
    #[error("unsupported transfer characteristic {code}")]
    UnsupportedTransferCharacteristic {
        /// Raw H.273 transfer code
        code: u8,
    },

    /// Linear solve failed.
    #[error("singular matrix while solving {context}")]
    SingularMatrix {
        /// Which system was being solved
        context: &'static str,
    },

    /// Policy value out of range.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}
