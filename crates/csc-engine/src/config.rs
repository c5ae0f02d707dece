//! Policy loading and sharing.
//!
//! Policies are YAML documents; every field is optional and falls back to
//! its default:
//!
//! ```yaml
//! hdr_mode: force_off
//! knee_factor: 128
//! extra_contrast:
//!   ratios: [150, 140, 134, 130, 128]
//! ```
//!
//! [`PolicyHandle`] is how a control surface and the evaluating thread
//! share one policy. Writers take the lock per update; the engine clones a
//! snapshot at the start of every evaluation and never holds the lock while
//! evaluating.

use std::path::Path;
use std::sync::Arc;

use csc_core::PolicyConfig;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::EngineResult;

/// Parses and validates a policy document.
pub fn from_yaml_str(yaml: &str) -> EngineResult<PolicyConfig> {
    let policy: PolicyConfig = serde_yaml::from_str(yaml)?;
    if let Err(e) = policy.validate() {
        warn!("policy rejected: {}", e);
        return Err(e.into());
    }
    Ok(policy)
}

/// Reads a policy document from disk.
pub fn from_file(path: impl AsRef<Path>) -> EngineResult<PolicyConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let policy = from_yaml_str(&content)?;
    debug!(path = %path.display(), "policy loaded");
    Ok(policy)
}

/// Serializes a policy to YAML.
pub fn to_yaml_string(policy: &PolicyConfig) -> EngineResult<String> {
    Ok(serde_yaml::to_string(policy)?)
}

/// Shared, concurrently writable policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyHandle {
    inner: Arc<RwLock<PolicyConfig>>,
}

impl PolicyHandle {
    /// Wraps a policy.
    pub fn new(policy: PolicyConfig) -> Self {
        Self { inner: Arc::new(RwLock::new(policy)) }
    }

    /// Clones the current policy.
    pub fn snapshot(&self) -> PolicyConfig {
        self.inner.read().clone()
    }

    /// Replaces the whole policy after validating it.
    pub fn replace(&self, policy: PolicyConfig) -> EngineResult<()> {
        policy.validate()?;
        *self.inner.write() = policy;
        Ok(())
    }

    /// Applies `f` to the policy. The change is discarded if the result
    /// does not validate.
    pub fn update(&self, f: impl FnOnce(&mut PolicyConfig)) -> EngineResult<()> {
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        f(&mut next);
        next.validate()?;
        *guard = next;
        Ok(())
    }
}

impl From<PolicyConfig> for PolicyHandle {
    fn from(policy: PolicyConfig) -> Self {
        Self::new(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use csc_core::ModePolicy;
    use std::io::Write;

    #[test]
    fn test_partial_document() {
        let p = from_yaml_str("hdr_mode: force_off\nknee_factor: 128\n").unwrap();
        assert_eq!(p.hdr_mode, ModePolicy::ForceOff);
        assert_eq!(p.knee_factor, 128);
        assert_eq!(p.sdr_mode, ModePolicy::Auto);
        assert_eq!(p.debounce_threshold, 1);
    }

    #[test]
    fn test_nested_partial() {
        let p = from_yaml_str("extra_contrast:\n  norm: 64\nhdr_flags:\n  adjust_saturation: true\n")
            .unwrap();
        assert_eq!(p.extra_contrast.norm, 64);
        assert_eq!(p.extra_contrast.thresholds[0], 512);
        assert!(p.hdr_flags.adjust_saturation);
        assert!(p.hdr_flags.use_source_primaries);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = from_yaml_str("knee_factor: 300\n").unwrap_err();
        assert!(matches!(err, EngineError::Policy(_)));
        let err = from_yaml_str("debounce_threshold: 0\n").unwrap_err();
        assert!(matches!(err, EngineError::Policy(_)));
    }

    #[test]
    fn test_rejects_bad_yaml() {
        let err = from_yaml_str("hdr_mode: sometimes\n").unwrap_err();
        assert!(matches!(err, EngineError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sdr_mode: force_on").unwrap();
        writeln!(file, "panel_luminance: 800").unwrap();
        let p = from_file(file.path()).unwrap();
        assert_eq!(p.sdr_mode, ModePolicy::ForceOn);
        assert_eq!(p.panel_luminance, 800);

        let missing = from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(EngineError::Io(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let p = PolicyConfig { knee_factor: 64, force_pure_hlg: true, ..Default::default() };
        let text = to_yaml_string(&p).unwrap();
        assert_eq!(from_yaml_str(&text).unwrap(), p);
    }

    #[test]
    fn test_handle_update_validates() {
        let h = PolicyHandle::default();
        h.update(|p| p.knee_factor = 100).unwrap();
        assert_eq!(h.snapshot().knee_factor, 100);

        assert!(h.update(|p| p.knee_factor = 999).is_err());
        assert_eq!(h.snapshot().knee_factor, 100);

        let other = h.clone();
        other.replace(PolicyConfig { enabled: false, ..Default::default() }).unwrap();
        assert!(!h.snapshot().enabled);
    }
}
