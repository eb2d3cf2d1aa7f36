//! Host OS version probe.
//!
//! Decides whether newer store fields (introductory pricing) and the bundle
//! receipt APIs are safe to touch. The version string is read once per
//! process lifetime; the OS version cannot change at runtime.

use std::sync::{Arc, OnceLock};

use store_traits::SystemInfo;

/// Fallback when the platform exposes no version string: the minimum OS
/// version the runtime can be deployed on.
const FALLBACK_MAJOR_VERSION: u32 = 6;

/// Parsed dotted OS version. Missing or unparsable trailing components are
/// left unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsVersion {
    pub major: u32,
    pub minor: Option<u32>,
    pub patch: Option<u32>,
}

impl OsVersion {
    /// Parses a dotted version string such as `"11.2.5"`. Returns `None`
    /// when the major component is missing or unparsable.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts.next().and_then(|part| part.trim().parse().ok());
        let patch = parts.next().and_then(|part| part.trim().parse().ok());
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Whether this version is at least `major.minor`. A missing minor
    /// component counts as zero.
    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        self.major > major || (self.major == major && self.minor.unwrap_or(0) >= minor)
    }
}

/// Cached OS version gate backed by the injected [`SystemInfo`] capability.
pub struct VersionProbe {
    system: Arc<dyn SystemInfo>,
    cached: OnceLock<OsVersion>,
}

impl VersionProbe {
    pub fn new(system: Arc<dyn SystemInfo>) -> Self {
        Self {
            system,
            cached: OnceLock::new(),
        }
    }

    /// The host OS version, read and parsed on first access.
    pub fn version(&self) -> OsVersion {
        *self.cached.get_or_init(|| {
            match self
                .system
                .os_version()
                .as_deref()
                .and_then(OsVersion::parse)
            {
                Some(version) => version,
                None => OsVersion {
                    major: FALLBACK_MAJOR_VERSION,
                    minor: None,
                    patch: None,
                },
            }
        })
    }

    /// Baseline gate: the bundle receipt APIs exist from 7.0.
    pub fn supports_receipt_url(&self) -> bool {
        self.version().is_at_least(7, 0)
    }

    /// Introductory pricing fields are safe to read from 11.2.
    pub fn supports_introductory_price(&self) -> bool {
        self.version().is_at_least(11, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        System {}

        impl SystemInfo for System {
            fn os_version(&self) -> Option<String>;
        }
    }

    fn probe_for(version: &str) -> VersionProbe {
        let mut system = MockSystem::new();
        let version = version.to_string();
        system
            .expect_os_version()
            .return_once(move || Some(version));
        VersionProbe::new(Arc::new(system))
    }

    #[test]
    fn parses_full_and_partial_versions() {
        assert_eq!(
            OsVersion::parse("11.2.5"),
            Some(OsVersion {
                major: 11,
                minor: Some(2),
                patch: Some(5),
            })
        );
        assert_eq!(
            OsVersion::parse("12"),
            Some(OsVersion {
                major: 12,
                minor: None,
                patch: None,
            })
        );
        assert!(OsVersion::parse("beta").is_none());
    }

    #[test]
    fn introductory_price_gate_needs_11_2() {
        assert!(probe_for("11.2").supports_introductory_price());
        assert!(probe_for("11.2.6").supports_introductory_price());
        assert!(probe_for("12.0").supports_introductory_price());
        assert!(!probe_for("11.1.2").supports_introductory_price());
        assert!(!probe_for("10.3").supports_introductory_price());
    }

    #[test]
    fn receipt_url_gate_needs_7_0() {
        assert!(probe_for("7.0").supports_receipt_url());
        assert!(probe_for("9.3.5").supports_receipt_url());
        assert!(!probe_for("6.1").supports_receipt_url());
    }

    #[test]
    fn version_is_read_once_per_process() {
        let mut system = MockSystem::new();
        system
            .expect_os_version()
            .times(1)
            .return_const(Some("11.2.5".to_string()));
        let probe = VersionProbe::new(Arc::new(system));

        assert!(probe.supports_introductory_price());
        // Second read hits the cache; the mock allows exactly one call.
        assert!(probe.supports_introductory_price());
    }

    #[test]
    fn missing_version_string_falls_back_to_minimum_baseline() {
        let mut system = MockSystem::new();
        system.expect_os_version().return_const(None::<String>);
        let probe = VersionProbe::new(Arc::new(system));

        assert_eq!(probe.version().major, 6);
        assert!(!probe.supports_receipt_url());
        assert!(!probe.supports_introductory_price());
    }
}
