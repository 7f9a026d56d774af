// Platform detection result, resolved once per process

use serde::Serialize;
use std::fmt;

/// Detected operating environment category driving strategy selection.
///
/// Resolved exactly once at startup and immutable for the process lifetime;
/// probe strategies are bound against it at registration time, never
/// re-checked per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    PosixGeneric,
    Ubuntu,
    Centos,
    ManagedOs,
    Unknown,
}

impl PlatformKind {
    /// Kinds served by POSIX command strategies.
    ///
    /// `Unknown` is included: an undetected host is still assumed to speak
    /// POSIX, matching how the probes degrade in the field.
    pub const POSIX: &'static [PlatformKind] = &[
        PlatformKind::PosixGeneric,
        PlatformKind::Ubuntu,
        PlatformKind::Centos,
        PlatformKind::Unknown,
    ];

    /// Kinds served by the management-API strategy.
    pub const MANAGED: &'static [PlatformKind] = &[PlatformKind::ManagedOs];

    /// All kinds (platform-agnostic probes).
    pub const ALL: &'static [PlatformKind] = &[
        PlatformKind::PosixGeneric,
        PlatformKind::Ubuntu,
        PlatformKind::Centos,
        PlatformKind::ManagedOs,
        PlatformKind::Unknown,
    ];

    pub fn is_posix(&self) -> bool {
        !matches!(self, PlatformKind::ManagedOs)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::PosixGeneric => "posix-generic",
            PlatformKind::Ubuntu => "ubuntu",
            PlatformKind::Centos => "centos",
            PlatformKind::ManagedOs => "managed-os",
            PlatformKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full platform detection result: the strategy-selecting kind plus the
/// raw distro identifier when one was found (e.g. "DEBIAN" on a host that
/// maps to `PosixGeneric`).
#[derive(Debug, Clone)]
pub struct Platform {
    pub kind: PlatformKind,
    pub distro_id: Option<String>,
}

impl Platform {
    pub fn new(kind: PlatformKind) -> Self {
        Self {
            kind,
            distro_id: None,
        }
    }

    pub fn with_distro(kind: PlatformKind, distro_id: impl Into<String>) -> Self {
        Self {
            kind,
            distro_id: Some(distro_id.into()),
        }
    }
}
