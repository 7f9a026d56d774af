// One-shot platform detection
//
// Detection runs once at startup; the result is immutable for the process
// lifetime and drives strategy selection at registry build time.

use std::fs;
use std::path::Path;

use tracing::debug;

use hostprobe_core::domain::{Platform, PlatformKind};

const REDHAT_RELEASE: &str = "/etc/redhat-release";
const OS_RELEASE: &str = "/etc/os-release";

/// Detect the host platform from well-known release files.
///
/// On Windows builds the managed-OS strategy is selected unconditionally.
/// On other hosts `/etc/redhat-release` wins over `/etc/os-release`; a host
/// with neither file detects as `Unknown` and is served the POSIX strategy
/// set.
pub fn detect_platform() -> Platform {
    if cfg!(windows) {
        return Platform::new(PlatformKind::ManagedOs);
    }
    let platform = detect_from_files(Path::new(REDHAT_RELEASE), Path::new(OS_RELEASE));
    debug!(kind = %platform.kind, distro = ?platform.distro_id, "platform detected");
    platform
}

fn detect_from_files(redhat_release: &Path, os_release: &Path) -> Platform {
    if let Ok(contents) = fs::read_to_string(redhat_release) {
        return classify_redhat_release(&contents);
    }
    if let Ok(contents) = fs::read_to_string(os_release) {
        if let Some(platform) = classify_os_release(&contents) {
            return platform;
        }
    }
    Platform::new(PlatformKind::Unknown)
}

/// Classify from a redhat-release banner, e.g.
/// `CentOS Linux release 7.9.2009 (Core)`. The leading word is the distro
/// identifier.
fn classify_redhat_release(contents: &str) -> Platform {
    match contents.split_whitespace().next() {
        Some(word) if word.eq_ignore_ascii_case("centos") => {
            Platform::with_distro(PlatformKind::Centos, word.to_ascii_lowercase())
        }
        Some(word) => {
            Platform::with_distro(PlatformKind::PosixGeneric, word.to_ascii_lowercase())
        }
        None => Platform::new(PlatformKind::Unknown),
    }
}

/// Classify from os-release `ID=` (not `ID_LIKE=`), quotes stripped.
fn classify_os_release(contents: &str) -> Option<Platform> {
    let id = contents
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("ID="))
        .map(|value| value.trim_matches('"').to_ascii_lowercase())?;
    if id.is_empty() {
        return None;
    }

    let kind = match id.as_str() {
        "ubuntu" => PlatformKind::Ubuntu,
        "centos" => PlatformKind::Centos,
        _ => PlatformKind::PosixGeneric,
    };
    Some(Platform::with_distro(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redhat_release_centos() {
        let platform = classify_redhat_release("CentOS Linux release 7.9.2009 (Core)\n");
        assert_eq!(platform.kind, PlatformKind::Centos);
        assert_eq!(platform.distro_id.as_deref(), Some("centos"));
    }

    #[test]
    fn test_redhat_release_other_vendor_is_posix_generic() {
        let platform = classify_redhat_release("Red Hat Enterprise Linux release 9.3\n");
        assert_eq!(platform.kind, PlatformKind::PosixGeneric);
        assert_eq!(platform.distro_id.as_deref(), Some("red"));
    }

    #[test]
    fn test_os_release_ubuntu() {
        let contents = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"22.04\"\n";
        let platform = classify_os_release(contents).unwrap();
        assert_eq!(platform.kind, PlatformKind::Ubuntu);
        assert_eq!(platform.distro_id.as_deref(), Some("ubuntu"));
    }

    #[test]
    fn test_os_release_quoted_unlisted_id_is_posix_generic() {
        let contents = "ID=\"debian\"\nVERSION_ID=\"12\"\n";
        let platform = classify_os_release(contents).unwrap();
        assert_eq!(platform.kind, PlatformKind::PosixGeneric);
        assert_eq!(platform.distro_id.as_deref(), Some("debian"));
    }

    #[test]
    fn test_os_release_id_like_is_not_mistaken_for_id() {
        let contents = "NAME=\"Some OS\"\nID_LIKE=debian\n";
        assert!(classify_os_release(contents).is_none());
    }

    #[test]
    fn test_redhat_release_wins_over_os_release() {
        let dir = TempDir::new().unwrap();
        let redhat = dir.path().join("redhat-release");
        let os = dir.path().join("os-release");
        std::fs::write(&redhat, "CentOS Stream release 9\n").unwrap();
        std::fs::write(&os, "ID=ubuntu\n").unwrap();

        let platform = detect_from_files(&redhat, &os);
        assert_eq!(platform.kind, PlatformKind::Centos);
    }

    #[test]
    fn test_no_release_files_is_unknown() {
        let dir = TempDir::new().unwrap();
        let platform = detect_from_files(
            &dir.path().join("redhat-release"),
            &dir.path().join("os-release"),
        );
        assert_eq!(platform.kind, PlatformKind::Unknown);
        assert!(platform.distro_id.is_none());
    }
}
