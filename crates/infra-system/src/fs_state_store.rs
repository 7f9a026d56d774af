// Filesystem state store rooted at an injected directory
//
// Writes are whole-file replacements of self-consistent values, so racing
// first-time writers can lose the race but never corrupt state.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use hostprobe_core::port::state_store::{StateError, StateStore};

/// File-backed StateStore under a configured state root (e.g.
/// `~/.hostprobe`). The directory is created on construction.
pub struct FsStateStore {
    root: PathBuf,
}

impl FsStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StateError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StateError::Unavailable(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn io_err(key: &str, source: std::io::Error) -> StateError {
        StateError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl StateStore for FsStateStore {
    fn read(&self, key: &str) -> Result<Option<String>, StateError> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StateError> {
        fs::write(self.path_of(key), value).map_err(|e| Self::io_err(key, e))
    }

    fn set_flag(&self, name: &str) -> Result<(), StateError> {
        fs::write(self.path_of(name), "").map_err(|e| Self::io_err(name, e))
    }

    fn take_flag(&self, name: &str) -> Result<bool, StateError> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_err(name, e)),
        }
    }

    fn ensure_script(&self, name: &str, contents: &str) -> Result<PathBuf, StateError> {
        let path = self.path_of(name);
        if !path.exists() {
            fs::write(&path, contents).map_err(|e| Self::io_err(name, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o750))
                    .map_err(|e| Self::io_err(name, e))?;
            }
            debug!(script = %path.display(), "state script materialized");
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsStateStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStateStore::new(dir.path().join("state")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_read_missing_key_is_none() {
        let (_dir, store) = store();
        assert_eq!(store.read("machine-id").unwrap(), None);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let (_dir, store) = store();
        store.write("machine-id", "abc123").unwrap();
        assert_eq!(store.read("machine-id").unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_write_replaces_whole_file() {
        let (_dir, store) = store();
        store.write("top-output", "first snapshot, quite long").unwrap();
        store.write("top-output", "second").unwrap();
        assert_eq!(store.read("top-output").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_flag_lifecycle() {
        let (_dir, store) = store();
        assert!(!store.take_flag("check-updates").unwrap());
        store.set_flag("check-updates").unwrap();
        store.set_flag("check-updates").unwrap(); // idempotent
        assert!(store.take_flag("check-updates").unwrap());
        assert!(!store.take_flag("check-updates").unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn test_script_is_created_once_and_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        let path = store.ensure_script("reboot.sh", "#!/bin/bash\nexit 0\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);

        // second call keeps the existing file
        let again = store.ensure_script("reboot.sh", "#!/bin/bash\nexit 1\n").unwrap();
        assert_eq!(path, again);
        assert_eq!(
            std::fs::read_to_string(&again).unwrap(),
            "#!/bin/bash\nexit 0\n"
        );
    }

    #[test]
    fn test_persists_across_store_instances() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("state");
        {
            let store = FsStateStore::new(&root).unwrap();
            store.write("machine-id", "stable-token").unwrap();
        }
        let reopened = FsStateStore::new(&root).unwrap();
        assert_eq!(
            reopened.read("machine-id").unwrap().as_deref(),
            Some("stable-token")
        );
    }
}
