use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::debug;

/// A stable path redirected at whichever installed version is active.
pub trait AliasManager {
    /// The well-known alias location.
    fn path(&self) -> &Path;

    /// Where the alias currently points, if it exists. The target may be gone.
    fn resolve(&self) -> Option<PathBuf>;

    /// Removes the alias itself, never the directory it points at.
    /// Succeeds when there is nothing to remove.
    fn remove(&self) -> Result<()>;

    /// Creates the alias pointing at `target`. The alias must not exist.
    fn create(&self, target: &Path) -> Result<()>;
}

/// Directory symlink at a fixed path.
///
/// On Unix this is a plain symlink. On Windows a directory symlink needs
/// either Developer Mode or an elevated `mklink /D`, which raises a UAC prompt
/// and blocks until the user answers it.
#[derive(Debug, Clone)]
pub struct SymlinkAlias {
    path: PathBuf,
}

impl SymlinkAlias {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl AliasManager for SymlinkAlias {
    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self) -> Option<PathBuf> {
        std::fs::read_link(&self.path).ok()
    }

    fn remove(&self) -> Result<()> {
        let Ok(meta) = std::fs::symlink_metadata(&self.path) else {
            return Ok(());
        };
        debug!("removing alias {}", self.path.display());
        let removed = if meta.is_dir() || (cfg!(windows) && meta.file_type().is_symlink()) {
            // Windows directory links are removed like empty directories.
            std::fs::remove_dir(&self.path)
        } else {
            std::fs::remove_file(&self.path)
        };
        removed.with_context(|| format!("Could not remove {}", self.path.display()))
    }

    fn create(&self, target: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("linking {} -> {}", self.path.display(), target.display());
        create_dir_link(target, &self.path)
    }
}

#[cfg(unix)]
fn create_dir_link(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(windows)]
fn create_dir_link(target: &Path, link: &Path) -> Result<()> {
    use std::io::ErrorKind;
    // ERROR_PRIVILEGE_NOT_HELD
    const PRIVILEGE_NOT_HELD: i32 = 1314;

    match std::os::windows::fs::symlink_dir(target, link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied || e.raw_os_error() == Some(PRIVILEGE_NOT_HELD) => {
            elevated_mklink(target, link)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(windows)]
fn elevated_mklink(target: &Path, link: &Path) -> Result<()> {
    use std::process::Command;

    let args = format!("/c mklink /D \"{}\" \"{}\"", link.display(), target.display());
    let script = format!(
        "Start-Process -FilePath cmd -ArgumentList '{}' -Verb RunAs -Wait -WindowStyle Hidden",
        args.replace('\'', "''")
    );
    let status = Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .status()
        .context("Could not launch powershell")?;
    if !status.success() || std::fs::symlink_metadata(link).is_err() {
        anyhow::bail!("elevation was denied or mklink failed");
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_resolve_remove() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("php-8.3.12-Win32-vs16-x64");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("php.exe"), b"binary").unwrap();
        let alias = SymlinkAlias::new(dir.path().join("home").join("php"));

        assert_eq!(alias.resolve(), None);
        alias.create(&target).unwrap();
        assert_eq!(alias.resolve(), Some(target.clone()));
        assert!(alias.path().join("php.exe").exists());

        alias.remove().unwrap();
        assert_eq!(alias.resolve(), None);
        assert!(target.join("php.exe").exists());
    }

    #[test]
    fn test_remove_missing_alias_is_ok() {
        let dir = tempdir().unwrap();
        let alias = SymlinkAlias::new(dir.path().join("php"));
        alias.remove().unwrap();
    }

    #[test]
    fn test_dangling_alias_resolves_and_removes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("gone");
        std::fs::create_dir(&target).unwrap();
        let alias = SymlinkAlias::new(dir.path().join("php"));
        alias.create(&target).unwrap();
        std::fs::remove_dir(&target).unwrap();

        assert_eq!(alias.resolve(), Some(target));
        alias.remove().unwrap();
        assert!(std::fs::symlink_metadata(alias.path()).is_err());
    }

    #[test]
    fn test_remove_never_recurses_into_real_directory() {
        let dir = tempdir().unwrap();
        let alias = SymlinkAlias::new(dir.path().join("php"));
        std::fs::create_dir(alias.path()).unwrap();
        std::fs::write(alias.path().join("keep"), b"data").unwrap();

        assert!(alias.remove().is_err());
        assert!(alias.path().join("keep").exists());
    }
}
