use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::debug;

/// The user's persistent executable search path.
pub trait SearchPath {
    /// Adds `entry` unless it is already present. Returns whether anything changed.
    fn ensure_contains(&self, entry: &Path) -> Result<bool>;
}

/// Appends `entry` to a separator-joined path list unless it already occurs in it.
///
/// The containment check is a plain substring test, so this is a union rather
/// than a strict append.
pub fn merge_search_path(current: &str, entry: &str, separator: char) -> Option<String> {
    if current.contains(entry) {
        return None;
    }
    let current = current.trim_end_matches(separator);
    if current.is_empty() {
        Some(entry.to_string())
    } else {
        Some(format!("{current}{separator}{entry}"))
    }
}

/// Persists to the user-scoped `Path` environment variable on Windows and to
/// `~/.profile` elsewhere.
#[derive(Debug, Clone)]
pub struct UserSearchPath {
    #[cfg_attr(windows, allow(dead_code))]
    profile: PathBuf,
}

impl UserSearchPath {
    pub fn new() -> Result<Self> {
        let home = directories::BaseDirs::new()
            .context("Could not determine the home directory")?
            .home_dir()
            .to_path_buf();
        Ok(Self { profile: home.join(".profile") })
    }

    /// Uses a specific shell profile instead of `~/.profile`.
    pub fn with_profile<P: Into<PathBuf>>(profile: P) -> Self {
        Self { profile: profile.into() }
    }
}

#[cfg(windows)]
impl SearchPath for UserSearchPath {
    fn ensure_contains(&self, entry: &Path) -> Result<bool> {
        use std::process::Command;

        let output = Command::new("powershell")
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                "[Environment]::GetEnvironmentVariable('Path', 'User')",
            ])
            .output()
            .context("Could not read the user Path")?;
        let current = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let Some(updated) = merge_search_path(&current, &entry.display().to_string(), ';') else {
            return Ok(false);
        };
        debug!("updating user Path to {}", updated);
        let script = format!(
            "[Environment]::SetEnvironmentVariable('Path', '{}', 'User')",
            updated.replace('\'', "''")
        );
        let status = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .status()?;
        if !status.success() {
            anyhow::bail!("Could not update the user Path");
        }
        Ok(true)
    }
}

#[cfg(not(windows))]
impl SearchPath for UserSearchPath {
    fn ensure_contains(&self, entry: &Path) -> Result<bool> {
        let current = std::fs::read_to_string(&self.profile).unwrap_or_default();
        let entry = entry.display().to_string();
        if current.contains(&entry) {
            return Ok(false);
        }
        debug!("adding {} to {}", entry, self.profile.display());
        let mut updated = current;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format!("export PATH=\"{entry}:$PATH\"\n"));
        std::fs::write(&self.profile, updated)
            .with_context(|| format!("Could not write {}", self.profile.display()))?;
        Ok(true)
    }
}
