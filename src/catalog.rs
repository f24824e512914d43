use std::path::{Path, PathBuf};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};
use crate::error::{PvmError, PvmResult};
use crate::util::{compare_versions_desc, http_client};

/// Where the official Windows PHP builds publish their release index.
pub const RELEASE_INDEX_URL: &str = "https://windows.php.net/downloads/releases/releases.json";
/// Base URL that relative `zip.path` entries of the index are joined to.
pub const RELEASE_BASE_URL: &str = "https://windows.php.net/downloads/releases/";

/// Installed directories look like `php-<version>-<platform>-<compiler>-x64`.
pub const RUNTIME_PREFIX: &str = "php-";
pub const ARCH_SUFFIX: &str = "-x64";
/// Only thread-safe builds are installable.
pub const THREAD_SAFE_MARKER: &str = "ts-";

/// A PHP version unpacked in the runtime storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    /// The version, e.g. `7.4.33`.
    pub identifier: String,
    /// Absolute location of the unpacked runtime.
    pub path: PathBuf,
}

impl InstalledVersion {
    /// The directory name, which is what the host config stores.
    pub fn folder_name(&self) -> String {
        crate::util::folder_name(&self.path).unwrap_or_else(|| self.identifier.clone())
    }
}

/// Extracts the version from an installed directory name.
///
/// Returns `None` unless the name starts with `php-` and ends with `-x64`.
///
/// ```
/// use pvm::catalog::parse_installed_name;
///
/// assert_eq!(parse_installed_name("php-7.4.33-Win32-vc15-x64").as_deref(), Some("7.4.33"));
/// assert_eq!(parse_installed_name("README-x64"), None);
/// ```
pub fn parse_installed_name(name: &str) -> Option<String> {
    let middle = name
        .strip_prefix(RUNTIME_PREFIX)?
        .strip_suffix(ARCH_SUFFIX)?;
    let version = middle.split('-').next()?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}

/// The set of installed versions, rebuilt by scanning on every invocation.
#[derive(Debug, Clone, Default)]
pub struct InstalledCatalog {
    versions: Vec<InstalledVersion>,
}

impl InstalledCatalog {
    /// Scans the immediate subdirectories of `runtime_root`.
    ///
    /// A missing directory yields an empty catalog; entries that don't follow
    /// the naming convention are skipped. Version paths are always absolute,
    /// a relative root is taken from the current directory.
    pub fn scan<P: AsRef<Path>>(runtime_root: P) -> PvmResult<Self> {
        let runtime_root = std::path::absolute(runtime_root.as_ref())?;
        let mut versions = Vec::new();
        if !runtime_root.is_dir() {
            return Ok(Self { versions });
        }
        for entry in std::fs::read_dir(&runtime_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(identifier) = parse_installed_name(&name.to_string_lossy()) else {
                debug!("skipping {:?}", entry.path());
                continue;
            };
            versions.push(InstalledVersion { identifier, path: entry.path() });
        }
        versions.sort_by(|a, b| a.path.cmp(&b.path));
        for (index, version) in versions.iter().enumerate() {
            if let Some(first) = versions[..index].iter().find(|v| v.identifier == version.identifier) {
                warn!(
                    "{} and {} are both PHP {}, only {} can be selected by version",
                    first.folder_name(),
                    version.folder_name(),
                    version.identifier,
                    first.folder_name()
                );
            }
        }
        Ok(Self { versions })
    }

    /// Installed versions ordered newest first, folders of the same version by name.
    pub fn newest_first(&self) -> Vec<&InstalledVersion> {
        let mut versions: Vec<&InstalledVersion> = self.versions.iter().collect();
        versions.sort_by(|a, b| compare_versions_desc(&a.identifier, &b.identifier));
        versions
    }

    /// Number of installed folders carrying `identifier`.
    pub fn count(&self, identifier: &str) -> usize {
        self.versions.iter().filter(|v| v.identifier == identifier).count()
    }

    pub fn versions(&self) -> &[InstalledVersion] {
        &self.versions
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.identifier.clone()).collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&InstalledVersion> {
        self.versions.iter().find(|v| v.identifier == identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Drops a version after it has been deleted from disk.
    pub fn forget(&mut self, identifier: &str) -> Option<InstalledVersion> {
        let index = self.versions.iter().position(|v| v.identifier == identifier)?;
        Some(self.versions.remove(index))
    }
}

/// Shorthand for [`InstalledCatalog::scan`].
pub fn list_installed<P: AsRef<Path>>(runtime_root: P) -> PvmResult<Vec<InstalledVersion>> {
    Ok(InstalledCatalog::scan(runtime_root)?.versions)
}

/// A release listed in the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRelease {
    /// Key in the index, e.g. `8.3`.
    pub identifier: String,
    /// Latest patch version advertised for this release, if any.
    pub latest: Option<String>,
    /// Selected thread-safe x64 variant, e.g. `ts-vs16-x64`.
    pub variant_key: Option<String>,
    /// Absolute download location of the selected variant.
    pub archive_url: Option<String>,
}

impl RemoteRelease {
    pub fn is_installable(&self) -> bool {
        self.archive_url.is_some()
    }
}

/// The remote release index, reconstructed on every invocation that needs it.
#[derive(Debug, Clone, Default)]
pub struct RemoteCatalog {
    releases: Vec<RemoteRelease>,
}

impl RemoteCatalog {
    pub fn releases(&self) -> &[RemoteRelease] {
        &self.releases
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.releases.iter().map(|r| r.identifier.clone()).collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&RemoteRelease> {
        self.releases.iter().find(|r| r.identifier == identifier)
    }
}

fn is_qualifying_variant(name: &str) -> bool {
    name.starts_with(THREAD_SAFE_MARKER) && name.ends_with(ARCH_SUFFIX)
}

/// Parses the release index document.
///
/// For each release the first variant (in document order) whose name starts
/// with `ts-` and ends with `-x64` is selected. Releases without such a
/// variant are kept with no archive so they still show up in listings.
///
/// # Errors
///
/// [`PvmError::CatalogFormatError`] if the document is not a mapping of
/// release to mapping, or the selected variant has no `zip.path`.
pub fn parse_remote_index(document: &str) -> PvmResult<RemoteCatalog> {
    let root: Value = serde_json::from_str(document)
        .map_err(|e| PvmError::CatalogFormatError(e.to_string()))?;
    let root = root
        .as_object()
        .ok_or_else(|| PvmError::CatalogFormatError("top level is not an object".to_string()))?;
    let base = Url::parse(RELEASE_BASE_URL)
        .map_err(|e| PvmError::CatalogFormatError(e.to_string()))?;

    let mut releases = Vec::with_capacity(root.len());
    for (identifier, entry) in root {
        let entry = entry.as_object().ok_or_else(|| {
            PvmError::CatalogFormatError(format!("release '{identifier}' is not an object"))
        })?;
        let latest = entry
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);

        let variant = entry
            .iter()
            .find(|(name, meta)| meta.is_object() && is_qualifying_variant(name));

        let (variant_key, archive_url) = match variant {
            Some((name, meta)) => {
                let zip_path = meta
                    .pointer("/zip/path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        PvmError::CatalogFormatError(format!(
                            "variant '{name}' of release '{identifier}' has no zip.path"
                        ))
                    })?;
                let url = base
                    .join(zip_path)
                    .map_err(|e| PvmError::CatalogFormatError(e.to_string()))?;
                (Some(name.clone()), Some(url.to_string()))
            }
            None => (None, None),
        };

        releases.push(RemoteRelease {
            identifier: identifier.clone(),
            latest,
            variant_key,
            archive_url,
        });
    }
    Ok(RemoteCatalog { releases })
}

/// Fetches and parses the remote release index.
pub fn fetch_remote_index() -> anyhow::Result<RemoteCatalog> {
    debug!("fetching {RELEASE_INDEX_URL}");
    let body = http_client()?
        .get(RELEASE_INDEX_URL)
        .send()?
        .error_for_status()?
        .text()?;
    Ok(parse_remote_index(&body)?)
}
