use std::path::Path;
use anyhow::Context;
use tracing::{debug, info, warn};
use crate::catalog::{parse_installed_name, InstalledVersion, RemoteCatalog};
use crate::error::{reason, PvmError, PvmResult};
use crate::php_ini::{rewrite_php_ini, ACTIVE_INI, DEVELOPMENT_INI};
use crate::resolver::resolve;
use crate::transfer::{Downloader, Extractor};
use crate::util::{archive_stem, file_name_from_url};

/// Trust-anchor bundle used by curl and openssl inside PHP.
pub const CACERT_URL: &str = "https://curl.se/ca/cacert.pem";
pub const CACERT_FILE: &str = "cacert.pem";

/// Runs the install pipeline: resolve, select variant, fetch, extract, configure.
///
/// Stages run strictly in order and the first failure aborts the rest.
pub struct Installer<'a> {
    downloader: &'a dyn Downloader,
    extractor: &'a dyn Extractor,
}

impl<'a> Installer<'a> {
    pub fn new(downloader: &'a dyn Downloader, extractor: &'a dyn Extractor) -> Self {
        Self { downloader, extractor }
    }

    /// Installs the release matching `query` into `runtime_root`.
    ///
    /// Re-installing an existing version wipes its directory first.
    ///
    /// # Errors
    ///
    /// - [`PvmError::VersionNotFound`] / [`PvmError::NoCompatibleBuild`] before anything touches disk.
    /// - [`PvmError::DownloadFailed`] / [`PvmError::ExtractionFailed`] when fetching or unpacking fails.
    /// - [`PvmError::ConfigurationIncomplete`] when the runtime is on disk but `php.ini` could not be prepared.
    pub fn install(
        &self,
        query: &str,
        catalog: &RemoteCatalog,
        runtime_root: &Path,
    ) -> PvmResult<InstalledVersion> {
        let identifier = resolve(query, catalog.identifiers())
            .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))?;
        let release = catalog
            .get(&identifier)
            .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))?;
        let url = release
            .archive_url
            .as_deref()
            .ok_or_else(|| PvmError::NoCompatibleBuild(identifier.clone()))?;
        info!("installing PHP {} from {}", identifier, url);

        std::fs::create_dir_all(runtime_root)?;
        let file_name = file_name_from_url(url);
        let archive = runtime_root.join(file_name);
        fetch_archive(self.downloader, url, &archive)?;

        let stem = archive_stem(file_name);
        let dest = runtime_root.join(stem);
        extract_archive(self.extractor, &archive, &dest)?;

        let version = InstalledVersion {
            identifier: parse_installed_name(stem)
                .or_else(|| release.latest.clone())
                .unwrap_or(identifier),
            path: dest,
        };

        self.configure(&version.path)
            .map_err(|e| PvmError::ConfigurationIncomplete {
                version: version.identifier.clone(),
                path: version.path.clone(),
                reason: reason(&e),
            })?;
        info!("installed PHP {} to {}", version.identifier, version.path.display());
        Ok(version)
    }

    /// Prepares `php.ini` inside an unpacked runtime.
    ///
    /// Copies the development defaults over `php.ini`, fetches `cacert.pem`
    /// if it is missing, then enables the standard extensions and CA paths.
    pub fn configure(&self, runtime_dir: &Path) -> anyhow::Result<()> {
        let defaults = runtime_dir.join(DEVELOPMENT_INI);
        let active = runtime_dir.join(ACTIVE_INI);
        std::fs::copy(&defaults, &active)
            .with_context(|| format!("Could not copy {}", defaults.display()))?;
        debug!("copied {} to {}", DEVELOPMENT_INI, ACTIVE_INI);

        let cacert = runtime_dir.join(CACERT_FILE);
        if !cacert.exists() {
            if let Err(e) = self.downloader.download(CACERT_URL, &cacert) {
                remove_partial_file(&cacert);
                return Err(e.context("Could not download cacert.pem"));
            }
        }

        let contents = std::fs::read_to_string(&active)?;
        std::fs::write(&active, rewrite_php_ini(&contents, &cacert))?;
        Ok(())
    }
}

/// Downloads `url` to `archive`, deleting any stale file of the same name first.
/// Installs never resume; a partial download is removed on failure.
pub fn fetch_archive(downloader: &dyn Downloader, url: &str, archive: &Path) -> PvmResult<()> {
    if archive.exists() {
        warn!("removing stale download {}", archive.display());
        std::fs::remove_file(archive)?;
    }
    downloader.download(url, archive).map_err(|e| {
        remove_partial_file(archive);
        PvmError::DownloadFailed { url: url.to_string(), reason: reason(&e) }
    })
}

/// Extracts `archive` into a freshly recreated `dest`, then deletes the archive.
pub fn extract_archive(extractor: &dyn Extractor, archive: &Path, dest: &Path) -> PvmResult<()> {
    let failed = |reason: String| PvmError::ExtractionFailed {
        archive: archive.to_path_buf(),
        reason,
    };
    if dest.exists() {
        debug!("removing previous {}", dest.display());
        std::fs::remove_dir_all(dest).map_err(|e| failed(e.to_string()))?;
    }
    std::fs::create_dir_all(dest).map_err(|e| failed(e.to_string()))?;
    extractor
        .extract(archive, dest)
        .map_err(|e| failed(reason(&e)))?;
    info!("extracted to {}", dest.display());

    if let Err(e) = std::fs::remove_file(archive) {
        warn!("could not delete {}: {}", archive.display(), e);
    }
    Ok(())
}

fn remove_partial_file(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("could not delete partial file {}: {}", path.display(), e);
        }
    }
}
