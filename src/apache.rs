//! Secondary component managed alongside PHP: the host's Apache builds.
//!
//! Apache versions are plain directories under `bin/apache`; switching one is
//! only a host config change, no alias is involved.

use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::{reason, PvmError, PvmResult};
use crate::host_config::{set_if_changed, HostConfigStore, APACHE_SECTION, VERSION_KEY};
use crate::installer::{extract_archive, fetch_archive};
use crate::process::{with_host_stopped, ProcessSupervisor};
use crate::transfer::{Downloader, Extractor};
use crate::util::{archive_stem, file_name_from_url};

/// Known-good Apache build installed by `apache fix`.
pub const FIX_ARCHIVE_URL: &str =
    "https://www.apachelounge.com/download/VS17/binaries/httpd-2.4.62-240718-win64-VS17.zip";
/// Folder the fixed build is installed as.
pub const FIX_FOLDER: &str = "httpd-2.4.62-win64-VS17";
/// Directory inside Apache Lounge archives holding the actual server.
const INNER_DIR: &str = "Apache24";

/// Installed Apache folder names, sorted.
pub fn list_apache(apache_root: &Path) -> PvmResult<Vec<String>> {
    let mut names = Vec::new();
    if !apache_root.is_dir() {
        return Ok(names);
    }
    for entry in std::fs::read_dir(apache_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// First installed folder (in sorted order) whose name contains `query`.
pub fn find_apache(apache_root: &Path, query: &str) -> PvmResult<String> {
    list_apache(apache_root)?
        .into_iter()
        .find(|name| name.contains(query))
        .ok_or_else(|| PvmError::VersionNotFound(query.to_string()))
}

/// Makes `folder` the host's active Apache, stopping the host around the write.
/// Returns whether the host config changed.
pub fn use_apache(
    folder: &str,
    supervisor: &dyn ProcessSupervisor,
    host_config: &mut dyn HostConfigStore,
) -> PvmResult<bool> {
    let (changed, _) = with_host_stopped(supervisor, || {
        set_if_changed(host_config, APACHE_SECTION, VERSION_KEY, folder)
            .map_err(|e| PvmError::HostConfigFailed(reason(&e)))
    })?;
    info!("apache version set to {}", folder);
    Ok(changed)
}

/// Reinstalls the known-good Apache build and activates it.
///
/// The archive nests the server under `Apache24/`; that directory is hoisted to
/// become the version folder itself.
pub fn fix_apache(
    apache_root: &Path,
    archive_url: &str,
    downloader: &dyn Downloader,
    extractor: &dyn Extractor,
    supervisor: &dyn ProcessSupervisor,
    host_config: &mut dyn HostConfigStore,
) -> PvmResult<PathBuf> {
    std::fs::create_dir_all(apache_root)?;
    let file_name = file_name_from_url(archive_url);
    let archive = apache_root.join(file_name);
    fetch_archive(downloader, archive_url, &archive)?;

    let dest = apache_root.join(FIX_FOLDER);
    let staging = apache_root.join(archive_stem(file_name));
    extract_archive(extractor, &archive, &staging)?;
    hoist_inner_dir(&staging, &dest)?;

    use_apache(FIX_FOLDER, supervisor, host_config)?;
    Ok(dest)
}

/// Moves `<staging>/Apache24` to `dest`, replacing whatever was there.
fn hoist_inner_dir(staging: &Path, dest: &Path) -> PvmResult<()> {
    let inner = staging.join(INNER_DIR);
    let failed = |reason: String| PvmError::ExtractionFailed {
        archive: staging.to_path_buf(),
        reason,
    };
    if !inner.is_dir() {
        return Err(failed(format!("archive has no {INNER_DIR} directory")));
    }
    let parked = staging.with_file_name(format!("{INNER_DIR}.pvm-tmp"));
    if parked.exists() {
        std::fs::remove_dir_all(&parked)?;
    }
    std::fs::rename(&inner, &parked)?;
    std::fs::remove_dir_all(staging)?;
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::rename(&parked, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_config::fake::MemoryConfig;
    use crate::process::fake::FakeSupervisor;
    use crate::transfer::ZipExtractor;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    struct ZipDownloader(Vec<u8>);

    impl Downloader for ZipDownloader {
        fn download(&self, _url: &str, dest: &Path) -> anyhow::Result<()> {
            std::fs::write(dest, &self.0)?;
            Ok(())
        }
    }

    fn apache_zip(inner: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(format!("{inner}/bin/httpd.exe"), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"httpd").unwrap();
        writer.start_file("ReadMe.txt", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"readme").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_list_and_find() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("httpd-2.4.62-win64-VS17")).unwrap();
        std::fs::create_dir(dir.path().join("httpd-2.4.54-win64-VS16")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        assert_eq!(
            list_apache(dir.path()).unwrap(),
            vec!["httpd-2.4.54-win64-VS16", "httpd-2.4.62-win64-VS17"]
        );
        assert_eq!(find_apache(dir.path(), "2.4").unwrap(), "httpd-2.4.54-win64-VS16");
        assert_eq!(find_apache(dir.path(), "VS17").unwrap(), "httpd-2.4.62-win64-VS17");
        assert!(matches!(find_apache(dir.path(), "2.2"), Err(PvmError::VersionNotFound(_))));
        assert!(list_apache(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_use_apache_brackets_host() {
        let supervisor = FakeSupervisor::running();
        let mut config = MemoryConfig::default();
        assert!(use_apache("httpd-2.4.62-win64-VS17", &supervisor, &mut config).unwrap());
        assert_eq!(
            config.get(APACHE_SECTION, VERSION_KEY).unwrap().as_deref(),
            Some("httpd-2.4.62-win64-VS17")
        );
        assert_eq!(*supervisor.events.borrow(), vec!["is_running", "stop", "start"]);
    }

    #[test]
    fn test_fix_hoists_inner_directory() {
        let dir = tempdir().unwrap();
        let old = dir.path().join(FIX_FOLDER);
        std::fs::create_dir_all(&old).unwrap();
        std::fs::write(old.join("stale.conf"), b"old").unwrap();

        let downloader = ZipDownloader(apache_zip(INNER_DIR));
        let supervisor = FakeSupervisor::default();
        let mut config = MemoryConfig::default();
        let dest = fix_apache(
            dir.path(),
            FIX_ARCHIVE_URL,
            &downloader,
            &ZipExtractor,
            &supervisor,
            &mut config,
        )
        .unwrap();

        assert_eq!(dest, old);
        assert!(dest.join("bin").join("httpd.exe").exists());
        assert!(!dest.join("stale.conf").exists());
        assert!(!dest.join("ReadMe.txt").exists());
        assert!(!dir.path().join("httpd-2.4.62-240718-win64-VS17").exists());
        assert!(!dir.path().join("httpd-2.4.62-240718-win64-VS17.zip").exists());
        assert_eq!(config.get(APACHE_SECTION, VERSION_KEY).unwrap().as_deref(), Some(FIX_FOLDER));
    }

    #[test]
    fn test_fix_without_inner_directory_fails() {
        let dir = tempdir().unwrap();
        let downloader = ZipDownloader(apache_zip("Apache22"));
        let supervisor = FakeSupervisor::running();
        let mut config = MemoryConfig::default();
        let err = fix_apache(
            dir.path(),
            FIX_ARCHIVE_URL,
            &downloader,
            &ZipExtractor,
            &supervisor,
            &mut config,
        )
        .unwrap_err();

        assert!(matches!(err, PvmError::ExtractionFailed { .. }));
        assert!(supervisor.events.borrow().is_empty());
        assert_eq!(config.writes, 0);
    }
}
