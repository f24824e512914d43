//! Download and unpack capabilities used by the install pipelines.
//!
//! Both are traits so the pipelines can be exercised without network access.

use std::fs::File;
use std::path::Path;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;
use zip::ZipArchive;
use crate::util::http_client;

/// Streams the resource at `url` into a file at `dest`.
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Unpacks `archive` into the existing directory `dest`.
pub trait Extractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Downloads over HTTPS with the pvm user agent.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        Ok(Self { client: http_client()? })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()?
            .error_for_status()?;
        debug!(
            "downloading {} ({} bytes) to {}",
            url,
            response.content_length().unwrap_or(0),
            dest.display()
        );
        let mut file = File::create(dest)
            .with_context(|| format!("Could not create {}", dest.display()))?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}

/// Extracts `.zip` archives, the format of every Windows PHP and Apache build.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive)
            .with_context(|| format!("Could not open {}", archive.display()))?;
        let mut zip = ZipArchive::new(file)?;
        zip.extract(dest)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_zip_extractor_unpacks_nested_files() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer.start_file("php.exe", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"binary").unwrap();
        writer.start_file("ext/php_curl.dll", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"dll").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        ZipExtractor.extract(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("php.exe")).unwrap(), b"binary");
        assert!(dest.join("ext").join("php_curl.dll").exists());
    }

    #[test]
    fn test_zip_extractor_rejects_garbage() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();
        assert!(ZipExtractor.extract(&archive, dir.path()).is_err());
    }
}
