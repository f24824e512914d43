use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the install, activation and removal pipelines.
///
/// Every pipeline is fail-fast: the first error aborts the remaining stages
/// and nothing is retried. Only [`PvmError::ConfigurationIncomplete`] is
/// reported after the runtime has already been placed on disk.
#[derive(Debug, Error)]
pub enum PvmError {
    #[error("no version matching '{0}' was found")]
    VersionNotFound(String),

    #[error("PHP {0} has no thread-safe x64 build")]
    NoCompatibleBuild(String),

    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("could not extract {}: {reason}", .archive.display())]
    ExtractionFailed { archive: PathBuf, reason: String },

    /// The runtime is installed and usable, but `php.ini` was not fully prepared.
    #[error("PHP {version} was installed to {} but could not be configured: {reason}", .path.display())]
    ConfigurationIncomplete {
        version: String,
        path: PathBuf,
        reason: String,
    },

    #[error("could not point {} at {}: {reason}", .alias.display(), .target.display())]
    ActivationDenied {
        alias: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("could not remove {}: {reason}", .path.display())]
    RemovalFailed { path: PathBuf, reason: String },

    #[error("release index is malformed: {0}")]
    CatalogFormatError(String),

    #[error("could not update host configuration: {0}")]
    HostConfigFailed(String),

    #[error("could not control the host process: {0}")]
    ProcessControlFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type PvmResult<T> = std::result::Result<T, PvmError>;

/// Flattens an `anyhow` chain into a single line for the error variants above.
pub(crate) fn reason(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
