use std::path::{Path, PathBuf};

/// Paths inside a host installation. Everything is relative to the host root:
///
/// ```txt
/// :root:/
///     bin/php/       # one directory per installed PHP version
///     bin/apache/    # one directory per installed Apache version
///     usr/laragon.ini
///     laragon.exe
/// ```
///
/// Resolved once by the dispatcher and passed by value into each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    root: PathBuf,
}

/// Name of the host process as reported by the OS.
pub const HOST_PROCESS_NAME: &str = "laragon";

impl HostLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runtime storage directory holding every installed PHP version.
    pub fn php_dir(&self) -> PathBuf {
        self.root.join("bin").join("php")
    }

    pub fn apache_dir(&self) -> PathBuf {
        self.root.join("bin").join("apache")
    }

    /// The host application's own ini file.
    pub fn host_ini(&self) -> PathBuf {
        self.root.join("usr").join("laragon.ini")
    }

    pub fn host_exe(&self) -> PathBuf {
        self.root.join(format!("{HOST_PROCESS_NAME}.exe"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = HostLayout::new("/opt/laragon");
        assert_eq!(layout.php_dir(), Path::new("/opt/laragon/bin/php"));
        assert_eq!(layout.apache_dir(), Path::new("/opt/laragon/bin/apache"));
        assert_eq!(layout.host_ini(), Path::new("/opt/laragon/usr/laragon.ini"));
        assert_eq!(layout.host_exe(), Path::new("/opt/laragon/laragon.exe"));
    }
}
