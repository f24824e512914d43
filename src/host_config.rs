use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

/// Section and key holding the host's active PHP folder.
pub const PHP_SECTION: &str = "php";
/// Section and key holding the host's active Apache folder.
pub const APACHE_SECTION: &str = "apache";
pub const VERSION_KEY: &str = "Version";

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([^\]]+)\]\s*$").expect("valid section regex"));
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^=;#\[]+?)\s*=(.*)$").expect("valid entry regex"));

/// The host application's persisted settings. pvm is the only writer.
pub trait HostConfigStore {
    fn get(&self, section: &str, key: &str) -> Result<Option<String>>;
    fn set(&mut self, section: &str, key: &str, value: &str) -> Result<()>;
}

/// Sets `section.key` to `value` only when it differs. Returns whether it changed.
pub fn set_if_changed(
    store: &mut dyn HostConfigStore,
    section: &str,
    key: &str,
    value: &str,
) -> Result<bool> {
    if store.get(section, key)?.as_deref() == Some(value) {
        debug!("[{}] {} already {}", section, key, value);
        return Ok(false);
    }
    store.set(section, key, value)?;
    Ok(true)
}

/// Line-preserving editor for an ini file.
///
/// Section and key names match case-insensitively. Comments, blank lines and
/// unrelated entries are written back untouched.
#[derive(Debug, Clone)]
pub struct IniDocument {
    lines: Vec<String>,
}

impl IniDocument {
    pub fn parse(contents: &str) -> Self {
        Self { lines: contents.lines().map(str::to_string).collect() }
    }

    fn section_of(line: &str) -> Option<&str> {
        SECTION_RE
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
    }

    fn entry_of(line: &str) -> Option<(&str, &str)> {
        let captures = ENTRY_RE.captures(line)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str().trim()))
    }

    /// Index of the key line, or of the section's last line if the key is absent.
    fn locate(&self, section: &str, key: &str) -> (Option<usize>, Option<usize>) {
        let mut in_section = false;
        let mut section_end = None;
        for (index, line) in self.lines.iter().enumerate() {
            if let Some(name) = Self::section_of(line) {
                in_section = name.eq_ignore_ascii_case(section);
                if in_section {
                    section_end = Some(index);
                }
                continue;
            }
            if !in_section {
                continue;
            }
            if !line.trim().is_empty() {
                section_end = Some(index);
            }
            if let Some((name, _)) = Self::entry_of(line) {
                if name.eq_ignore_ascii_case(key) {
                    return (Some(index), section_end);
                }
            }
        }
        (None, section_end)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let (index, _) = self.locate(section, key);
        let (_, value) = Self::entry_of(&self.lines[index?])?;
        Some(value.to_string())
    }

    /// Rewrites the key in place, or appends it to the section, or appends a new section.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        match self.locate(section, key) {
            (Some(index), _) => {
                let name = Self::entry_of(&self.lines[index])
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_else(|| key.to_string());
                self.lines[index] = format!("{name}={value}");
            }
            (None, Some(end)) => {
                self.lines.insert(end + 1, format!("{key}={value}"));
            }
            (None, None) => {
                if self.lines.last().is_some_and(|l| !l.trim().is_empty()) {
                    self.lines.push(String::new());
                }
                self.lines.push(format!("[{section}]"));
                self.lines.push(format!("{key}={value}"));
            }
        }
    }

    pub fn render(&self, newline: &str) -> String {
        let mut out = self.lines.join(newline);
        out.push_str(newline);
        out
    }
}

/// An ini file on disk, re-read on every access.
#[derive(Debug, Clone)]
pub struct IniFile {
    path: PathBuf,
}

impl IniFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))
    }
}

impl HostConfigStore for IniFile {
    fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
        Ok(IniDocument::parse(&self.read()?).get(section, key))
    }

    fn set(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        let contents = self.read()?;
        let newline = if contents.contains("\r\n") { "\r\n" } else { "\n" };
        let mut document = IniDocument::parse(&contents);
        document.set(section, key, value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("writing [{}] {}={} to {}", section, key, value, self.path.display());
        std::fs::write(&self.path, document.render(newline))
            .with_context(|| format!("Could not write {}", self.path.display()))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    /// In-memory store counting writes.
    #[derive(Default)]
    pub struct MemoryConfig {
        pub values: HashMap<(String, String), String>,
        pub writes: usize,
        pub fail_writes: bool,
    }

    impl HostConfigStore for MemoryConfig {
        fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
            Ok(self.values.get(&(section.to_string(), key.to_string())).cloned())
        }

        fn set(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("file is read-only");
            }
            self.writes += 1;
            self.values.insert((section.to_string(), key.to_string()), value.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const LARAGON_INI: &str = "[laragon]\n\
Language=English\n\
\n\
[php]\n\
; active build\n\
Version = php-7.4.33-Win32-vc15-x64\n\
\n\
[apache]\n\
Port=80\n";

    #[test]
    fn test_get_is_case_insensitive() {
        let doc = IniDocument::parse(LARAGON_INI);
        assert_eq!(doc.get("php", "version").as_deref(), Some("php-7.4.33-Win32-vc15-x64"));
        assert_eq!(doc.get("PHP", "Version").as_deref(), Some("php-7.4.33-Win32-vc15-x64"));
        assert_eq!(doc.get("apache", "Version"), None);
        assert_eq!(doc.get("mysql", "Version"), None);
    }

    #[test]
    fn test_set_existing_keeps_layout() {
        let mut doc = IniDocument::parse(LARAGON_INI);
        doc.set("php", "version", "php-8.3.12-Win32-vs16-x64");
        let expected = LARAGON_INI.replace(
            "Version = php-7.4.33-Win32-vc15-x64",
            "Version=php-8.3.12-Win32-vs16-x64",
        );
        assert_eq!(doc.render("\n"), expected);
    }

    #[test]
    fn test_set_appends_to_section_and_new_section() {
        let mut doc = IniDocument::parse(LARAGON_INI);
        doc.set("apache", "Version", "httpd-2.4.62-win64-VS17");
        doc.set("mysql", "Version", "mysql-8.0");
        assert_eq!(
            doc.render("\n"),
            format!("{LARAGON_INI}Version=httpd-2.4.62-win64-VS17\n\n[mysql]\nVersion=mysql-8.0\n")
        );
    }

    #[test]
    fn test_ini_file_round_trip_and_missing_file() {
        let dir = tempdir().unwrap();
        let mut file = IniFile::new(dir.path().join("usr").join("laragon.ini"));
        assert_eq!(file.get("php", "Version").unwrap(), None);

        file.set("php", "Version", "php-8.3.12-Win32-vs16-x64").unwrap();
        assert_eq!(
            file.get("php", "Version").unwrap().as_deref(),
            Some("php-8.3.12-Win32-vs16-x64")
        );
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "[php]\nVersion=php-8.3.12-Win32-vs16-x64\n");
    }

    #[test]
    fn test_crlf_file_stays_crlf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("laragon.ini");
        std::fs::write(&path, "[php]\r\nVersion=old\r\n").unwrap();
        let mut file = IniFile::new(&path);
        file.set("php", "Version", "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[php]\r\nVersion=new\r\n");
    }

    #[test]
    fn test_set_if_changed_skips_identical_value() {
        let mut store = fake::MemoryConfig::default();
        assert!(set_if_changed(&mut store, "php", "Version", "a").unwrap());
        assert!(!set_if_changed(&mut store, "php", "Version", "a").unwrap());
        assert!(set_if_changed(&mut store, "php", "Version", "b").unwrap());
        assert_eq!(store.writes, 2);
    }
}
