use std::cmp::Ordering;
use std::path::Path;
use anyhow::Result;
use reqwest::blocking::Client;
use semver::Version;

/// The release server rejects requests without a browser-like user agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Builds the blocking HTTP client shared by every request pvm makes.
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Returns the last `/`-separated segment of a URL or relative archive path.
pub fn file_name_from_url(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
}

/// Strips a trailing `.zip` from an archive file name.
pub fn archive_stem(file_name: &str) -> &str {
    file_name.strip_suffix(".zip").unwrap_or(file_name)
}

/// Parses `7.4`, `8` or `8.3.12` into a semver `Version`, filling missing parts with 0.
/// Anything after a `-` is ignored.
pub fn parse_lenient_version(version: &str) -> Option<Version> {
    let core = version.split('-').next()?;
    let mut parts = core.split('.');
    let major: u64 = parts.next()?.parse().ok()?;
    let minor = parts.next().map(str::parse::<u64>).transpose().ok()?.unwrap_or(0);
    let patch = parts.next().map(str::parse::<u64>).transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

/// Orders version strings newest first for display.
/// Versions that don't parse go last, in lexicographic order.
pub fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    match (parse_lenient_version(a), parse_lenient_version(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Returns the final component of a path as an owned string.
pub fn folder_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://windows.php.net/downloads/releases/php-8.3.12-Win32-vs16-x64.zip"),
            "php-8.3.12-Win32-vs16-x64.zip"
        );
        assert_eq!(file_name_from_url("php-8.3.12-Win32-vs16-x64.zip"), "php-8.3.12-Win32-vs16-x64.zip");
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(archive_stem("php-7.4.33-Win32-vc15-x64.zip"), "php-7.4.33-Win32-vc15-x64");
        assert_eq!(archive_stem("no-extension"), "no-extension");
    }

    #[test]
    fn test_parse_lenient_version() {
        assert_eq!(parse_lenient_version("7.4"), Some(Version::new(7, 4, 0)));
        assert_eq!(parse_lenient_version("8.3.12"), Some(Version::new(8, 3, 12)));
        assert_eq!(parse_lenient_version("8"), Some(Version::new(8, 0, 0)));
        assert_eq!(parse_lenient_version("8.1.0RC1"), None);
        assert_eq!(parse_lenient_version("1.2.3.4"), None);
        assert_eq!(parse_lenient_version("latest"), None);
    }

    #[test]
    fn test_compare_versions_desc_is_semantic() {
        let mut versions = vec![
            "7.9.1".to_string(),
            "weird".to_string(),
            "7.10.0".to_string(),
            "8.0.30".to_string(),
        ];
        versions.sort_by(|a, b| compare_versions_desc(a, b));
        assert_eq!(versions, vec!["8.0.30", "7.10.0", "7.9.1", "weird"]);
    }

    #[test]
    fn test_folder_name() {
        let path = Path::new("/opt/laragon/bin/php/php-8.3.12-Win32-vs16-x64");
        assert_eq!(folder_name(path).as_deref(), Some("php-8.3.12-Win32-vs16-x64"));
    }
}
