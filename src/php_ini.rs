//! Post-install rewriting of `php.ini`.
//!
//! Rules only match lines that are still commented out, so applying them to an
//! already prepared file changes nothing.

use std::path::Path;

/// Bundled development defaults shipped inside every PHP archive.
pub const DEVELOPMENT_INI: &str = "php.ini-development";
/// The settings file PHP actually reads.
pub const ACTIVE_INI: &str = "php.ini";

/// Extensions enabled on every fresh install.
pub const ENABLED_EXTENSIONS: [&str; 14] = [
    "curl", "fileinfo", "gd2", "intl", "mbstring", "exif", "mysqli", "openssl",
    "pdo_mysql", "soap", "xsl", "zip", "sockets", "sodium",
];

fn rewrite_line(line: &str, cacert: &str) -> Option<String> {
    if line.starts_with(";extension_dir = \"ext\"") {
        return Some("extension_dir = \"ext\"".to_string());
    }
    if let Some(name) = line.strip_prefix(";extension=") {
        if ENABLED_EXTENSIONS.contains(&name.trim()) {
            return Some(line[1..].to_string());
        }
        return None;
    }
    if line.starts_with(";curl.cainfo") {
        return Some(format!("curl.cainfo={cacert}"));
    }
    if line.starts_with(";openssl.cafile") {
        return Some(format!("openssl.cafile={cacert}"));
    }
    None
}

/// Applies the enablement rules to the contents of a `php.ini`.
///
/// Line endings of the input are kept (`\r\n` if present anywhere, `\n`
/// otherwise) and the output always ends with a newline.
pub fn rewrite_php_ini(contents: &str, cacert: &Path) -> String {
    let cacert = cacert.display().to_string();
    let newline = if contents.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = String::with_capacity(contents.len() + 256);
    for line in contents.lines() {
        match rewrite_line(line, &cacert) {
            Some(rewritten) => out.push_str(&rewritten),
            None => out.push_str(line),
        }
        out.push_str(newline);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const SAMPLE: &str = "[PHP]\n\
; On windows:\n\
;extension_dir = \"ext\"\n\
;extension=bz2\n\
;extension=curl\n\
;extension=mbstring\n\
;extension=sodium \n\
extension=gettext\n\
[curl]\n\
;curl.cainfo =\n\
[openssl]\n\
;openssl.cafile=\n\
;openssl.capath=\n";

    fn cacert() -> PathBuf {
        PathBuf::from("/opt/laragon/bin/php/php-8.3.12-Win32-vs16-x64/cacert.pem")
    }

    #[test]
    fn test_rules_applied() {
        let out = rewrite_php_ini(SAMPLE, &cacert());
        let expected = "[PHP]\n\
; On windows:\n\
extension_dir = \"ext\"\n\
;extension=bz2\n\
extension=curl\n\
extension=mbstring\n\
extension=sodium \n\
extension=gettext\n\
[curl]\n\
curl.cainfo=/opt/laragon/bin/php/php-8.3.12-Win32-vs16-x64/cacert.pem\n\
[openssl]\n\
openssl.cafile=/opt/laragon/bin/php/php-8.3.12-Win32-vs16-x64/cacert.pem\n\
;openssl.capath=\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_php_ini(SAMPLE, &cacert());
        let twice = rewrite_php_ini(&once, &cacert());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_crlf_is_preserved() {
        let input = ";extension=zip\r\n;extension=ldap\r\n";
        let out = rewrite_php_ini(input, &cacert());
        assert_eq!(out, "extension=zip\r\n;extension=ldap\r\n");
    }
}
