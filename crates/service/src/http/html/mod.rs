//! Server-rendered pages: archive browsing and directory listings.

use askama::Template;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Row in an archive listing
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveItem {
    /// Full name inside the archive
    pub name: String,
    pub filename: String,
    /// Directory inside the archive, empty at the top level
    pub directory: String,
    pub locator: String,
    /// Link that serves the entry, empty for directory entries
    pub href: String,
    pub is_dir: bool,
    pub size: u64,
    pub size_formatted: String,
}

#[derive(Template)]
#[template(path = "pages/archive.html")]
pub struct ArchiveTemplate {
    pub host: String,
    /// Archive base name
    pub filename: String,
    /// Request path of the archive
    pub zip_path: String,
    pub download_href: String,
    pub items: Vec<ArchiveItem>,
}

/// Row in a directory listing
#[derive(Debug, Clone)]
pub struct DirectoryItem {
    pub name: String,
    pub href: String,
    pub is_dir: bool,
    pub size_formatted: String,
}

#[derive(Template)]
#[template(path = "pages/directory.html")]
pub struct DirectoryTemplate {
    pub host: String,
    pub path: String,
    pub parent_href: Option<String>,
    pub items: Vec<DirectoryItem>,
}

/// Human readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Bytes escaped in links. Unreserved characters and `/` stay literal.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a path for use in an `href`, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SET).to_string()
}

/// Join a request path and a child name into a link
pub fn child_href(base: &str, name: &str, is_dir: bool) -> String {
    let base = base.trim_end_matches('/');
    let mut href = format!("{}/{}", encode_path(base), encode_path(name));
    if is_dir {
        href.push('/');
    }
    href
}
