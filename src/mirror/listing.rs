//! Parser for the HTML directory listings served by `rclone serve http`.
//!
//! Only anchors matter. The page layout around them (tables, spans, sizes)
//! varies between rclone versions and is ignored.

use crate::types::{EntryKind, FileEntry};
use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn anchor_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</a\s*>"#)
            .expect("anchor pattern is valid")
    })
}

#[allow(clippy::expect_used)]
fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid")
    })
}

/// Extract file and directory entries from a listing page
///
/// Rules:
/// - the parent link (`../`) and the names `.` and `..` are skipped
/// - an entry whose text or href ends with `/` is a directory; its name loses
///   the trailing slash and its path always gets one
/// - a file whose name (query string removed) has no extension is skipped
/// - the href is percent-decoded into `path`
pub fn parse_listing(html: &str) -> Vec<FileEntry> {
    let mut entries = Vec::new();

    for caps in anchor_regex().captures_iter(html) {
        let Some(href) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };
        if href.is_empty() || href == "../" {
            continue;
        }

        let text = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        let mut name = decode_entities(&tag_regex().replace_all(text, ""))
            .trim()
            .to_string();
        let mut href = decode_entities(href);

        let kind = if name.ends_with('/') || href.ends_with('/') {
            name = name.trim_end_matches('/').to_string();
            href = format!("{}/", href.trim_end_matches('/'));
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        if name.is_empty() || name == "." || name == ".." {
            continue;
        }

        if kind == EntryKind::File && !has_extension(&name) {
            continue;
        }

        let path = urlencoding::decode(&href)
            .map(|p| p.into_owned())
            .unwrap_or(href);

        entries.push(FileEntry { name, kind, path });
    }

    entries
}

/// Whether a file name carries an extension, ignoring any query string
/// and leading dots (`.hidden` has none)
fn has_extension(name: &str) -> bool {
    let without_query = name.split('?').next().unwrap_or_default();
    let base = without_query.rsplit('/').next().unwrap_or_default();
    base.trim_start_matches('.').contains('.')
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
