//! Chapter enumerator: scrape the title's index page for chapter numbers.

use crate::model::{ChapterId, Title};
use crate::scan::probe::probe;
use crate::scan::{PoliteClient, ScanPatterns, SiteLayout};
use regex::Regex;

/// Chapter numbers in document order. Duplicates are kept.
pub fn parse_chapter_list(html: &str, pattern: &Regex) -> Vec<ChapterId> {
    pattern
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<ChapterId>().ok())
        .collect()
}

/// Chapters listed on the index page of `title`. Empty when the index page is missing or
/// unreadable, or lists nothing.
pub fn list_chapters(
    client: &mut PoliteClient,
    layout: &SiteLayout,
    patterns: &ScanPatterns,
    title: &Title,
) -> Vec<ChapterId> {
    let url = layout.chapter_index_url(title);
    if !probe(client, &url) {
        tracing::warn!("No chapter index for {} at {}", title, url);
        return Vec::new();
    }
    let html = match client.get(&url).and_then(|r| r.error_for_status()?.text()) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Could not read chapter index {}: {}", url, e);
            return Vec::new();
        }
    };
    let chapters = parse_chapter_list(&html, &patterns.chapter);
    for chapter in &chapters {
        tracing::info!("Found chapter {}", chapter);
    }
    chapters
}
