//! Page counter: read a chapter's first page and extract how many pages it has.

use crate::model::{ChapterId, ChapterPages, Title};
use crate::scan::probe::probe;
use crate::scan::{PoliteClient, ScanPatterns, SiteLayout};
use regex::Regex;

/// Largest page count accepted from a chapter page. Anything above is treated as a bad parse.
pub const MAX_PAGES_PER_CHAPTER: u32 = 10_000;

/// First page count found in `html`, if any.
pub fn parse_page_count(html: &str, pattern: &Regex) -> Option<u32> {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Pages `1..=N` of `chapter`. Empty pages when the first page is missing or carries no count.
pub fn count_pages(
    client: &mut PoliteClient,
    layout: &SiteLayout,
    patterns: &ScanPatterns,
    title: &Title,
    chapter: ChapterId,
) -> ChapterPages {
    let url = layout.first_page_url(title, chapter);
    if !probe(client, &url) {
        tracing::warn!("Chapter {} not found at {}", chapter, url);
        return ChapterPages::with_count(chapter, 0);
    }
    let html = match client.get(&url).and_then(|r| r.error_for_status()?.text()) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Could not read {}: {}", url, e);
            return ChapterPages::with_count(chapter, 0);
        }
    };
    match parse_page_count(&html, &patterns.page_count) {
        Some(count) => pages_for_count(chapter, count),
        None => {
            tracing::warn!("No page count on {}", url);
            ChapterPages::with_count(chapter, 0)
        }
    }
}

/// `1..=count`, or no pages when `count` exceeds [`MAX_PAGES_PER_CHAPTER`].
fn pages_for_count(chapter: ChapterId, count: u32) -> ChapterPages {
    if count > MAX_PAGES_PER_CHAPTER {
        tracing::warn!(
            "Ignoring page count {} for chapter {} (limit {})",
            count,
            chapter,
            MAX_PAGES_PER_CHAPTER
        );
        return ChapterPages::with_count(chapter, 0);
    }
    tracing::info!("{} pages found for chapter {}", count, chapter);
    ChapterPages::with_count(chapter, count)
}
