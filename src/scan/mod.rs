//! Chapter/page discovery and retrieval against the scan host.
//!
//! [SiteLayout] knows the three URL shapes the site uses, [ScanPatterns] holds the regexes that
//! scrape chapter numbers and page counts, and [Scanner] drives a run through probe, fetch,
//! chapter listing and page counting.

mod client;
mod error;

pub mod chapters;
pub mod fetch;
pub mod pages;
pub mod probe;
pub mod runner;

pub use client::{PoliteClient, PoliteClientBuilder};
pub use error::ScanError;
pub use fetch::{FetchStatus, Fetched};
pub use runner::{Progress, Scanner};

use crate::model::{ChapterId, PageNumber, Title};
use regex::Regex;
use reqwest::Url;

pub const DEFAULT_DOMAIN: &str = "http://www.lecture-en-ligne.com";

/// Table cell whose label contains "chapitre <n>".
pub const DEFAULT_CHAPTER_PATTERN: &str = r#"<td class="td">[A-Za-z0-9\- :]+chapitre ([0-9]+)"#;
/// Span carrying the number of images in a chapter.
pub const DEFAULT_PAGE_COUNT_PATTERN: &str = r#"<span class="chapter-max_images">([0-9]+)</span"#;

/// URL shapes of the scan host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    domain: String,
}

impl SiteLayout {
    /// `domain` must be an absolute http(s) URL; a trailing slash is dropped.
    pub fn new(domain: &str) -> Result<Self, ScanError> {
        let url = Url::parse(domain).map_err(|e| ScanError::InvalidUrl {
            input: domain.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl {
                input: domain.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(Self {
            domain: domain.trim_end_matches('/').to_string(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `{domain}/manga/{title}/`
    pub fn chapter_index_url(&self, title: &Title) -> String {
        format!("{}/manga/{}/", self.domain, title)
    }

    /// `{domain}/{title}/{chapter}/0/0/1.html`
    pub fn first_page_url(&self, title: &Title, chapter: ChapterId) -> String {
        format!("{}/{}/{}/0/0/1.html", self.domain, title, chapter)
    }

    /// `{domain}/images/manga/{title}/{chapter}/{padded_page}`, without extension.
    pub fn image_base_url(&self, title: &Title, chapter: ChapterId, page: PageNumber) -> String {
        format!(
            "{}/images/manga/{}/{}/{}",
            self.domain,
            title,
            chapter,
            page.padded()
        )
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

/// Scraping patterns. Each must have one capture group holding a decimal integer.
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    pub chapter: Regex,
    pub page_count: Regex,
}

impl ScanPatterns {
    pub fn new(chapter: &str, page_count: &str) -> Result<Self, ScanError> {
        Ok(Self {
            chapter: compile_pattern("chapter", chapter)?,
            page_count: compile_pattern("page count", page_count)?,
        })
    }

    pub fn default_patterns() -> Result<Self, ScanError> {
        Self::new(DEFAULT_CHAPTER_PATTERN, DEFAULT_PAGE_COUNT_PATTERN)
    }
}

fn compile_pattern(name: &'static str, pattern: &str) -> Result<Regex, ScanError> {
    let re = Regex::new(pattern).map_err(|e| ScanError::InvalidPattern {
        name,
        reason: e.to_string(),
    })?;
    // captures_len counts the implicit whole-match group
    if re.captures_len() < 2 {
        return Err(ScanError::InvalidPattern {
            name,
            reason: "needs a capture group for the number".to_string(),
        });
    }
    Ok(re)
}
