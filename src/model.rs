//! Data model for a scan run: what to download, where it lands, and what happened.
//!
//! Everything here is built fresh per run and dropped afterwards. The filesystem is the only
//! state that survives between runs.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the per-chapter directory prefix: `chapter_<id>`.
const CHAPTER_DIR_PREFIX: &str = "chapter";

/// Slug naming a serialized work. Used verbatim as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    /// Returns None for an empty or whitespace-only slug.
    pub fn new(slug: impl Into<String>) -> Option<Self> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            None
        } else {
            Some(Self(slug))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chapter number within a title. Gaps between chapters are legal.
pub type ChapterId = u32;

/// 1-based page number, dense within a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageNumber(pub u32);

impl PageNumber {
    /// Page segment as the site writes it: single digits are zero-padded to two.
    pub fn padded(self) -> String {
        format!("{:02}", self.0)
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image extensions guessed for a page, in probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Gif,
    Png,
}

impl ImageExtension {
    /// Fixed probing order: jpg, jpeg, gif, png.
    pub const CANDIDATES: [ImageExtension; 4] = [
        ImageExtension::Jpg,
        ImageExtension::Jpeg,
        ImageExtension::Gif,
        ImageExtension::Png,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Gif => "gif",
            ImageExtension::Png => "png",
        }
    }
}

/// One page to download. The extension is resolved later by probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTarget {
    pub chapter: ChapterId,
    pub page: PageNumber,
}

/// Chapter number paired with its page sequence `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPages {
    pub chapter: ChapterId,
    pub pages: Vec<PageNumber>,
}

impl ChapterPages {
    /// Pages `1..=count`, fully materialized.
    pub fn with_count(chapter: ChapterId, count: u32) -> Self {
        Self {
            chapter,
            pages: (1..=count).map(PageNumber).collect(),
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = DownloadTarget> + '_ {
        self.pages.iter().map(move |&page| DownloadTarget {
            chapter: self.chapter,
            page,
        })
    }
}

/// Input of a scan run.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub title: Title,
    /// Explicit chapters in caller order. Empty means "discover from the index page".
    pub chapters: Vec<ChapterId>,
    /// Destination root; files land in `root/<title>/chapter_<id>/`.
    pub root: PathBuf,
    /// Re-download files that already exist at the destination.
    pub ignore_existing: bool,
}

impl ScanJob {
    /// `root/<title>/chapter_<id>`.
    pub fn chapter_dir(&self, chapter: ChapterId) -> PathBuf {
        chapter_dir(&self.root, &self.title, chapter)
    }
}

pub fn chapter_dir(root: &Path, title: &Title, chapter: ChapterId) -> PathBuf {
    root.join(title.as_str()).join(format!("{}_{}", CHAPTER_DIR_PREFIX, chapter))
}

/// Per-chapter outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub chapter: ChapterId,
    pub directory: PathBuf,
    pub pages_expected: usize,
    /// Pages fetched over the network in this run.
    pub downloaded: Vec<PathBuf>,
    /// Pages skipped because the file was already on disk.
    pub already_present: Vec<PathBuf>,
    /// Pages for which no candidate extension resolved.
    pub missing: Vec<PageNumber>,
}

impl ChapterReport {
    pub fn new(chapter: ChapterId, directory: PathBuf, pages_expected: usize) -> Self {
        Self {
            chapter,
            directory,
            pages_expected,
            downloaded: Vec::new(),
            already_present: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Pages that ended up on disk, fresh or not.
    pub fn succeeded(&self) -> usize {
        self.downloaded.len() + self.already_present.len()
    }
}

/// Outcome of a whole run. Built by the orchestrator, optionally written as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub title: Title,
    pub chapters: Vec<ChapterReport>,
}

impl ScanReport {
    pub fn pages_succeeded(&self) -> usize {
        self.chapters.iter().map(ChapterReport::succeeded).sum()
    }

    pub fn pages_downloaded(&self) -> usize {
        self.chapters.iter().map(|c| c.downloaded.len()).sum()
    }

    pub fn pages_already_present(&self) -> usize {
        self.chapters.iter().map(|c| c.already_present.len()).sum()
    }

    pub fn pages_missing(&self) -> usize {
        self.chapters.iter().map(|c| c.missing.len()).sum()
    }

    /// True when every expected page is on disk.
    pub fn is_complete(&self) -> bool {
        self.pages_missing() == 0
    }
}
