//! Scan orchestrator: resolve chapters and page counts, then fetch every page.

use crate::model::{
    ChapterId, ChapterPages, ChapterReport, DownloadTarget, ImageExtension, ScanJob, ScanReport,
    Title,
};
use crate::scan::chapters::list_chapters;
use crate::scan::error::ScanError;
use crate::scan::fetch::{fetch, FetchStatus, Fetched};
use crate::scan::pages::count_pages;
use crate::scan::{PoliteClient, ScanPatterns, SiteLayout};
use std::path::Path;

/// Progress callback: (pages handled so far, total pages planned).
pub type Progress<'p> = &'p dyn Fn(usize, usize);

/// Runs scan jobs against one site. Holds a reference to the shared polite client.
pub struct Scanner<'a> {
    client: &'a mut PoliteClient,
    layout: &'a SiteLayout,
    patterns: &'a ScanPatterns,
}

impl<'a> Scanner<'a> {
    pub fn new(
        client: &'a mut PoliteClient,
        layout: &'a SiteLayout,
        patterns: &'a ScanPatterns,
    ) -> Self {
        Self {
            client,
            layout,
            patterns,
        }
    }

    /// Explicit chapters verbatim (order kept, not checked), otherwise discovered from the index.
    pub fn resolve_chapters(&mut self, job: &ScanJob) -> Vec<ChapterId> {
        if !job.chapters.is_empty() {
            return job.chapters.clone();
        }
        list_chapters(self.client, self.layout, self.patterns, &job.title)
    }

    /// Chapters with their page sequences, in resolved order.
    pub fn plan(&mut self, job: &ScanJob) -> Vec<ChapterPages> {
        self.resolve_chapters(job)
            .into_iter()
            .map(|chapter| {
                count_pages(self.client, self.layout, self.patterns, &job.title, chapter)
            })
            .collect()
    }

    /// Try each candidate extension in order; stop at the first that resolves.
    pub fn fetch_page(
        &mut self,
        title: &Title,
        target: DownloadTarget,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<Option<Fetched>, ScanError> {
        let base = self.layout.image_base_url(title, target.chapter, target.page);
        for ext in ImageExtension::CANDIDATES {
            let url = format!("{}.{}", base, ext.as_str());
            if let Some(fetched) = fetch(self.client, &url, dest_dir, overwrite)? {
                return Ok(Some(fetched));
            }
        }
        Ok(None)
    }

    /// Plan and download the whole job.
    pub fn run(
        &mut self,
        job: &ScanJob,
        progress: Option<Progress<'_>>,
    ) -> Result<ScanReport, ScanError> {
        let plan = self.plan(job);
        self.download(job, &plan, progress)
    }

    /// Download every page of an already computed plan. Missing pages are recorded and skipped;
    /// only filesystem failures abort.
    pub fn download(
        &mut self,
        job: &ScanJob,
        plan: &[ChapterPages],
        progress: Option<Progress<'_>>,
    ) -> Result<ScanReport, ScanError> {
        let total: usize = plan.iter().map(|c| c.pages.len()).sum();
        let mut done = 0usize;
        let mut reports = Vec::with_capacity(plan.len());

        for chapter in plan {
            tracing::info!(">> Downloading chapter {}", chapter.chapter);
            let dir = job.chapter_dir(chapter.chapter);
            std::fs::create_dir_all(&dir).map_err(|e| ScanError::CreateDir {
                path: dir.clone(),
                source: e,
            })?;

            let mut report = ChapterReport::new(chapter.chapter, dir.clone(), chapter.pages.len());
            for target in chapter.targets() {
                match self.fetch_page(&job.title, target, &dir, job.ignore_existing)? {
                    Some(fetched) => {
                        tracing::info!(">> Page {} downloaded", target.page.padded());
                        match fetched.status {
                            FetchStatus::Downloaded => report.downloaded.push(fetched.path),
                            FetchStatus::AlreadyPresent => {
                                report.already_present.push(fetched.path)
                            }
                        }
                    }
                    None => {
                        tracing::warn!(
                            "Page {} of chapter {} not found",
                            target.page.padded(),
                            target.chapter
                        );
                        report.missing.push(target.page);
                    }
                }
                done += 1;
                if let Some(cb) = progress {
                    cb(done, total);
                }
            }
            reports.push(report);
        }

        let report = ScanReport {
            title: job.title.clone(),
            chapters: reports,
        };
        tracing::info!(
            "{} pages downloaded, {} already present, {} missing",
            report.pages_downloaded(),
            report.pages_already_present(),
            report.pages_missing()
        );
        Ok(report)
    }
}
