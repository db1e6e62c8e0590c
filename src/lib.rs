//! scandl: downloads manga scan chapters page by page from a single scan host.

pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod scan;

// Re-exports for CLI and consumers.
pub use model::{ChapterId, ChapterPages, ImageExtension, PageNumber, ScanJob, ScanReport, Title};
pub use scan::{
    FetchStatus, Fetched, PoliteClient, PoliteClientBuilder, ScanError, ScanPatterns, Scanner,
    SiteLayout,
};
