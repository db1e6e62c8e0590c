//! Optional config file loading. Search order: ./scandl.toml, then
//! $XDG_CONFIG_HOME/scandl/config.toml (or ~/.config/scandl/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Directory created under the home directory when no destination is configured.
pub const DEFAULT_SCAN_DIRNAME: &str = "scan_dl";

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Destination root when -d is not set.
    pub dir_path: Option<PathBuf>,
    /// Scan host, e.g. "http://www.lecture-en-ligne.com".
    pub domain: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in milliseconds between requests.
    pub request_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Number of HTTP attempts for transient failures (default 3).
    pub retry_count: Option<u32>,
    /// Delay in seconds before each retry (e.g. [1, 2]).
    pub retry_backoff_secs: Option<Vec<u64>>,
    /// Regex with one capture group extracting chapter numbers from the index page.
    pub chapter_pattern: Option<String>,
    /// Regex with one capture group extracting the page count from a chapter's first page.
    pub page_count_pattern: Option<String>,
}

/// Search order: (1) ./scandl.toml, (2) $XDG_CONFIG_HOME/scandl/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("scandl.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("scandl").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}

/// `~/scan_dl`, or `./scan_dl` when the home directory is unknown.
pub fn default_scan_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SCAN_DIRNAME)
}
