use anyhow::{anyhow, Result};

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://github.com/paymenter/paymenter/releases/%s/paymenter.tar.gz";

pub const LATEST_RELEASE_PATH: &str = "latest/download";

/// Picks the archive to download: an explicit, non-blank override wins,
/// otherwise the latest release asset. The url is handed to curl as a
/// positional argument, so it must not look like an option.
pub fn resolve_archive_url(url_override: Option<&str>) -> Result<String> {
    match url_override.map(str::trim) {
        Some(url) if url.starts_with('-') => {
            Err(anyhow!("invalid archive url '{url}': must not start with '-'"))
        }
        Some(url) if !url.is_empty() => Ok(url.to_string()),
        _ => Ok(DEFAULT_URL_TEMPLATE.replacen("%s", LATEST_RELEASE_PATH, 1)),
    }
}
