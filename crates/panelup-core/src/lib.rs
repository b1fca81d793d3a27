mod archive;
mod config;
mod options;
mod ownership;
mod release;
mod runtime;

pub use archive::ArchiveType;
pub use config::{UpgradeConfig, CONFIG_FILE_NAME};
pub use options::{FailurePolicy, UpgradeOptions};
pub use ownership::{Ownership, DEFAULT_GROUP, DEFAULT_USER, SUGGESTED_ACCOUNTS};
pub use release::{resolve_archive_url, DEFAULT_URL_TEMPLATE, LATEST_RELEASE_PATH};
pub use runtime::{parse_runtime_version, RuntimeCheck, MIN_RUNTIME_VERSION};

#[cfg(test)]
mod tests;
