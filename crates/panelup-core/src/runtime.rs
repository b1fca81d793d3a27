use anyhow::{anyhow, Result};
use semver::Version;

pub const MIN_RUNTIME_VERSION: Version = Version::new(8, 1, 0);

/// Outcome of comparing the PHP runtime against [`MIN_RUNTIME_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCheck {
    Supported(Version),
    Unsupported(Version),
    Unknown(String),
}

impl RuntimeCheck {
    pub fn from_reported(reported: &str) -> Self {
        match parse_runtime_version(reported) {
            Ok(version) if version >= MIN_RUNTIME_VERSION => Self::Supported(version),
            Ok(version) => Self::Unsupported(version),
            Err(err) => Self::Unknown(err.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn message(&self) -> String {
        match self {
            Self::Supported(version) => {
                format!("php runtime {version} satisfies >= {MIN_RUNTIME_VERSION}")
            }
            Self::Unsupported(version) => {
                let (major, minor) = (MIN_RUNTIME_VERSION.major, MIN_RUNTIME_VERSION.minor);
                format!(
                    "Cannot execute self-upgrade process. The minimum required PHP version \
                     required is {major}.{minor}, you have [{version}]."
                )
            }
            Self::Unknown(reason) => format!(
                "Cannot execute self-upgrade process. Unable to determine the PHP version \
                 ({reason})."
            ),
        }
    }
}

/// Reads the numeric `major.minor.patch` prefix of a PHP version string,
/// ignoring distro suffixes such as `-1ubuntu1` or `RC1`.
pub fn parse_runtime_version(reported: &str) -> Result<Version> {
    let trimmed = reported.trim();
    let numeric: String = trimmed
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    let parts = numeric
        .split('.')
        .filter(|part| !part.is_empty())
        .take(3)
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| anyhow!("invalid version component '{part}' in '{trimmed}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    match parts.as_slice() {
        [] => Err(anyhow!("no version number in '{trimmed}'")),
        [major] => Ok(Version::new(*major, 0, 0)),
        [major, minor] => Ok(Version::new(*major, *minor, 0)),
        [major, minor, patch, ..] => Ok(Version::new(*major, *minor, *patch)),
    }
}
