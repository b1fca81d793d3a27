use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

pub const PASSWD_PATH: &str = "/etc/passwd";
pub const GROUP_PATH: &str = "/etc/group";

/// uid/gid to name tables read from the local account databases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDatabase {
    users: BTreeMap<u32, String>,
    groups: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedOwner {
    pub uid: u32,
    pub gid: u32,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl AccountDatabase {
    pub fn load() -> Result<Self> {
        Self::from_files(Path::new(PASSWD_PATH), Path::new(GROUP_PATH))
    }

    pub fn from_files(passwd: &Path, group: &Path) -> Result<Self> {
        let passwd = read_optional(passwd)?;
        let group = read_optional(group)?;
        Ok(Self::parse(&passwd, &group))
    }

    pub fn parse(passwd: &str, group: &str) -> Self {
        Self {
            users: parse_id_table(passwd),
            groups: parse_id_table(group),
        }
    }

    pub fn user_name(&self, uid: u32) -> Option<&str> {
        self.users.get(&uid).map(String::as_str)
    }

    pub fn group_name(&self, gid: u32) -> Option<&str> {
        self.groups.get(&gid).map(String::as_str)
    }
}

fn read_optional(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "account database not present");
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

// Both files share the `name:password:id:...` prefix. First entry per id wins.
fn parse_id_table(content: &str) -> BTreeMap<u32, String> {
    let mut table = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(':');
        let (Some(name), Some(_), Some(id)) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        let Ok(id) = id.parse::<u32>() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        table.entry(id).or_insert_with(|| name.to_string());
    }
    table
}

#[cfg(unix)]
pub fn detect_owner(path: &Path, accounts: &AccountDatabase) -> Result<DetectedOwner> {
    use std::os::unix::fs::MetadataExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to read owner of {}", path.display()))?;
    let (uid, gid) = (metadata.uid(), metadata.gid());
    Ok(DetectedOwner {
        uid,
        gid,
        user: accounts.user_name(uid).map(str::to_string),
        group: accounts.group_name(gid).map(str::to_string),
    })
}

#[cfg(not(unix))]
pub fn detect_owner(path: &Path, _accounts: &AccountDatabase) -> Result<DetectedOwner> {
    Err(anyhow::anyhow!(
        "file ownership detection is supported only on unix hosts: {}",
        path.display()
    ))
}
