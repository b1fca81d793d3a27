use std::fmt;

use anyhow::{anyhow, Result};

pub const DEFAULT_USER: &str = "www-data";
pub const DEFAULT_GROUP: &str = "www-data";

/// Accounts web servers commonly run under, offered when detection is rejected.
pub const SUGGESTED_ACCOUNTS: [&str; 3] = ["www-data", "nginx", "apache"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub user: String,
    pub group: String,
}

impl Ownership {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Result<Self> {
        let user = user.into().trim().to_string();
        let group = group.into().trim().to_string();
        validate_account_name("user", &user)?;
        validate_account_name("group", &group)?;
        Ok(Self { user, group })
    }

    /// Fills whatever was not supplied with the `www-data` defaults.
    pub fn with_defaults(user: Option<&str>, group: Option<&str>) -> Result<Self> {
        Self::new(user.unwrap_or(DEFAULT_USER), group.unwrap_or(DEFAULT_GROUP))
    }

    pub fn chown_spec(&self) -> String {
        format!("{}:{}", self.user, self.group)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}

fn validate_account_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("{kind} name must not be empty"));
    }
    if name.contains(':') || name.chars().any(char::is_whitespace) {
        return Err(anyhow!(
            "invalid {kind} name '{name}': must not contain ':' or whitespace"
        ));
    }
    if name.starts_with('-') {
        return Err(anyhow!("invalid {kind} name '{name}': must not start with '-'"));
    }
    Ok(())
}
