//! Identity allowlist
//!
//! Decides whether an identity may use the system at all. The gate checks
//! it after resolution; the login web flow checks it before recording a
//! login.

use std::collections::BTreeSet;
use std::path::Path;

use crate::auth::Identity;
use crate::error::{Result, ToolgateError};

/// Membership test for permitted identities.
pub trait IdentityAllowlist: Send + Sync {
    /// Returns `true` when `identity` is permitted.
    fn contains(&self, identity: &Identity) -> bool;

    /// Lists permitted identities, for display on the login page.
    fn identities(&self) -> Vec<Identity> {
        Vec::new()
    }
}

/// A fixed set of permitted identities.
///
/// # Examples
///
/// ```
/// use toolgate::allowlist::{IdentityAllowlist, StaticAllowlist};
/// use toolgate::auth::Identity;
///
/// let allowlist = StaticAllowlist::new(["+1111", "+2222"]);
/// assert!(allowlist.contains(&Identity::from("+1111")));
/// assert!(!allowlist.contains(&Identity::from("+3333")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticAllowlist {
    identities: BTreeSet<Identity>,
}

impl StaticAllowlist {
    /// Builds an allowlist from any collection of identity strings.
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identities: identities
                .into_iter()
                .map(|s| Identity::new(s.into().trim().to_string()))
                .filter(|id| !id.as_str().is_empty())
                .collect(),
        }
    }

    /// Builds an allowlist from the subdirectory names of a data directory.
    ///
    /// Each subdirectory of `dir` holds canned responses for one identity,
    /// so its name is the identity. Hidden entries and plain files are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::Config`] if `dir` cannot be listed.
    pub fn from_data_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ToolgateError::Config(format!(
                "Failed to read data directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        tracing::info!(
            "Discovered {} allowed identities in {}",
            names.len(),
            dir.display()
        );
        Ok(Self::new(names))
    }

    /// Number of permitted identities.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether no identity is permitted.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl IdentityAllowlist for StaticAllowlist {
    fn contains(&self, identity: &Identity) -> bool {
        self.identities.contains(identity)
    }

    fn identities(&self) -> Vec<Identity> {
        self.identities.iter().cloned().collect()
    }
}
