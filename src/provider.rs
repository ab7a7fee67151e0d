//! Data providers
//!
//! Once a call is authorized, the gate hands it to a [`DataProvider`] which
//! produces the tool's response payload. The payload is passed back to the
//! client verbatim.
//!
//! [`FileDataProvider`] serves canned JSON from
//! `<root>/<identity>/<tool>.json`.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{Result, ToolgateError};
use crate::gate::AuthorizedCall;

/// Produces the payload for an authorized tool call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the payload for `call`.
    ///
    /// # Errors
    ///
    /// Any error is treated as permanent for this call; the gate reports a
    /// generic read failure and logs the cause.
    async fn fetch(&self, call: &AuthorizedCall) -> Result<String>;
}

/// Reads canned responses from a directory tree.
///
/// # Examples
///
/// ```
/// use toolgate::provider::FileDataProvider;
///
/// let provider = FileDataProvider::new("test_data_dir");
/// assert_eq!(
///     provider.path_for("+1555", "fetch_net_worth").unwrap(),
///     std::path::Path::new("test_data_dir/+1555/fetch_net_worth.json")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FileDataProvider {
    root: PathBuf,
}

impl FileDataProvider {
    /// Creates a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes the file backing `(identity, tool)`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::InvalidPathComponent`] if either part could
    /// escape the root directory.
    pub fn path_for(&self, identity: &str, tool: &str) -> Result<PathBuf> {
        validate_component(identity)?;
        validate_component(tool)?;
        Ok(self.root.join(identity).join(format!("{}.json", tool)))
    }
}

fn validate_component(part: &str) -> Result<()> {
    if part.is_empty()
        || part == "."
        || part == ".."
        || part.contains('/')
        || part.contains('\\')
        || part.contains('\0')
    {
        return Err(ToolgateError::InvalidPathComponent(part.to_string()).into());
    }
    Ok(())
}

#[async_trait]
impl DataProvider for FileDataProvider {
    async fn fetch(&self, call: &AuthorizedCall) -> Result<String> {
        let path = self.path_for(call.identity.as_str(), &call.tool_name)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            ToolgateError::DataUnavailable {
                identity: call.identity.to_string(),
                tool: call.tool_name.clone(),
                message: format!("{}: {}", path.display(), e),
            }
            .into()
        })
    }
}
