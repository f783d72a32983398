//! Store credential file
//!
//! The credential file is JSON:
//! ```json
//! { "project_id": "track-pd", "database": "store.db" }
//! ```
//! It must exist and parse; anything else is fatal at process startup.

use crate::config::resolve_relative_to;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Credentials identifying the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCredentials {
    /// Project the store belongs to (logged, not interpreted)
    pub project_id: String,
    /// Store database location; relative paths resolve against the credential file
    pub database: PathBuf,
}

impl StoreCredentials {
    /// Load and validate a credential file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Credentials(format!(
                "Credential file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut credentials: StoreCredentials = serde_json::from_str(&content)
            .map_err(|e| Error::Credentials(format!("{}: {}", path.display(), e)))?;

        if credentials.project_id.trim().is_empty() {
            return Err(Error::Credentials(format!(
                "{}: project_id is empty",
                path.display()
            )));
        }
        if credentials.database.as_os_str().is_empty() {
            return Err(Error::Credentials(format!(
                "{}: database is empty",
                path.display()
            )));
        }

        credentials.database = resolve_relative_to(path, &credentials.database);
        Ok(credentials)
    }
}
