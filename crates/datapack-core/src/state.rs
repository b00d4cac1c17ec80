//! Persisted record of the most recently converted export paths, so a
//! processing run can find the converted files without re-entering them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastUsedPaths {
    pub datalog_last_used_path: PathBuf,
    pub mfc_last_used_path: PathBuf,
}

impl LastUsedPaths {
    pub fn new(datalog: PathBuf, mfc: PathBuf) -> Self {
        Self {
            datalog_last_used_path: datalog,
            mfc_last_used_path: mfc,
        }
    }

    /// Loads the state record, returning `None` when no state file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
