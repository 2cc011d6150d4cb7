use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{CrossPostError, Result};
use crate::models::types::ContentId;

/// Line-delimited record of content identifiers that have already been cross-posted.
///
/// A missing file reads as empty and is created on first append. There is no
/// locking: one writer at a time is assumed.
#[derive(Debug, Clone)]
pub struct PostLedger {
    path: PathBuf,
}

impl PostLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    fn read_ids(&self) -> io::Result<HashSet<String>> {
        Ok(parse_ids(&self.read_raw()?))
    }

    /// Whether `id` has been recorded. Read failures are logged and count as "not posted".
    pub fn exists(&self, id: &ContentId) -> bool {
        match self.read_ids() {
            Ok(ids) => {
                let posted = ids.contains(id.as_str());
                info!(content_id = %id, posted, "ledger: lookup");
                posted
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "ledger: read failed, treating as not posted");
                false
            }
        }
    }

    /// Appends `id` unless it is already present. Any I/O failure is returned.
    pub fn record(&self, id: &ContentId) -> Result<()> {
        let data = self.read_raw().map_err(CrossPostError::LedgerIo)?;
        if parse_ids(&data).contains(id.as_str()) {
            info!(content_id = %id, "ledger: already recorded");
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CrossPostError::LedgerIo)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(CrossPostError::LedgerIo)?;
        // a hand-edited file may lack the final newline
        let sep = if data.is_empty() || data.ends_with('\n') { "" } else { "\n" };
        writeln!(f, "{}{}", sep, id).map_err(CrossPostError::LedgerIo)?;
        info!(content_id = %id, path = %self.path.display(), "ledger: recorded");
        Ok(())
    }
}

fn parse_ids(data: &str) -> HashSet<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
