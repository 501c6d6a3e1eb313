//! Quarantine of catalog files that fail to decode.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::CodecError;

pub const QUARANTINE_SUFFIX: &str = ".corrupted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Food,
    MenuItem,
    Meal,
}

impl CatalogKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CatalogKind::Food => "food",
            CatalogKind::MenuItem => "menu item",
            CatalogKind::Meal => "meal",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A catalog that was reset to empty during load.
#[derive(Debug, Clone)]
pub struct RecoveryNotice {
    pub catalog: CatalogKind,
    pub path: PathBuf,
    /// Where the file was moved. `None` if the rename failed, in which case
    /// the file is overwritten by the next save.
    pub quarantined_to: Option<PathBuf>,
    pub reason: CodecError,
}

impl fmt::Display for RecoveryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file {} is corrupted ({}); ",
            self.catalog,
            self.path.display(),
            self.reason
        )?;
        match &self.quarantined_to {
            Some(moved) => write!(
                f,
                "moved to {} and starting with an empty catalog",
                moved.display()
            ),
            None => f.write_str("it could not be moved and will be replaced on the next save"),
        }
    }
}

/// Move a corrupted file out of the way and describe what happened.
pub fn recover(catalog: CatalogKind, path: &Path, reason: CodecError) -> RecoveryNotice {
    let quarantined_to = match quarantine(path) {
        Ok(moved) => {
            warn!(
                %catalog,
                path = %path.display(),
                moved_to = %moved.display(),
                error = %reason,
                "quarantined corrupted catalog file"
            );
            Some(moved)
        }
        Err(e) => {
            warn!(
                %catalog,
                path = %path.display(),
                error = %reason,
                rename_error = %e,
                "could not quarantine corrupted catalog file"
            );
            None
        }
    };
    RecoveryNotice {
        catalog,
        path: path.to_path_buf(),
        quarantined_to,
        reason,
    }
}

/// Rename `path` to `<path>.corrupted`, or `<path>.corrupted.N` with the
/// lowest free `N` when earlier quarantined copies exist.
pub fn quarantine(path: &Path) -> io::Result<PathBuf> {
    let target = free_quarantine_path(path);
    std::fs::rename(path, &target)?;
    Ok(target)
}

fn free_quarantine_path(path: &Path) -> PathBuf {
    let mut base = path.as_os_str().to_owned();
    base.push(QUARANTINE_SUFFIX);
    let first = PathBuf::from(&base);
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| {
            let mut numbered = base.clone();
            numbered.push(format!(".{n}"));
            PathBuf::from(numbered)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
