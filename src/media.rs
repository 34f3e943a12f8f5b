//! Media-store collaborator
//!
//! The inspector never touches the filesystem itself. For every multimedia
//! record it hands the primary [`FileReference`] to a [`MediaStore`], which
//! answers with a [`MediaCheck`]: the storage status plus a resolved file
//! name for messages.
//!
//! [`FsMediaStore`] resolves references the way a tree on disk lays them out:
//!
//! ```text
//! <base>/                     tree directory
//! <base>/<tree>/...           stg: references (media storage directory)
//! <base>/<tree>.zip           arc: references (media archive)
//! anything else               plain path, relative to <base>
//! ```

use crate::record::FileReference;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Prefix of references into the media storage directory
pub const STORAGE_PREFIX: &str = "stg:";
/// Prefix of references into the media archive
pub const ARCHIVE_PREFIX: &str = "arc:";

/// Result of looking up a file reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// The file is present
    Exists,
    /// The file itself is missing
    FileNotFound,
    /// The storage directory the file lives in is missing
    StorageNotFound,
    /// The archive the file lives in is missing
    ArchiveNotFound,
    /// The reference or its target cannot be read
    BadData,
}

/// Status plus the resolved name used in problem details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCheck {
    /// Lookup outcome
    pub status: MediaStatus,
    /// File name or path the reference resolved to
    pub file_name: String,
}

impl MediaCheck {
    fn new(status: MediaStatus, file_name: impl Into<String>) -> Self {
        Self {
            status,
            file_name: file_name.into(),
        }
    }
}

/// Answers whether a referenced media file is available
pub trait MediaStore: Send + Sync {
    /// Look up one file reference
    fn verify(&self, reference: &FileReference) -> MediaCheck;
}

/// Media store that reports every file as present
///
/// Used when the host has no media location to offer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumePresent;

impl MediaStore for AssumePresent {
    fn verify(&self, reference: &FileReference) -> MediaCheck {
        MediaCheck::new(MediaStatus::Exists, reference.path.clone())
    }
}

/// Media store backed by the local filesystem
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    base_dir: PathBuf,
    tree_name: String,
}

impl FsMediaStore {
    /// Create a store rooted at `base_dir` for the tree called `tree_name`
    pub fn new(base_dir: impl Into<PathBuf>, tree_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            tree_name: tree_name.into(),
        }
    }

    /// Directory holding `stg:` files
    pub fn storage_dir(&self) -> PathBuf {
        self.base_dir.join(&self.tree_name)
    }

    /// Archive holding `arc:` files
    pub fn archive_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.zip", self.tree_name))
    }

    fn verify_storage(&self, relative: &str) -> MediaCheck {
        let dir = self.storage_dir();
        let target = dir.join(relative);
        let name = target.display().to_string();
        match probe(&dir) {
            Probe::Present => {}
            Probe::Missing => return MediaCheck::new(MediaStatus::StorageNotFound, name),
            Probe::Unreadable => return MediaCheck::new(MediaStatus::BadData, name),
        }
        MediaCheck::new(probe(&target).status(MediaStatus::FileNotFound), name)
    }

    fn verify_archive(&self, entry: &str) -> MediaCheck {
        let archive = self.archive_path();
        let name = format!("{}:{}", archive.display(), entry);
        match std::fs::metadata(&archive) {
            // archive entries are not inspected; an empty archive cannot hold any
            Ok(meta) if meta.len() == 0 => MediaCheck::new(MediaStatus::BadData, name),
            Ok(_) => MediaCheck::new(MediaStatus::Exists, name),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                MediaCheck::new(MediaStatus::ArchiveNotFound, name)
            }
            Err(_) => MediaCheck::new(MediaStatus::BadData, name),
        }
    }

    fn verify_path(&self, path: &str) -> MediaCheck {
        let path = Path::new(path);
        let target = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let name = target.display().to_string();
        MediaCheck::new(probe(&target).status(MediaStatus::FileNotFound), name)
    }
}

impl MediaStore for FsMediaStore {
    fn verify(&self, reference: &FileReference) -> MediaCheck {
        let path = reference.path.trim();
        let check = if path.is_empty() {
            MediaCheck::new(MediaStatus::BadData, "")
        } else if let Some(rest) = path.strip_prefix(STORAGE_PREFIX) {
            self.verify_storage(rest)
        } else if let Some(rest) = path.strip_prefix(ARCHIVE_PREFIX) {
            self.verify_archive(rest)
        } else {
            self.verify_path(path)
        };
        trace!("Media {} -> {:?}", reference.path, check.status);
        check
    }
}

enum Probe {
    Present,
    Missing,
    Unreadable,
}

impl Probe {
    fn status(self, missing: MediaStatus) -> MediaStatus {
        match self {
            Probe::Present => MediaStatus::Exists,
            Probe::Missing => missing,
            Probe::Unreadable => MediaStatus::BadData,
        }
    }
}

fn probe(path: &Path) -> Probe {
    match std::fs::metadata(path) {
        Ok(_) => Probe::Present,
        Err(e) if e.kind() == ErrorKind::NotFound => Probe::Missing,
        Err(_) => Probe::Unreadable,
    }
}
