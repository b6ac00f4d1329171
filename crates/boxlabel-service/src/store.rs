//! On-disk layout of a dataset.
//!
//! ```text
//! <raw_root>/<folder>/<source image>            sources, never written
//! <raw_root>/<folder>/fields.json               field set fallback
//! <labeled_root>/<folder>/preprocessed-images/  size-bounded, upright
//! <labeled_root>/<folder>/processed-images/     rotated + overlay
//! <labeled_root>/<folder>/labels.json           image name -> label
//! <labeled_root>/<folder>/fields.json           field set
//! ```
//!
//! Derived files are named after the source stem with a `.jpg` extension.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use boxlabel_core::decode::{derived_file_name, is_source_image};
use tracing::warn;

use crate::ServiceConfig;
use crate::ServiceError;

const LABELS_FILE: &str = "labels.json";
const FIELDS_FILE: &str = "fields.json";

/// The two derived image tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Preprocessed,
    Processed,
}

impl Tier {
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Preprocessed => "preprocessed-images",
            Tier::Processed => "processed-images",
        }
    }
}

/// Path arithmetic for the raw and labeled roots.
#[derive(Debug, Clone)]
pub struct DerivedStore {
    raw_root: PathBuf,
    labeled_root: PathBuf,
}

impl DerivedStore {
    pub fn new(raw_root: impl Into<PathBuf>, labeled_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            labeled_root: labeled_root.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.raw_root, &config.labeled_root)
    }

    pub fn source_dir(&self, folder: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.raw_root.join(validate_name(folder)?))
    }

    pub fn source_path(&self, folder: &str, image: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.source_dir(folder)?.join(validate_name(image)?))
    }

    pub fn folder_dir(&self, folder: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.labeled_root.join(validate_name(folder)?))
    }

    pub fn tier_dir(&self, folder: &str, tier: Tier) -> Result<PathBuf, ServiceError> {
        Ok(self.folder_dir(folder)?.join(tier.dir_name()))
    }

    /// Derived file for a source image name in the given tier.
    pub fn tier_path(&self, folder: &str, image: &str, tier: Tier) -> Result<PathBuf, ServiceError> {
        let name = derived_file_name(validate_name(image)?);
        Ok(self.tier_dir(folder, tier)?.join(name))
    }

    pub fn labels_path(&self, folder: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.folder_dir(folder)?.join(LABELS_FILE))
    }

    pub fn fields_path(&self, folder: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.folder_dir(folder)?.join(FIELDS_FILE))
    }

    pub fn raw_fields_path(&self, folder: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.source_dir(folder)?.join(FIELDS_FILE))
    }

    /// Allow-listed source images of a folder, sorted by name.
    ///
    /// A missing folder lists as empty. Names that [`validate_name`] rejects
    /// (a backslash is legal in a Unix file name) are left out, so every
    /// listed image can be addressed by the other operations.
    pub async fn list_source_images(&self, folder: &str) -> Result<Vec<String>, ServiceError> {
        let dir = self.source_dir(folder)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ServiceError::io(&dir)(err)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(ServiceError::io(&dir))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_source_image(Path::new(&name)) {
                continue;
            }
            if validate_name(&name).is_err() {
                warn!(folder, image = %name, "skipping source with unusable name");
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}

/// Reject names that are empty or could leave their parent directory.
pub fn validate_name(name: &str) -> Result<&str, ServiceError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(ServiceError::InvalidName(name.to_string()));
    }
    Ok(name)
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// Readers see either the old file or the complete new one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let parent = path
        .parent()
        .ok_or_else(|| ServiceError::InvalidName(path.display().to_string()))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(ServiceError::io(parent))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("derived");
    let temp = parent.join(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&temp, bytes)
        .await
        .map_err(ServiceError::io(&temp))?;

    if let Err(err) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(ServiceError::io(path)(err));
    }
    Ok(())
}

/// Delete a file; a missing file is not an error. Returns whether one existed.
pub async fn remove_if_exists(path: &Path) -> Result<bool, ServiceError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ServiceError::io(path)(err)),
    }
}

/// Read a file, mapping "missing" to `None`.
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ServiceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ServiceError::io(path)(err)),
    }
}

pub async fn file_exists(path: &Path) -> Result<bool, ServiceError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(ServiceError::io(path))
}
