use std::path::{Path, PathBuf};

use boxlabel_core::{CompressPolicy, OverlayStyle};
use serde::{Deserialize, Serialize};

/// Where the tiers live and how they are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root holding one directory of source images per folder.
    pub raw_root: PathBuf,
    /// Root holding the derived tiers and JSON files per folder.
    pub labeled_root: PathBuf,
    /// In-flight image jobs per preprocessing pass.
    pub max_concurrent_images: usize,
    pub compress: CompressPolicy,
    /// JPEG quality of the processed tier.
    pub render_quality: u8,
    pub overlay: OverlayStyle,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::for_dataset("dataset")
    }
}

impl ServiceConfig {
    /// `<root>/raw-data` and `<root>/labeled-data` with default settings.
    pub fn for_dataset(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            raw_root: root.join("raw-data"),
            labeled_root: root.join("labeled-data"),
            max_concurrent_images: 4,
            compress: CompressPolicy::default(),
            render_quality: 95,
            overlay: OverlayStyle::default(),
        }
    }
}
