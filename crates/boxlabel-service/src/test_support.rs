//! Fixtures shared by the service tests.

use std::path::PathBuf;

use boxlabel_core::encode::encode_jpeg;
use tempfile::TempDir;

use crate::store::{DerivedStore, Tier};
use crate::ServiceConfig;

pub(crate) struct Dataset {
    _dir: TempDir,
    pub config: ServiceConfig,
}

impl Dataset {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = ServiceConfig::for_dataset(dir.path());
        Self { _dir: dir, config }
    }

    pub fn store(&self) -> DerivedStore {
        DerivedStore::from_config(&self.config)
    }

    /// Write a gradient JPEG into the raw folder.
    pub fn add_source(&self, folder: &str, name: &str, width: u32, height: u32) -> PathBuf {
        self.add_source_bytes(folder, name, &gradient_jpeg(width, height))
    }

    pub fn add_source_bytes(&self, folder: &str, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.config.raw_root.join(folder);
        std::fs::create_dir_all(&dir).expect("raw folder");
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write source");
        path
    }

    pub fn tier_path(&self, folder: &str, image: &str, tier: Tier) -> PathBuf {
        self.store().tier_path(folder, image, tier).expect("tier path")
    }

    /// Put an image straight into the preprocessed tier.
    pub fn add_preprocessed(&self, folder: &str, image: &str, width: u32, height: u32) -> PathBuf {
        let path = self.tier_path(folder, image, Tier::Preprocessed);
        std::fs::create_dir_all(path.parent().expect("tier dir")).expect("create tier");
        std::fs::write(&path, gradient_jpeg(width, height)).expect("write preprocessed");
        path
    }
}

/// Gradient JPEG with an EXIF block carrying only `orientation`.
pub(crate) fn exif_oriented_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut tiff = b"MM\0\x2A\0\0\0\x08".to_vec();
    tiff.extend_from_slice(&1u16.to_be_bytes());
    // Orientation, SHORT, count 1, value left-aligned in the offset field.
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);

    let jpeg = gradient_jpeg(width, height);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub(crate) fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x % 256) as u8);
            pixels.push((y % 256) as u8);
            pixels.push(((x + y) % 256) as u8);
        }
    }
    encode_jpeg(&pixels, width, height, 95).expect("encode fixture")
}
