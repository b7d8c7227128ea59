//! Background asset loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{RenderError, Result};

/// Source of background images referenced by templates.
///
/// Abstracted so the renderer can be exercised without touching the
/// filesystem.
pub trait AssetSource: Send + Sync {
    /// Load an image by template-relative path.
    fn load_image(&self, path: &str) -> Result<DynamicImage>;
}

/// Filesystem-backed asset source rooted at a directory.
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // Reject traversal out of the asset root.
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(RenderError::AssetNotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for FsAssetSource {
    fn load_image(&self, path: &str) -> Result<DynamicImage> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(RenderError::AssetNotFound(path.to_string()));
        }
        Ok(image::open(full)?)
    }
}

/// In-memory asset source, used in tests and by callers that already hold
/// decoded images.
#[derive(Default)]
pub struct MemoryAssetSource {
    images: HashMap<String, DynamicImage>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, image: DynamicImage) {
        self.images.insert(path.into(), image);
    }
}

impl AssetSource for MemoryAssetSource {
    fn load_image(&self, path: &str) -> Result<DynamicImage> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| RenderError::AssetNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_source_rejects_traversal() {
        let source = FsAssetSource::new("/tmp/assets");
        assert!(matches!(
            source.load_image("../etc/passwd"),
            Err(RenderError::AssetNotFound(_))
        ));
        assert!(matches!(
            source.load_image("/etc/passwd"),
            Err(RenderError::AssetNotFound(_))
        ));
    }

    #[test]
    fn memory_source_round_trip() {
        let mut source = MemoryAssetSource::new();
        source.insert(
            "bg.png",
            DynamicImage::new_rgba8(4, 4),
        );
        assert!(source.load_image("bg.png").is_ok());
        assert!(matches!(
            source.load_image("missing.png"),
            Err(RenderError::AssetNotFound(_))
        ));
    }
}
