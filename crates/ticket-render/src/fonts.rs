//! Font loading keyed by family name.

use std::collections::HashMap;
use std::path::Path;

use ab_glyph::FontVec;
use tracing::{debug, warn};

use crate::error::{RenderError, Result};

/// A set of loaded fonts, keyed by family name.
///
/// Family names come from the file stem: `fonts/Inter-Bold.ttf` registers
/// as `Inter-Bold`.
#[derive(Default)]
pub struct FontLibrary {
    fonts: HashMap<String, FontVec>,
}

impl FontLibrary {
    /// An empty library. Templates without text overlays never need fonts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `.ttf`/`.otf` file in a directory.
    ///
    /// Unparseable font files are skipped with a warning rather than
    /// failing the whole load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut library = Self::empty();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            let Some(family) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    debug!(family = %family, "Loaded font");
                    library.fonts.insert(family.to_string(), font);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unparseable font file");
                }
            }
        }
        Ok(library)
    }

    /// Register a font from raw bytes.
    pub fn insert(&mut self, family: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| RenderError::InvalidFont(e.to_string()))?;
        self.fonts.insert(family.into(), font);
        Ok(())
    }

    /// Look up a font by family name.
    pub fn get(&self, family: &str) -> Option<&FontVec> {
        self.fonts.get(family)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_library_has_no_families() {
        let library = FontLibrary::empty();
        assert!(library.is_empty());
        assert!(library.get("Inter").is_none());
    }

    #[test]
    fn insert_rejects_garbage_bytes() {
        let mut library = FontLibrary::empty();
        let err = library.insert("Bogus", vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidFont(_)));
    }

    #[test]
    fn load_dir_ignores_non_font_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a font").unwrap();
        std::fs::write(dir.path().join("broken.ttf"), b"not a font either").unwrap();
        let library = FontLibrary::load_dir(dir.path()).unwrap();
        assert!(library.is_empty());
    }
}
