//! Font registration
//!
//! Every render worker owns its own `FontCache`, built once when the worker
//! starts. Nothing here is process-global, so concurrent workers never race
//! on registration.

use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

use crate::compiler::errors::RenderError;

/// Fonts available to one worker's compilations
pub struct FontCache {
    /// Metadata for font selection, pre-hashed for Typst
    book: LazyHash<FontBook>,
    /// The actual font data, indexed like `book`
    fonts: Vec<Font>,
}

impl FontCache {
    /// Register the fonts embedded in the binary
    pub fn embedded() -> Result<Self, RenderError> {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();

        for data in typst_assets::fonts() {
            let buffer = Bytes::from_static(data);
            for font in Font::iter(buffer) {
                book.push(font.info().clone());
                fonts.push(font);
            }
        }

        if fonts.is_empty() {
            return Err(RenderError::NoFonts);
        }

        tracing::debug!("Font cache registered {} fonts", fonts.len());

        Ok(Self {
            book: LazyHash::new(book),
            fonts,
        })
    }

    pub fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Sorted, deduplicated family names
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .book
            .families()
            .map(|(name, _)| name.to_string())
            .collect();

        families.sort();
        families.dedup();
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_fonts_registered() {
        let cache = FontCache::embedded().unwrap();
        assert!(!cache.is_empty(), "Font cache should not be empty");
        assert!(cache.font(0).is_some());
        assert!(cache.font(cache.len()).is_none());
    }

    #[test]
    fn test_each_cache_is_independent() {
        let first = FontCache::embedded().unwrap();
        let second = FontCache::embedded().unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(first.families(), second.families());
    }
}
