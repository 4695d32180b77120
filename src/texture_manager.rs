use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;

use crate::element::ObjectId;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Failed to generate texture")]
    GenerationFailed,
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
}

/// What a cached texture shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// A page raster uploaded under a document session generation
    Page { page: u32, generation: u64 },
    /// Pixels of an image object
    Image(ObjectId),
}

/// Caches GPU textures for page rasters and image objects
pub struct TextureManager {
    texture_cache: HashMap<TextureKey, TextureHandle>,
    /// Frame each texture was last used in
    last_used: HashMap<TextureKey, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("current_frame", &self.current_frame)
            .finish()
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Gets or creates the texture for `key`.
    ///
    /// Uploading a page under a new generation frees that page's textures
    /// from older generations.
    pub fn get_or_create_texture<F>(
        &mut self,
        key: TextureKey,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }

        if let TextureKey::Page { page, generation } = key {
            self.drop_superseded(page, generation);
        }
        self.prune_cache_if_needed();

        let image = generator()?;
        if image.size[0] == 0 || image.size[1] == 0 {
            return Err(TextureGenerationError::InvalidDimensions);
        }
        let name = match key {
            TextureKey::Page { page, generation } => format!("page_{page}_g{generation}"),
            TextureKey::Image(id) => format!("image_{id}"),
        };
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
        let id = handle.id();
        self.texture_cache.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        Ok(id)
    }

    fn drop_superseded(&mut self, page: u32, generation: u64) {
        let stale: Vec<TextureKey> = self
            .texture_cache
            .keys()
            .filter(|key| {
                matches!(key, TextureKey::Page { page: p, generation: g } if *p == page && *g < generation)
            })
            .copied()
            .collect();
        for key in stale {
            self.texture_cache.remove(&key);
            self.last_used.remove(&key);
        }
    }

    /// Free the texture of an image object
    pub fn invalidate_image(&mut self, id: ObjectId) {
        let key = TextureKey::Image(id);
        self.texture_cache.remove(&key);
        self.last_used.remove(&key);
    }

    /// Evict least recently used textures down to the size limit
    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(TextureKey, u64)> = self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() + 1 - self.max_cache_size;
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    /// Clears all textures, used when a new document replaces the old one
    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    pub fn contains(&self, key: TextureKey) -> bool {
        self.texture_cache.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_texture_generator() -> Result<ColorImage, TextureGenerationError> {
        Ok(ColorImage::new([10, 10], egui::Color32::WHITE))
    }

    fn page(page: u32, generation: u64) -> TextureKey {
        TextureKey::Page { page, generation }
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);

        let first = manager.get_or_create_texture(page(1, 1), mock_texture_generator, &ctx).unwrap();
        let second = manager.get_or_create_texture(page(1, 1), mock_texture_generator, &ctx).unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_new_generation_frees_old_page() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);

        manager.get_or_create_texture(page(1, 1), mock_texture_generator, &ctx).unwrap();
        manager.get_or_create_texture(page(2, 1), mock_texture_generator, &ctx).unwrap();
        manager.get_or_create_texture(page(1, 2), mock_texture_generator, &ctx).unwrap();

        assert!(!manager.contains(page(1, 1)));
        assert!(manager.contains(page(2, 1)));
        assert!(manager.contains(page(1, 2)));
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let (a, b) = (ObjectId::new(), ObjectId::new());

        manager.get_or_create_texture(TextureKey::Image(a), mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(TextureKey::Image(b), mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(page(1, 1), mock_texture_generator, &ctx).unwrap();

        assert_eq!(manager.cache_size(), 2);
        assert!(!manager.contains(TextureKey::Image(a)));
        assert!(manager.contains(TextureKey::Image(b)));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);
        let result = manager.get_or_create_texture(
            page(1, 1),
            || Ok(ColorImage::new([0, 10], egui::Color32::WHITE)),
            &ctx,
        );
        assert!(matches!(result, Err(TextureGenerationError::InvalidDimensions)));
        assert_eq!(manager.cache_size(), 0);
    }
}
