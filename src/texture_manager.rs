use std::collections::{HashMap, HashSet};
use std::path::Path;

use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use image::RgbaImage;
use thiserror::Error;

/// Errors that can occur while turning an image into a texture
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("invalid texture dimensions")]
    InvalidDimensions,
    #[error("texture `{0}` failed to load earlier")]
    Unavailable(String),
}

type CacheKey = (String, u64);

/// Caches GPU textures by (key, version), evicting the least recently used ones
pub struct TextureManager {
    texture_cache: HashMap<CacheKey, TextureHandle>,
    last_used: HashMap<CacheKey, u64>,
    failed: HashSet<CacheKey>,
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("failed", &self.failed.len())
            .field("current_frame", &self.current_frame)
            .finish()
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            failed: HashSet::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Returns the cached texture for `key` at `version`, generating it on a miss.
    ///
    /// A failed generation is remembered so the generator is not retried every frame.
    pub fn get_or_create<F>(
        &mut self,
        ctx: &Context,
        key: &str,
        version: u64,
        generator: F,
    ) -> Result<TextureHandle, TextureError>
    where
        F: FnOnce() -> Result<ColorImage, TextureError>,
    {
        let cache_key = (key.to_owned(), version);

        if let Some(handle) = self.texture_cache.get(&cache_key) {
            self.last_used.insert(cache_key, self.current_frame);
            return Ok(handle.clone());
        }
        if self.failed.contains(&cache_key) {
            return Err(TextureError::Unavailable(key.to_owned()));
        }

        let image = match generator() {
            Ok(image) => image,
            Err(err) => {
                log::warn!("texture `{}` v{} failed: {}", key, version, err);
                self.failed.insert(cache_key);
                return Err(err);
            }
        };

        self.prune_for_insert();
        let name = format!("{key}_v{version}");
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
        self.texture_cache.insert(cache_key.clone(), handle.clone());
        self.last_used.insert(cache_key, self.current_frame);
        Ok(handle)
    }

    /// Drops every cached version of `key`
    pub fn invalidate(&mut self, key: &str) {
        self.texture_cache.retain(|(cached, _), _| cached != key);
        self.last_used.retain(|(cached, _), _| cached != key);
        self.failed.retain(|(cached, _)| cached != key);
    }

    // Makes room for one more entry, oldest first.
    fn prune_for_insert(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(CacheKey, u64)> = self
            .last_used
            .iter()
            .map(|(key, frame)| (key.clone(), *frame))
            .collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = self.texture_cache.len() + 1 - self.max_cache_size;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.texture_cache.remove(&key);
            self.last_used.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
        self.failed.clear();
    }

    pub fn len(&self) -> usize {
        self.texture_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texture_cache.is_empty()
    }

    pub fn contains(&self, key: &str, version: u64) -> bool {
        self.texture_cache.contains_key(&(key.to_owned(), version))
    }
}

pub fn color_image(image: &RgbaImage) -> Result<ColorImage, TextureError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidDimensions);
    }
    Ok(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        image.as_raw(),
    ))
}

pub fn load_color_image(path: &Path) -> Result<ColorImage, TextureError> {
    let image = image::open(path)?.to_rgba8();
    color_image(&image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> Result<ColorImage, TextureError> {
        Ok(ColorImage::new([10, 10], egui::Color32::WHITE))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);

        let first = manager.get_or_create(&ctx, "preview", 1, white).unwrap();
        let second = manager
            .get_or_create(&ctx, "preview", 1, || panic!("generator must not run on a hit"))
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);

        manager.get_or_create(&ctx, "a", 0, white).unwrap();
        manager.begin_frame();
        manager.get_or_create(&ctx, "b", 0, white).unwrap();
        manager.begin_frame();
        manager.get_or_create(&ctx, "c", 0, white).unwrap();

        assert_eq!(manager.len(), 2);
        assert!(!manager.contains("a", 0));
        assert!(manager.contains("b", 0));
        assert!(manager.contains("c", 0));
    }

    #[test]
    fn test_failures_are_remembered() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);

        let err = manager
            .get_or_create(&ctx, "sticker.png", 0, || Err(TextureError::InvalidDimensions))
            .err().unwrap();
        assert!(matches!(err, TextureError::InvalidDimensions));

        let err = manager.get_or_create(&ctx, "sticker.png", 0, white).err().unwrap();
        assert!(matches!(err, TextureError::Unavailable(_)));

        manager.invalidate("sticker.png");
        assert!(manager.get_or_create(&ctx, "sticker.png", 0, white).is_ok());
    }

    #[test]
    fn empty_images_are_rejected() {
        assert!(matches!(
            color_image(&RgbaImage::new(0, 4)),
            Err(TextureError::InvalidDimensions)
        ));
        let image = color_image(&RgbaImage::new(3, 2)).unwrap();
        assert_eq!(image.size, [3, 2]);
    }
}
