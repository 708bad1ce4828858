use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use eframe::egui;

type Decoded = Arc<Mutex<HashMap<PathBuf, Option<egui::ColorImage>>>>;

/// Decode an image file into egui pixels. Animated GIFs yield their first
/// frame.
pub fn decode(path: &Path) -> Result<egui::ColorImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .into_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

/// Textures keyed by path. Failed loads are remembered so a broken file is
/// only tried once.
///
/// Preloads decode on the rayon pool and park the pixels in a shared map;
/// textures are only ever created on the UI thread.
pub struct ImageCache {
    textures: RefCell<HashMap<PathBuf, Option<egui::TextureHandle>>>,
    decoded: Decoded,
    requested: RefCell<HashSet<PathBuf>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            textures: RefCell::new(HashMap::new()),
            decoded: Arc::new(Mutex::new(HashMap::new())),
            requested: RefCell::new(HashSet::new()),
        }
    }

    /// Start decoding `path` in the background. Repeated calls are no-ops.
    pub fn preload(&self, path: &Path) {
        if self.textures.borrow().contains_key(path)
            || !self.requested.borrow_mut().insert(path.to_path_buf())
        {
            return;
        }
        let decoded = Arc::clone(&self.decoded);
        let path = path.to_path_buf();
        rayon::spawn(move || {
            let image = match decode(&path) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::debug!("Preload failed: {e:#}");
                    None
                }
            };
            if let Ok(mut map) = decoded.lock() {
                map.insert(path, image);
            }
        });
    }

    /// Load `path` now, on the calling thread, unless it is already cached.
    pub fn load_now(&self, ctx: &egui::Context, path: &Path) {
        let _ = self.get_or_load(ctx, path);
    }

    pub fn get_or_load(&self, ctx: &egui::Context, path: &Path) -> Option<egui::TextureHandle> {
        if let Some(entry) = self.textures.borrow().get(path) {
            return entry.clone();
        }

        let preloaded = self
            .decoded
            .lock()
            .ok()
            .and_then(|mut map| map.remove(path));
        let image = match preloaded {
            Some(image) => image,
            None => match decode(path) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::debug!("Image unavailable: {e:#}");
                    None
                }
            },
        };

        let texture = image.map(|image| {
            ctx.load_texture(
                path.to_string_lossy(),
                image,
                egui::TextureOptions::LINEAR,
            )
        });
        self.textures
            .borrow_mut()
            .insert(path.to_path_buf(), texture.clone());
        texture
    }

    /// Drop preloaded pixels for paths that already have a texture. A
    /// preload can finish after the same path was decoded synchronously.
    pub fn discard_stale(&self) {
        let textures = self.textures.borrow();
        if let Ok(mut map) = self.decoded.lock() {
            map.retain(|path, _| !textures.contains_key(path));
        }
    }

    /// `src`, or `fallback` when `src` cannot be loaded.
    pub fn get_with_fallback(
        &self,
        ctx: &egui::Context,
        src: &Path,
        fallback: Option<&Path>,
    ) -> Option<egui::TextureHandle> {
        self.get_or_load(ctx, src).or_else(|| {
            let fallback = fallback?;
            tracing::debug!(
                "Using placeholder {} for {}",
                fallback.display(),
                src.display()
            );
            self.get_or_load(ctx, fallback)
        })
    }

    #[cfg(test)]
    fn is_decoded(&self, path: &Path) -> bool {
        self.decoded
            .lock()
            .map(|map| map.contains_key(path))
            .unwrap_or(false)
    }
}
