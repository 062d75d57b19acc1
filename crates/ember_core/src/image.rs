//! Image handles
//!
//! The engine never loads or decodes pixels. A host registers each image it
//! owns under a name together with its pixel dimensions, and receives an
//! opaque [`ImageHandle`] that drawables carry around.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Rect, Size};

new_key_type! {
    /// Handle to a registered image
    pub struct ImageId;
}

/// Opaque reference to a host-owned image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageHandle {
    pub id: ImageId,
    pub size: Size,
}

impl ImageHandle {
    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// The frame covering the whole image
    pub fn full_frame(&self) -> Rect {
        self.size.to_rect()
    }
}

#[derive(Clone, Debug)]
struct ImageEntry {
    name: String,
    size: Size,
}

/// Name-keyed registry of host images
#[derive(Clone, Debug, Default)]
pub struct ImageRegistry {
    images: SlotMap<ImageId, ImageEntry>,
    by_name: FxHashMap<String, ImageId>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image, replacing the dimensions of an existing entry with
    /// the same name
    pub fn register(&mut self, name: impl Into<String>, width: f64, height: f64) -> ImageHandle {
        let name = name.into();
        let size = Size::new(width, height);

        if let Some(&id) = self.by_name.get(&name) {
            if let Some(entry) = self.images.get_mut(id) {
                entry.size = size;
            }
            tracing::debug!("ImageRegistry: updated '{}' to {}x{}", name, width, height);
            return ImageHandle { id, size };
        }

        let id = self.images.insert(ImageEntry {
            name: name.clone(),
            size,
        });
        tracing::debug!("ImageRegistry: registered '{}' ({}x{})", name, width, height);
        self.by_name.insert(name, id);
        ImageHandle { id, size }
    }

    /// Look up an image by name
    pub fn get(&self, name: &str) -> Option<ImageHandle> {
        let id = *self.by_name.get(name)?;
        self.handle(id)
    }

    /// Look up an image by id
    pub fn handle(&self, id: ImageId) -> Option<ImageHandle> {
        self.images
            .get(id)
            .map(|entry| ImageHandle { id, size: entry.size })
    }

    /// Name an image was registered under
    pub fn name(&self, id: ImageId) -> Option<&str> {
        self.images.get(id).map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ImageRegistry::new();
        let spark = registry.register("spark", 32.0, 16.0);

        let found = registry.get("spark").unwrap();
        assert_eq!(found, spark);
        assert_eq!(found.width(), 32.0);
        assert_eq!(found.full_frame(), Rect::new(0.0, 0.0, 32.0, 16.0));
        assert_eq!(registry.name(spark.id), Some("spark"));
        assert!(registry.get("smoke").is_none());
    }

    #[test]
    fn test_register_same_name_keeps_id() {
        let mut registry = ImageRegistry::new();
        let first = registry.register("atlas", 64.0, 64.0);
        let second = registry.register("atlas", 128.0, 64.0);

        assert_eq!(first.id, second.id);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("atlas").unwrap().width(), 128.0);
    }

    #[test]
    fn test_handle_by_id() {
        let mut registry = ImageRegistry::new();
        assert!(registry.is_empty());
        let handle = registry.register("dot", 4.0, 4.0);

        assert_eq!(registry.handle(handle.id), Some(handle));
        assert_eq!(registry.name(handle.id), Some("dot"));
    }
}
