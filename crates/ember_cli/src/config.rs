//! Simulation file handling
//!
//! A simulation file names an optional preset, the images the emitter may
//! reference (name → `[width, height]`), and emitter options merged over the
//! preset. TOML and JSON are both accepted, picked by file extension:
//!
//! ```toml
//! preset = "fire"
//!
//! [images]
//! flame = [64, 16]
//!
//! [emitter]
//! emitterX = 320
//! emitterY = 400
//!
//! [emitter.particle]
//! image = "flame"
//! frame = [[0, 0, 16, 16], [16, 0, 16, 16]]
//! pivotX = 0.5
//! pivotY = 0.5
//! ```

use anyhow::{Context, Result};
use ember_core::ImageRegistry;
use ember_particles::{Emitter, EmitterOptions, PRESET_NAMES};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Contents of a simulation file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulationFile {
    /// Preset the emitter options are merged over
    pub preset: Option<String>,
    /// Image name to pixel size
    pub images: BTreeMap<String, [f64; 2]>,
    pub emitter: EmitterOptions,
}

impl SimulationFile {
    /// Load from a `.json` or `.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Register the declared images
    pub fn image_registry(&self) -> ImageRegistry {
        let mut images = ImageRegistry::new();
        for (name, [width, height]) in &self.images {
            images.register(name.as_str(), *width, *height);
        }
        images
    }

    /// Build an idle emitter from the preset and the file's options
    pub fn build_emitter(&self, images: &ImageRegistry) -> Result<Emitter> {
        let base = match &self.preset {
            Some(name) => EmitterOptions::preset(name).with_context(|| {
                format!("Unknown preset '{}'. Available: {:?}", name, PRESET_NAMES)
            })?,
            None => EmitterOptions::default(),
        };

        let mut emitter = Emitter::new(&base, images).context("Invalid preset options")?;
        emitter
            .configure(&self.emitter, images)
            .context("Invalid emitter options")?;
        Ok(emitter)
    }
}
