//! Emitter and particle configuration
//!
//! Configuration comes in two layers:
//!
//! - [`EmitterOptions`] / [`ParticleOptions`]: the flat input mapping. Every
//!   field is optional, option names follow the `emitTime` / `vxVar` style
//!   and unknown keys are ignored when parsing.
//! - [`EmitterConfig`] / [`ParticleTemplate`]: the resolved state an emitter
//!   runs from. Every field has a documented default and options are merged
//!   over it field by field, last write wins.
//!
//! # Example
//!
//! ```rust
//! use ember_core::ImageRegistry;
//! use ember_particles::{EmitterConfig, EmitterOptions, ParticleOptions};
//!
//! let options = EmitterOptions::new()
//!     .with_emit_interval(0.1, 0.02)
//!     .with_gravity(0.0, 300.0)
//!     .with_particle(ParticleOptions::new().with_velocity(0.0, -200.0).with_life(1.5, 0.5));
//!
//! let mut config = EmitterConfig::default();
//! config.merge(&options, &ImageRegistry::new()).unwrap();
//! assert_eq!(config.emit_interval.value, 0.1);
//! assert_eq!(config.particle.life.var, 0.5);
//! assert_eq!(config.particle.scale.value, 1.0);
//! ```

use ember_core::{ImageHandle, ImageRegistry, Rect, Vec2};
use rand::Rng;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::error::{ParticleError, Result};
use crate::particle::EmitterContext;
use crate::sampler::Ranged;

/// Seconds between emission batches when not configured
pub const DEFAULT_EMIT_INTERVAL: f64 = 0.2;
/// Particles per batch when not configured
pub const DEFAULT_EMIT_COUNT: f64 = 10.0;

/// Frame list for a particle image: one `[x, y, width, height]` rectangle or
/// several of them
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FrameSpec {
    Single([f64; 4]),
    Many(Vec<[f64; 4]>),
}

impl FrameSpec {
    fn to_rects(&self) -> SmallVec<[Rect; 4]> {
        match self {
            FrameSpec::Single(frame) => smallvec::smallvec![Rect::from_array(*frame)],
            FrameSpec::Many(frames) => frames.iter().copied().map(Rect::from_array).collect(),
        }
    }
}

// =============================================================================
// Input options
// =============================================================================

/// Particle template options
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleOptions {
    pub x: Option<f64>,
    pub x_var: Option<f64>,
    pub y: Option<f64>,
    pub y_var: Option<f64>,
    pub vx: Option<f64>,
    pub vx_var: Option<f64>,
    pub vy: Option<f64>,
    pub vy_var: Option<f64>,
    pub ax: Option<f64>,
    pub ax_var: Option<f64>,
    pub ay: Option<f64>,
    pub ay_var: Option<f64>,
    pub rotation: Option<f64>,
    pub rotation_var: Option<f64>,
    pub rotation_v: Option<f64>,
    pub rotation_v_var: Option<f64>,
    pub scale: Option<f64>,
    pub scale_var: Option<f64>,
    pub scale_v: Option<f64>,
    pub scale_v_var: Option<f64>,
    pub alpha: Option<f64>,
    pub alpha_var: Option<f64>,
    pub alpha_v: Option<f64>,
    pub alpha_v_var: Option<f64>,
    pub life: Option<f64>,
    pub life_var: Option<f64>,
    /// Name of an image in the host's `ImageRegistry`
    pub image: Option<String>,
    pub frame: Option<FrameSpec>,
    /// Pivot as a fraction of the frame width
    pub pivot_x: Option<f64>,
    /// Pivot as a fraction of the frame height
    pub pivot_y: Option<f64>,
}

impl ParticleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_position_var(mut self, x_var: f64, y_var: f64) -> Self {
        self.x_var = Some(x_var);
        self.y_var = Some(y_var);
        self
    }

    /// Set initial velocity in units per second
    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vx = Some(vx);
        self.vy = Some(vy);
        self
    }

    pub fn with_velocity_var(mut self, vx_var: f64, vy_var: f64) -> Self {
        self.vx_var = Some(vx_var);
        self.vy_var = Some(vy_var);
        self
    }

    /// Set per-particle acceleration in units per second squared
    pub fn with_acceleration(mut self, ax: f64, ay: f64) -> Self {
        self.ax = Some(ax);
        self.ay = Some(ay);
        self
    }

    pub fn with_acceleration_var(mut self, ax_var: f64, ay_var: f64) -> Self {
        self.ax_var = Some(ax_var);
        self.ay_var = Some(ay_var);
        self
    }

    pub fn with_rotation(mut self, rotation: f64, var: f64) -> Self {
        self.rotation = Some(rotation);
        self.rotation_var = Some(var);
        self
    }

    /// Set rotation change per frame
    pub fn with_rotation_rate(mut self, rate: f64, var: f64) -> Self {
        self.rotation_v = Some(rate);
        self.rotation_v_var = Some(var);
        self
    }

    pub fn with_scale(mut self, scale: f64, var: f64) -> Self {
        self.scale = Some(scale);
        self.scale_var = Some(var);
        self
    }

    /// Set scale change per frame
    pub fn with_scale_rate(mut self, rate: f64, var: f64) -> Self {
        self.scale_v = Some(rate);
        self.scale_v_var = Some(var);
        self
    }

    pub fn with_alpha(mut self, alpha: f64, var: f64) -> Self {
        self.alpha = Some(alpha);
        self.alpha_var = Some(var);
        self
    }

    /// Set opacity change per frame
    pub fn with_alpha_rate(mut self, rate: f64, var: f64) -> Self {
        self.alpha_v = Some(rate);
        self.alpha_v_var = Some(var);
        self
    }

    /// Set lifetime in seconds
    pub fn with_life(mut self, life: f64, var: f64) -> Self {
        self.life = Some(life);
        self.life_var = Some(var);
        self
    }

    pub fn with_image(mut self, name: impl Into<String>) -> Self {
        self.image = Some(name.into());
        self
    }

    pub fn with_frame(mut self, frame: [f64; 4]) -> Self {
        self.frame = Some(FrameSpec::Single(frame));
        self
    }

    pub fn with_frames(mut self, frames: impl IntoIterator<Item = [f64; 4]>) -> Self {
        self.frame = Some(FrameSpec::Many(frames.into_iter().collect()));
        self
    }

    pub fn with_pivot(mut self, pivot_x: f64, pivot_y: f64) -> Self {
        self.pivot_x = Some(pivot_x);
        self.pivot_y = Some(pivot_y);
        self
    }
}

/// Emitter options
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmitterOptions {
    /// Seconds between batches
    pub emit_time: Option<f64>,
    pub emit_time_var: Option<f64>,
    /// Particles per batch
    pub emit_num: Option<f64>,
    pub emit_num_var: Option<f64>,
    pub emitter_x: Option<f64>,
    pub emitter_y: Option<f64>,
    /// Global acceleration applied to every particle
    pub gx: Option<f64>,
    pub gy: Option<f64>,
    /// Seconds before emission stops by itself; zero or negative is unbounded
    pub total_time: Option<f64>,
    pub particle: Option<ParticleOptions>,
}

impl EmitterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ParticleError::Parse(e.to_string()))
    }

    /// Parse options from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ParticleError::Parse(e.to_string()))
    }

    pub fn with_emit_interval(mut self, seconds: f64, var: f64) -> Self {
        self.emit_time = Some(seconds);
        self.emit_time_var = Some(var);
        self
    }

    pub fn with_emit_count(mut self, count: f64, var: f64) -> Self {
        self.emit_num = Some(count);
        self.emit_num_var = Some(var);
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.emitter_x = Some(x);
        self.emitter_y = Some(y);
        self
    }

    pub fn with_gravity(mut self, gx: f64, gy: f64) -> Self {
        self.gx = Some(gx);
        self.gy = Some(gy);
        self
    }

    pub fn with_total_time(mut self, seconds: f64) -> Self {
        self.total_time = Some(seconds);
        self
    }

    pub fn with_particle(mut self, particle: ParticleOptions) -> Self {
        self.particle = Some(particle);
        self
    }
}

// =============================================================================
// Resolved configuration
// =============================================================================

/// Resolved particle template
///
/// Each numeric field is sampled once per particle when it is emitted.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleTemplate {
    pub x: Ranged,
    pub y: Ranged,
    pub vx: Ranged,
    pub vy: Ranged,
    pub ax: Ranged,
    pub ay: Ranged,
    pub rotation: Ranged,
    pub rotation_v: Ranged,
    pub scale: Ranged,
    pub scale_v: Ranged,
    pub alpha: Ranged,
    pub alpha_v: Ranged,
    pub life: Ranged,
    pub image: Option<ImageHandle>,
    /// Frames to pick from; empty means the whole image
    pub frames: SmallVec<[Rect; 4]>,
    pub pivot_x: Option<f64>,
    pub pivot_y: Option<f64>,
}

impl Default for ParticleTemplate {
    fn default() -> Self {
        Self {
            x: Ranged::fixed(0.0),
            y: Ranged::fixed(0.0),
            vx: Ranged::fixed(0.0),
            vy: Ranged::fixed(0.0),
            ax: Ranged::fixed(0.0),
            ay: Ranged::fixed(0.0),
            rotation: Ranged::fixed(0.0),
            rotation_v: Ranged::fixed(0.0),
            scale: Ranged::fixed(1.0),
            scale_v: Ranged::fixed(0.0),
            alpha: Ranged::fixed(1.0),
            alpha_v: Ranged::fixed(0.0),
            life: Ranged::fixed(1.0),
            image: None,
            frames: SmallVec::new(),
            pivot_x: None,
            pivot_y: None,
        }
    }
}

impl ParticleTemplate {
    /// Merge options over this template
    ///
    /// Image references are resolved and frames validated before anything is
    /// written, so on error the template is left as it was.
    pub fn merge(&mut self, options: &ParticleOptions, images: &ImageRegistry) -> Result<()> {
        let image = match &options.image {
            Some(name) => Some(
                images
                    .get(name)
                    .ok_or_else(|| ParticleError::MissingImage(name.clone()))?,
            ),
            None => self.image,
        };
        let frames = match &options.frame {
            Some(spec) => spec.to_rects(),
            None => self.frames.clone(),
        };

        match image {
            Some(image) => validate_frames(&image, &frames)?,
            None if !frames.is_empty() => {
                tracing::warn!(
                    "ParticleTemplate: {} frame(s) have no effect until an image is set",
                    frames.len()
                );
            }
            None => {}
        }

        self.image = image;
        self.frames = frames;
        merge_option(&mut self.pivot_x, options.pivot_x, "pivotX");
        merge_option(&mut self.pivot_y, options.pivot_y, "pivotY");

        merge_ranged(&mut self.x, options.x, options.x_var, "x");
        merge_ranged(&mut self.y, options.y, options.y_var, "y");
        merge_ranged(&mut self.vx, options.vx, options.vx_var, "vx");
        merge_ranged(&mut self.vy, options.vy, options.vy_var, "vy");
        merge_ranged(&mut self.ax, options.ax, options.ax_var, "ax");
        merge_ranged(&mut self.ay, options.ay, options.ay_var, "ay");
        merge_ranged(&mut self.rotation, options.rotation, options.rotation_var, "rotation");
        merge_ranged(
            &mut self.rotation_v,
            options.rotation_v,
            options.rotation_v_var,
            "rotationV",
        );
        merge_ranged(&mut self.scale, options.scale, options.scale_var, "scale");
        merge_ranged(&mut self.scale_v, options.scale_v, options.scale_v_var, "scaleV");
        merge_ranged(&mut self.alpha, options.alpha, options.alpha_var, "alpha");
        merge_ranged(&mut self.alpha_v, options.alpha_v, options.alpha_v_var, "alphaV");
        merge_ranged(&mut self.life, options.life, options.life_var, "life");
        Ok(())
    }

    /// Pick the frame for a new particle, uniformly among the configured ones
    ///
    /// `None` means the whole image.
    pub fn pick_frame<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Rect> {
        match self.frames.len() {
            0 => None,
            1 => Some(self.frames[0]),
            n => Some(self.frames[rng.gen_range(0..n)]),
        }
    }
}

/// Resolved emitter configuration
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterConfig {
    /// Seconds between batches
    pub emit_interval: Ranged,
    /// Particles per batch, rounded after sampling
    pub emit_count: Ranged,
    pub origin: Vec2,
    pub gravity: Vec2,
    /// Seconds of emission before stopping; `None` runs until stopped
    pub total_time: Option<f64>,
    pub particle: ParticleTemplate,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            emit_interval: Ranged::fixed(DEFAULT_EMIT_INTERVAL),
            emit_count: Ranged::fixed(DEFAULT_EMIT_COUNT),
            origin: Vec2::ZERO,
            gravity: Vec2::ZERO,
            total_time: None,
            particle: ParticleTemplate::default(),
        }
    }
}

impl EmitterConfig {
    /// Build a config from defaults plus `options`
    pub fn from_options(options: &EmitterOptions, images: &ImageRegistry) -> Result<Self> {
        let mut config = Self::default();
        config.merge(options, images)?;
        Ok(config)
    }

    /// Merge options over this config; on error nothing changes
    pub fn merge(&mut self, options: &EmitterOptions, images: &ImageRegistry) -> Result<()> {
        // The template is the only fallible part, so it goes first
        if let Some(particle) = &options.particle {
            self.particle.merge(particle, images)?;
        }

        merge_ranged(
            &mut self.emit_interval,
            options.emit_time,
            options.emit_time_var,
            "emitTime",
        );
        merge_ranged(
            &mut self.emit_count,
            options.emit_num,
            options.emit_num_var,
            "emitNum",
        );
        merge_value(&mut self.origin.x, options.emitter_x, "emitterX");
        merge_value(&mut self.origin.y, options.emitter_y, "emitterY");
        merge_value(&mut self.gravity.x, options.gx, "gx");
        merge_value(&mut self.gravity.y, options.gy, "gy");

        if let Some(total) = options.total_time {
            self.total_time = (total.is_finite() && total > 0.0).then_some(total);
        }
        Ok(())
    }

    /// What particles need to know about their emitter
    pub fn context(&self) -> EmitterContext {
        EmitterContext {
            origin: self.origin,
            gravity: self.gravity,
        }
    }
}

fn validate_frames(image: &ImageHandle, frames: &[Rect]) -> Result<()> {
    let bounds = image.full_frame();
    for (index, frame) in frames.iter().enumerate() {
        if !(frame.width() > 0.0 && frame.height() > 0.0)
            || !frame.width().is_finite()
            || !frame.height().is_finite()
        {
            return Err(ParticleError::InvalidFrame {
                index,
                reason: format!(
                    "size {}x{} must be positive and finite",
                    frame.width(),
                    frame.height()
                ),
            });
        }
        if !bounds.contains_rect(frame) {
            return Err(ParticleError::InvalidFrame {
                index,
                reason: format!(
                    "[{}, {}, {}, {}] lies outside the {}x{} image",
                    frame.x(),
                    frame.y(),
                    frame.width(),
                    frame.height(),
                    image.width(),
                    image.height()
                ),
            });
        }
    }
    Ok(())
}

fn merge_value(slot: &mut f64, value: Option<f64>, name: &str) {
    match value {
        Some(v) if v.is_finite() => *slot = v,
        Some(v) => tracing::warn!("Ignoring non-finite value {} for '{}'", v, name),
        None => {}
    }
}

fn merge_option(slot: &mut Option<f64>, value: Option<f64>, name: &str) {
    match value {
        Some(v) if v.is_finite() => *slot = Some(v),
        Some(v) => tracing::warn!("Ignoring non-finite value {} for '{}'", v, name),
        None => {}
    }
}

fn merge_ranged(slot: &mut Ranged, value: Option<f64>, var: Option<f64>, name: &str) {
    merge_value(&mut slot.value, value, name);
    merge_value(&mut slot.var, var, name);
}
