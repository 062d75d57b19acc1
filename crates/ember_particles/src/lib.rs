//! Ember Particles
//!
//! Pooled 2D particle emission for frame-driven hosts.
//!
//! # Features
//!
//! - **Randomized Templates**: every particle property is a nominal value
//!   plus symmetric variance, sampled per particle
//! - **Interval Emission**: batches fire on a randomized time accumulator,
//!   with an optional total run time
//! - **Semi-implicit Euler**: per-particle acceleration plus emitter-wide
//!   gravity, with per-frame rotation, scale and opacity rates
//! - **Recycling**: expired particles go back to a `ParticlePool` (private or
//!   shared between emitters) and are reinitialized in place
//! - **Flat Options**: `emitTime` / `vxVar` style options from code, JSON or
//!   TOML, merged field by field over documented defaults
//! - **Presets**: fountain, fire, smoke, snow, sparks and explosion
//!
//! The host owns rendering and timing: it calls [`ember_core::Tick::tick`]
//! on each emitter once per frame and draws the `VisualNode` of every live
//! particle in [`Emitter::particles`] order.

pub mod config;
pub mod emitter;
pub mod error;
pub mod particle;
pub mod pool;
pub mod presets;
pub mod sampler;

pub use config::{
    EmitterConfig, EmitterOptions, FrameSpec, ParticleOptions, ParticleTemplate,
    DEFAULT_EMIT_COUNT, DEFAULT_EMIT_INTERVAL,
};
pub use emitter::{Emitter, EmitterStats, MAX_BATCH_SIZE};
pub use error::{ParticleError, Result};
pub use particle::{EmitterContext, Particle, ParticleUid, ALPHA_SETTLE_DELAY};
pub use pool::{ParticlePool, PoolHandle};
pub use presets::PRESET_NAMES;
pub use sampler::{sample, Ranged};
