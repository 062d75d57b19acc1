//! Ready-made emitter options
//!
//! Screen coordinates: y grows downward, distances in pixels, times in
//! seconds. Presets set no image and no origin; merge those in afterwards.

use crate::config::{EmitterOptions, ParticleOptions};

/// Names accepted by [`EmitterOptions::preset`]
pub const PRESET_NAMES: &[&str] = &["fountain", "fire", "smoke", "snow", "sparks", "explosion"];

impl EmitterOptions {
    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "fountain" => Some(Self::fountain()),
            "fire" => Some(Self::fire()),
            "smoke" => Some(Self::smoke()),
            "snow" => Some(Self::snow()),
            "sparks" => Some(Self::sparks()),
            "explosion" => Some(Self::explosion()),
            _ => None,
        }
    }

    /// Water thrown upward and pulled back down
    pub fn fountain() -> Self {
        Self::new()
            .with_emit_interval(0.05, 0.0)
            .with_emit_count(4.0, 1.0)
            .with_gravity(0.0, 600.0)
            .with_particle(
                ParticleOptions::new()
                    .with_velocity(0.0, -420.0)
                    .with_velocity_var(60.0, 40.0)
                    .with_scale(0.6, 0.2)
                    .with_life(1.4, 0.2),
            )
    }

    /// Rising, shrinking flames
    pub fn fire() -> Self {
        Self::new()
            .with_emit_interval(0.03, 0.01)
            .with_emit_count(3.0, 1.0)
            .with_gravity(0.0, -120.0)
            .with_particle(
                ParticleOptions::new()
                    .with_position_var(12.0, 2.0)
                    .with_velocity(0.0, -60.0)
                    .with_velocity_var(15.0, 20.0)
                    .with_scale(1.0, 0.2)
                    .with_scale_rate(-0.02, 0.005)
                    .with_alpha_rate(-0.02, 0.005)
                    .with_life(0.9, 0.3),
            )
    }

    /// Slow, growing, fading puffs
    pub fn smoke() -> Self {
        Self::new()
            .with_emit_interval(0.12, 0.04)
            .with_emit_count(1.0, 0.0)
            .with_gravity(8.0, -20.0)
            .with_particle(
                ParticleOptions::new()
                    .with_position_var(8.0, 0.0)
                    .with_velocity(0.0, -30.0)
                    .with_velocity_var(6.0, 8.0)
                    .with_rotation(0.0, 180.0)
                    .with_rotation_rate(0.0, 0.6)
                    .with_scale(0.4, 0.1)
                    .with_scale_rate(0.008, 0.002)
                    .with_alpha(0.6, 0.1)
                    .with_alpha_rate(-0.004, 0.001)
                    .with_life(3.0, 1.0),
            )
    }

    /// Wide band of slowly drifting flakes
    pub fn snow() -> Self {
        Self::new()
            .with_emit_interval(0.1, 0.05)
            .with_emit_count(2.0, 1.0)
            .with_gravity(0.0, 10.0)
            .with_particle(
                ParticleOptions::new()
                    .with_position_var(400.0, 0.0)
                    .with_velocity(0.0, 40.0)
                    .with_velocity_var(20.0, 10.0)
                    .with_rotation(0.0, 180.0)
                    .with_rotation_rate(0.0, 1.0)
                    .with_scale(0.5, 0.3)
                    .with_life(8.0, 2.0),
            )
    }

    /// Fast streaks falling under gravity
    pub fn sparks() -> Self {
        Self::new()
            .with_emit_interval(0.02, 0.0)
            .with_emit_count(2.0, 1.0)
            .with_gravity(0.0, 900.0)
            .with_particle(
                ParticleOptions::new()
                    .with_velocity(0.0, -250.0)
                    .with_velocity_var(250.0, 150.0)
                    .with_scale(0.3, 0.1)
                    .with_alpha_rate(-0.03, 0.01)
                    .with_life(0.6, 0.25),
            )
    }

    /// One large burst that stops itself
    pub fn explosion() -> Self {
        Self::new()
            .with_emit_interval(0.0, 0.0)
            .with_emit_count(150.0, 30.0)
            .with_total_time(0.001)
            .with_gravity(0.0, 300.0)
            .with_particle(
                ParticleOptions::new()
                    .with_velocity_var(400.0, 400.0)
                    .with_rotation(0.0, 180.0)
                    .with_rotation_rate(0.0, 8.0)
                    .with_scale(1.2, 0.4)
                    .with_scale_rate(-0.015, 0.005)
                    .with_alpha_rate(-0.025, 0.01)
                    .with_life(1.0, 0.4),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;
    use crate::emitter::Emitter;
    use ember_core::{ImageRegistry, Tick};

    #[test]
    fn test_every_name_resolves() {
        let images = ImageRegistry::new();
        for name in PRESET_NAMES {
            let options = EmitterOptions::preset(name).unwrap();
            let config = EmitterConfig::from_options(&options, &images).unwrap();
            assert!(config.particle.life.value > 0.0, "{name}");
        }
        assert!(EmitterOptions::preset("confetti").is_none());
    }

    #[test]
    fn test_explosion_is_a_single_burst() {
        let mut emitter = Emitter::new(&EmitterOptions::explosion(), &ImageRegistry::new())
            .unwrap()
            .with_seed(3);
        emitter.start();
        emitter.tick(16);
        assert!(!emitter.is_running());

        let spawned = emitter.stats().spawned;
        assert!((120..=180).contains(&spawned));

        emitter.tick(16);
        assert_eq!(emitter.stats().batches, 1);
    }

    #[test]
    fn test_presets_run_and_recycle() {
        let images = ImageRegistry::new();
        for name in PRESET_NAMES {
            let options = EmitterOptions::preset(name).unwrap();
            let mut emitter = Emitter::new(&options, &images).unwrap().with_seed(5);
            emitter.start();
            // Ten simulated seconds at 50fps
            for _ in 0..500 {
                emitter.tick(20);
            }
            let stats = emitter.stats();
            assert!(stats.spawned > 0, "{name}");
            assert!(stats.expired > 0, "{name}");
            for (_, particle) in emitter.particles() {
                assert!(particle.is_alive(), "{name}");
            }
        }
    }
}
