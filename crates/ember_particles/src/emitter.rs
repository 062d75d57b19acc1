//! Particle emitter
//!
//! An `Emitter` accumulates frame time, spawns batches of particles from its
//! template whenever the accumulator crosses a randomized threshold, and owns
//! the live particles in an ordered container. Expired particles go back to
//! the emitter's pool, which may be shared with other emitters.
//!
//! # Example
//!
//! ```rust
//! use ember_core::{FrameClock, ImageRegistry};
//! use ember_particles::{Emitter, EmitterOptions, ParticleOptions};
//!
//! let options = EmitterOptions::new()
//!     .with_emit_interval(0.1, 0.0)
//!     .with_emit_count(5.0, 0.0)
//!     .with_particle(ParticleOptions::new().with_velocity(0.0, -50.0).with_life(2.0, 0.0));
//!
//! let mut emitter = Emitter::new(&options, &ImageRegistry::new()).unwrap().with_seed(1);
//! emitter.start();
//!
//! let mut clock = FrameClock::new(10.0);
//! for _ in 0..5 {
//!     clock.advance(&mut emitter);
//! }
//! assert_eq!(emitter.live_count(), 25);
//! ```

use std::rc::Rc;

use ember_core::{Container, ImageRegistry, NodeId, Tick};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{EmitterConfig, EmitterOptions};
use crate::error::Result;
use crate::particle::{EmitterContext, Particle};
use crate::pool::{ParticlePool, PoolHandle};

/// Largest batch a single emission may spawn; larger sampled counts are
/// clamped
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Running totals for an emitter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitterStats {
    /// Emission batches triggered
    pub batches: u64,
    /// Particles added to the container
    pub spawned: u64,
    /// Spawns served from the pool instead of constructing
    pub recycled: u64,
    /// Particles that died in their own update
    pub expired: u64,
    /// Particles destroyed by `stop(true)` or `destroy_particle`
    pub destroyed: u64,
}

/// Particle emitter
pub struct Emitter {
    config: EmitterConfig,
    context: EmitterContext,
    particles: Container<Particle>,
    pool: PoolHandle,
    rng: StdRng,
    running: bool,
    emit_elapsed: f64,
    total_elapsed: f64,
    next_emit: f64,
    stats: EmitterStats,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::from_config(EmitterConfig::default(), ParticlePool::new().into_handle())
    }
}

impl Emitter {
    /// Create an idle emitter with its own pool
    pub fn new(options: &EmitterOptions, images: &ImageRegistry) -> Result<Self> {
        Self::with_pool(options, images, ParticlePool::new().into_handle())
    }

    /// Create an idle emitter that recycles through a shared pool
    pub fn with_pool(
        options: &EmitterOptions,
        images: &ImageRegistry,
        pool: PoolHandle,
    ) -> Result<Self> {
        let config = EmitterConfig::from_options(options, images)?;
        Ok(Self::from_config(config, pool))
    }

    /// Create an idle emitter from an already resolved configuration
    pub fn from_config(config: EmitterConfig, pool: PoolHandle) -> Self {
        warn_if_oversized(&config);
        let context = config.context();
        Self {
            config,
            context,
            particles: Container::new(),
            pool,
            rng: StdRng::from_entropy(),
            running: false,
            emit_elapsed: 0.0,
            total_elapsed: 0.0,
            next_emit: 0.0,
            stats: EmitterStats::default(),
        }
    }

    /// Use a deterministic random sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Merge options over the current configuration
    ///
    /// Takes effect for the next batch; particles already alive keep their
    /// sampled values but follow the new gravity. On error the configuration
    /// is unchanged.
    pub fn configure(&mut self, options: &EmitterOptions, images: &ImageRegistry) -> Result<()> {
        self.config.merge(options, images)?;
        self.context = self.config.context();
        warn_if_oversized(&self.config);
        tracing::debug!(
            "Emitter: configured (interval {}±{}s, count {}±{}, total {:?})",
            self.config.emit_interval.value,
            self.config.emit_interval.var,
            self.config.emit_count.value,
            self.config.emit_count.var,
            self.config.total_time
        );
        Ok(())
    }

    /// Start a fresh run, clearing any particles from the previous one
    pub fn start(&mut self) {
        self.stop(true);
        self.emit_elapsed = 0.0;
        self.total_elapsed = 0.0;
        self.running = true;
        self.next_emit = self.config.emit_interval.sample(&mut self.rng);
        tracing::debug!("Emitter: started, first batch after {:.3}s", self.next_emit);
    }

    /// Stop emitting
    ///
    /// With `clear`, every live particle is destroyed and returned to the
    /// pool; otherwise they keep aging out on their own.
    pub fn stop(&mut self, clear: bool) {
        self.running = false;
        if clear && !self.particles.is_empty() {
            let pool = Rc::clone(&self.pool);
            let cleared = self.release_all(&mut pool.borrow_mut());
            tracing::debug!("Emitter: stopped, cleared {} particles", cleared);
        }
    }

    fn release_all(&mut self, pool: &mut ParticlePool) -> usize {
        let stats = &mut self.stats;
        let mut cleared = 0usize;
        self.particles.drain_children(|_, particle| {
            pool.release(particle);
            stats.destroyed += 1;
            cleared += 1;
        });
        cleared
    }

    /// Advance the emission schedule by `dt_ms` milliseconds
    ///
    /// Does nothing while stopped. Live particles are advanced separately by
    /// [`Emitter::update_particles`].
    pub fn update(&mut self, dt_ms: u32) {
        if !self.running {
            return;
        }
        let dt = f64::from(dt_ms) / 1000.0;
        self.total_elapsed += dt;
        self.emit_elapsed += dt;

        if self.emit_elapsed >= self.next_emit {
            self.emit_elapsed = 0.0;
            self.next_emit = self.config.emit_interval.sample(&mut self.rng);
            self.emit();
        }

        if let Some(total) = self.config.total_time {
            if self.total_elapsed >= total {
                tracing::debug!(
                    "Emitter: total time {}s reached, {} particles left to expire",
                    total,
                    self.particles.len()
                );
                self.stop(false);
            }
        }
    }

    /// Advance every live particle, recycling the ones that expire
    pub fn update_particles(&mut self, dt_ms: u32) {
        let context = self.context;
        let mut pool = self.pool.borrow_mut();
        let stats = &mut self.stats;
        self.particles.retain_children(
            |_, particle| particle.update(dt_ms, &context),
            |_, particle| {
                stats.expired += 1;
                pool.release(particle);
            },
        );
    }

    /// Destroy a single live particle
    ///
    /// Returns `false` if the id does not belong to a live particle of this
    /// emitter, so destroying twice is harmless.
    pub fn destroy_particle(&mut self, id: NodeId) -> bool {
        let Some(mut particle) = self.particles.remove_child(id) else {
            return false;
        };
        particle.destroy();
        self.pool.borrow_mut().release(particle);
        self.stats.destroyed += 1;
        true
    }

    fn emit(&mut self) {
        let count = self.batch_size();
        let mut pool = self.pool.borrow_mut();
        for _ in 0..count {
            if !pool.is_empty() {
                self.stats.recycled += 1;
            }
            let particle = pool.acquire(&self.config.particle, &self.context, &mut self.rng);
            self.particles.add_child(particle);
        }
        self.stats.batches += 1;
        self.stats.spawned += count as u64;
        tracing::trace!(
            "Emitter: batch of {} ({} live, {} pooled)",
            count,
            self.particles.len(),
            pool.len()
        );
    }

    fn batch_size(&mut self) -> usize {
        let count = self.config.emit_count.sample(&mut self.rng).round();
        if count >= MAX_BATCH_SIZE as f64 {
            MAX_BATCH_SIZE
        } else if count > 0.0 {
            count as usize
        } else {
            0
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Origin and gravity as seen by this emitter's particles
    pub fn context(&self) -> &EmitterContext {
        &self.context
    }

    /// Live particles in draw order
    pub fn particles(&self) -> impl Iterator<Item = (NodeId, &Particle)> + '_ {
        self.particles.iter()
    }

    pub fn particle(&self, id: NodeId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn live_count(&self) -> usize {
        self.particles.len()
    }

    pub fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Zero the running totals; they otherwise persist across `start`
    pub fn reset_stats(&mut self) {
        self.stats = EmitterStats::default();
    }

    /// Seconds accumulated since the last batch
    pub fn emit_elapsed(&self) -> f64 {
        self.emit_elapsed
    }

    /// Seconds accumulated since `start`
    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    /// Accumulated seconds at which the next batch fires
    pub fn next_emit_threshold(&self) -> f64 {
        self.next_emit
    }
}

impl Tick for Emitter {
    /// Emitter schedule first, then its particles, so a batch spawned this
    /// frame is also advanced this frame
    fn tick(&mut self, dt_ms: u32) {
        self.update(dt_ms);
        self.update_particles(dt_ms);
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        // Hand live particles to whoever else holds the pool
        if Rc::strong_count(&self.pool) == 1 || self.particles.is_empty() {
            return;
        }
        let handle = Rc::clone(&self.pool);
        let Ok(mut pool) = handle.try_borrow_mut() else {
            tracing::warn!(
                "Emitter: pool is borrowed during drop, discarding {} live particles",
                self.particles.len()
            );
            return;
        };
        self.release_all(&mut pool);
    }
}

fn warn_if_oversized(config: &EmitterConfig) {
    if config.emit_count.max() > MAX_BATCH_SIZE as f64 {
        tracing::warn!(
            "Emitter: batch size up to {} will be clamped to {}",
            config.emit_count.max(),
            MAX_BATCH_SIZE
        );
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("running", &self.running)
            .field("live", &self.particles.len())
            .field("emit_elapsed", &self.emit_elapsed)
            .field("total_elapsed", &self.total_elapsed)
            .field("next_emit", &self.next_emit)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleOptions;
    use crate::particle::ParticleUid;
    use ember_core::Vec2;

    fn seeded(options: EmitterOptions) -> Emitter {
        Emitter::new(&options, &ImageRegistry::new())
            .unwrap()
            .with_seed(7)
    }

    fn steady() -> EmitterOptions {
        EmitterOptions::new()
            .with_emit_interval(0.2, 0.0)
            .with_emit_count(10.0, 0.0)
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut emitter = seeded(steady());
        for _ in 0..20 {
            emitter.tick(100);
        }
        assert!(!emitter.is_running());
        assert_eq!(emitter.emit_elapsed(), 0.0);
        assert_eq!(emitter.total_elapsed(), 0.0);
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.stats(), EmitterStats::default());
    }

    #[test]
    fn test_start_resets_accumulators() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.update(150);
        assert!(emitter.total_elapsed() > 0.0);

        emitter.start();
        assert!(emitter.is_running());
        assert_eq!(emitter.emit_elapsed(), 0.0);
        assert_eq!(emitter.total_elapsed(), 0.0);
        assert_eq!(emitter.next_emit_threshold(), 0.2);
    }

    #[test]
    fn test_five_batches_in_one_second() {
        let mut emitter = seeded(steady());
        emitter.start();
        for _ in 0..10 {
            emitter.tick(100);
        }

        let stats = emitter.stats();
        assert_eq!(stats.batches, 5);
        assert_eq!(stats.spawned, 50);
        assert_eq!(emitter.live_count(), 50);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_batch_size_variance_is_rounded_and_clamped() {
        let mut emitter = seeded(
            EmitterOptions::new()
                .with_emit_interval(0.0, 0.0)
                .with_emit_count(-3.0, 2.0),
        );
        emitter.start();
        for _ in 0..50 {
            emitter.update(10);
        }
        assert_eq!(emitter.stats().batches, 50);
        assert_eq!(emitter.live_count(), 0);

        let mut emitter = seeded(
            EmitterOptions::new()
                .with_emit_interval(0.0, 0.0)
                .with_emit_count(2.0, 0.4),
        );
        emitter.start();
        for _ in 0..20 {
            emitter.update(10);
        }
        // 1.6..=2.4 always rounds to 2
        assert_eq!(emitter.live_count(), 40);
    }

    #[test]
    fn test_oversized_batches_are_clamped() {
        let mut emitter = seeded(
            EmitterOptions::new()
                .with_emit_interval(0.0, 0.0)
                .with_emit_count(1e12, 0.0),
        );
        emitter.start();
        emitter.update(10);
        assert_eq!(emitter.live_count(), MAX_BATCH_SIZE);
        assert_eq!(emitter.stats().batches, 1);

        // value + variance can overflow to infinity
        let mut emitter = seeded(
            EmitterOptions::new()
                .with_emit_interval(0.0, 0.0)
                .with_emit_count(f64::MAX, f64::MAX),
        );
        emitter.start();
        for _ in 0..3 {
            emitter.update(10);
        }
        assert_eq!(emitter.stats().batches, 3);
        assert!(emitter.live_count() <= 3 * MAX_BATCH_SIZE);
    }

    #[test]
    fn test_stop_with_clear_recycles_everything() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);
        assert_eq!(emitter.live_count(), 10);

        emitter.stop(true);
        assert!(!emitter.is_running());
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.pool().borrow().len(), 10);
        assert_eq!(emitter.stats().destroyed, 10);
    }

    #[test]
    fn test_stop_without_clear_lets_particles_age_out() {
        let mut emitter = seeded(steady().with_particle(ParticleOptions::new().with_life(0.5, 0.0)));
        emitter.start();
        emitter.tick(200);
        emitter.stop(false);
        assert!(!emitter.is_running());
        assert_eq!(emitter.live_count(), 10);

        // No new batches, existing ones expire after their half second
        emitter.tick(250);
        assert_eq!(emitter.live_count(), 10);
        emitter.tick(250);
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.stats().batches, 1);
        assert_eq!(emitter.stats().expired, 10);
        assert_eq!(emitter.pool().borrow().len(), 10);
    }

    #[test]
    fn test_total_time_stops_emission() {
        let mut emitter = seeded(steady().with_total_time(0.45));
        emitter.start();
        for _ in 0..10 {
            emitter.tick(100);
        }
        assert!(!emitter.is_running());
        // Batches at 0.2s and 0.4s only
        assert_eq!(emitter.stats().batches, 2);
    }

    #[test]
    fn test_non_positive_total_time_never_stops() {
        for total in [0.0, -5.0] {
            let mut emitter = seeded(steady().with_total_time(total));
            emitter.start();
            for _ in 0..100 {
                emitter.update(100);
            }
            assert!(emitter.is_running());
            assert_eq!(emitter.stats().batches, 50);
        }
    }

    #[test]
    fn test_restart_clears_previous_run() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);
        assert_eq!(emitter.live_count(), 10);

        emitter.start();
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.pool().borrow().len(), 10);

        // The next batch is served from the pool
        emitter.tick(200);
        assert_eq!(emitter.live_count(), 10);
        assert_eq!(emitter.stats().recycled, 10);
        assert_eq!(emitter.pool().borrow().created(), 10);
    }

    #[test]
    fn test_stats_persist_until_reset() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);
        emitter.start();
        emitter.tick(200);
        assert_eq!(emitter.stats().batches, 2);
        assert_eq!(emitter.stats().destroyed, 10);

        emitter.reset_stats();
        assert_eq!(emitter.stats(), EmitterStats::default());
        assert_eq!(emitter.live_count(), 10);
    }

    #[test]
    fn test_destroy_particle_is_idempotent() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);

        let (id, uid) = emitter
            .particles()
            .map(|(id, p)| (id, p.uid()))
            .next()
            .unwrap();
        assert!(emitter.destroy_particle(id));
        assert!(!emitter.destroy_particle(id));

        assert_eq!(emitter.live_count(), 9);
        let pool = emitter.pool().borrow();
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(uid));
    }

    #[test]
    fn test_configure_while_running() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);

        emitter
            .configure(
                &EmitterOptions::new()
                    .with_origin(50.0, 60.0)
                    .with_gravity(0.0, 9.8),
                &ImageRegistry::new(),
            )
            .unwrap();
        assert!(emitter.is_running());
        assert_eq!(emitter.context().gravity, Vec2::new(0.0, 9.8));

        emitter.tick(200);
        let newest = emitter.particles().last().unwrap().1;
        // Spawned at the new origin, then moved by one frame of gravity
        assert_eq!(newest.position().x, 50.0);
        assert!(newest.position().y > 60.0);
    }

    #[test]
    fn test_configure_error_keeps_old_config() {
        let mut emitter = seeded(steady());
        let before = emitter.config().clone();
        let result = emitter.configure(
            &EmitterOptions::new()
                .with_emit_count(1.0, 0.0)
                .with_particle(ParticleOptions::new().with_image("missing")),
            &ImageRegistry::new(),
        );
        assert!(result.is_err());
        assert_eq!(emitter.config(), &before);
    }

    #[test]
    fn test_stop_with_clear_keeps_pool_uids_unique() {
        let mut emitter = seeded(steady());
        emitter.start();
        emitter.tick(200);
        emitter.tick(200);
        emitter.stop(true);
        emitter.start();
        emitter.tick(200);
        emitter.stop(true);

        let pool = emitter.pool().borrow();
        assert_eq!(pool.len(), 20);
        assert_eq!(pool.created(), 20);
        for uid in (0..20).map(ParticleUid) {
            assert!(pool.contains(uid), "{uid:?}");
        }
    }

    #[test]
    fn test_drop_while_pool_is_borrowed() {
        let pool = ParticlePool::new().into_handle();
        let mut emitter =
            Emitter::with_pool(&steady(), &ImageRegistry::new(), Rc::clone(&pool)).unwrap();
        emitter.start();
        emitter.tick(200);
        assert_eq!(emitter.live_count(), 10);

        {
            let guard = pool.borrow();
            drop(emitter);
            assert!(guard.is_empty());
        }
        // The live particles were discarded rather than handed back
        assert!(pool.borrow().is_empty());
        assert_eq!(pool.borrow().created(), 10);
    }

    #[test]
    fn test_shared_pool_receives_particles_on_drop() {
        let pool = ParticlePool::new().into_handle();
        {
            let mut emitter =
                Emitter::with_pool(&steady(), &ImageRegistry::new(), Rc::clone(&pool)).unwrap();
            emitter.start();
            emitter.tick(200);
        }
        assert_eq!(pool.borrow().len(), 10);
    }
}
