//! Particle recycling
//!
//! Dead particles are moved into a `ParticlePool` instead of being dropped
//! and handed out again on the next emission. Because particles move by
//! value between the container and the pool, a particle can only ever be in
//! one of the two places.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use crate::config::ParticleTemplate;
use crate::particle::{EmitterContext, Particle, ParticleUid};

/// Shared pool handle
///
/// Emitters run on the host's tick thread only, so the handle is
/// deliberately not `Send`.
pub type PoolHandle = Rc<RefCell<ParticlePool>>;

/// Free list of dead particles
#[derive(Debug, Default)]
pub struct ParticlePool {
    free: Vec<Particle>,
    created: u64,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            created: 0,
        }
    }

    /// Wrap the pool in a handle that several emitters can share
    pub fn into_handle(self) -> PoolHandle {
        Rc::new(RefCell::new(self))
    }

    /// Hand out an initialized particle, reusing the most recently released
    /// one when available
    pub fn acquire<R: Rng + ?Sized>(
        &mut self,
        template: &ParticleTemplate,
        emitter: &EmitterContext,
        rng: &mut R,
    ) -> Particle {
        let mut particle = match self.free.pop() {
            Some(particle) => particle,
            None => self.construct(),
        };
        particle.initialize(template, emitter, rng);
        particle
    }

    /// Take back a particle
    ///
    /// A particle that is still alive is destroyed first so stale state can
    /// never be drawn.
    pub fn release(&mut self, mut particle: Particle) {
        particle.destroy();
        self.free.push(particle);
    }

    /// Construct `count` dead particles up front so early bursts do not
    /// allocate
    pub fn prewarm(&mut self, count: usize) {
        self.free.reserve(count);
        for _ in 0..count {
            let particle = self.construct();
            self.free.push(particle);
        }
        tracing::debug!(
            "ParticlePool: prewarmed {} particles ({} free)",
            count,
            self.free.len()
        );
    }

    /// Drop free particles beyond `max`
    pub fn shrink_to(&mut self, max: usize) {
        if self.free.len() > max {
            let dropped = self.free.len() - max;
            self.free.truncate(max);
            self.free.shrink_to_fit();
            tracing::debug!("ParticlePool: dropped {} free particles", dropped);
        }
    }

    /// Number of particles waiting for reuse
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Particles ever constructed by this pool
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Whether a particle with this uid is waiting in the pool
    pub fn contains(&self, uid: ParticleUid) -> bool {
        self.free.iter().any(|p| p.uid() == uid)
    }

    fn construct(&mut self) -> Particle {
        let uid = ParticleUid(self.created);
        self.created += 1;
        Particle::new(uid)
    }
}
