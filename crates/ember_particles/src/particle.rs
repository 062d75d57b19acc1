//! Individual particle state and per-frame integration

use ember_core::{Point, VisualNode, Vec2};
use rand::Rng;

use crate::config::ParticleTemplate;

/// Age in seconds before opacity starts following its rate
///
/// Keeps a freshly spawned particle from flashing when it fades per frame.
pub const ALPHA_SETTLE_DELAY: f64 = 0.1;

/// Read-only view of the emitter a particle belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmitterContext {
    /// Offset added to every spawn position
    pub origin: Vec2,
    /// Acceleration shared by every particle of the emitter
    pub gravity: Vec2,
}

/// Pool-unique particle identity, stable across recycling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleUid(pub u64);

/// A single particle instance
///
/// Not `Clone`: a particle is either live in one container or waiting in one
/// pool, never both.
#[derive(Debug)]
pub struct Particle {
    uid: ParticleUid,
    /// Position, rotation, scale, opacity and sizing for the renderer
    pub node: VisualNode,
    /// Units per second
    pub velocity: Vec2,
    /// Local acceleration, added to the emitter's gravity
    pub acceleration: Vec2,
    /// Rotation change per update
    pub rotation_v: f64,
    /// Uniform scale, mirrored into the node on every update
    pub scale: f64,
    /// Scale change per update
    pub scale_v: f64,
    /// Opacity change per update once settled
    pub alpha_v: f64,
    /// Lifetime in seconds
    pub life: f64,
    age: f64,
    alive: bool,
}

impl Particle {
    /// A dead particle awaiting its first `initialize`
    pub(crate) fn new(uid: ParticleUid) -> Self {
        Self {
            uid,
            node: VisualNode::default(),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            rotation_v: 0.0,
            scale: 1.0,
            scale_v: 0.0,
            alpha_v: 0.0,
            life: 1.0,
            age: 0.0,
            alive: false,
        }
    }

    pub fn uid(&self) -> ParticleUid {
        self.uid
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Seconds since the particle was (re)initialized
    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn position(&self) -> Vec2 {
        self.node.position
    }

    pub fn alpha(&self) -> f64 {
        self.node.alpha
    }

    /// Age as a fraction of lifetime, clamped to [0, 1]
    pub fn normalized_age(&self) -> f64 {
        if self.life > 0.0 {
            (self.age / self.life).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Bring the particle to life with freshly sampled values
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        template: &ParticleTemplate,
        emitter: &EmitterContext,
        rng: &mut R,
    ) {
        self.alive = true;
        self.age = 0.0;
        self.node = VisualNode::default();

        let x = template.x.sample(rng);
        let y = template.y.sample(rng);
        self.velocity = Vec2::new(template.vx.sample(rng), template.vy.sample(rng));
        self.acceleration = Vec2::new(template.ax.sample(rng), template.ay.sample(rng));
        self.node.rotation = template.rotation.sample(rng);
        self.rotation_v = template.rotation_v.sample(rng);
        self.scale = template.scale.sample(rng);
        self.scale_v = template.scale_v.sample(rng);
        self.node.alpha = template.alpha.sample(rng);
        self.alpha_v = template.alpha_v.sample(rng);
        self.life = template.life.sample(rng);

        self.node.position = Vec2::new(x, y) + emitter.origin;
        self.node.set_uniform_scale(self.scale);

        if let Some(image) = template.image {
            let frame = template.pick_frame(rng);
            self.node.set_image(image, frame);
            let size = self.node.size;
            self.node.pivot = Point::new(
                template.pivot_x.map_or(0.0, |px| px * size.width),
                template.pivot_y.map_or(0.0, |py| py * size.height),
            );
        }
    }

    /// Advance the particle by `dt_ms` milliseconds
    ///
    /// Returns `false` once the particle is dead, destroying it on the update
    /// where it expires. Dead particles are left untouched.
    pub fn update(&mut self, dt_ms: u32, emitter: &EmitterContext) -> bool {
        if !self.alive {
            return false;
        }
        let dt = f64::from(dt_ms) / 1000.0;

        // Velocity first, then position from the new velocity
        let acceleration = self.acceleration + emitter.gravity;
        self.velocity += acceleration * dt;
        self.node.position += self.velocity * dt;

        self.node.rotation += self.rotation_v;

        if self.age > ALPHA_SETTLE_DELAY {
            self.node.alpha += self.alpha_v;
        }

        self.scale += self.scale_v;
        self.node.set_uniform_scale(self.scale);

        self.age += dt;
        if self.age >= self.life || self.node.alpha <= 0.0 {
            self.destroy();
            return false;
        }
        true
    }

    /// Mark the particle dead
    ///
    /// Returns whether this call did the transition; destroying a dead
    /// particle changes nothing. The owning container is responsible for
    /// detaching it and handing it back to the pool.
    pub fn destroy(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.node.alpha = 0.0;
        true
    }
}
