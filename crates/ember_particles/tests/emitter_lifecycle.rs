//! End-to-end emitter behavior driven through the host tick contract

use std::rc::Rc;

use ember_core::{FrameClock, ImageRegistry, Size, Tick};
use ember_particles::{
    Emitter, EmitterOptions, ParticleError, ParticleOptions, ParticlePool,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("ember_particles=debug")
        .try_init();
}

fn steady(life: f64) -> EmitterOptions {
    EmitterOptions::new()
        .with_emit_interval(0.2, 0.0)
        .with_emit_count(10.0, 0.0)
        .with_particle(ParticleOptions::new().with_life(life, 0.0))
}

#[test]
fn test_steady_state_population() {
    init_tracing();
    let mut emitter = Emitter::new(&steady(1.0), &ImageRegistry::new())
        .unwrap()
        .with_seed(1);
    emitter.start();

    // 10 particles every 0.2s living 1s: the population settles at 50
    for _ in 0..100 {
        emitter.tick(50);
    }
    let live = emitter.live_count();
    assert!((40..=50).contains(&live), "live = {live}");

    let stats = emitter.stats();
    assert_eq!(stats.spawned, stats.expired + live as u64);
    // Everything after the first second is served from the pool
    assert!(stats.recycled > 0);
    assert!(emitter.pool().borrow().created() <= 60);
}

#[test]
fn test_particle_expires_into_pool_once() {
    init_tracing();
    let options = EmitterOptions::new()
        .with_emit_interval(0.25, 0.0)
        .with_emit_count(1.0, 0.0)
        .with_total_time(0.25)
        .with_particle(ParticleOptions::new().with_life(1.0, 0.0));
    let mut emitter = Emitter::new(&options, &ImageRegistry::new()).unwrap();
    emitter.start();

    emitter.tick(250);
    assert!(!emitter.is_running());
    let (id, uid) = emitter
        .particles()
        .map(|(id, p)| (id, p.uid()))
        .next()
        .unwrap();

    for _ in 0..3 {
        emitter.tick(250);
    }
    assert_eq!(emitter.live_count(), 0);
    assert_eq!(emitter.stats().expired, 1);

    // Destroying the already recycled particle does not add a second entry
    assert!(!emitter.destroy_particle(id));
    let pool = emitter.pool().borrow();
    assert_eq!(pool.len(), 1);
    assert!(pool.contains(uid));
}

#[test]
fn test_shared_pool_between_emitters() {
    init_tracing();
    let images = ImageRegistry::new();
    let pool = ParticlePool::new().into_handle();

    let mut first = Emitter::with_pool(&steady(0.1), &images, Rc::clone(&pool))
        .unwrap()
        .with_seed(2);
    let mut second = Emitter::with_pool(&steady(5.0), &images, Rc::clone(&pool))
        .unwrap()
        .with_seed(3);

    first.start();
    first.tick(200);
    first.tick(100);
    first.stop(false);
    assert_eq!(first.live_count(), 0);
    assert_eq!(pool.borrow().len(), 10);

    // The second emitter picks up what the first one released
    second.start();
    second.tick(200);
    assert_eq!(second.stats().recycled, 10);
    assert_eq!(pool.borrow().created(), 10);
    assert!(pool.borrow().is_empty());
}

#[test]
fn test_frame_clock_drives_emitter() {
    init_tracing();
    let mut emitter = Emitter::new(&steady(10.0), &ImageRegistry::new())
        .unwrap()
        .with_seed(4);
    emitter.start();

    let mut clock = FrameClock::new(60.0);
    while clock.elapsed_ms() < 1000 {
        clock.advance(&mut emitter);
    }
    assert_eq!(clock.frames(), 60);
    assert!((emitter.total_elapsed() - 1.0).abs() < 1e-9);
    // 16/17ms frames cross 0.2s a little late, so batches drift
    let batches = emitter.stats().batches;
    assert!((4..=5).contains(&batches), "batches = {batches}");
}

#[test]
fn test_json_options_with_images() {
    init_tracing();
    let mut images = ImageRegistry::new();
    images.register("sparks", 64.0, 16.0);

    let options = EmitterOptions::from_json_str(
        r#"{
            "emitTime": 0.1,
            "emitNum": 4,
            "emitterX": 200,
            "emitterY": 100,
            "particle": {
                "image": "sparks",
                "frame": [[0, 0, 16, 16], [16, 0, 16, 16], [32, 0, 16, 16], [48, 0, 16, 16]],
                "pivotX": 0.5,
                "pivotY": 0.5,
                "life": 3
            }
        }"#,
    )
    .unwrap();

    let mut emitter = Emitter::new(&options, &images).unwrap().with_seed(5);
    emitter.start();
    for _ in 0..10 {
        emitter.tick(100);
    }

    assert_eq!(emitter.live_count(), 40);
    for (_, particle) in emitter.particles() {
        assert_eq!(particle.node.size, Size::new(16.0, 16.0));
        assert_eq!(particle.node.pivot.x, 8.0);
        let drawable = particle.node.drawable.unwrap();
        assert_eq!(drawable.image, images.get("sparks").unwrap());
        assert_eq!(drawable.rect.y(), 0.0);
        assert_eq!(particle.position(), ember_core::Vec2::new(200.0, 100.0));
    }
    let distinct_frames = {
        let mut xs: Vec<i64> = emitter
            .particles()
            .map(|(_, p)| p.node.drawable.unwrap().rect.x() as i64)
            .collect();
        xs.sort_unstable();
        xs.dedup();
        xs.len()
    };
    assert!(distinct_frames > 1);
}

#[test]
fn test_missing_image_is_reported_at_configure() {
    init_tracing();
    let mut emitter = Emitter::new(&steady(1.0), &ImageRegistry::new()).unwrap();
    let err = emitter
        .configure(
            &EmitterOptions::new().with_particle(ParticleOptions::new().with_image("ghost")),
            &ImageRegistry::new(),
        )
        .unwrap_err();
    assert_eq!(err, ParticleError::MissingImage("ghost".into()));
    assert_eq!(err.to_string(), "Image not registered: ghost");

    // The emitter still runs on its previous template
    emitter.start();
    emitter.tick(200);
    assert_eq!(emitter.live_count(), 10);
}

#[test]
fn test_tick_is_object_safe() {
    let mut emitters: Vec<Box<dyn Tick>> = vec![
        Box::new(Emitter::new(&steady(1.0), &ImageRegistry::new()).unwrap()),
        Box::new(Emitter::default()),
    ];
    for emitter in &mut emitters {
        emitter.tick(16);
    }
}
