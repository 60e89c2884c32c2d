//! End-to-end scenarios over the whole simulation core: launch-to-burst
//! timing, whole-batch retirement, and the statistical shape of the
//! burst sampling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skyburst_core::{profile, FireworkKind, SceneEvent, SceneEventBus, World};
use skyburst_shared::{grid, SimConfig, SimMode, Vec3};

fn world_with(config: SimConfig) -> (World, skyburst_core::SceneEventReceiver) {
    let bus = SceneEventBus::new(4096);
    let world = World::new(config, bus.sender()).unwrap();
    (world, bus.receiver())
}

/// Scenario A: a peony rocket launched at the origin must vanish on
/// exactly the frame its up-axis position reaches the explosion height,
/// replaced by one full batch at the snapped detonation point.
#[test]
fn test_rocket_explodes_on_the_predicted_frame() {
    let config = SimConfig::default();
    let (mut world, _receiver) = world_with(config);

    world.launch(FireworkKind::Peony, Vec3::ZERO);
    let velocity = world.rockets()[0].velocity;

    // Mirror the integration: one add per axis per frame, dt = 1.
    let mut mirror = Vec3::ZERO;
    let mut expected_frames = 0u32;
    while mirror.y < config.explosion_height {
        mirror += velocity;
        expected_frames += 1;
    }
    assert!(
        (22..=30).contains(&expected_frames),
        "ascent speed out of expected range: {expected_frames} frames"
    );

    for frame in 1..=expected_frames {
        assert_eq!(world.rocket_count(), 1, "rocket gone early at frame {frame}");
        assert_eq!(world.batch_count(), 0, "batch spawned early at frame {frame}");
        world.advance_frame();
    }

    assert_eq!(world.rocket_count(), 0, "rocket survived its trigger frame");
    assert_eq!(world.batch_count(), 1);

    let batch = &world.batches()[0];
    assert_eq!(batch.particle_count(), config.particle_count);
    let expected_origin = Vec3::new(
        grid::snap(mirror.x, config.grid_size),
        grid::snap(mirror.y, config.grid_size),
        grid::snap(mirror.z, config.grid_size),
    );
    assert_eq!(batch.origin, expected_origin);
}

/// Scenario B: with decay 0.96 and threshold 0.05 a batch must survive
/// frame 73 and be retired on frame 74 exactly.
#[test]
fn test_batch_retires_on_frame_74() {
    let (mut world, receiver) = world_with(SimConfig::default());
    world.detonate(FireworkKind::Chrysanthemum, Vec3::new(0.0, 8.0, 0.0));
    let _ = receiver.drain();

    let mut previous_alpha = world.batches()[0].alpha;
    for frame in 1..=73 {
        world.advance_frame();
        assert_eq!(world.batch_count(), 1, "batch retired early at frame {frame}");
        let alpha = world.batches()[0].alpha;
        assert!(alpha < previous_alpha, "alpha not strictly decreasing");
        previous_alpha = alpha;
    }

    world.advance_frame();
    assert_eq!(world.batch_count(), 0, "batch not retired on frame 74");
    assert!(matches!(
        receiver.drain().as_slice(),
        [SceneEvent::BatchRetired { .. }]
    ));
}

/// The particle count never changes over a batch's life.
#[test]
fn test_particle_count_is_fixed_for_life() {
    let config = SimConfig::default();
    let (mut world, _receiver) = world_with(config);
    world.detonate(FireworkKind::Willow, Vec3::ZERO);

    while world.batch_count() > 0 {
        assert_eq!(world.batches()[0].particle_count(), config.particle_count);
        assert_eq!(world.live_particles(), config.particle_count);
        world.advance_frame();
    }
}

/// Every particle's render position stays the snap of its continuous
/// position, frame after frame.
#[test]
fn test_particle_render_positions_are_snapped() {
    let config = SimConfig::default();
    let (mut world, _receiver) = world_with(config);
    world.detonate(FireworkKind::Peony, Vec3::new(1.37, 4.2, 0.0));

    for _ in 0..20 {
        world.advance_frame();
        if world.batch_count() == 0 {
            break;
        }
        let batch = &world.batches()[0];
        for (true_pos, render_pos) in batch
            .true_positions
            .iter()
            .zip(batch.render_positions.iter())
        {
            assert_eq!(*render_pos, grid::snap(*true_pos, config.grid_size));
        }
    }
}

/// A planar burst never leaves the X-Y plane: gravity pulls on Y and
/// every Z velocity is zero.
#[test]
fn test_planar_burst_stays_in_plane() {
    let (mut world, _receiver) = world_with(SimConfig::default());
    world.detonate(FireworkKind::MultiBreak, Vec3::new(0.0, 6.0, 0.0));

    for _ in 0..10 {
        world.advance_frame();
        if world.batch_count() == 0 {
            break;
        }
        let batch = &world.batches()[0];
        for chunk in batch.true_positions.chunks_exact(3) {
            assert_eq!(chunk[2], 0.0);
        }
    }
}

/// The uniform-sphere sampler must give a z-component uniform in
/// [-1, 1]. Kolmogorov-Smirnov against the uniform CDF over 100k draws;
/// naive angle-pair sampling fails this with D around 0.2.
#[test]
fn test_sphere_sampling_z_is_uniform() {
    const SAMPLES: usize = 100_000;
    let mut rng = ChaCha8Rng::seed_from_u64(424_242);

    let mut z_values = Vec::with_capacity(SAMPLES);
    for index in 0..SAMPLES {
        let dir = profile::sample_direction(SimMode::Volumetric, index, SAMPLES, &mut rng);
        assert!((dir.length() - 1.0).abs() < 1e-4, "direction not unit length");
        z_values.push(dir.z);
    }
    z_values.sort_by(f32::total_cmp);

    let n = SAMPLES as f64;
    let mut d_statistic = 0.0f64;
    for (i, z) in z_values.iter().enumerate() {
        let cdf = (f64::from(*z) + 1.0) / 2.0;
        let above = ((i + 1) as f64 / n - cdf).abs();
        let below = (cdf - i as f64 / n).abs();
        d_statistic = d_statistic.max(above).max(below);
    }

    // Critical value at alpha = 0.05 is 1.36 / sqrt(n) ~= 0.0043; allow
    // a little slack for f32 quantization.
    assert!(
        d_statistic < 0.006,
        "z-component not uniform: D = {d_statistic}"
    );
}

/// Launch and detonation events arrive in lifecycle order.
#[test]
fn test_scene_events_follow_the_lifecycle() {
    let (mut world, receiver) = world_with(SimConfig::default());
    world.launch(FireworkKind::Ring, Vec3::ZERO);

    for _ in 0..40 {
        world.advance_frame();
        if world.rocket_count() == 0 {
            break;
        }
    }
    assert_eq!(world.rocket_count(), 0);

    let events = receiver.drain();
    assert!(matches!(events[0], SceneEvent::RocketLaunched { .. }));
    assert!(matches!(events[1], SceneEvent::RocketExploded { .. }));
    assert!(matches!(events[2], SceneEvent::BatchSpawned { .. }));
}
