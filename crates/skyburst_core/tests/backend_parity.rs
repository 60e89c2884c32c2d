//! The two numeric backends implement one physics contract. These tests
//! run identical sessions through both and require agreement, plus the
//! zero-entity no-op guarantees.

use skyburst_core::{FireworkKind, SceneEventBus, World};
use skyburst_shared::{BackendKind, SimConfig, SimMode, Vec3};

const TOLERANCE: f32 = 1e-4;

/// Runs a fixed-seed session and records every observable float:
/// rocket positions, batch render positions, batch alphas.
fn run_session(backend: BackendKind) -> Vec<f32> {
    let config = SimConfig {
        backend,
        mode: SimMode::Volumetric,
        rng_seed: 99,
        particle_count: 64,
        ..SimConfig::default()
    };
    let bus = SceneEventBus::new(4096);
    let mut world = World::new(config, bus.sender()).unwrap();
    assert_eq!(world.backend_kind(), backend);

    world.launch(FireworkKind::Peony, Vec3::new(-2.0, 0.0, 0.0));
    world.launch(FireworkKind::Willow, Vec3::new(2.0, 1.0, 0.5));
    world.launch(FireworkKind::MultiBreak, Vec3::new(0.0, -1.0, 0.0));

    let mut trace = Vec::new();
    for _ in 0..60 {
        world.advance_frame();
        for rocket in world.rockets() {
            trace.extend_from_slice(&rocket.true_position.to_array());
            trace.extend_from_slice(&rocket.render_position.to_array());
        }
        for batch in world.batches() {
            trace.push(batch.alpha);
            trace.extend_from_slice(&batch.true_positions);
            trace.extend_from_slice(&batch.render_positions);
        }
    }
    trace
}

/// Scenario D: same seed, same inputs, both backends; positions must
/// agree within a small numeric tolerance.
#[test]
fn test_backends_agree_on_the_same_session() {
    let scalar = run_session(BackendKind::Scalar);
    let batched = run_session(BackendKind::Batched);

    assert_eq!(scalar.len(), batched.len(), "sessions diverged structurally");
    assert!(!scalar.is_empty());

    for (index, (a, b)) in scalar.iter().zip(batched.iter()).enumerate() {
        assert!(
            (a - b).abs() <= TOLERANCE,
            "backends disagree at float {index}: {a} vs {b}"
        );
    }
}

/// Scenario C: an empty world advanced for 1000 frames touches no pool,
/// emits no event and never errors.
#[test]
fn test_empty_world_is_a_noop() {
    for backend in [BackendKind::Scalar, BackendKind::Batched] {
        let config = SimConfig {
            backend,
            ..SimConfig::default()
        };
        let bus = SceneEventBus::new(64);
        let receiver = bus.receiver();
        let mut world = World::new(config, bus.sender()).unwrap();

        for _ in 0..1000 {
            world.advance_frame();
        }

        assert_eq!(world.rocket_count(), 0);
        assert_eq!(world.batch_count(), 0);
        assert_eq!(world.backend_rocket_slots(), 0);
        assert_eq!(world.backend_batch_slots(), 0);
        assert_eq!(receiver.pending_count(), 0);
    }
}

/// Pools are fully reclaimed after a session drains: every rocket slot
/// and batch slot goes back once the show ends.
#[test]
fn test_pools_drain_with_the_show() {
    for backend in [BackendKind::Scalar, BackendKind::Batched] {
        let config = SimConfig {
            backend,
            particle_count: 32,
            ..SimConfig::default()
        };
        let bus = SceneEventBus::new(4096);
        let mut world = World::new(config, bus.sender()).unwrap();

        world.launch(FireworkKind::Ring, Vec3::ZERO);
        world.launch(FireworkKind::Palm, Vec3::new(3.0, 0.0, 0.0));

        // Long enough for ascent (~30 frames) plus full fade (74 frames).
        for _ in 0..150 {
            world.advance_frame();
        }

        assert_eq!(world.rocket_count(), 0);
        assert_eq!(world.batch_count(), 0);
        assert_eq!(world.backend_rocket_slots(), 0);
        assert_eq!(world.backend_batch_slots(), 0);
    }
}
