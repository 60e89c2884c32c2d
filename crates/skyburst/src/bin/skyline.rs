//! # Skyline Demo
//!
//! Headless golden-path run: save a lineup of placements, launch them
//! all, drive the loop until the sky is empty again, and print the frame
//! statistics plus the bridge's resource tallies.
//!
//! Run with: cargo run --bin skyline [-- path/to/config.toml]

use std::path::Path;

use skyburst::{DriverBuilder, PlacementStore, RendererBridge};
use skyburst_core::FireworkKind;
use skyburst_shared::SimConfig;

/// Frames after which the run is abandoned as stuck.
const MAX_FRAMES: usize = 2_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(Path::new(&path))?,
        None => SimConfig::default(),
    };

    let mut driver = DriverBuilder::new(config).fallback_to_scalar(true).build()?;
    let mut bridge = RendererBridge::new(driver.events());

    // The lineup a user might click together.
    let store = PlacementStore::new();
    let lineup = [
        (FireworkKind::Peony, -6.0),
        (FireworkKind::Chrysanthemum, -3.0),
        (FireworkKind::Willow, 0.0),
        (FireworkKind::Ring, 3.0),
        (FireworkKind::Palm, 6.0),
        (FireworkKind::MultiBreak, 9.0),
    ];
    for (kind, x) in lineup {
        let _ = store.add(kind, x, -8.0);
    }

    let queued = driver.launch_all(&store.snapshot());
    println!("launching {queued} fireworks");

    let mut frames = 0;
    loop {
        if driver.step(1.0).is_none() {
            break;
        }
        bridge.process_events();
        frames += 1;

        let world = driver.world();
        let show_over = frames > 1 && world.rocket_count() == 0 && world.batch_count() == 0;
        if show_over || frames >= MAX_FRAMES {
            break;
        }
    }

    driver.stop();
    bridge.process_events();

    println!();
    println!("show complete after {frames} frames");
    driver.stats().print_summary();
    println!("┌─ RENDERER BRIDGE ──────────────────────────────────┐");
    println!("│ Drawables created: {}", bridge.created_count());
    println!("│ Drawables disposed: {}", bridge.disposed_count());
    println!(
        "│ Live at exit:      {} rockets, {} batches",
        bridge.live_rockets(),
        bridge.live_batches()
    );
    println!("└────────────────────────────────────────────────────┘");

    Ok(())
}
