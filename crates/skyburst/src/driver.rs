//! # Frame Driver
//!
//! The cooperative loop at the top of every frame:
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. DELTA TIME                                                │
//! │    └─ elapsed since frame N-1, in unit frames, clamped       │
//! │ 2. INTENTS                                                   │
//! │    └─ drain queued launches into the world                   │
//! │ 3. ADVANCE                                                   │
//! │    ├─ rockets (may detonate into batches)                    │
//! │    └─ batches (may retire)                                   │
//! │ 4. HANDOFF                                                   │
//! │    └─ world views + scene events for the renderer            │
//! │ 5. STATS                                                     │
//! │    └─ record timing, warn past budget                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-threaded and cooperative: the input layer only enqueues intents,
//! it never mutates simulation state. `stop()` guarantees no further frame
//! runs and every live resource is released exactly once; `start()` after
//! a stop is a full reinitialization, and that boundary is the only legal
//! point to switch numeric backends.

use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;

use skyburst_core::{FireworkKind, SceneEventBus, SceneEventReceiver, World, WorldError};
use skyburst_shared::{BackendKind, SimConfig, Vec3};

use crate::placements::SavedPlacement;

/// Frame budget at the reference 60 Hz refresh, in microseconds.
pub const FRAME_BUDGET_US: u64 = 16_666;

/// Errors raised by driver construction and control.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Backends cannot be switched while entities may be live.
    #[error("backend switch requires a stopped driver")]
    SwitchWhileRunning,

    /// The underlying world could not be built.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Tunables for the frame loop.
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    /// The simulation configuration.
    pub sim: SimConfig,
    /// Scene event channel capacity.
    pub event_capacity: usize,
    /// Launch intent queue capacity.
    pub intent_capacity: usize,
    /// Refresh rate one unit frame corresponds to.
    pub reference_fps: f32,
    /// Upper bound on a single step's delta, in unit frames. Keeps a
    /// long pause from turning into a physics explosion.
    pub max_delta_frames: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            event_capacity: 1024,
            intent_capacity: 256,
            reference_fps: 60.0,
            max_delta_frames: 6.0,
        }
    }
}

/// One queued launch request.
#[derive(Clone, Copy, Debug)]
pub struct LaunchIntent {
    /// Firework kind to launch.
    pub kind: FireworkKind,
    /// Launch position in world coordinates.
    pub position: Vec3,
}

/// Clonable handle the input layer uses to enqueue launches.
#[derive(Clone)]
pub struct LaunchQueue {
    sender: Sender<LaunchIntent>,
}

impl LaunchQueue {
    /// Enqueues one launch. Returns `false` when the queue is full.
    pub fn push(&self, kind: FireworkKind, position: Vec3) -> bool {
        self.sender.try_send(LaunchIntent { kind, position }).is_ok()
    }
}

/// Timing and population numbers for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Wall time the frame took, in microseconds.
    pub total_us: u64,
    /// Launch intents processed this frame.
    pub launches: u32,
    /// Live rockets after the frame.
    pub rockets: usize,
    /// Live batches after the frame.
    pub batches: usize,
    /// Live particles after the frame.
    pub particles: usize,
}

/// Running aggregate over recorded frames.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Frames recorded.
    pub frames_recorded: u64,
    /// Sum of frame times in microseconds.
    pub total_us_sum: u64,
    /// Fastest frame seen.
    pub min_frame_us: u64,
    /// Slowest frame seen.
    pub max_frame_us: u64,
    /// Frames that blew the budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records one frame.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        if stats.total_us > FRAME_BUDGET_US {
            self.frames_over_budget += 1;
        }
    }

    /// Average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Average frames per second.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Prints a summary block to stdout.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_summary(&self) {
        println!("┌─ FRAME TIMING ─────────────────────────────────────┐");
        println!("│ Frames recorded:   {}", self.frames_recorded);
        println!(
            "│ Average frame:     {:.3} ms ({:.1} FPS)",
            self.avg_frame_ms(),
            self.avg_fps()
        );
        if self.frames_recorded > 0 {
            println!("│ Min frame:         {:.3} ms", self.min_frame_us as f64 / 1000.0);
            println!("│ Max frame:         {:.3} ms", self.max_frame_us as f64 / 1000.0);
        }
        println!(
            "│ Over budget:       {} frames (budget {:.3} ms)",
            self.frames_over_budget,
            FRAME_BUDGET_US as f64 / 1000.0
        );
        println!("└────────────────────────────────────────────────────┘");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`FrameDriver`]: the session's single backend selection
/// point.
pub struct DriverBuilder {
    config: DriverConfig,
    fallback_to_scalar: bool,
}

impl DriverBuilder {
    /// Starts a builder around a simulation config.
    #[must_use]
    pub fn new(sim: SimConfig) -> Self {
        Self {
            config: DriverConfig {
                sim,
                ..DriverConfig::default()
            },
            fallback_to_scalar: false,
        }
    }

    /// Overrides the scene event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Opts in to falling back to the scalar backend when the batched
    /// one fails to construct. Off by default: unavailability surfaces
    /// as an error unless the caller makes this choice.
    #[must_use]
    pub fn fallback_to_scalar(mut self, fallback: bool) -> Self {
        self.fallback_to_scalar = fallback;
        self
    }

    /// Builds the driver, running immediately.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] for an invalid configuration or an
    /// unavailable backend (unless the fallback opt-in applies).
    pub fn build(self) -> Result<FrameDriver, DriverError> {
        let mut config = self.config;
        let bus = SceneEventBus::new(config.event_capacity);

        let world = match World::new(config.sim, bus.sender()) {
            Ok(world) => world,
            Err(WorldError::Backend(err))
                if self.fallback_to_scalar && config.sim.backend == BackendKind::Batched =>
            {
                tracing::warn!(%err, "batched backend unavailable, falling back to scalar");
                let mut scalar_sim = config.sim;
                scalar_sim.backend = BackendKind::Scalar;
                World::new(scalar_sim, bus.sender())?
            }
            Err(err) => return Err(err.into()),
        };
        // Record the backend actually running so a restart rebuilds the
        // same session shape.
        config.sim.backend = world.backend_kind();

        let (intent_sender, intent_receiver) = bounded(config.intent_capacity);
        tracing::info!(backend = ?config.sim.backend, mode = ?config.sim.mode, "frame driver up");

        Ok(FrameDriver {
            config,
            world,
            bus,
            intent_sender,
            intent_receiver,
            stats: FrameStatsAccumulator::new(),
            frame_count: 0,
            last_tick: None,
            running: true,
        })
    }
}

/// The cooperative frame loop.
pub struct FrameDriver {
    config: DriverConfig,
    world: World,
    bus: SceneEventBus,
    intent_sender: Sender<LaunchIntent>,
    intent_receiver: Receiver<LaunchIntent>,
    stats: FrameStatsAccumulator,
    frame_count: u64,
    last_tick: Option<Instant>,
    running: bool,
}

impl FrameDriver {
    /// A handle for enqueueing launch intents.
    #[must_use]
    pub fn queue(&self) -> LaunchQueue {
        LaunchQueue {
            sender: self.intent_sender.clone(),
        }
    }

    /// A receiver for the scene event stream.
    #[must_use]
    pub fn events(&self) -> SceneEventReceiver {
        self.bus.receiver()
    }

    /// Enqueues a launch for every saved placement, in save order.
    /// Returns how many were queued.
    pub fn launch_all(&self, placements: &[SavedPlacement]) -> usize {
        let mut queued = 0;
        for placement in placements {
            let intent = LaunchIntent {
                kind: placement.kind,
                position: Vec3::new(placement.x, placement.y, 0.0),
            };
            if self.intent_sender.try_send(intent).is_err() {
                tracing::warn!(queued, "intent queue full, dropping remaining launches");
                break;
            }
            queued += 1;
        }
        queued
    }

    /// Runs one frame with an explicit delta, in unit frames.
    ///
    /// Returns `None` once the driver is stopped; no frame executes past
    /// a stop.
    pub fn step(&mut self, dt: f32) -> Option<FrameStats> {
        if !self.running {
            return None;
        }
        let frame_start = Instant::now();

        let mut launches = 0u32;
        while let Ok(intent) = self.intent_receiver.try_recv() {
            self.world.launch(intent.kind, intent.position);
            launches += 1;
        }

        self.world.advance(dt);

        let total_us = u64::try_from(frame_start.elapsed().as_micros()).unwrap_or(u64::MAX);
        let stats = FrameStats {
            frame: self.frame_count,
            total_us,
            launches,
            rockets: self.world.rocket_count(),
            batches: self.world.batch_count(),
            particles: self.world.live_particles(),
        };
        self.frame_count += 1;
        self.stats.record(stats);
        if total_us > FRAME_BUDGET_US {
            tracing::warn!(frame = stats.frame, total_us, "frame over budget");
        }
        Some(stats)
    }

    /// Runs one frame against real elapsed time.
    ///
    /// The first tick after a start uses a unit step; afterwards the
    /// elapsed wall time is converted to unit frames and clamped.
    pub fn tick(&mut self) -> Option<FrameStats> {
        let now = Instant::now();
        let dt = self.last_tick.map_or(1.0, |previous| {
            now.duration_since(previous).as_secs_f32() * self.config.reference_fps
        });
        self.last_tick = Some(now);
        self.step(dt.min(self.config.max_delta_frames))
    }

    /// Runs up to `frames` fixed steps, stopping early if stopped.
    pub fn run_frames(&mut self, frames: usize, dt: f32) {
        for _ in 0..frames {
            if self.step(dt).is_none() {
                break;
            }
        }
    }

    /// Stops the loop: no further frame executes and every live entity's
    /// resources are released. Idempotent.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.world.clear();
        self.running = false;
        self.last_tick = None;
        tracing::info!(frames = self.frame_count, "frame driver stopped");
    }

    /// Starts a stopped driver as a fresh session: new world, zeroed
    /// frame counter and statistics. A no-op while running.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] if the world cannot be rebuilt;
    /// the driver stays stopped in that case.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.running {
            return Ok(());
        }
        self.world = World::new(self.config.sim, self.bus.sender())?;
        self.frame_count = 0;
        self.stats = FrameStatsAccumulator::new();
        self.last_tick = None;
        self.running = true;
        tracing::info!(backend = ?self.config.sim.backend, "frame driver restarted");
        Ok(())
    }

    /// Selects a different numeric backend for the next session.
    ///
    /// Only legal at the stop/start boundary: ids mapping live entities
    /// onto a backend do not survive a switch.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::SwitchWhileRunning`] if called while the
    /// loop is running, or [`DriverError::World`] when the new backend
    /// cannot be constructed (the previous selection is kept).
    pub fn select_backend(&mut self, backend: BackendKind) -> Result<(), DriverError> {
        if self.running {
            return Err(DriverError::SwitchWhileRunning);
        }
        let mut sim = self.config.sim;
        sim.backend = backend;
        self.world = World::new(sim, self.bus.sender())?;
        self.config.sim.backend = backend;
        tracing::info!(backend = ?backend, "numeric backend selected");
        Ok(())
    }

    /// True while frames may execute.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Frames executed since the last start.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The aggregate frame statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// Read access to the simulation state for the renderer handoff.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The driver configuration.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulator_tracks_budget() {
        let mut accumulator = FrameStatsAccumulator::new();
        for i in 0..10 {
            accumulator.record(FrameStats {
                frame: i,
                total_us: 10_000 + i * 2_000,
                ..FrameStats::default()
            });
        }
        assert_eq!(accumulator.frames_recorded, 10);
        assert_eq!(accumulator.min_frame_us, 10_000);
        assert_eq!(accumulator.max_frame_us, 28_000);
        // Frames above 16.666 ms: 18k, 20k, ..., 28k.
        assert_eq!(accumulator.frames_over_budget, 6);
        assert!(accumulator.avg_fps() > 0.0);
    }

    #[test]
    fn test_queue_handle_feeds_the_next_step() {
        let mut driver = DriverBuilder::new(SimConfig::default()).build().unwrap();
        let queue = driver.queue();
        assert!(queue.push(FireworkKind::Peony, Vec3::ZERO));

        let stats = driver.step(1.0).unwrap();
        assert_eq!(stats.launches, 1);
        assert_eq!(stats.rockets, 1);
    }
}
