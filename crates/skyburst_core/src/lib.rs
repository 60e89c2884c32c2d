//! # SKYBURST Core
//!
//! The fireworks simulation engine: firework profiles, the rocket
//! lifecycle, particle batches, two interchangeable numeric backends and
//! the scene event stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   advance(dt)   ┌──────────────┐   spawns   ┌──────────────┐
//! │ Frame Driver │────────────────>│   Rockets    │───────────>│   Batches    │
//! │ (integration │                 │ (ascend,     │            │ (fall, fade, │
//! │    crate)    │                 │  trigger)    │            │  retire)     │
//! └──────────────┘                 └──────┬───────┘            └──────┬───────┘
//!                                         │      one trait, two engines      │
//!                                         v                           v
//!                                  ┌──────────────────────────────────────┐
//!                                  │     NumericBackend (scalar/batched)  │
//!                                  └──────────────────────────────────────┘
//! ```
//!
//! ## CRITICAL RULE
//!
//! This crate never touches a drawing context. It owns numeric state and
//! emits scene events plus flat position/opacity views; turning those
//! into draw calls is the integration crate's job.

pub mod backend;
pub mod batch;
pub mod events;
pub mod profile;
pub mod rocket;
pub mod world;

pub use backend::{
    create_backend, BackendError, BackendId, BatchedBackend, NumericBackend, ScalarBackend,
};
pub use batch::ParticleBatch;
pub use events::{SceneEvent, SceneEventBus, SceneEventReceiver, SceneEventSender};
pub use profile::{FireworkKind, Rgb};
pub use rocket::Rocket;
pub use world::{World, WorldError};
