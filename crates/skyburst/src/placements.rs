//! # Saved Placements
//!
//! The store of user-chosen launch points awaiting the next launch
//! trigger. The input layer writes it on clicks, the sidebar reads it for
//! marker rendering, and the driver reads it when the user fires the
//! whole lineup.
//!
//! Selection policy: **selection-stable**. Changing the active firework
//! kind only affects placements saved afterwards; it never rewrites saved
//! placements and never resets live rockets or batches. The only full
//! reset is the driver's stop/start boundary.

use std::sync::Arc;

use parking_lot::Mutex;
use skyburst_core::FireworkKind;
use skyburst_shared::constants::MAX_PLACEMENTS;

/// One saved launch point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SavedPlacement {
    /// Store-assigned identity, monotonic per store.
    pub id: u64,
    /// Firework kind selected when the placement was saved.
    pub kind: FireworkKind,
    /// World X of the click.
    pub x: f32,
    /// World Y of the click.
    pub y: f32,
}

#[derive(Default)]
struct StoreInner {
    placements: Vec<SavedPlacement>,
    next_id: u64,
}

/// Shared, clonable handle to the placement list.
///
/// Input handler and driver live in the same process; the mutex keeps the
/// handle trivially shareable without exposing interior state.
#[derive(Clone, Default)]
pub struct PlacementStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl PlacementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a placement, returning its id, or `None` once the store
    /// holds [`MAX_PLACEMENTS`] entries.
    pub fn add(&self, kind: FireworkKind, x: f32, y: f32) -> Option<u64> {
        let mut inner = self.inner.lock();
        if inner.placements.len() >= MAX_PLACEMENTS {
            tracing::warn!(cap = MAX_PLACEMENTS, "placement store full, click ignored");
            return None;
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.placements.push(SavedPlacement { id, kind, x, y });
        Some(id)
    }

    /// Removes one placement. Returns `false` for an unknown id.
    pub fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.placements.len();
        inner.placements.retain(|placement| placement.id != id);
        inner.placements.len() != before
    }

    /// Drops every placement. Ids keep counting up.
    pub fn clear(&self) {
        self.inner.lock().placements.clear();
    }

    /// A copy of the current lineup, save order preserved.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SavedPlacement> {
        self.inner.lock().placements.clone()
    }

    /// Saved placements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().placements.len()
    }

    /// True when nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().placements.is_empty()
    }
}
