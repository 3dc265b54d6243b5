//! Edge-triggered contact tracking.
//!
//! The dynamics engine reports every pair that is touching *now*, with no
//! notion of when the contact started. [`CollisionTracker`] keeps the
//! previous step's pair set and diffs it against the current one:
//!
//! ```text
//! began = this_step - last_collisions
//! ended = last_collisions - this_step
//! last_collisions <- this_step
//! ```
//!
//! Pairs are canonical [`BodyPair`]s held in ordered sets, so set membership
//! is stable across steps and events come out in ascending pair order.

use std::collections::BTreeSet;

use crate::listener::{CollisionEvent, ContactKind};
use crate::pair::{BodyHandle, BodyPair};

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Result of diffing one step against the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transitions {
    /// Pairs touching this step but not the previous one, ascending.
    pub began: Vec<BodyPair>,
    /// Pairs touching the previous step but not this one, ascending.
    pub ended: Vec<BodyPair>,
}

impl Transitions {
    pub fn is_empty(&self) -> bool {
        self.began.is_empty() && self.ended.is_empty()
    }

    /// All Began events followed by all Ended events.
    pub fn events(&self) -> Vec<CollisionEvent> {
        let began = self.began.iter().map(|&pair| CollisionEvent {
            pair,
            kind: ContactKind::Began,
        });
        let ended = self.ended.iter().map(|&pair| CollisionEvent {
            pair,
            kind: ContactKind::Ended,
        });
        began.chain(ended).collect()
    }
}

// ---------------------------------------------------------------------------
// CollisionTracker
// ---------------------------------------------------------------------------

/// Remembers last step's contacts and reports transitions.
#[derive(Debug, Clone, Default)]
pub struct CollisionTracker {
    last_collisions: BTreeSet<BodyPair>,
}

impl CollisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs that were touching at the end of the last update.
    pub fn active(&self) -> &BTreeSet<BodyPair> {
        &self.last_collisions
    }

    /// Whether `pair` was touching at the end of the last update.
    pub fn is_touching(&self, pair: BodyPair) -> bool {
        self.last_collisions.contains(&pair)
    }

    /// Replace the remembered set with `pairs_this_step` and report what
    /// changed.
    pub fn update(&mut self, pairs_this_step: BTreeSet<BodyPair>) -> Transitions {
        let began = pairs_this_step
            .difference(&self.last_collisions)
            .copied()
            .collect();
        let ended = self
            .last_collisions
            .difference(&pairs_this_step)
            .copied()
            .collect();
        self.last_collisions = pairs_this_step;
        Transitions { began, ended }
    }

    /// Drop every remembered pair involving `handle` without reporting it.
    ///
    /// Called when a body leaves the world so no later step mentions it.
    pub fn forget(&mut self, handle: BodyHandle) -> usize {
        let before = self.last_collisions.len();
        self.last_collisions.retain(|pair| !pair.contains(handle));
        before - self.last_collisions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
