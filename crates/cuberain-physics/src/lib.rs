// cuberain-physics: Rigid-body world wrapper and collision transition detection.
//
// Wraps a raw `rapier3d` pipeline behind a `PhysicsWorld` resource that owns
// registered bodies, advances time in fixed steps and, after every
// `simulate`, diffs the engine's touching pairs against the previous step to
// produce Began/Ended events for subscribed listeners.

pub mod body;
pub mod config;
pub mod error;
pub mod listener;
pub mod pair;
pub mod shape;
pub mod tracker;
pub mod world;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        body::{translate, Body, BodyView, Pose},
        config::PhysicsConfig,
        error::{ConfigError, CubeRainError, PhysicsError},
        listener::{shared, CollisionEvent, CollisionListener, ContactKind, SharedListener},
        pair::{BodyHandle, BodyPair},
        shape::Shape,
        tracker::{CollisionTracker, Transitions},
        world::{PhysicsWorld, StepReport},
    };
}

pub use world::PhysicsWorld;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
