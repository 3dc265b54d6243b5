//! Shared test fixtures and utilities for Cube Rain crates.
//!
//! Provides recording collision listeners, ready-made worlds with bodies on
//! a collision course, Bevy test app builders and deterministic RNG setup.

pub mod app;
pub mod mocks;
pub mod rng;
pub mod worlds;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use app::{rain_test_app, step_n};
pub use mocks::{RecordedEvent, RecordingListener};
pub use rng::seeded_rng;
pub use worlds::{
    ball, collision_course, collision_course_at, weightless_world, CollisionCourse,
};
