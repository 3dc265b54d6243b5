//! Ready-made physics worlds.

use bevy::prelude::Vec3;
use cuberain_physics::body::{translate, Body};
use cuberain_physics::config::PhysicsConfig;
use cuberain_physics::pair::BodyHandle;
use cuberain_physics::shape::Shape;
use cuberain_physics::world::PhysicsWorld;

/// World with gravity switched off and default stepping.
pub fn weightless_world() -> PhysicsWorld {
    PhysicsWorld::new(&PhysicsConfig::weightless())
}

/// Dynamic ball of `radius` at `position`, moving at `velocity`.
///
/// # Panics
///
/// Panics if `radius` is not positive.
pub fn ball(radius: f32, position: Vec3, velocity: Vec3) -> Body {
    Body::new(Shape::Ball { radius }, translate(position), 1.0)
        .expect("test ball radius must be positive")
        .with_linear_velocity(velocity)
}

// ---------------------------------------------------------------------------
// CollisionCourse
// ---------------------------------------------------------------------------

/// Two unit-diameter balls 5 apart on the x axis, heading at each other.
pub struct CollisionCourse {
    pub world: PhysicsWorld,
    pub left: BodyHandle,
    pub right: BodyHandle,
    /// Centre distance at which the balls touch.
    pub radius_sum: f32,
}

impl CollisionCourse {
    /// Current centre distance.
    ///
    /// # Panics
    ///
    /// Panics if either ball was removed.
    pub fn separation(&self) -> f32 {
        let left = self.world.position(self.left).expect("left ball registered");
        let right = self.world.position(self.right).expect("right ball registered");
        left.distance(right)
    }
}

/// Build the head-on scenario: contact starts after roughly two seconds.
pub fn collision_course() -> CollisionCourse {
    collision_course_at(1.0)
}

/// Head-on scenario with each ball moving at `speed` units/s.
pub fn collision_course_at(speed: f32) -> CollisionCourse {
    let mut world = weightless_world();
    let left = world.add_body(ball(0.5, Vec3::new(-2.5, 0.0, 0.0), Vec3::X * speed));
    let right = world.add_body(ball(0.5, Vec3::new(2.5, 0.0, 0.0), Vec3::NEG_X * speed));
    CollisionCourse {
        world,
        left,
        right,
        radius_sum: 1.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_starts_apart() {
        let course = collision_course();
        assert!((course.separation() - 5.0).abs() < 1e-6);
        assert_eq!(course.world.len(), 2);
        assert!(course.world.active_collisions().is_empty());
    }

    #[test]
    fn balls_close_in() {
        let mut course = collision_course();
        for _ in 0..30 {
            course.world.simulate(1.0 / 60.0, 10);
        }
        assert!((course.separation() - 4.0).abs() < 0.05);
    }
}
