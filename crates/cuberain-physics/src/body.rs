//! Rigid bodies: shape + motion state + mass.

use std::fmt;

use bevy::prelude::{Quat, Vec3};
use rapier3d::prelude::{MassProperties, RigidBody, RigidBodyBuilder};

use crate::error::PhysicsError;
use crate::pair::BodyHandle;
use crate::shape::Shape;

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pure translation by `v`.
pub const fn translate(v: Vec3) -> Pose {
    Pose::new(v, Quat::IDENTITY)
}

// ---------------------------------------------------------------------------
// Engine state readers
// ---------------------------------------------------------------------------

pub(crate) fn position_of(rb: &RigidBody) -> Vec3 {
    let t = rb.translation();
    Vec3::new(t.x, t.y, t.z)
}

pub(crate) fn rotation_of(rb: &RigidBody) -> Quat {
    let r = rb.rotation();
    Quat::from_xyzw(r.x, r.y, r.z, r.w)
}

pub(crate) fn linear_velocity_of(rb: &RigidBody) -> Vec3 {
    let v = rb.linvel();
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn apply_pose(rb: &mut RigidBody, pose: Pose) {
    rb.set_translation(pose.translation, true);
    rb.set_rotation(pose.rotation, true);
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A rigid body not currently registered with a world.
///
/// Owns its [`Shape`] and its engine rigid body (pose, velocities, user
/// data). [`PhysicsWorld::add_body`](crate::world::PhysicsWorld::add_body)
/// takes it by value; [`PhysicsWorld::remove_body`](crate::world::PhysicsWorld::remove_body)
/// gives it back with the pose it had when it left the simulation.
pub struct Body {
    pub(crate) shape: Shape,
    pub(crate) mass: f32,
    pub(crate) local_inertia: Vec3,
    pub(crate) rigid_body: RigidBody,
}

impl Body {
    /// Create a body. `mass == 0` makes it static (immovable, zero inertia).
    pub fn new(shape: Shape, pose: Pose, mass: f32) -> Result<Self, PhysicsError> {
        shape.validate()?;
        if !(mass.is_finite() && mass >= 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }

        let local_inertia = shape.local_inertia(mass);
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic().additional_mass_properties(MassProperties::new(
                Vec3::ZERO,
                mass,
                local_inertia,
            ))
        } else {
            RigidBodyBuilder::fixed()
        };
        let rigid_body = builder
            .translation(pose.translation)
            .rotation(pose.rotation.to_scaled_axis())
            .build();

        Ok(Self {
            shape,
            mass,
            local_inertia,
            rigid_body,
        })
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.rigid_body.set_linvel(velocity, true);
        self
    }

    /// Attach an opaque back-reference. Stored and returned untouched.
    #[must_use]
    pub fn with_user_tag(mut self, tag: u128) -> Self {
        self.rigid_body.user_data = tag;
        self
    }

    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    pub const fn mass(&self) -> f32 {
        self.mass
    }

    /// Principal moments of inertia; zero for static bodies.
    pub const fn local_inertia(&self) -> Vec3 {
        self.local_inertia
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// World-space origin.
    pub fn position(&self) -> Vec3 {
        position_of(&self.rigid_body)
    }

    pub fn rotation(&self) -> Quat {
        rotation_of(&self.rigid_body)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position(), self.rotation())
    }

    pub fn set_pose(&mut self, pose: Pose) {
        apply_pose(&mut self.rigid_body, pose);
    }

    pub fn linear_velocity(&self) -> Vec3 {
        linear_velocity_of(&self.rigid_body)
    }

    pub fn user_tag(&self) -> u128 {
        self.rigid_body.user_data
    }

    /// Native engine body.
    pub const fn rigid_body(&self) -> &RigidBody {
        &self.rigid_body
    }

    pub fn rigid_body_mut(&mut self) -> &mut RigidBody {
        &mut self.rigid_body
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("shape", &self.shape)
            .field("mass", &self.mass)
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// BodyView
// ---------------------------------------------------------------------------

/// Read access to a registered body.
#[derive(Clone, Copy)]
pub struct BodyView<'w> {
    pub(crate) handle: BodyHandle,
    pub(crate) shape: &'w Shape,
    pub(crate) mass: f32,
    pub(crate) local_inertia: Vec3,
    pub(crate) rigid_body: &'w RigidBody,
}

impl<'w> BodyView<'w> {
    pub const fn handle(&self) -> BodyHandle {
        self.handle
    }

    /// Identity check against a handle received from a collision event.
    pub fn is_same(&self, handle: BodyHandle) -> bool {
        self.handle == handle
    }

    pub const fn shape(&self) -> &'w Shape {
        self.shape
    }

    pub const fn mass(&self) -> f32 {
        self.mass
    }

    pub const fn local_inertia(&self) -> Vec3 {
        self.local_inertia
    }

    /// World-space origin after the latest step.
    pub fn position(&self) -> Vec3 {
        position_of(self.rigid_body)
    }

    pub fn rotation(&self) -> Quat {
        rotation_of(self.rigid_body)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position(), self.rotation())
    }

    pub fn linear_velocity(&self) -> Vec3 {
        linear_velocity_of(self.rigid_body)
    }

    pub fn user_tag(&self) -> u128 {
        self.rigid_body.user_data
    }

    pub const fn rigid_body(&self) -> &'w RigidBody {
        self.rigid_body
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
