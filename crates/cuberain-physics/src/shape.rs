//! Collision shapes and their mass distribution.

use bevy::prelude::Vec3;
use rapier3d::prelude::ColliderBuilder;

use crate::error::PhysicsError;

/// Collision shape exclusively owned by a [`Body`](crate::body::Body).
///
/// Dimensions are half extents / radii in meters, centered on the body
/// origin. Cylinders are aligned with the local Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Box with the given half extents.
    Cuboid { half_extents: Vec3 },
    /// Sphere.
    Ball { radius: f32 },
    /// Y-aligned cylinder.
    Cylinder { half_height: f32, radius: f32 },
}

impl Shape {
    /// Box with half extent `h` on every axis.
    pub const fn cube(h: f32) -> Self {
        Self::Cuboid {
            half_extents: Vec3::splat(h),
        }
    }

    /// Reject empty or degenerate shapes.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Self::Cuboid { half_extents } => {
                if ok(half_extents.x) && ok(half_extents.y) && ok(half_extents.z) {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape("cuboid half extents must be > 0"))
                }
            }
            Self::Ball { radius } => {
                if ok(radius) {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape("ball radius must be > 0"))
                }
            }
            Self::Cylinder {
                half_height,
                radius,
            } => {
                if ok(half_height) && ok(radius) {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(
                        "cylinder half height and radius must be > 0",
                    ))
                }
            }
        }
    }

    /// Principal moments of inertia about the center of mass.
    ///
    /// Zero for `mass <= 0` (static bodies).
    pub fn local_inertia(&self, mass: f32) -> Vec3 {
        if mass <= 0.0 {
            return Vec3::ZERO;
        }
        match *self {
            Self::Cuboid { half_extents: h } => {
                let sq = h * h;
                Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 3.0)
            }
            Self::Ball { radius } => Vec3::splat(0.4 * mass * radius * radius),
            Self::Cylinder {
                half_height,
                radius,
            } => {
                let r2 = radius * radius;
                let lateral = mass * (3.0 * r2 + 4.0 * half_height * half_height) / 12.0;
                Vec3::new(lateral, 0.5 * mass * r2, lateral)
            }
        }
    }

    /// Engine collider for this shape.
    ///
    /// The collider carries no mass of its own; mass properties are attached
    /// to the rigid body.
    pub(crate) fn collider(&self) -> ColliderBuilder {
        let builder = match *self {
            Self::Cuboid { half_extents: h } => ColliderBuilder::cuboid(h.x, h.y, h.z),
            Self::Ball { radius } => ColliderBuilder::ball(radius),
            Self::Cylinder {
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height, radius),
        };
        builder.density(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
