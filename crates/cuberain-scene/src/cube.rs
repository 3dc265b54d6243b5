//! Cube spawning: whole-number positions, scales and the matching bodies.

use bevy::prelude::Vec3;
use rand::Rng;

use cuberain_physics::body::{translate, Body};
use cuberain_physics::error::PhysicsError;
use cuberain_physics::shape::Shape;

use crate::config::CubeRainConfig;

/// Smallest cube scale.
pub const MIN_SCALE: f32 = 0.7;
/// Largest cube scale.
pub const MAX_SCALE: f32 = 1.4;

// ---------------------------------------------------------------------------
// CubeId / SceneEntity
// ---------------------------------------------------------------------------

/// Index of a cube in the pool. Stable for the cube's lifetime: the pool
/// only grows and shrinks at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeId(pub usize);

/// What a physics body stands for in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEntity {
    Cube(CubeId),
}

// ---------------------------------------------------------------------------
// CubeObject
// ---------------------------------------------------------------------------

/// Position and size of one cube, as the scene sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeObject {
    pub position: Vec3,
    /// In `[MIN_SCALE, MIN_SCALE + 0.7]`; a unit cube has scale 1.
    pub scale: f32,
}

impl CubeObject {
    /// Half extent of the cube's box.
    pub fn half_extent(&self) -> f32 {
        0.5 * self.scale
    }

    /// Spawn velocity: smaller cubes fall faster.
    pub fn fall_velocity(&self, base_fall_speed: f32) -> Vec3 {
        Vec3::new(0.0, -base_fall_speed * (2.0 - self.scale), 0.0)
    }
}

/// Random whole-number position in the spawn box above the origin.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn spawn_position(rng: &mut impl Rng, config: &CubeRainConfig) -> Vec3 {
    let half = config.spawn_half_width as i32;
    let floor = config.spawn_floor;
    let top = floor.saturating_add_unsigned(config.spawn_layers);
    Vec3::new(
        rng.random_range(-half..=half) as f32,
        rng.random_range(floor..top) as f32,
        rng.random_range(-half..=half) as f32,
    )
}

/// Random cube scale in hundredths between 0.70 and 1.40.
#[allow(clippy::cast_precision_loss)]
pub fn spawn_scale(rng: &mut impl Rng) -> f32 {
    MIN_SCALE + rng.random_range(0..=70_u32) as f32 / 100.0
}

/// Draw a new cube.
pub fn new_cube(rng: &mut impl Rng, config: &CubeRainConfig) -> CubeObject {
    let position = spawn_position(rng, config);
    let scale = spawn_scale(rng);
    CubeObject { position, scale }
}

/// Physics body for `cube`, tagged with its pool index.
pub fn cube_body(cube: &CubeObject, id: CubeId, config: &CubeRainConfig) -> Result<Body, PhysicsError> {
    let body = Body::new(
        Shape::cube(cube.half_extent()),
        translate(cube.position),
        config.cube_mass,
    )?;
    Ok(body
        .with_linear_velocity(cube.fall_velocity(config.base_fall_speed))
        .with_user_tag(id.0 as u128))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn spawn_is_reproducible_from_seed() {
        let config = CubeRainConfig::default();
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(new_cube(&mut a, &config), new_cube(&mut b, &config));
        }
    }

    #[test]
    fn spawn_covers_the_whole_box() {
        let config = CubeRainConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut xs = std::collections::BTreeSet::new();
        let mut ys = std::collections::BTreeSet::new();
        for _ in 0..5000 {
            let p = spawn_position(&mut rng, &config);
            assert!((-7.0..=7.0).contains(&p.x), "x = {}", p.x);
            assert!((-7.0..=7.0).contains(&p.z), "z = {}", p.z);
            assert!((7.0..=36.0).contains(&p.y), "y = {}", p.y);
            assert_eq!(p, p.round(), "not whole: {p:?}");
            xs.insert(p.x as i32);
            ys.insert(p.y as i32);
        }
        assert_eq!(xs.len(), 15);
        assert_eq!(ys.len(), 30);
    }

    #[test]
    fn scale_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..2000 {
            let s = spawn_scale(&mut rng);
            min = min.min(s);
            max = max.max(s);
        }
        assert!(min >= MIN_SCALE - 1e-6);
        assert!(max <= MAX_SCALE + 1e-6);
        assert!(max - min > 0.5, "range barely covered: {min}..{max}");
    }

    #[test]
    fn smaller_cubes_fall_faster() {
        let small = CubeObject {
            position: Vec3::ZERO,
            scale: 0.7,
        };
        let large = CubeObject {
            position: Vec3::ZERO,
            scale: 1.4,
        };
        assert!(small.fall_velocity(3.0).y < large.fall_velocity(3.0).y);
        assert!((small.fall_velocity(3.0).y + 3.9).abs() < 1e-5);
    }

    #[test]
    fn cube_body_matches_cube() {
        let config = CubeRainConfig::default();
        let cube = CubeObject {
            position: Vec3::new(1.0, 20.0, -2.0),
            scale: 1.2,
        };
        let body = cube_body(&cube, CubeId(4), &config).unwrap();
        assert_eq!(body.position(), cube.position);
        assert_eq!(body.user_tag(), 4);
        assert_eq!(*body.shape(), Shape::cube(0.6));
        assert_eq!(body.mass(), 1.0);
        assert!((body.linear_velocity().y + 2.4).abs() < 1e-5);
    }
}
