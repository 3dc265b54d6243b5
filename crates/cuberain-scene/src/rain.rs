//! [`CubeRain`]: the cube pool and its per-frame update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bevy::log::{debug, info};
use bevy::prelude::{Quat, Resource, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cuberain_physics::body::translate;
use cuberain_physics::error::{CubeRainError, PhysicsError};
use cuberain_physics::pair::BodyHandle;
use cuberain_physics::world::PhysicsWorld;

use crate::config::CubeRainConfig;
use crate::cube::{cube_body, new_cube, CubeId, CubeObject, SceneEntity};
use crate::highlight::{ContactCollector, Highlights};

// ---------------------------------------------------------------------------
// CubeSlot
// ---------------------------------------------------------------------------

/// One pooled cube and the body simulating it.
#[derive(Debug, Clone, Copy)]
pub struct CubeSlot {
    pub object: CubeObject,
    pub body: BodyHandle,
    /// Orientation after the latest frame.
    pub rotation: Quat,
}

// ---------------------------------------------------------------------------
// FrameReport
// ---------------------------------------------------------------------------

/// What happened during one [`CubeRain::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub sub_steps: u32,
    pub began: usize,
    pub ended: usize,
    /// Cube endpoints of this frame's Began events.
    pub struck: usize,
    /// Cubes highlighted after expiry.
    pub highlighted: usize,
    /// Highlighted cubes with an open contact.
    pub touching: usize,
    /// Cubes that fell through the floor and were respawned.
    pub recycled: usize,
    pub spawned: usize,
    pub despawned: usize,
}

// ---------------------------------------------------------------------------
// CubeRain
// ---------------------------------------------------------------------------

/// Pool of falling cubes registered in a [`PhysicsWorld`].
///
/// Bodies are tagged with their [`CubeId`] and also tracked in a side table,
/// so a handle from a collision event resolves back to its cube.
#[derive(Resource)]
pub struct CubeRain {
    config: CubeRainConfig,
    /// Requested pool size; applied at the start of the next update.
    target_count: usize,
    rng: ChaCha8Rng,
    cubes: Vec<CubeSlot>,
    entities: HashMap<BodyHandle, SceneEntity>,
    highlights: Highlights,
    collector: Arc<Mutex<ContactCollector>>,
    /// Scene time in seconds, unaffected by dilation.
    clock: f64,
    time_dilation: f32,
    /// Dilation to restore when unpausing.
    resume_dilation: f32,
}

impl CubeRain {
    /// Empty pool. `config` is assumed validated; cubes are spawned by the
    /// first [`update`](Self::update) or [`sync_pool`](Self::sync_pool).
    pub fn new(config: CubeRainConfig) -> Self {
        let time_dilation = config.time_dilation;
        Self {
            target_count: config.cube_count,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            cubes: Vec::new(),
            entities: HashMap::new(),
            highlights: Highlights::new(),
            collector: Arc::new(Mutex::new(ContactCollector::new())),
            clock: 0.0,
            time_dilation,
            resume_dilation: if time_dilation > 0.0 { time_dilation } else { 1.0 },
            config,
        }
    }

    pub const fn config(&self) -> &CubeRainConfig {
        &self.config
    }

    /// Cubes currently in the pool.
    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn cubes(&self) -> &[CubeSlot] {
        &self.cubes
    }

    pub fn cube(&self, id: CubeId) -> Option<&CubeSlot> {
        self.cubes.get(id.0)
    }

    /// Scene entity behind a body handle.
    pub fn resolve(&self, handle: BodyHandle) -> Option<SceneEntity> {
        self.entities.get(&handle).copied()
    }

    pub const fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    pub fn is_highlighted(&self, id: CubeId) -> bool {
        self.highlights.is_highlighted(id)
    }

    pub const fn clock(&self) -> f64 {
        self.clock
    }

    pub const fn time_dilation(&self) -> f32 {
        self.time_dilation
    }

    pub fn is_paused(&self) -> bool {
        self.time_dilation == 0.0
    }

    // -- Controls -----------------------------------------------------------

    /// Request a new pool size, clamped to `max_cube_count`.
    pub fn set_cube_count(&mut self, count: usize) -> usize {
        self.target_count = count.min(self.config.max_cube_count);
        self.target_count
    }

    /// Set the simulation speed multiplier. Negative or non-finite values
    /// are treated as zero.
    pub fn set_time_dilation(&mut self, dilation: f32) {
        self.time_dilation = if dilation.is_finite() { dilation.max(0.0) } else { 0.0 };
        if self.time_dilation > 0.0 {
            self.resume_dilation = self.time_dilation;
        }
    }

    /// Freeze or resume physics. Released highlights keep fading while
    /// paused; cubes still in contact stay lit.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_paused() {
            self.time_dilation = self.resume_dilation;
        } else {
            self.time_dilation = 0.0;
        }
        self.is_paused()
    }

    // -- Pool management ----------------------------------------------------

    /// Grow or shrink the pool to the requested size.
    ///
    /// Returns `(spawned, despawned)`.
    pub fn sync_pool(&mut self, world: &mut PhysicsWorld) -> Result<(usize, usize), PhysicsError> {
        let current = self.cubes.len();
        let target = self.target_count;
        if target > current {
            self.add_cubes(world, target - current)?;
            info!("cube pool grown {current} -> {target}");
            Ok((target - current, 0))
        } else if target < current {
            self.remove_cubes(world, current - target);
            info!("cube pool shrunk {current} -> {target}");
            Ok((0, current - target))
        } else {
            Ok((0, 0))
        }
    }

    /// Spawn `count` cubes at the end of the pool.
    pub fn add_cubes(&mut self, world: &mut PhysicsWorld, count: usize) -> Result<(), PhysicsError> {
        self.cubes.reserve(count);
        for _ in 0..count {
            let id = CubeId(self.cubes.len());
            let object = new_cube(&mut self.rng, &self.config);
            let body = world.add_body(cube_body(&object, id, &self.config)?);
            self.entities.insert(body, SceneEntity::Cube(id));
            self.cubes.push(CubeSlot {
                object,
                body,
                rotation: Quat::IDENTITY,
            });
        }
        Ok(())
    }

    /// Despawn the last `count` cubes.
    ///
    /// The world drops a removed body's contacts without an Ended event, so
    /// the surviving partners are released here.
    pub fn remove_cubes(&mut self, world: &mut PhysicsWorld, count: usize) {
        let keep = self.cubes.len().saturating_sub(count);
        for (index, slot) in self.cubes.drain(keep..).enumerate() {
            let partners: Vec<BodyHandle> = world
                .active_collisions()
                .iter()
                .filter_map(|pair| pair.other(slot.body))
                .collect();
            world.remove_body(slot.body);
            self.entities.remove(&slot.body);
            self.highlights.forget(CubeId(keep + index));
            for partner in partners {
                if let Some(SceneEntity::Cube(id)) = self.entities.get(&partner).copied() {
                    self.highlights.release(id, self.clock);
                }
            }
        }
    }

    // -- Frame --------------------------------------------------------------

    /// Advance the scene by one frame of `frame_dt` seconds.
    ///
    /// Resizes the pool if requested, steps the world by the dilated frame
    /// time, applies contact transitions to the highlights, expires faded
    /// highlights and respawns cubes that fell below the threshold.
    pub fn update(&mut self, world: &mut PhysicsWorld, frame_dt: f32) -> Result<FrameReport, CubeRainError> {
        let (spawned, despawned) = self.sync_pool(world)?;

        world.subscribe_collisions(self.collector.clone());
        let step = world.advance(frame_dt * self.time_dilation);
        world.unsubscribe_collisions(&self.collector);

        self.clock += f64::from(frame_dt.max(0.0));
        let contacts = self
            .collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain();
        let mut struck_cubes = 0;
        for pair in &contacts.began {
            let (a, b) = pair.handles();
            for handle in [a, b] {
                if let Some(SceneEntity::Cube(id)) = self.resolve(handle) {
                    self.highlights.touch(id, self.clock);
                    struck_cubes += 1;
                }
            }
        }
        for pair in &contacts.ended {
            let (a, b) = pair.handles();
            for handle in [a, b] {
                if let Some(SceneEntity::Cube(id)) = self.resolve(handle) {
                    self.highlights.release(id, self.clock);
                }
            }
        }
        self.highlights.expire(self.clock, self.config.highlight_secs());

        let recycled = self.recycle(world);

        let report = FrameReport {
            sub_steps: step.sub_steps,
            began: step.began,
            ended: step.ended,
            struck: struck_cubes,
            highlighted: self.highlights.len(),
            touching: self.highlights.touching(),
            recycled,
            spawned,
            despawned,
        };
        debug!("{report:?}");
        Ok(report)
    }

    /// Sync cached positions from the world; respawn cubes below the
    /// threshold at a fresh spawn position. Velocity is kept.
    fn recycle(&mut self, world: &mut PhysicsWorld) -> usize {
        let mut recycled = 0;
        for slot in &mut self.cubes {
            let Some(position) = world.position(slot.body) else {
                continue;
            };
            if position.y > self.config.fall_off_threshold {
                slot.object.position = position;
                slot.rotation = world.rotation(slot.body).unwrap_or(Quat::IDENTITY);
            } else {
                // The body keeps its size, so only the position is redrawn.
                let respawn = new_cube(&mut self.rng, &self.config).position;
                world.set_pose(slot.body, translate(respawn));
                slot.object.position = respawn;
                slot.rotation = Quat::IDENTITY;
                recycled += 1;
            }
        }
        recycled
    }

    /// Lowest cube, if any.
    pub fn lowest(&self) -> Option<Vec3> {
        self.cubes
            .iter()
            .map(|slot| slot.object.position)
            .min_by(|a, b| a.y.total_cmp(&b.y))
    }
}

impl std::fmt::Debug for CubeRain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeRain")
            .field("cubes", &self.cubes.len())
            .field("target_count", &self.target_count)
            .field("highlighted", &self.highlights.len())
            .field("clock", &self.clock)
            .field("time_dilation", &self.time_dilation)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(count: usize) -> CubeRainConfig {
        CubeRainConfig {
            cube_count: count,
            seed: 11,
            ..CubeRainConfig::default()
        }
    }

    fn scene(count: usize) -> (PhysicsWorld, CubeRain) {
        let config = small_config(count);
        (PhysicsWorld::new(&config.physics), CubeRain::new(config))
    }

    #[test]
    fn first_update_populates_pool() {
        let (mut world, mut rain) = scene(20);
        assert!(rain.is_empty());
        let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(report.spawned, 20);
        assert_eq!(rain.len(), 20);
        assert_eq!(world.len(), 20);
    }

    #[test]
    fn bodies_resolve_to_their_cube() {
        let (mut world, mut rain) = scene(8);
        rain.sync_pool(&mut world).unwrap();
        for (index, slot) in rain.cubes().iter().enumerate() {
            assert_eq!(rain.resolve(slot.body), Some(SceneEntity::Cube(CubeId(index))));
            assert_eq!(world.user_tag(slot.body), Some(index as u128));
        }
    }

    #[test]
    fn shrinking_removes_bodies_from_world() {
        let (mut world, mut rain) = scene(30);
        rain.sync_pool(&mut world).unwrap();
        let dropped: Vec<BodyHandle> = rain.cubes()[10..].iter().map(|s| s.body).collect();

        rain.set_cube_count(10);
        assert_eq!(rain.sync_pool(&mut world).unwrap(), (0, 20));
        assert_eq!(world.len(), 10);
        for handle in dropped {
            assert!(!world.contains(handle));
            assert_eq!(rain.resolve(handle), None);
        }
    }

    #[test]
    fn cube_count_is_clamped() {
        let (_, mut rain) = scene(0);
        assert_eq!(rain.set_cube_count(100_000), 1500);
    }

    #[test]
    fn cubes_fall_each_frame() {
        let (mut world, mut rain) = scene(5);
        rain.update(&mut world, 1.0 / 60.0).unwrap();
        let mean_height = |rain: &CubeRain| {
            rain.cubes().iter().map(|s| s.object.position.y).sum::<f32>() / rain.len() as f32
        };
        let before = mean_height(&rain);
        for _ in 0..10 {
            rain.update(&mut world, 1.0 / 60.0).unwrap();
        }
        // Ten frames at 2.1..3.9 units/s.
        let drop = before - mean_height(&rain);
        assert!(drop > 0.3 && drop < 0.7, "drop = {drop}");
    }

    #[test]
    fn pause_freezes_cubes_and_resumes() {
        let (mut world, mut rain) = scene(5);
        rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert!(rain.toggle_pause());
        let frozen: Vec<Vec3> = rain.cubes().iter().map(|s| s.object.position).collect();
        for _ in 0..10 {
            let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
            assert_eq!(report.sub_steps, 0);
        }
        let now: Vec<Vec3> = rain.cubes().iter().map(|s| s.object.position).collect();
        assert_eq!(frozen, now);

        assert!(!rain.toggle_pause());
        assert_eq!(rain.time_dilation(), 1.0);
    }

    #[test]
    fn fallen_cube_is_respawned_in_spawn_box() {
        let (mut world, mut rain) = scene(1);
        rain.sync_pool(&mut world).unwrap();
        let handle = rain.cubes()[0].body;
        world.set_pose(handle, translate(Vec3::new(0.0, -50.0, 0.0)));

        let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(report.recycled, 1);
        let y = world.position(handle).unwrap().y;
        assert!((7.0..=36.0).contains(&y), "y = {y}");
        assert_eq!(rain.cubes()[0].object.position.y, y);
        // Same body, same size.
        assert_eq!(rain.resolve(handle), Some(SceneEntity::Cube(CubeId(0))));
    }

    /// Put cubes 0 and 1 into a deep overlap at rest.
    fn stack_first_two(world: &mut PhysicsWorld, rain: &CubeRain) -> (BodyHandle, BodyHandle) {
        let (a, b) = (rain.cubes()[0].body, rain.cubes()[1].body);
        let spot = Vec3::new(0.0, 20.0, 0.0);
        world.set_pose(a, translate(spot));
        world.set_pose(b, translate(spot + Vec3::new(0.3, 0.0, 0.0)));
        world.set_linear_velocity(a, Vec3::ZERO);
        world.set_linear_velocity(b, Vec3::ZERO);
        (a, b)
    }

    #[test]
    fn separated_cubes_fade_after_highlight_time() {
        let (mut world, mut rain) = scene(2);
        rain.sync_pool(&mut world).unwrap();
        let (_, b) = stack_first_two(&mut world, &rain);

        let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(report.began, 1);
        assert_eq!(report.struck, 2);
        assert_eq!(report.touching, 2);
        assert!(rain.is_highlighted(CubeId(0)));
        assert!(rain.is_highlighted(CubeId(1)));

        // Ended starts the fade; the cubes are still lit that frame.
        world.set_pose(b, translate(Vec3::new(30.0, 20.0, 0.0)));
        let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(report.ended, 1);
        assert_eq!(report.touching, 0);
        assert_eq!(report.highlighted, 2);

        for _ in 0..20 {
            rain.update(&mut world, 1.0 / 60.0).unwrap();
        }
        assert!(rain.highlights().is_empty());
    }

    #[test]
    fn resting_contact_keeps_cubes_highlighted() {
        let (mut world, mut rain) = scene(2);
        rain.sync_pool(&mut world).unwrap();
        let (a, b) = stack_first_two(&mut world, &rain);

        // 30 frames is twice the 250 ms highlight time.
        for frame in 0..30 {
            rain.update(&mut world, 1.0 / 60.0).unwrap();
            assert!(world.is_touching(a, b), "apart at frame {frame}");
            assert!(rain.is_highlighted(CubeId(0)), "cube 0 dark at frame {frame}");
            assert!(rain.is_highlighted(CubeId(1)), "cube 1 dark at frame {frame}");
        }
        assert_eq!(rain.highlights().touching(), 2);
    }

    #[test]
    fn despawning_a_partner_releases_the_survivor() {
        let (mut world, mut rain) = scene(2);
        rain.sync_pool(&mut world).unwrap();
        stack_first_two(&mut world, &rain);
        rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(rain.highlights().touching(), 2);

        rain.set_cube_count(1);
        let report = rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(report.despawned, 1);
        assert_eq!(report.ended, 0);
        assert_eq!(report.touching, 0);
        assert!(rain.is_highlighted(CubeId(0)));

        for _ in 0..20 {
            rain.update(&mut world, 1.0 / 60.0).unwrap();
        }
        assert!(!rain.is_highlighted(CubeId(0)));
    }

    #[test]
    fn collector_is_not_left_subscribed() {
        let (mut world, mut rain) = scene(3);
        rain.update(&mut world, 1.0 / 60.0).unwrap();
        assert_eq!(world.listener_count(), 0);
    }

    #[test]
    fn same_seed_same_rain() {
        let (mut wa, mut ra) = scene(15);
        let (mut wb, mut rb) = scene(15);
        for _ in 0..30 {
            ra.update(&mut wa, 1.0 / 60.0).unwrap();
            rb.update(&mut wb, 1.0 / 60.0).unwrap();
        }
        let pa: Vec<Vec3> = ra.cubes().iter().map(|s| s.object.position).collect();
        let pb: Vec<Vec3> = rb.cubes().iter().map(|s| s.object.position).collect();
        assert_eq!(pa, pb);
    }
}
