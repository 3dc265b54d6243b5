//! [`PhysicsWorld`]: the dynamics context, body registration and the
//! per-step collision transition pass.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use bevy::log::{debug, trace};
use bevy::prelude::{Quat, Resource, Vec3};
use rapier3d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, CollisionPipeline, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBody, RigidBodySet,
};

use crate::body::{apply_pose, position_of, rotation_of, Body, BodyView, Pose};
use crate::config::PhysicsConfig;
use crate::listener::{CollisionListener, ListenerRegistry, SharedListener};
use crate::pair::{BodyHandle, BodyPair};
use crate::shape::Shape;
use crate::tracker::{CollisionTracker, Transitions};

// ---------------------------------------------------------------------------
// BodyRecord
// ---------------------------------------------------------------------------

/// What the world keeps about a registered body besides the engine state.
struct BodyRecord {
    shape: Shape,
    mass: f32,
    local_inertia: Vec3,
    collider: ColliderHandle,
}

// ---------------------------------------------------------------------------
// StepReport
// ---------------------------------------------------------------------------

/// Summary of one [`PhysicsWorld::simulate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Engine steps actually taken.
    pub sub_steps: u32,
    /// Began events dispatched.
    pub began: usize,
    /// Ended events dispatched.
    pub ended: usize,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// All rapier state plus body bookkeeping in a single Bevy resource.
///
/// `PhysicsPipeline::step()` requires mutable access to every set
/// simultaneously, so they live together. Bodies are moved in by
/// [`add_body`](Self::add_body) and handed back by
/// [`remove_body`](Self::remove_body).
#[derive(Resource)]
pub struct PhysicsWorld {
    // -- Rapier sets --
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    physics_pipeline: PhysicsPipeline,
    /// Contact refresh on the poses left by the last engine step.
    collision_pipeline: CollisionPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,

    // -- Parameters --
    integration_parameters: IntegrationParameters,
    gravity: Vec3,
    fixed_dt: f32,
    max_sub_steps: u32,
    /// Time accumulated but not yet simulated.
    local_time: f32,
    /// Engine steps taken since creation.
    step_count: u64,

    // -- Bookkeeping --
    records: HashMap<BodyHandle, BodyRecord>,
    tracker: CollisionTracker,
    listeners: ListenerRegistry,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    /// Create an empty world. `config` is assumed validated.
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_dt;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            collision_pipeline: CollisionPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity: Vec3::from_array(config.gravity),
            fixed_dt: config.fixed_dt,
            max_sub_steps: config.max_sub_steps,
            local_time: 0.0,
            step_count: 0,
            records: HashMap::new(),
            tracker: CollisionTracker::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    pub const fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub const fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Engine steps taken since creation.
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    // -- Registration -------------------------------------------------------

    /// Register `body` with the simulation.
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let Body {
            shape,
            mass,
            local_inertia,
            rigid_body,
        } = body;

        let raw = self.rigid_body_set.insert(rigid_body);
        let collider = self.collider_set.insert_with_parent(
            shape.collider().build(),
            raw,
            &mut self.rigid_body_set,
        );
        let handle = BodyHandle(raw);
        self.records.insert(
            handle,
            BodyRecord {
                shape,
                mass,
                local_inertia,
                collider,
            },
        );
        trace!("added {handle:?} ({shape:?}, mass {mass})");
        handle
    }

    /// Deregister a body and return it to the caller.
    ///
    /// Contacts it was part of are dropped silently: no Ended event will
    /// ever mention `handle`. Returns `None` for an unknown handle.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let record = self.records.remove(&handle)?;
        let rigid_body = self.rigid_body_set.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        )?;
        let dropped = self.tracker.forget(handle);
        trace!("removed {handle:?}, dropped {dropped} active contacts");

        Some(Body {
            shape: record.shape,
            mass: record.mass,
            local_inertia: record.local_inertia,
            rigid_body,
        })
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.records.contains_key(&handle)
    }

    /// Number of registered bodies.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live view over the engine's registered bodies.
    ///
    /// Each call reflects the current registration state.
    pub fn collision_objects(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.rigid_body_set.iter().map(|(raw, _)| BodyHandle(raw))
    }

    // -- Body access --------------------------------------------------------

    pub fn body(&self, handle: BodyHandle) -> Option<BodyView<'_>> {
        let record = self.records.get(&handle)?;
        let rigid_body = self.rigid_body_set.get(handle.0)?;
        Some(BodyView {
            handle,
            shape: &record.shape,
            mass: record.mass,
            local_inertia: record.local_inertia,
            rigid_body,
        })
    }

    /// World-space origin of a registered body.
    pub fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle.0).map(position_of)
    }

    pub fn rotation(&self, handle: BodyHandle) -> Option<Quat> {
        self.rigid_body_set.get(handle.0).map(rotation_of)
    }

    /// Teleport a registered body. Velocities are kept.
    pub fn set_pose(&mut self, handle: BodyHandle, pose: Pose) -> bool {
        self.rigid_body_mut(handle)
            .map(|rb| apply_pose(rb, pose))
            .is_some()
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        self.rigid_body_mut(handle)
            .map(|rb| rb.set_linvel(velocity, true))
            .is_some()
    }

    pub fn user_tag(&self, handle: BodyHandle) -> Option<u128> {
        self.rigid_body_set.get(handle.0).map(|rb| rb.user_data)
    }

    /// Native engine body.
    pub fn rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle.0)
    }

    /// Map an engine collision object back to the body that owns it.
    pub fn resolve_collider(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let raw = self.collider_set.get(collider)?.parent()?;
        let handle = BodyHandle(raw);
        self.records.contains_key(&handle).then_some(handle)
    }

    // -- Collision listeners ------------------------------------------------

    /// Register a listener; events reach listeners in subscription order.
    pub fn subscribe_collisions(&mut self, listener: SharedListener) {
        self.listeners.subscribe(listener);
    }

    /// Remove the first registration of `listener`. No-op if absent.
    pub fn unsubscribe_collisions<L>(&mut self, listener: &Arc<Mutex<L>>) -> bool
    where
        L: CollisionListener + Send + ?Sized,
    {
        self.listeners.unsubscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Pairs touching at the end of the latest `simulate`.
    pub fn active_collisions(&self) -> &BTreeSet<BodyPair> {
        self.tracker.active()
    }

    pub fn is_touching(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.tracker.is_touching(BodyPair::new(a, b))
    }

    // -- Stepping -----------------------------------------------------------

    /// Advance by `time_step` seconds, then dispatch contact transitions.
    ///
    /// Time accumulates and the engine runs whole `fixed_dt` steps, at most
    /// `max_sub_steps` of them; time beyond that is dropped. With
    /// `max_sub_steps == 0` a single step of exactly `time_step` runs.
    /// A zero, negative or non-finite `time_step` advances nothing.
    pub fn simulate(&mut self, time_step: f32, max_sub_steps: u32) -> StepReport {
        let sub_steps = self.plan_sub_steps(time_step, max_sub_steps);
        for _ in 0..sub_steps {
            self.step_engine();
        }
        if sub_steps > 0 {
            self.refresh_contacts();
        }

        let transitions = self.handle_collisions();
        if !transitions.is_empty() {
            debug!(
                "simulate({time_step}): {sub_steps} steps, {} began, {} ended",
                transitions.began.len(),
                transitions.ended.len()
            );
        }

        StepReport {
            sub_steps,
            began: transitions.began.len(),
            ended: transitions.ended.len(),
        }
    }

    /// [`simulate`](Self::simulate) with the configured sub-step limit.
    pub fn advance(&mut self, time_step: f32) -> StepReport {
        self.simulate(time_step, self.max_sub_steps)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn plan_sub_steps(&mut self, time_step: f32, max_sub_steps: u32) -> u32 {
        let advancing = time_step.is_finite() && time_step > 0.0;

        if max_sub_steps == 0 {
            if !advancing {
                return 0;
            }
            self.integration_parameters.dt = time_step;
            return 1;
        }

        self.integration_parameters.dt = self.fixed_dt;
        if advancing {
            self.local_time += time_step;
        }
        if self.local_time < self.fixed_dt {
            return 0;
        }
        let whole = (self.local_time / self.fixed_dt).floor();
        self.local_time -= whole * self.fixed_dt;
        (whole as u32).min(max_sub_steps)
    }

    /// Run one engine step.
    fn step_engine(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.step_count += 1;
    }

    /// Recompute contacts for the poses the last engine step produced.
    ///
    /// The engine's narrow phase runs before integration, so after a step
    /// its contact graph describes where bodies were, not where they are.
    /// Only called after at least one engine step: this pass consumes the
    /// engine's pending body changes.
    fn refresh_contacts(&mut self) {
        self.collision_pipeline.step(
            self.integration_parameters.prediction_distance(),
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &(),
            &(),
        );
    }

    /// Canonical pairs of registered bodies with at least one contact point
    /// at or below zero distance. Predicted points ahead of impact don't count.
    fn touching_pairs(&self) -> BTreeSet<BodyPair> {
        let mut pairs = BTreeSet::new();
        for contact in self.narrow_phase.contact_pairs() {
            let touching = contact
                .manifolds
                .iter()
                .any(|m| m.points.iter().any(|p| p.dist <= 0.0));
            if !touching {
                continue;
            }
            // Colliders removed since the last engine step are gone here.
            let (Some(a), Some(b)) = (
                self.resolve_collider(contact.collider1),
                self.resolve_collider(contact.collider2),
            ) else {
                continue;
            };
            if a != b {
                pairs.insert(BodyPair::new(a, b));
            }
        }
        pairs
    }

    /// Diff this step's contacts against the last step's and notify
    /// listeners.
    fn handle_collisions(&mut self) -> Transitions {
        let pairs_this_step = self.touching_pairs();
        let transitions = self.tracker.update(pairs_this_step);
        if transitions.is_empty() {
            return transitions;
        }

        let events = transitions.events();
        for event in &events {
            trace!("{:?} {:?}", event.kind, event.pair);
        }
        self.listeners.dispatch(&events);
        transitions
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.records.len())
            .field("gravity", &self.gravity)
            .field("fixed_dt", &self.fixed_dt)
            .field("active_collisions", &self.tracker.active().len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
