//! Rain statistics and the per-frame step system.

use bevy::log::error;
use bevy::prelude::*;

use cuberain_physics::world::PhysicsWorld;

use crate::rain::{CubeRain, FrameReport};

// ---------------------------------------------------------------------------
// RainStats
// ---------------------------------------------------------------------------

/// Bevy resource with cumulative counters over all frames.
#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct RainStats {
    pub frames: u64,
    pub engine_steps: u64,
    pub contacts_began: u64,
    pub contacts_ended: u64,
    pub cubes_recycled: u64,
    /// Most cubes highlighted at once.
    pub peak_highlighted: usize,
    /// Frames whose update failed.
    pub failed_frames: u64,
    pub last_frame: FrameReport,
}

impl RainStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame into the totals.
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.engine_steps += u64::from(report.sub_steps);
        self.contacts_began += report.began as u64;
        self.contacts_ended += report.ended as u64;
        self.cubes_recycled += report.recycled as u64;
        self.peak_highlighted = self.peak_highlighted.max(report.highlighted);
        self.last_frame = *report;
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Advances the rain by the configured frame time on every app update.
#[allow(clippy::needless_pass_by_value)]
pub fn cube_rain_step_system(
    mut world: ResMut<PhysicsWorld>,
    mut rain: ResMut<CubeRain>,
    mut stats: ResMut<RainStats>,
) {
    let frame_dt = rain.config().frame_dt;
    match rain.update(&mut world, frame_dt) {
        Ok(report) => stats.record(&report),
        Err(err) => {
            stats.failed_frames += 1;
            error!("cube rain frame failed: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
