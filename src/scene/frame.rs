use crate::scene::entity::VisualEntity;
use crate::scene::manager::Scene;

/*
Render/Update Loop boundary
===========================

Once per display frame, in this order:

  1. `advance` - integrate kinematics and recompute opacity for every live
     entity (the only place spatial state mutates);
  2. `snapshot` - copy the live set plus the global parameters into plain
     data for the render pipeline.

The pipeline on the other side rasterizes however it likes; this crate never
learns how. Within one tick boundary the frame update reads before the sweep
removes - both sides go through the scene lock, and snapshots are by-value,
so a swept entity can never be touched afterwards.
*/

/// Global render parameters delivered alongside the entity set.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    /// Starfield warp factor; rises while the drum machine runs.
    pub warp: f32,
    /// Audio-reactive glow intensities by band.
    pub glow_low: f32,
    pub glow_mid: f32,
    pub glow_high: f32,
    /// Effect toggles for the outer pipeline.
    pub starfield: bool,
    pub planet: bool,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            warp: 0.0,
            glow_low: 0.0,
            glow_mid: 0.0,
            glow_high: 0.0,
            starfield: true,
            planet: true,
        }
    }
}

/// Everything the render pipeline gets for one frame. Plain values, no
/// references back into the scene.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub entities: Vec<VisualEntity>,
    pub params: FrameParams,
}

/// Per-frame update: integrate every live entity by `dt` seconds.
pub fn advance(scene: &mut Scene, dt: f32, now: f64) {
    for entity in scene.entities_mut() {
        entity.update(dt, now);
    }
}

/// Copy the live set and parameters across the render boundary.
pub fn snapshot(scene: &Scene, params: FrameParams) -> FrameSnapshot {
    FrameSnapshot {
        entities: scene.entities().to_vec(),
        params,
    }
}
