//! Visual entity lifecycle: spawn on input events, per-frame kinematics and
//! fade, periodic sweep of the expired. The render pipeline itself lives
//! outside the crate; it only ever sees the plain-data snapshots produced by
//! `frame`.

pub mod entity;
pub mod frame;
pub mod manager;

pub use entity::{EntityId, EntityKind, ShapeForm, VisualEntity};
pub use frame::{FrameParams, FrameSnapshot};
pub use manager::{Scene, SceneConfig, SpawnOutcome};
