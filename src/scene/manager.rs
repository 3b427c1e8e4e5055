use glam::Vec3;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use log::debug;

use crate::input::KeyId;
use crate::scene::entity::{EntityId, EntityKind, ShapeForm, VisualEntity};
use crate::speech::phrases::{PhrasePool, PhraseSource};

/*
Entity Lifecycle Manager
========================

The bridge from discrete input events to time-bounded visual entities.

Every qualifying key press ALWAYS spawns:

  one shape     random form from the fixed set, random color from the fixed
                palette, randomized position/velocity/spin/scale/lifetime
                within fixed ranges;

  one glyph     the pressed character itself, flying off on its own course.

And, at most once per cooldown window (4 s), one text fragment drawn from
the phrase pool. The spawn outcome reports the chosen phrase so the session
can hand it to the speech router - the scene layer itself never touches
audio.

The live collection is capped. Overflow drops the OLDEST entries silently
(no teardown here - an entity is plain data; dropping it from the collection
is its disposal, and it happens only on this side of the lock). The sweep
removes everything whose age has reached its lifetime.
*/

/// Fixed color palette for shapes and glyphs.
pub const PALETTE: [[f32; 3]; 8] = [
    [0.98, 0.36, 0.64], // magenta
    [0.36, 0.82, 0.98], // cyan
    [0.99, 0.78, 0.21], // amber
    [0.55, 0.95, 0.55], // mint
    [0.76, 0.49, 0.99], // violet
    [0.99, 0.52, 0.29], // coral
    [0.38, 0.56, 0.99], // cobalt
    [0.93, 0.93, 0.93], // starlight
];

#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Hard cap on live entities; the oldest are dropped beyond it.
    pub max_entities: usize,
    /// Seconds between text fragments (and opportunistic speech).
    pub text_cooldown: f64,
    pub shape_life: std::ops::Range<f64>,
    pub glyph_life: std::ops::Range<f64>,
    pub text_life: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_entities: 256,
            text_cooldown: 4.0,
            shape_life: 6.0..14.0,
            glyph_life: 3.0..7.0,
            text_life: 9.0,
        }
    }
}

/// What one input event produced.
#[derive(Debug, Default)]
pub struct SpawnOutcome {
    pub spawned: usize,
    /// Set when the cooldown allowed a text fragment; the caller may speak it.
    pub phrase: Option<String>,
}

pub struct Scene {
    entities: Vec<VisualEntity>,
    next_id: EntityId,
    last_text_at: Option<f64>,
    phrases: PhrasePool,
    rng: SmallRng,
    config: SceneConfig,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 0,
            last_text_at: None,
            phrases: PhrasePool::new(),
            rng: SmallRng::from_os_rng(),
            config,
        }
    }

    fn alloc_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    fn random_color(&mut self) -> [f32; 3] {
        *PALETTE.choose(&mut self.rng).unwrap_or(&PALETTE[0])
    }

    fn push(&mut self, entity: VisualEntity) {
        self.entities.push(entity);

        // Cap overflow: silently drop the oldest
        if self.entities.len() > self.config.max_entities {
            let overflow = self.entities.len() - self.config.max_entities;
            self.entities.drain(..overflow);
            debug!("entity cap reached, dropped {overflow} oldest");
        }
    }

    fn spawn_shape(&mut self, now: f64) {
        let id = self.alloc_id();
        let form = ShapeForm::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ShapeForm::Tetrahedron);
        let color = self.random_color();
        let life_time = self.rng.random_range(self.config.shape_life.clone());

        let entity = VisualEntity {
            id,
            kind: EntityKind::Shape { form, color },
            position: Vec3::new(
                self.rng.random_range(-40.0..40.0),
                self.rng.random_range(-25.0..25.0),
                self.rng.random_range(-60.0..-10.0),
            ),
            velocity: Vec3::new(
                self.rng.random_range(-2.0..2.0),
                self.rng.random_range(-1.5..1.5),
                self.rng.random_range(0.5..3.0),
            ),
            rotation: Vec3::ZERO,
            rotation_speed: Vec3::new(
                self.rng.random_range(-1.2..1.2),
                self.rng.random_range(-1.2..1.2),
                self.rng.random_range(-0.6..0.6),
            ),
            scale: self.rng.random_range(0.6..3.2),
            opacity: 0.0,
            created_at: now,
            life_time,
        };
        self.push(entity);
    }

    fn spawn_glyph(&mut self, key: KeyId, now: f64) {
        let id = self.alloc_id();
        let color = self.random_color();
        let life_time = self.rng.random_range(self.config.glyph_life.clone());

        let entity = VisualEntity {
            id,
            kind: EntityKind::Glyph { ch: key, color },
            position: Vec3::new(
                self.rng.random_range(-10.0..10.0),
                self.rng.random_range(-8.0..8.0),
                -12.0,
            ),
            velocity: Vec3::new(
                self.rng.random_range(-4.0..4.0),
                self.rng.random_range(1.0..5.0),
                self.rng.random_range(-1.0..1.0),
            ),
            rotation: Vec3::ZERO,
            rotation_speed: Vec3::new(0.0, 0.0, self.rng.random_range(-2.0..2.0)),
            scale: self.rng.random_range(0.8..1.6),
            opacity: 0.0,
            created_at: now,
            life_time,
        };
        self.push(entity);
    }

    fn spawn_text(&mut self, now: f64) -> String {
        let phrase = self.phrases.pick().to_string();
        let id = self.alloc_id();

        let entity = VisualEntity {
            id,
            kind: EntityKind::Text {
                phrase: phrase.clone(),
            },
            position: Vec3::new(self.rng.random_range(-18.0..18.0), -14.0, -20.0),
            velocity: Vec3::new(0.0, self.rng.random_range(0.8..1.8), 0.0),
            rotation: Vec3::ZERO,
            rotation_speed: Vec3::ZERO,
            scale: 1.0,
            opacity: 0.0,
            created_at: now,
            life_time: self.config.text_life,
        };
        self.push(entity);
        phrase
    }

    /// Handle one qualifying key press: always a shape and a glyph, plus a
    /// text fragment when the cooldown window has passed.
    pub fn add_shape_and_friends(&mut self, key: KeyId, now: f64) -> SpawnOutcome {
        let mut outcome = SpawnOutcome::default();

        self.spawn_shape(now);
        self.spawn_glyph(key, now);
        outcome.spawned = 2;

        let cooled_down = self
            .last_text_at
            .map(|at| now - at > self.config.text_cooldown)
            .unwrap_or(true);

        if cooled_down {
            outcome.phrase = Some(self.spawn_text(now));
            outcome.spawned += 1;
            self.last_text_at = Some(now);
        }

        outcome
    }

    /// Remove every entity whose age has reached its lifetime. Called by the
    /// periodic sweep timer; removal here is the entity's disposal.
    pub fn sweep(&mut self, now: f64) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| !e.expired(now));
        let removed = before - self.entities.len();
        if removed > 0 {
            debug!("sweep removed {removed} expired entities");
        }
        removed
    }

    /// Refresh the phrase pool from a text-generation source (fallback on
    /// failure is handled inside the pool).
    pub fn refresh_phrases(&mut self, source: &mut dyn PhraseSource) {
        self.phrases.refresh(source);
    }

    pub fn entities(&self) -> &[VisualEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [VisualEntity] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }
}
