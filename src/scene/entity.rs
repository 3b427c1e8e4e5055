use glam::Vec3;

/*
Visual Entities
===============

A VisualEntity is a time-bounded animated object: it is born at `created_at`,
lives exactly `life_time` seconds, and is eligible for update and display iff

    now - created_at < life_time

Defining fields (kind, lifetime, spawn time) are immutable after creation.
Spatial state and opacity are mutated once per frame by the frame update, and
only there. Removal is the sweep's job; by the time an entity leaves the live
collection, nothing downstream holds a reference to it - snapshots across the
render boundary are plain copies.

Kinds are a closed tagged union. Kinematics and the opacity curve are
kind-agnostic; the only per-kind difference is the fade thresholds, kept as
separate constants because the original tuning differs slightly between
shapes/glyphs and text and there is no reason to believe that is an accident.
*/

pub type EntityId = u64;

/// Fixed set of shape geometries the spawner draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeForm {
    Tetrahedron,
    Cube,
    Octahedron,
    Icosahedron,
    Torus,
    Spiral,
}

impl ShapeForm {
    pub const ALL: [ShapeForm; 6] = [
        ShapeForm::Tetrahedron,
        ShapeForm::Cube,
        ShapeForm::Octahedron,
        ShapeForm::Icosahedron,
        ShapeForm::Torus,
        ShapeForm::Spiral,
    ];
}

/// What an entity is, with its per-kind payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Shape { form: ShapeForm, color: [f32; 3] },
    Text { phrase: String },
    Glyph { ch: char, color: [f32; 3] },
}

/// Fade thresholds as fractions of the lifetime: opacity ramps in until
/// `fade_in`, holds, and ramps out after `fade_out`.
#[derive(Debug, Clone, Copy)]
pub struct FadeCurve {
    pub fade_in: f64,
    pub fade_out: f64,
}

/// Shapes and flying glyphs share one tuning…
pub const SHAPE_FADE: FadeCurve = FadeCurve {
    fade_in: 0.10,
    fade_out: 0.85,
};

/// …text fragments use a slightly earlier, longer one.
pub const TEXT_FADE: FadeCurve = FadeCurve {
    fade_in: 0.08,
    fade_out: 0.80,
};

#[derive(Debug, Clone)]
pub struct VisualEntity {
    pub id: EntityId,
    pub kind: EntityKind,

    // Spatial state, mutated per frame
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub rotation_speed: Vec3,
    pub scale: f32,
    pub opacity: f32,

    // Immutable after creation
    pub created_at: f64,
    pub life_time: f64,
}

impl VisualEntity {
    pub fn age(&self, now: f64) -> f64 {
        now - self.created_at
    }

    /// True once the entity has outlived its lifetime - the sweep removes it
    /// on its next pass.
    pub fn expired(&self, now: f64) -> bool {
        self.age(now) >= self.life_time
    }

    pub fn fade_curve(&self) -> FadeCurve {
        match self.kind {
            EntityKind::Text { .. } => TEXT_FADE,
            EntityKind::Shape { .. } | EntityKind::Glyph { .. } => SHAPE_FADE,
        }
    }

    /// Advance kinematics and recompute opacity for this frame.
    pub fn update(&mut self, dt: f32, now: f64) {
        self.position += self.velocity * dt;
        self.rotation += self.rotation_speed * dt;
        self.opacity = self.opacity_at(now);
    }

    /// Opacity from the age fraction and the kind's fade curve.
    pub fn opacity_at(&self, now: f64) -> f32 {
        let u = (self.age(now) / self.life_time).clamp(0.0, 1.0);
        let curve = self.fade_curve();

        let value = if u < curve.fade_in {
            u / curve.fade_in
        } else if u > curve.fade_out {
            (1.0 - u) / (1.0 - curve.fade_out)
        } else {
            1.0
        };

        value.clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(created_at: f64, life_time: f64) -> VisualEntity {
        VisualEntity {
            id: 1,
            kind: EntityKind::Shape {
                form: ShapeForm::Cube,
                color: [1.0, 0.5, 0.0],
            },
            position: Vec3::ZERO,
            velocity: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
            rotation_speed: Vec3::new(0.0, 0.5, 0.0),
            scale: 1.0,
            opacity: 0.0,
            created_at,
            life_time,
        }
    }

    #[test]
    fn visible_strictly_inside_its_lifetime() {
        let entity = shape(10.0, 4.0);
        assert!(!entity.expired(10.0));
        assert!(!entity.expired(13.9));
        assert!(entity.expired(14.0), "boundary counts as expired");
        assert!(entity.expired(20.0));
    }

    #[test]
    fn kinematics_integrate_velocity_and_spin() {
        let mut entity = shape(0.0, 10.0);
        entity.update(0.5, 0.5);

        assert!((entity.position.x - 0.5).abs() < 1e-6);
        assert!((entity.rotation.y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn opacity_ramps_in_holds_and_ramps_out() {
        let entity = shape(0.0, 10.0);

        // Mid fade-in (10% threshold for shapes): halfway at age 0.5
        assert!((entity.opacity_at(0.5) - 0.5).abs() < 1e-4);
        // Held at full
        assert!((entity.opacity_at(5.0) - 1.0).abs() < 1e-6);
        // Past the 85% threshold: halfway out at u = 0.925
        assert!((entity.opacity_at(9.25) - 0.5).abs() < 1e-4);
        // At the end, gone
        assert!(entity.opacity_at(10.0) < 1e-6);
    }

    #[test]
    fn text_uses_its_own_fade_thresholds() {
        let text = VisualEntity {
            kind: EntityKind::Text {
                phrase: "the void hums".into(),
            },
            ..shape(0.0, 10.0)
        };

        // At u = 0.09: shapes are still fading in (0.9), text is already full
        assert!((text.opacity_at(0.9) - 1.0).abs() < 1e-6);
        let as_shape = shape(0.0, 10.0);
        assert!(as_shape.opacity_at(0.9) < 1.0);

        // At u = 0.82: text is fading out, shapes still full
        assert!(text.opacity_at(8.2) < 1.0);
        assert!((as_shape.opacity_at(8.2) - 1.0).abs() < 1e-6);
    }
}
