use glam::DVec2;
use rand::RngExt;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::field::FlowField;

/// Everything needed to draw a particle for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub position: DVec2,
    /// Direction of travel in radians, `-PI..=PI`
    pub heading: f64,
    /// Rotation that points the particle's local +y axis along its velocity
    pub orientation: f64,
    /// Heading mapped onto 0..=100
    pub hue: f64,
    /// Speed as a fraction of the particle's cap, 0..=1
    pub speed: f64,
    pub size: f64,
}

impl RenderState {
    /// Fill colour: hue with no saturation, brightness tracks speed.
    pub fn fill_hsb(&self) -> (f64, f64, f64) {
        (self.hue, 0.0, 100.0 * self.speed)
    }

    /// Outline colour: fully saturated hue, drawn at `speed` opacity.
    pub fn stroke_hsb(&self) -> (f64, f64, f64) {
        (self.hue, 100.0, 100.0)
    }

    /// Fill opacity tracks speed, so slow particles fade out.
    pub fn fill_alpha(&self) -> f64 {
        self.speed
    }

    pub fn stroke_alpha(&self) -> f64 {
        self.speed
    }

    /// Triangle corners in canvas space, tip first.
    pub fn triangle(&self) -> [DVec2; 3] {
        let s = self.size;
        let rot = DVec2::from_angle(self.orientation);
        [
            DVec2::new(0.0, s * 2.0),
            DVec2::new(s, -s * 2.0),
            DVec2::new(-s, -s * 2.0),
        ]
        .map(|corner| self.position + rot.rotate(corner))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub max_speed: f64,
    pub size: f64,
}

impl Particle {
    pub fn new(position: DVec2, max_speed: f64, size: f64) -> Self {
        Particle {
            position,
            velocity: DVec2::ZERO,
            max_speed,
            size,
        }
    }

    /// A particle at `position` with a speed cap drawn from `speed_range`.
    pub fn random_speed<R: RngExt>(
        position: DVec2,
        speed_range: (f64, f64),
        size: f64,
        rng: &mut R,
    ) -> Self {
        let (lo, hi) = speed_range;
        let max_speed = if hi > lo { rng.random_range(lo..hi) } else { lo };
        Particle::new(position, max_speed, size)
    }

    /// The field vector under the particle is the steering force as-is.
    pub fn steer(&self, field: &FlowField) -> DVec2 {
        let (x, y) = field.cell_of(self.position);
        field.vector_at(x, y)
    }

    pub fn update(&mut self, field: &FlowField, width: f64, height: f64) {
        self.velocity += self.steer(field);
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
        self.position += self.velocity;
        self.wraparound(width, height);
    }

    /// Re-enter from the opposite edge, landing five sizes inside it.
    pub fn wraparound(&mut self, width: f64, height: f64) {
        let margin = self.size * 5.0;

        if self.position.x < -self.size {
            self.position.x = width - margin;
        } else if self.position.x > width + self.size {
            self.position.x = margin;
        }

        if self.position.y < -self.size {
            self.position.y = height - margin;
        } else if self.position.y > height + self.size {
            self.position.y = margin;
        }
    }

    pub fn heading(&self) -> f64 {
        self.velocity.y.atan2(self.velocity.x)
    }

    pub fn render_state(&self) -> RenderState {
        let heading = self.heading();
        let speed = if self.max_speed > 0.0 {
            (self.velocity.length() / self.max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        RenderState {
            position: self.position,
            heading,
            orientation: heading - FRAC_PI_2,
            hue: 100.0 * (heading + PI) / TAU,
            speed,
            size: self.size,
        }
    }
}

/// Particles in draw order.
#[derive(Debug, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// `count` particles spread uniformly over a `width x height` canvas.
    pub fn scattered<R: RngExt>(
        count: usize,
        width: f64,
        height: f64,
        speed_range: (f64, f64),
        size: f64,
        rng: &mut R,
    ) -> Self {
        let particles = (0..count)
            .map(|_| {
                let position = DVec2::new(
                    rng.random_range(0.0..width.max(f64::MIN_POSITIVE)),
                    rng.random_range(0.0..height.max(f64::MIN_POSITIVE)),
                );
                Particle::random_speed(position, speed_range, size, rng)
            })
            .collect();
        ParticleSet { particles }
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn update(&mut self, field: &FlowField, width: f64, height: f64) {
        for p in &mut self.particles {
            p.update(field, width, height);
        }
    }

    pub fn render_states(&self) -> impl Iterator<Item = RenderState> + '_ {
        self.particles.iter().map(Particle::render_state)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }
}
