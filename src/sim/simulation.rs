use glam::DVec2;
use rand::rngs::ThreadRng;
use tracing::{debug, info, warn};

use super::field::FlowField;
use super::noise::NoiseSource;
use super::particle::{Particle, ParticleSet};
use super::settings::{Rebuild, Settings, SettingsUpdate};
use super::{DrawSurface, SimError};

/// Owns the field, the particles and the settings snapshot they run under.
pub struct Simulation {
    settings: Settings,
    noise: NoiseSource,
    field: FlowField,
    particles: ParticleSet,
    /// Temporal noise coordinate, advanced once per step
    zoff: f64,
    rng: ThreadRng,
}

impl Simulation {
    pub fn initialize(settings: Settings) -> Result<Self, SimError> {
        if settings.rows == 0 || settings.columns == 0 {
            return Err(SimError::EmptyGrid {
                rows: settings.rows,
                columns: settings.columns,
            });
        }
        check_canvas(settings.width, settings.height)?;

        let settings = settings.clamped();
        let mut rng = rand::rng();
        let noise = NoiseSource::new(settings.seed, settings.octaves, settings.falloff);
        let mut field = FlowField::new(&settings);
        field.build(&settings, &noise, 0.0);
        let particles = scatter(&settings, &mut rng);

        info!(
            rows = settings.rows,
            columns = settings.columns,
            count = settings.count,
            width = settings.width,
            height = settings.height,
            seed = settings.seed,
            "simulation initialized"
        );

        Ok(Simulation {
            settings,
            noise,
            field,
            particles,
            zoff: 0.0,
            rng,
        })
    }

    /// Rebuild the field at the current time, advance time, move every particle.
    pub fn step(&mut self) {
        self.noise.set_detail(self.settings.octaves, self.settings.falloff);
        self.field.build(&self.settings, &self.noise, self.zoff);
        self.zoff += self.settings.z_increment;
        self.particles
            .update(&self.field, self.settings.width, self.settings.height);
    }

    pub fn render<S: DrawSurface>(&self, surface: &mut S) {
        if self.settings.draw_field {
            for line in self.field.lines() {
                surface.draw_field_line(&line);
            }
        }
        for state in self.particles.render_states() {
            surface.draw_particle(&state);
        }
    }

    /// Add one particle at `point` and bump the target count to match.
    pub fn spawn(&mut self, point: DVec2) {
        let particle = Particle::random_speed(
            point,
            (self.settings.min_speed, self.settings.max_speed),
            self.settings.particle_size,
            &mut self.rng,
        );
        self.particles.push(particle);
        self.settings.count += 1;
    }

    /// New canvas size. Particles keep their positions and wrap back in.
    pub fn resize(&mut self, width: f64, height: f64) {
        if let Err(e) = check_canvas(width, height) {
            warn!("ignoring resize: {}", e);
            return;
        }
        self.settings.width = width;
        self.settings.height = height;
        self.field.resize(width, height);
        debug!(width, height, cell = ?self.field.cell_size(), "canvas resized");
    }

    /// Apply a partial settings update between frames.
    pub fn apply(&mut self, params: &SettingsUpdate) -> Rebuild {
        let rebuild = self.settings.apply(params);
        if rebuild.field {
            self.field = FlowField::new(&self.settings);
            self.noise.set_detail(self.settings.octaves, self.settings.falloff);
            self.field.build(&self.settings, &self.noise, self.zoff);
            info!(rows = self.settings.rows, columns = self.settings.columns, "flow field rebuilt");
        }
        if rebuild.particles {
            self.particles = scatter(&self.settings, &mut self.rng);
            info!(count = self.settings.count, "particles rebuilt");
        }
        debug!(?params, "settings applied");
        rebuild
    }

    pub fn toggle_animate(&mut self) -> bool {
        self.settings.animate = !self.settings.animate;
        self.settings.animate
    }

    pub fn toggle_field(&mut self) -> bool {
        self.settings.draw_field = !self.settings.draw_field;
        self.settings.draw_field
    }

    pub fn toggle_diagnostics(&mut self) -> bool {
        self.settings.show_diagnostics = !self.settings.show_diagnostics;
        self.settings.show_diagnostics
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn field(&self) -> &FlowField {
        &self.field
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn zoff(&self) -> f64 {
        self.zoff
    }
}

fn check_canvas(width: f64, height: f64) -> Result<(), SimError> {
    if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
        Ok(())
    } else {
        Err(SimError::EmptyCanvas { width, height })
    }
}

fn scatter(settings: &Settings, rng: &mut ThreadRng) -> ParticleSet {
    ParticleSet::scattered(
        settings.count,
        settings.width,
        settings.height,
        (settings.min_speed, settings.max_speed),
        settings.particle_size,
        rng,
    )
}
