pub const MAX_GRID: usize = 50;
pub const MAX_OCTAVES: usize = 10;
pub const MAX_XY_INCREMENT: f64 = 0.2;
pub const MAX_Z_INCREMENT: f64 = 0.05;
pub const MAX_COUNT: usize = 5000;

/// A partial settings change; `None` keeps the current value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettingsUpdate {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub octaves: Option<usize>,
    pub falloff: Option<f64>,
    pub xy_increment: Option<f64>,
    pub z_increment: Option<f64>,
    pub count: Option<usize>,
    pub fade: Option<f64>,
    pub animate: Option<bool>,
    pub draw_field: Option<bool>,
    pub show_diagnostics: Option<bool>,
}

/// Clamp a requested particle count. Spawns may grow the live count past
/// this; only counts asked for up front are capped.
pub fn requested_count(count: usize) -> usize {
    count.clamp(1, MAX_COUNT)
}

/// Snapshot of every tunable the simulation reads during a step.
/// Mutate only between frames via [`Settings::apply`] so values stay clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rows: usize,
    pub columns: usize,
    pub octaves: usize,
    pub falloff: f64,
    pub xy_increment: f64,
    pub z_increment: f64,
    pub count: usize,
    /// Canvas size in pixels
    pub width: f64,
    pub height: f64,
    pub seed: u32,
    pub min_speed: f64,
    pub max_speed: f64,
    pub particle_size: f64,
    /// Fraction of the previous frame kept each frame (trail length)
    pub fade: f64,
    pub animate: bool,
    pub draw_field: bool,
    pub show_diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rows: 15,
            columns: 15,
            octaves: 4,
            falloff: 0.65,
            xy_increment: 0.05,
            z_increment: 0.001,
            count: 300,
            width: 0.0,
            height: 0.0,
            seed: 0,
            min_speed: 0.5,
            max_speed: 1.75,
            particle_size: 1.0,
            fade: 0.8,
            animate: true,
            draw_field: false,
            show_diagnostics: true,
        }
    }
}

/// Which parts of the simulation must be rebuilt after a settings change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rebuild {
    pub field: bool,
    pub particles: bool,
}

impl Settings {
    /// Force every field into its documented range.
    pub fn clamped(mut self) -> Self {
        self.rows = self.rows.clamp(1, MAX_GRID);
        self.columns = self.columns.clamp(1, MAX_GRID);
        self.octaves = self.octaves.clamp(1, MAX_OCTAVES);
        self.falloff = clamp_unit(self.falloff);
        self.xy_increment = clamp_or(self.xy_increment, 0.0, MAX_XY_INCREMENT, 0.05);
        self.z_increment = clamp_or(self.z_increment, 0.0, MAX_Z_INCREMENT, 0.001);
        self.count = self.count.max(1);
        self.fade = clamp_unit(self.fade);
        self.min_speed = clamp_or(self.min_speed, 0.0, f64::MAX, 0.0);
        self.max_speed = clamp_or(self.max_speed, 0.0, f64::MAX, 0.0);
        if self.min_speed > self.max_speed {
            std::mem::swap(&mut self.min_speed, &mut self.max_speed);
        }
        if !(self.particle_size.is_finite() && self.particle_size > 0.0) {
            self.particle_size = 1.0;
        }
        self
    }

    /// Merge a partial update, clamping the result. Returns what needs rebuilding.
    pub fn apply(&mut self, params: &SettingsUpdate) -> Rebuild {
        let before = self.clone();
        let mut next = self.clone();

        if let Some(v) = params.rows {
            next.rows = v;
        }
        if let Some(v) = params.columns {
            next.columns = v;
        }
        if let Some(v) = params.octaves {
            next.octaves = v;
        }
        if let Some(v) = params.falloff {
            next.falloff = v;
        }
        if let Some(v) = params.xy_increment {
            next.xy_increment = v;
        }
        if let Some(v) = params.z_increment {
            next.z_increment = v;
        }
        if let Some(v) = params.count {
            next.count = requested_count(v);
        }
        if let Some(v) = params.fade {
            next.fade = v;
        }
        if let Some(v) = params.animate {
            next.animate = v;
        }
        if let Some(v) = params.draw_field {
            next.draw_field = v;
        }
        if let Some(v) = params.show_diagnostics {
            next.show_diagnostics = v;
        }

        *self = next.clamped();
        Rebuild {
            field: self.rows != before.rows || self.columns != before.columns,
            particles: self.count != before.count,
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    clamp_or(v, 0.0, 1.0, 0.0)
}

// NaN has no place in the range, so it falls back instead of propagating
fn clamp_or(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v.clamp(lo, hi) }
}
