//! Flow field simulation core: noise, vector grid, particles and the
//! orchestrator that advances them one frame at a time.

pub mod field;
pub mod noise;
pub mod particle;
pub mod settings;
pub mod simulation;

use std::fmt;

pub use field::FieldLine;
pub use particle::RenderState;
pub use settings::{Settings, SettingsUpdate};
pub use simulation::Simulation;

/// Anything the simulation can draw itself onto.
pub trait DrawSurface {
    fn draw_particle(&mut self, state: &RenderState);

    fn draw_field_line(&mut self, line: &FieldLine);
}

/// Configurations the simulation refuses to start from.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    EmptyGrid { rows: usize, columns: usize },
    EmptyCanvas { width: f64, height: f64 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::EmptyGrid { rows, columns } => {
                write!(f, "flow field needs at least one row and column (got {}x{})", rows, columns)
            }
            SimError::EmptyCanvas { width, height } => {
                write!(f, "canvas must have a positive size (got {}x{})", width, height)
            }
        }
    }
}

impl std::error::Error for SimError {}

impl From<SimError> for std::io::Error {
    fn from(e: SimError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    }
}
