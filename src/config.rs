use crate::grid::{
    BoundaryPolicy, FluidGrid, DEFAULT_DT, DEFAULT_PRESSURE_ITERATIONS, MIN_GRID_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "arrowflow.json";

/// Where damping sits in the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingOrder {
    /// `swap -> advect -> dampen -> boundary -> [project]`
    BeforeBoundary,
    /// `swap -> advect -> boundary -> [project] -> dampen`
    #[default]
    AfterProjection,
}

/// Stage sequence for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickRecipe {
    pub project: bool,
    pub damping_factor: f32,
    pub damping_order: DampingOrder,
}

impl TickRecipe {
    /// Divergence-corrected pipeline.
    pub fn projected(damping_factor: f32) -> Self {
        Self {
            project: true,
            damping_factor,
            damping_order: DampingOrder::AfterProjection,
        }
    }

    /// Damping-only pipeline with no pressure solve.
    pub fn damped_only(damping_factor: f32) -> Self {
        Self {
            project: false,
            damping_factor,
            damping_order: DampingOrder::BeforeBoundary,
        }
    }
}

impl Default for TickRecipe {
    fn default() -> Self {
        Self::projected(0.99)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_size: usize,
    pub scale_x: f32,
    pub scale_y: f32,
    pub dt: f32,
    pub pressure_iterations: usize,
    pub boundary: BoundaryPolicy,
    pub recipe: TickRecipe,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 40,
            scale_x: 160.0,
            scale_y: 160.0,
            dt: DEFAULT_DT,
            pressure_iterations: DEFAULT_PRESSURE_ITERATIONS,
            boundary: BoundaryPolicy::default(),
            recipe: TickRecipe::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    GridTooSmall(usize),
    DampingOutOfRange(f32),
    InvalidTimestep(f32),
    NoRelaxationSweeps,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GridTooSmall(n) => {
                write!(f, "grid_size {n} is below the minimum of {MIN_GRID_SIZE}")
            }
            ConfigError::DampingOutOfRange(factor) => {
                write!(f, "damping_factor {factor} must lie in (0, 1]")
            }
            ConfigError::InvalidTimestep(dt) => {
                write!(f, "dt {dt} must be finite and non-negative")
            }
            ConfigError::NoRelaxationSweeps => write!(f, "pressure_iterations must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        let factor = self.recipe.damping_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::DampingOutOfRange(factor));
        }
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(ConfigError::InvalidTimestep(self.dt));
        }
        if self.pressure_iterations == 0 {
            return Err(ConfigError::NoRelaxationSweeps);
        }
        Ok(())
    }

    /// Fresh zeroed grid with this configuration's numerics.
    pub fn build_grid(&self) -> FluidGrid {
        FluidGrid::new(self.grid_size, self.scale_x, self.scale_y)
            .with_dt(self.dt)
            .with_pressure_iterations(self.pressure_iterations)
            .with_boundary_policy(self.boundary)
    }
}

pub fn from_json_str(contents: &str) -> Result<SimConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

/// Reads `path`, falling back to defaults when it is absent or unusable.
pub fn load(path: &Path) -> SimConfig {
    if !path.exists() {
        return SimConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match from_json_str(&contents) {
            Ok(cfg) => {
                log::info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("failed to parse {}: {e}; using defaults", path.display());
                SimConfig::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read {}: {e}; using defaults", path.display());
            SimConfig::default()
        }
    }
}
