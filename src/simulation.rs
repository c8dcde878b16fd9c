use crate::config::{ConfigError, DampingOrder, SimConfig, TickRecipe};
use crate::grid::FluidGrid;
use glam::Vec2;

/// Owns a grid and runs the configured tick recipe over it.
///
/// Forcing from the input side goes through [`Simulation::apply_force`],
/// which rejects cells outside the grid before they reach the solver.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub grid: FluidGrid,
    config: SimConfig,
    ticks: usize,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: config.build_grid(),
            config,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn recipe(&self) -> TickRecipe {
        self.config.recipe
    }

    /// Takes effect from the next tick; the grid is kept. A recipe that would
    /// fail validation is rejected and the current one stays in place.
    pub fn set_recipe(&mut self, recipe: TickRecipe) -> Result<(), ConfigError> {
        let candidate = SimConfig {
            recipe,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Injects `force` at `(row, col)` if the cell is on the grid.
    /// Returns whether the force was applied.
    pub fn apply_force(&mut self, row: isize, col: isize, force: Vec2) -> bool {
        let n = self.grid.size() as isize;
        if !(0..n).contains(&row) || !(0..n).contains(&col) {
            log::warn!("rejected force at ({row}, {col}) outside {n}x{n} grid");
            return false;
        }
        self.grid
            .add_force(row as usize, col as usize, force.x, force.y);
        true
    }

    /// One full tick: swap, advect both components, enforce walls, then the
    /// optional projection and damping in the configured order.
    pub fn tick(&mut self) {
        let recipe = self.config.recipe;

        self.grid.swap();
        self.grid.advect_u();
        self.grid.advect_v();

        if recipe.damping_order == DampingOrder::BeforeBoundary {
            self.grid.dampen(recipe.damping_factor);
        }

        self.grid.boundary();

        if recipe.project {
            self.grid.project();
        }

        if recipe.damping_order == DampingOrder::AfterProjection {
            self.grid.dampen(recipe.damping_factor);
        }

        self.ticks += 1;
        log::debug!(
            "tick {} (project={}): energy {:.6}",
            self.ticks,
            recipe.project,
            self.grid.kinetic_energy()
        );
    }

    /// Replaces the grid with a fresh zeroed one.
    pub fn reset(&mut self) {
        self.grid = self.config.build_grid();
        self.ticks = 0;
        log::info!(
            "reset {}x{} grid",
            self.config.grid_size,
            self.config.grid_size
        );
    }
}
