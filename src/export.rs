use crate::grid::FluidGrid;
use crate::render::Renderer;
use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only view of a velocity field for drawing and analysis.
pub trait FieldView {
    fn size(&self) -> usize;
    fn u(&self) -> &[f32];
    fn v(&self) -> &[f32];
}

impl FieldView for FluidGrid {
    fn size(&self) -> usize { FluidGrid::size(self) }
    fn u(&self) -> &[f32] { &self.current().u }
    fn v(&self) -> &[f32] { &self.current().v }
}

impl FieldView for Simulation {
    fn size(&self) -> usize { self.grid.size() }
    fn u(&self) -> &[f32] { &self.grid.current().u }
    fn v(&self) -> &[f32] { &self.grid.current().v }
}

/// Serialized form of the current field, indexed `[row][col]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub grid_size: usize,
    pub dt: f32,
    pub u: Vec<Vec<f32>>,
    pub v: Vec<Vec<f32>>,
}

pub struct ImageExporter {
    renderer: Renderer,
}

impl ImageExporter {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            renderer: Renderer::new(width, height),
        }
    }

    pub fn export_velocity_png(
        &self,
        field: &impl FieldView,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let img = self.renderer.render_velocity_field(field);
        img.save(path)?;
        Ok(())
    }

    pub fn export_frame_sequence(
        &self,
        simulation: &mut Simulation,
        steps: usize,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for i in 0..steps {
            simulation.tick();

            let filename = format!("{}_frame_{:04}.png", prefix, i);
            let path = output_dir.join(filename);

            self.export_velocity_png(simulation, &path)?;
        }
        log::info!("exported {} frames to {}", steps, output_dir.display());
        Ok(())
    }
}
