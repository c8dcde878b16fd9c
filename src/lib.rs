//! Two-dimensional velocity field solver for arrowflow.
//!
//! [`FluidGrid`] holds the solver state and exposes each pipeline stage on
//! its own; [`Simulation`] runs a configured [`TickRecipe`] over it.

pub mod analysis;
pub mod config;
pub mod desktop;
pub mod export;
pub mod grid;
pub mod render;
pub mod simulation;

pub use analysis::{AnalysisRecorder, FieldMetrics};
pub use config::{ConfigError, DampingOrder, SimConfig, TickRecipe};
pub use desktop::ArrowFlowApp;
pub use export::{FieldSnapshot, FieldView, ImageExporter};
pub use grid::{BoundaryPolicy, FluidGrid, VelocityField};
pub use render::Renderer;
pub use simulation::Simulation;
