//! Double-buffered velocity grid and the stages of one solver tick.
//!
//! Fields are stored row-major (`idx = row * n + col`, row = y, col = x).
//! Nothing here detects NaN or overflow: unbounded forcing or a huge `dt`
//! can destabilize the field, and damping is the only mitigation.

use crate::export::FieldSnapshot;
use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const DEFAULT_DT: f32 = 0.1;
pub const DEFAULT_PRESSURE_ITERATIONS: usize = 20;

/// Smallest grid that still has an interior cell.
pub const MIN_GRID_SIZE: usize = 3;

/// What the wall-normal velocity component becomes at an edge cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Negated copy of the adjacent interior cell.
    #[default]
    Mirror,
    /// Zero.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    U,
    V,
}

/// Which walls a field is normal to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Normal {
    /// Horizontal velocity: normal to the left and right walls.
    LeftRight,
    /// Vertical velocity: normal to the top and bottom walls.
    TopBottom,
    /// Scalar field (pressure): copied from the interior on every wall.
    Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VelocityField {
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

impl VelocityField {
    fn zeroed(size: usize) -> Self {
        Self {
            u: vec![0.0; size],
            v: vec![0.0; size],
        }
    }
}

#[derive(Debug, Clone)]
pub struct FluidGrid {
    n: usize,
    pub scale_x: f32,
    pub scale_y: f32,
    pub dt: f32,
    pub pressure_iterations: usize,
    pub boundary_policy: BoundaryPolicy,
    buffers: [VelocityField; 2],
    current: usize,
    divergence: Vec<f32>,
    pressure: Vec<f32>,
}

impl FluidGrid {
    /// Allocates an `n`x`n` grid with every field zeroed.
    ///
    /// `scale_x`/`scale_y` only size the rendered glyphs; the solver works
    /// in grid cells.
    pub fn new(n: usize, scale_x: f32, scale_y: f32) -> Self {
        assert!(
            n >= MIN_GRID_SIZE,
            "grid size {n} is below the minimum of {MIN_GRID_SIZE}"
        );
        let size = n * n;
        Self {
            n,
            scale_x,
            scale_y,
            dt: DEFAULT_DT,
            pressure_iterations: DEFAULT_PRESSURE_ITERATIONS,
            boundary_policy: BoundaryPolicy::default(),
            buffers: [VelocityField::zeroed(size), VelocityField::zeroed(size)],
            current: 0,
            divergence: vec![0.0; size],
            pressure: vec![0.0; size],
        }
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_pressure_iterations(mut self, iterations: usize) -> Self {
        self.pressure_iterations = iterations;
        self
    }

    pub fn with_boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary_policy = policy;
        self
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.n + col
    }

    #[inline]
    fn check_cell(&self, row: usize, col: usize) {
        assert!(
            row < self.n && col < self.n,
            "cell ({row}, {col}) is outside the {n}x{n} grid",
            n = self.n
        );
    }

    pub fn current(&self) -> &VelocityField {
        &self.buffers[self.current]
    }

    pub fn previous(&self) -> &VelocityField {
        &self.buffers[1 - self.current]
    }

    fn current_mut(&mut self) -> &mut VelocityField {
        &mut self.buffers[self.current]
    }

    /// Mutable "current" alongside read-only "previous".
    fn split_buffers(&mut self) -> (&mut VelocityField, &VelocityField) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&mut first[0], &second[0])
        } else {
            (&mut second[0], &first[0])
        }
    }

    /// Accumulates `(fx, fy)` into one cell of the current field.
    ///
    /// Callers bounds-check first; an out-of-range cell panics.
    pub fn add_force(&mut self, row: usize, col: usize, fx: f32, fy: f32) {
        self.check_cell(row, col);
        let idx = self.idx(row, col);
        let field = self.current_mut();
        field.u[idx] += fx;
        field.v[idx] += fy;
    }

    /// Exchanges the current and previous buffers without copying.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn advect_u(&mut self) {
        self.advect(Component::U);
    }

    pub fn advect_v(&mut self) {
        self.advect(Component::V);
    }

    /// Semi-Lagrangian self-advection of one component from "previous" into
    /// "current". Every cell, edges included, is overwritten.
    fn advect(&mut self, component: Component) {
        let n = self.n;
        let dt = self.dt;
        let max = n as f32 - 1.5;
        let (current, previous) = self.split_buffers();
        let (target, source) = match component {
            Component::U => (&mut current.u, &previous.u),
            Component::V => (&mut current.v, &previous.v),
        };
        let prev_u = &previous.u;
        let prev_v = &previous.v;

        target
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(row, out)| {
                for (col, cell) in out.iter_mut().enumerate() {
                    let idx = row * n + col;
                    let x = (col as f32 - dt * prev_u[idx]).clamp(0.5, max);
                    let y = (row as f32 - dt * prev_v[idx]).clamp(0.5, max);
                    *cell = bilinear(source, n, x, y);
                }
            });
    }

    /// Applies the wall rule to both components of the current field.
    ///
    /// Wall-normal components follow `boundary_policy` and tangential ones
    /// copy the adjacent interior cell. Under `Mirror` each corner is the mean
    /// of its two edge neighbours (which cancels to zero for a mirrored pair);
    /// under `Zero` both components are zeroed at the corners.
    pub fn boundary(&mut self) {
        let n = self.n;
        let policy = self.boundary_policy;
        let field = self.current_mut();
        enforce_walls(&mut field.u, n, Normal::LeftRight, policy);
        enforce_walls(&mut field.v, n, Normal::TopBottom, policy);
    }

    /// Removes the divergent part of the current field by subtracting the
    /// gradient of a pressure field relaxed with a fixed number of
    /// Gauss-Seidel sweeps. No convergence check is made.
    pub fn project(&mut self) {
        let n = self.n;
        self.divergence.fill(0.0);
        self.pressure.fill(0.0);

        let field = &self.buffers[self.current];
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                let idx = i * n + j;
                self.divergence[idx] = -0.5
                    * (field.u[idx + 1] - field.u[idx - 1] + field.v[idx + n]
                        - field.v[idx - n]);
            }
        }

        for _ in 0..self.pressure_iterations {
            for i in 1..n - 1 {
                for j in 1..n - 1 {
                    let idx = i * n + j;
                    self.pressure[idx] = (self.divergence[idx]
                        + self.pressure[idx - n]
                        + self.pressure[idx + n]
                        + self.pressure[idx - 1]
                        + self.pressure[idx + 1])
                        / 4.0;
                }
            }
            enforce_walls(&mut self.pressure, n, Normal::Scalar, self.boundary_policy);
        }

        let field = &mut self.buffers[self.current];
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                let idx = i * n + j;
                field.u[idx] -= 0.5 * (self.pressure[idx + 1] - self.pressure[idx - 1]);
                field.v[idx] -= 0.5 * (self.pressure[idx + n] - self.pressure[idx - n]);
            }
        }

        self.boundary();
    }

    /// Scales every velocity sample by `factor`, expected in `(0, 1]`.
    pub fn dampen(&mut self, factor: f32) {
        let field = self.current_mut();
        field.u.iter_mut().for_each(|u| *u *= factor);
        field.v.iter_mut().for_each(|v| *v *= factor);
    }

    pub fn get_u(&self, row: usize, col: usize) -> f32 {
        self.check_cell(row, col);
        self.current().u[self.idx(row, col)]
    }

    pub fn get_v(&self, row: usize, col: usize) -> f32 {
        self.check_cell(row, col);
        self.current().v[self.idx(row, col)]
    }

    pub fn velocity(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(self.get_u(row, col), self.get_v(row, col))
    }

    /// Centered-difference divergence of the current field at an interior
    /// cell, using the same scaling as the projection source term.
    pub fn divergence_at(&self, row: usize, col: usize) -> f32 {
        assert!(
            (1..self.n - 1).contains(&row) && (1..self.n - 1).contains(&col),
            "divergence is only defined at interior cells, got ({row}, {col})"
        );
        let n = self.n;
        let idx = self.idx(row, col);
        let field = self.current();
        -0.5 * (field.u[idx + 1] - field.u[idx - 1] + field.v[idx + n] - field.v[idx - n])
    }

    pub fn max_abs_divergence(&self) -> f32 {
        let n = self.n;
        (1..n - 1)
            .flat_map(|i| (1..n - 1).map(move |j| (i, j)))
            .map(|(i, j)| self.divergence_at(i, j).abs())
            .fold(0.0, f32::max)
    }

    /// Sum of `u² + v²` over the current field.
    pub fn kinetic_energy(&self) -> f32 {
        let field = self.current();
        field
            .u
            .iter()
            .zip(&field.v)
            .map(|(u, v)| u * u + v * v)
            .sum()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let field = self.current();
        let rows = |data: &[f32]| -> Vec<Vec<f32>> {
            data.chunks(self.n).map(<[f32]>::to_vec).collect()
        };
        FieldSnapshot {
            grid_size: self.n,
            dt: self.dt,
            u: rows(&field.u),
            v: rows(&field.v),
        }
    }

    /// Writes the current field as pretty-printed JSON.
    pub fn dump_log(&self, writer: impl Write) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer_pretty(writer, &self.snapshot())?;
        Ok(())
    }

    pub fn dump_log_to_path(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.dump_log(&mut writer)?;
        writer.flush()?;
        log::info!("dumped {}x{} field to {}", self.n, self.n, path.display());
        Ok(())
    }
}

/// Bilinear sample of an `n`x`n` field at fractional `(x, y)`.
/// Callers keep `x, y` within `[0, n - 1]`.
pub fn bilinear(field: &[f32], n: usize, x: f32, y: f32) -> f32 {
    let x0 = (x.floor() as usize).min(n - 1);
    let y0 = (y.floor() as usize).min(n - 1);
    let x1 = (x0 + 1).min(n - 1);
    let y1 = (y0 + 1).min(n - 1);

    let sx = x - x0 as f32;
    let sy = y - y0 as f32;

    (1.0 - sx) * (1.0 - sy) * field[y0 * n + x0]
        + sx * (1.0 - sy) * field[y0 * n + x1]
        + (1.0 - sx) * sy * field[y1 * n + x0]
        + sx * sy * field[y1 * n + x1]
}

fn wall_value(interior: f32, is_normal: bool, policy: BoundaryPolicy) -> f32 {
    match (is_normal, policy) {
        (false, _) => interior,
        (true, BoundaryPolicy::Mirror) => -interior,
        (true, BoundaryPolicy::Zero) => 0.0,
    }
}

fn enforce_walls(x: &mut [f32], n: usize, normal: Normal, policy: BoundaryPolicy) {
    let top_bottom = normal == Normal::TopBottom;
    let left_right = normal == Normal::LeftRight;

    for j in 1..n - 1 {
        x[j] = wall_value(x[n + j], top_bottom, policy);
        x[(n - 1) * n + j] = wall_value(x[(n - 2) * n + j], top_bottom, policy);
    }

    for i in 1..n - 1 {
        x[i * n] = wall_value(x[i * n + 1], left_right, policy);
        x[i * n + n - 1] = wall_value(x[i * n + n - 2], left_right, policy);
    }

    if policy == BoundaryPolicy::Zero && normal != Normal::Scalar {
        // A corner touches both walls, so every velocity component is normal there
        x[0] = 0.0;
        x[n - 1] = 0.0;
        x[(n - 1) * n] = 0.0;
        x[n * n - 1] = 0.0;
        return;
    }

    x[0] = 0.5 * (x[1] + x[n]);
    x[n - 1] = 0.5 * (x[n - 2] + x[2 * n - 1]);
    x[(n - 1) * n] = 0.5 * (x[(n - 2) * n] + x[(n - 1) * n + 1]);
    x[n * n - 1] = 0.5 * (x[(n - 1) * n - 1] + x[n * n - 2]);
}
