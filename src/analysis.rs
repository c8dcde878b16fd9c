use crate::export::FieldView;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetrics {
    /// Sum of `u² + v²` over every cell.
    pub kinetic_energy: f32,
    pub max_speed: f32,
    pub avg_speed: f32,
    pub max_divergence: f32,
    pub avg_divergence: f32,
    pub avg_vorticity: f32,
    pub frame: usize,
}

impl FieldMetrics {
    pub fn analyze(field: &impl FieldView, frame: usize) -> Self {
        let n = field.size();
        let u = field.u();
        let v = field.v();

        let (kinetic_energy, max_speed, speed_sum) = u
            .par_iter()
            .zip(v.par_iter())
            .map(|(&x, &y)| {
                let speed_sq = x * x + y * y;
                (speed_sq, speed_sq.sqrt(), speed_sq.sqrt())
            })
            .reduce(
                || (0.0, 0.0, 0.0),
                |(e1, m1, s1), (e2, m2, s2)| (e1 + e2, m1.max(m2), s1 + s2),
            );

        let mut max_divergence: f32 = 0.0;
        let mut total_divergence = 0.0;
        let mut total_vorticity = 0.0;

        for y in 1..n - 1 {
            for x in 1..n - 1 {
                let idx = y * n + x;

                // Same scaling as the projection source term
                let divergence = -0.5 * (u[idx + 1] - u[idx - 1] + v[idx + n] - v[idx - n]);
                max_divergence = max_divergence.max(divergence.abs());
                total_divergence += divergence.abs();

                let vorticity = 0.5 * ((v[idx + 1] - v[idx - 1]) - (u[idx + n] - u[idx - n]));
                total_vorticity += vorticity.abs();
            }
        }

        let interior = ((n - 2) * (n - 2)) as f32;

        Self {
            kinetic_energy,
            max_speed,
            avg_speed: speed_sum / (n * n) as f32,
            max_divergence,
            avg_divergence: total_divergence / interior,
            avg_vorticity: total_vorticity / interior,
            frame,
        }
    }

    /// False once any NaN or infinity has crept into the field.
    pub fn is_finite(&self) -> bool {
        self.kinetic_energy.is_finite() && self.max_speed.is_finite()
    }

    pub fn log_summary(&self) {
        log::info!(
            "frame {}: energy {:.6}, max speed {:.6}, avg speed {:.6}, max |div| {:.6}, avg |div| {:.6}, avg |curl| {:.6}",
            self.frame,
            self.kinetic_energy,
            self.max_speed,
            self.avg_speed,
            self.max_divergence,
            self.avg_divergence,
            self.avg_vorticity
        );
    }
}

#[derive(Debug, Default)]
pub struct AnalysisRecorder {
    pub metrics_history: Vec<FieldMetrics>,
}

impl AnalysisRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self, field: &impl FieldView, frame: usize) -> &FieldMetrics {
        let metrics = FieldMetrics::analyze(field, frame);
        if !metrics.is_finite() {
            log::warn!("frame {frame}: field is no longer finite");
        }
        self.metrics_history.push(metrics);
        &self.metrics_history[self.metrics_history.len() - 1]
    }

    /// Relative energy change between the first and last recorded frames.
    pub fn energy_change(&self) -> Option<f32> {
        let first = self.metrics_history.first()?;
        let last = self.metrics_history.last()?;
        Some((last.kinetic_energy - first.kinetic_energy) / first.kinetic_energy.max(0.001))
    }

    pub fn log_trends(&self) {
        if self.metrics_history.len() < 2 {
            return;
        }

        let first = &self.metrics_history[0];
        let last = &self.metrics_history[self.metrics_history.len() - 1];

        log::info!(
            "energy: {:.6} -> {:.6} ({:+.3}%)",
            first.kinetic_energy,
            last.kinetic_energy,
            self.energy_change().unwrap_or(0.0) * 100.0
        );
        log::info!(
            "max speed: {:.6} -> {:.6}",
            first.max_speed,
            last.max_speed
        );
        log::info!(
            "avg |div|: {:.6} -> {:.6}",
            first.avg_divergence,
            last.avg_divergence
        );
    }
}
