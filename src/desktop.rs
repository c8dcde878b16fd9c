use crate::config::{SimConfig, TickRecipe};
use crate::render::{arrow_glyph, cell_center, ArrowGlyph, GRAY, WHITE};
use crate::simulation::Simulation;
use eframe::egui;
use glam::Vec2;

/// Pointer motion (in pixels) is scaled by this before becoming a force.
const DRAG_FORCE_SCALE: f32 = 0.1;

pub struct ArrowFlowApp {
    simulation: Simulation,
    paused: bool,
    cell_size: f32,
}

impl ArrowFlowApp {
    pub fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            paused: false,
            cell_size: 16.0,
        }
    }

    pub fn from_config(config: SimConfig) -> Result<Self, crate::config::ConfigError> {
        Ok(Self::new(Simulation::new(config)?))
    }

    fn color(rgb: [u8; 3]) -> egui::Color32 {
        egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
    }

    fn paint_arrow(&self, painter: &egui::Painter, origin: egui::Pos2, glyph: &ArrowGlyph) {
        let to_pos = |p: Vec2| egui::Pos2::new(origin.x + p.x, origin.y + p.y);
        let color = Self::color(glyph.color);

        painter.line_segment(
            [to_pos(glyph.tail), to_pos(glyph.head_base)],
            egui::Stroke::new(glyph.shaft_width, color),
        );
        painter.add(egui::Shape::convex_polygon(
            vec![to_pos(glyph.tip), to_pos(glyph.head_left), to_pos(glyph.head_right)],
            color,
            egui::Stroke::NONE,
        ));
    }
}

impl eframe::App for ArrowFlowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::R)) {
            self.simulation.reset();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.paused = !self.paused;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("arrowflow");

            ui.horizontal(|ui| {
                if ui.button("Pause/Resume").clicked() {
                    self.paused = !self.paused;
                }
                if ui.button("Reset").clicked() {
                    self.simulation.reset();
                }

                let mut recipe: TickRecipe = self.simulation.recipe();
                ui.checkbox(&mut recipe.project, "Project");
                ui.add(
                    egui::Slider::new(&mut recipe.damping_factor, 0.8..=1.0).text("Damping"),
                );
                if recipe != self.simulation.recipe() {
                    if let Err(e) = self.simulation.set_recipe(recipe) {
                        log::warn!("ignored recipe change: {e}");
                    }
                }

                ui.add(egui::Slider::new(&mut self.cell_size, 4.0..=32.0).text("Cell Size"));
            });

            ui.separator();

            let n = self.simulation.grid.size();
            let canvas = n as f32 * self.cell_size;
            let (rect, response) = ui.allocate_exact_size(
                egui::Vec2::new(canvas, canvas),
                egui::Sense::click_and_drag(),
            );

            // Drag pushes the fluid under the pointer along the pointer motion
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    let col = ((pos.x - rect.left()) / self.cell_size).floor() as isize;
                    let row = ((pos.y - rect.top()) / self.cell_size).floor() as isize;
                    let delta = response.drag_delta();
                    let force = Vec2::new(delta.x, delta.y) * DRAG_FORCE_SCALE;
                    self.simulation.apply_force(row, col, force);
                }
            }

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 0.0, Self::color(WHITE));

            for row in 0..n {
                for col in 0..n {
                    let center = cell_center(row, col, self.cell_size);
                    let velocity = self.simulation.grid.velocity(row, col);
                    match arrow_glyph(center, self.cell_size, velocity) {
                        Some(glyph) => self.paint_arrow(&painter, rect.min, &glyph),
                        None => {
                            painter.circle_filled(
                                egui::Pos2::new(rect.left() + center.x, rect.top() + center.y),
                                1.0,
                                Self::color(GRAY),
                            );
                        }
                    }
                }
            }

            if !self.paused {
                self.simulation.tick();
            }

            ui.label(format!(
                "Tick: {} | Energy: {:.4} | Drag: push fluid | R: reset | Space: pause",
                self.simulation.ticks(),
                self.simulation.grid.kinetic_energy()
            ));
        });

        ctx.request_repaint();
    }
}
