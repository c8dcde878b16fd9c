use arrowflow::{config, AnalysisRecorder, ArrowFlowApp, ImageExporter, SimConfig, Simulation};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

const DEFAULT_HEADLESS_STEPS: usize = 120;
const WINDOW_SIZE: f32 = 640.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = config::load(Path::new(config::DEFAULT_CONFIG_PATH));

    if args.len() > 1 && args[1] == "headless" {
        let steps = match args.get(2) {
            Some(s) => s.parse()?,
            None => DEFAULT_HEADLESS_STEPS,
        };
        run_headless(config, steps)
    } else {
        run_gui_app(config)
    }
}

fn run_headless(config: SimConfig, steps: usize) -> Result<(), Box<dyn std::error::Error>> {
    log::info!(
        "running {} headless ticks on a {}x{} grid (project={})",
        steps,
        config.grid_size,
        config.grid_size,
        config.recipe.project
    );

    let output_dir = Path::new("output");
    std::fs::create_dir_all(output_dir)?;

    let mut simulation = Simulation::new(config)?;
    let exporter = ImageExporter::new(WINDOW_SIZE as u32, WINDOW_SIZE as u32);
    let mut recorder = AnalysisRecorder::new();
    let mut rng = StdRng::seed_from_u64(7);

    let n = simulation.grid.size() as isize;
    let center = n / 2;

    recorder.record_frame(&simulation, 0);

    for frame in 1..=steps {
        // Stir near the centre, like a mouse wandering over the window
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let row = center + rng.gen_range(-2..=2);
        let col = center + rng.gen_range(-2..=2);
        simulation.apply_force(row, col, Vec2::from_angle(angle) * 0.5);

        simulation.tick();
        let metrics = recorder.record_frame(&simulation, frame);

        if frame % 20 == 0 {
            metrics.log_summary();
            let path = output_dir.join(format!("frame_{:04}.png", frame));
            exporter.export_velocity_png(&simulation, &path)?;
        }
    }

    recorder.log_trends();
    simulation
        .grid
        .dump_log_to_path(&output_dir.join("final_state.json"))?;

    println!("Headless run finished: {} ticks, output in {}", steps, output_dir.display());
    Ok(())
}

fn run_gui_app(config: SimConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = ArrowFlowApp::from_config(config)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_SIZE + 40.0, WINDOW_SIZE + 120.0])
            .with_title("arrowflow - Velocity Field"),
        ..Default::default()
    };

    eframe::run_native("arrowflow", options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| e.to_string())?;
    Ok(())
}
