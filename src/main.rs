use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{error, info};
use serde_json::json;

use mazegen::animate::{Animator, Frame, View};
use mazegen::config::Params;
use mazegen::grid::{Cell, Grid};
use mazegen::render;
use mazegen::rng::Rng;

/// Logs carving progress every `every` ticks.
struct ProgressView {
    every: u64,
    cells: usize,
}

impl View for ProgressView {
    fn draw(&mut self, frame: &Frame<'_>) {
        if frame.tick % self.every == 0 {
            let carved = frame.grid.passage_count() + 1;
            info!(
                "tick {:6}: {:5}/{} cells carved, path length {}",
                frame.tick,
                carved,
                self.cells,
                frame.path.len()
            );
        }
    }
}

fn save_outputs(
    out_dir: &Path,
    grid: &Grid,
    path: &[Cell],
    params: &Params,
) -> anyhow::Result<()> {
    let (w, h) = params.canvas_size(grid.width(), grid.height())?;

    let svg_path = out_dir.join("maze.svg");
    std::fs::write(&svg_path, render::render_svg(grid, path, params)?)
        .with_context(|| format!("writing {}", svg_path.display()))?;
    info!("Saved {}", svg_path.display());

    let save = |name: &str, rgba: &[u8]| -> anyhow::Result<()> {
        let file = out_dir.join(name);
        image::save_buffer(&file, rgba, w, h, image::ColorType::Rgba8)
            .with_context(|| format!("saving {}", file.display()))?;
        info!("Saved {}", file.display());
        Ok(())
    };
    save("maze.png", &render::render_rgba(grid, path, params)?)?;
    save("depth.png", &render::render_depth(grid, params)?)?;
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let width: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(60);
    let height: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(30);
    let out_dir: PathBuf = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));
    let tick_ms: Option<u64> = args.get(5).and_then(|s| s.parse().ok());

    std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;

    let mut params = Params::default();
    if let Some(ms) = tick_ms {
        params.tick_interval_ms = ms;
    }
    params.validate()?;
    params.canvas_size(width, height)?;

    info!("Generating {}x{} maze with seed={}", width, height, seed);

    if tick_ms.is_some() {
        let grid = Grid::with_group_size(width, height, params.wall_group_size)?;
        let state = mazegen::create_generator(grid, Rng::new(seed))?;
        let view = ProgressView {
            every: 100,
            cells: width * height,
        };
        let stop = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let outcome = Animator::new(state, view)
            .run(params.tick_interval(), stop)
            .await?;
        if outcome.cancelled {
            info!("Stopped early; saving partial maze");
        }
        save_outputs(&out_dir, outcome.state.grid(), outcome.state.stack(), &params)?;
        return Ok(());
    }

    let (maze, timings) = mazegen::generate(seed, width, height, &params)?;

    info!("Timings:");
    for t in &timings {
        info!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    save_outputs(&out_dir, &maze.grid, &[], &params)?;

    let summary = json!({
        "seed": maze.seed,
        "width": width,
        "height": height,
        "steps": maze.steps,
        "passages": maze.grid.passage_count(),
        "perfect": maze.grid.is_perfect_maze(),
        "timings": timings
            .iter()
            .map(|t| json!({ "name": t.name, "ms": t.ms }))
            .collect::<Vec<_>>(),
    });
    let summary_path = out_dir.join("maze.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    info!("Saved {}", summary_path.display());

    info!("Done.");
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
