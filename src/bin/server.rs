use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use mazegen::animate::{Animator, Frame, View};
use mazegen::config::Params;
use mazegen::diff::SceneDiff;
use mazegen::grid::{Cell, Grid};
use mazegen::render;
use mazegen::rng::{Rng, entropy_seed};

/// Frame logs grow with the cell count; keep requests browser-sized.
const MAX_CELLS: usize = 40_000;

#[derive(Deserialize)]
struct GenerateRequest {
    seed: Option<u64>,
    width: Option<usize>,
    height: Option<usize>,
    #[serde(flatten)]
    params: Params,
}

#[derive(Serialize)]
struct GenerateResponse {
    seed: u64,
    width: usize,
    height: usize,
    start: Option<Cell>,
    tick_interval_ms: u64,
    svg: String,
    layers: Vec<Layer>,
    frames: Vec<SceneDiff>,
    timings: Vec<TimingEntry>,
    perfect: bool,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

/// Collects every per-tick diff for client-side playback.
#[derive(Default)]
struct FrameLog {
    frames: Vec<SceneDiff>,
}

impl View for FrameLog {
    fn draw(&mut self, frame: &Frame<'_>) {
        if frame.tick > 0 {
            self.frames.push(frame.diff.clone());
        }
    }
}

type ApiError = (StatusCode, String);

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn encode_png(rgba: &[u8], w: u32, h: u32) -> Result<String, ApiError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder
        .write_image(rgba, w, h, image::ExtendedColorType::Rgba8)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("PNG encode failed: {e}")))?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn build_response(
    seed: u64,
    width: usize,
    height: usize,
    params: Params,
) -> Result<GenerateResponse, ApiError> {
    params.validate().map_err(bad_request)?;
    let (cw, ch) = params.canvas_size(width, height).map_err(bad_request)?;
    let (maze, timings) = mazegen::generate(seed, width, height, &params).map_err(bad_request)?;

    // Same seed, same carving order: replay it tick by tick for the frame log.
    let grid = Grid::with_group_size(width, height, params.wall_group_size).map_err(bad_request)?;
    let state = mazegen::create_generator(grid, Rng::new(seed)).map_err(bad_request)?;
    let start = state.current();
    let outcome = Animator::new(state, FrameLog::default())
        .run_to_end()
        .map_err(bad_request)?;

    let maze_rgba = render::render_rgba(&maze.grid, &[], &params).map_err(bad_request)?;
    let depth_rgba = render::render_depth(&maze.grid, &params).map_err(bad_request)?;
    let layers = vec![
        Layer {
            name: "maze".into(),
            data_url: encode_png(&maze_rgba, cw, ch)?,
        },
        Layer {
            name: "depth".into(),
            data_url: encode_png(&depth_rgba, cw, ch)?,
        },
    ];

    let timing_entries = timings
        .iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(GenerateResponse {
        seed,
        width,
        height,
        start,
        tick_interval_ms: params.tick_interval_ms,
        svg: render::render_svg(&maze.grid, &[], &params).map_err(bad_request)?,
        layers,
        frames: outcome.view.frames,
        timings: timing_entries,
        perfect: maze.grid.is_perfect_maze(),
    })
}

async fn generate_handler(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let seed = req.seed.unwrap_or_else(entropy_seed);
    let width = req.width.unwrap_or(60);
    let height = req.height.unwrap_or(30);
    if width.saturating_mul(height) > MAX_CELLS {
        return Err(bad_request(format!(
            "{}x{} exceeds the {} cell limit",
            width, height, MAX_CELLS
        )));
    }
    info!("generate {}x{} seed={}", width, height, seed);

    let params = req.params;
    let response = tokio::task::spawn_blocking(move || build_response(seed, width, height, params))
        .await
        .map_err(|e| {
            error!("generate task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })??;

    Ok(Json(response))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .layer(CorsLayer::permissive())
        .fallback_service(frontend);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("mazegen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
