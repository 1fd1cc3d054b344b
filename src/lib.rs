pub mod animate;
pub mod config;
pub mod diff;
pub mod error;
pub mod generator;
pub mod grid;
pub mod render;
pub mod rng;

use std::time::Instant;

use log::debug;

use config::Params;
use grid::Grid;
use rng::Rng;

pub use error::{MazeError, Result};
pub use generator::{GeneratorState, advance, create_generator, is_complete, solve};

/// Empty grid with every wall standing, bucketed with the default group size.
pub fn create_grid(width: usize, height: usize) -> Result<Grid> {
    Grid::new(width, height)
}

pub struct Maze {
    pub seed: u64,
    pub grid: Grid,
    pub steps: usize,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Create and fully carve a `w`x`h` maze, timing each stage.
pub fn generate(seed: u64, w: usize, h: usize, params: &Params) -> Result<(Maze, Vec<Timing>)> {
    params.validate()?;
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Grid with all walls standing
    let t = Instant::now();
    let grid = Grid::with_group_size(w, h, params.wall_group_size)?;
    timings.push(Timing {
        name: "create_grid",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Carve, one advance per step
    let t = Instant::now();
    let mut state = create_generator(grid, Rng::new(seed))?;
    let mut steps = 0;
    while !state.is_complete() {
        state.step()?;
        steps += 1;
    }
    timings.push(Timing {
        name: "carve",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing {
        name: "TOTAL",
        ms: total_ms,
    });
    debug!("generated {}x{} maze, seed={}, {} steps in {:.1} ms", w, h, seed, steps, total_ms);

    let maze = Maze {
        seed,
        grid: state.into_grid(),
        steps,
    };

    Ok((maze, timings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_matches_solve() {
        let (maze, timings) = generate(42, 12, 8, &Params::default()).unwrap();
        let expected = solve(create_grid(12, 8).unwrap(), Rng::new(42)).unwrap();
        assert_eq!(maze.grid, expected);
        assert_eq!(maze.steps, 2 * 96 - 1);
        assert_eq!(timings.last().map(|t| t.name), Some("TOTAL"));
    }

    #[test]
    fn generate_rejects_bad_input() {
        assert!(matches!(
            generate(1, 0, 4, &Params::default()),
            Err(MazeError::InvalidDimensions { .. })
        ));
        let params = Params { wall_group_size: 0, ..Params::default() };
        assert!(matches!(generate(1, 4, 4, &params), Err(MazeError::InvalidGroupSize)));
    }
}
