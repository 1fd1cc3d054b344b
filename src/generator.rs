//! Recursive backtracker: randomized depth-first carving with an explicit stack.

use std::collections::HashSet;

use crate::error::{MazeError, Result};
use crate::grid::{Cell, Grid};
use crate::rng::Rng;

/// Snapshot of a running (or finished) generation.
///
/// Every `advance` returns a fresh snapshot; the random source travels with
/// it so replaying from any snapshot is deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorState {
    grid: Grid,
    stack: Vec<Cell>,
    current: Option<Cell>,
    visited: HashSet<Cell>,
    rng: Rng,
}

impl GeneratorState {
    pub fn new(grid: Grid, mut rng: Rng) -> Result<Self> {
        let start = *rng.pick(grid.cells())?;
        Ok(Self {
            grid,
            stack: vec![start],
            current: Some(start),
            visited: HashSet::from([start]),
            rng,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Current DFS path, start first.
    pub fn stack(&self) -> &[Cell] {
        &self.stack
    }

    pub fn current(&self) -> Option<Cell> {
        self.current
    }

    pub fn visited(&self) -> &HashSet<Cell> {
        &self.visited
    }

    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    /// Consecutive stack pairs, for drawing the path as line segments.
    pub fn path_segments(&self) -> impl Iterator<Item = (Cell, Cell)> + '_ {
        self.stack.windows(2).map(|w| (w[0], w[1]))
    }

    /// One transition, in place.
    pub(crate) fn step(&mut self) -> Result<()> {
        let current = match self.current {
            Some(c) if !self.stack.is_empty() => c,
            _ => return Err(MazeError::GeneratorAlreadyComplete),
        };

        let available: Vec<Cell> = self
            .grid
            .neighbors(current)
            .iter()
            .copied()
            .filter(|n| !self.visited.contains(n))
            .collect();

        if available.is_empty() {
            self.stack.pop();
            self.current = self.stack.last().copied();
            return Ok(());
        }

        let next = *self.rng.pick(&available)?;
        self.grid.remove_wall_in_place(current, next)?;
        self.current = Some(next);
        self.stack.push(next);
        self.visited.insert(next);
        Ok(())
    }
}

pub fn create_generator(grid: Grid, rng: Rng) -> Result<GeneratorState> {
    GeneratorState::new(grid, rng)
}

/// Next snapshot. The input is left as it was.
pub fn advance(state: &GeneratorState) -> Result<GeneratorState> {
    let mut next = state.clone();
    next.step()?;
    Ok(next)
}

pub fn is_complete(state: &GeneratorState) -> bool {
    state.is_complete()
}

/// Carve the whole maze synchronously.
pub fn solve(grid: Grid, rng: Rng) -> Result<Grid> {
    let mut state = GeneratorState::new(grid, rng)?;
    while !state.is_complete() {
        state.step()?;
    }
    Ok(state.into_grid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_completes_after_one_backtrack() {
        let grid = Grid::new(1, 1).unwrap();
        let state = create_generator(grid, Rng::new(3)).unwrap();
        assert!(!is_complete(&state));
        assert_eq!(state.stack(), &[Cell::new(0, 0)]);

        let done = advance(&state).unwrap();
        assert!(is_complete(&done));
        assert_eq!(done.current(), None);
        assert!(done.stack().is_empty());

        assert_eq!(advance(&done), Err(MazeError::GeneratorAlreadyComplete));
    }

    #[test]
    fn visited_grows_until_every_cell_is_reached() {
        let grid = Grid::new(9, 6).unwrap();
        let mut state = create_generator(grid, Rng::new(11)).unwrap();
        let mut last = state.visited().len();
        let mut steps = 0;
        while !is_complete(&state) {
            state = advance(&state).unwrap();
            assert!(state.visited().len() >= last);
            last = state.visited().len();
            steps += 1;
        }
        let all: HashSet<Cell> = state.grid().cells().iter().copied().collect();
        assert_eq!(state.visited(), &all);
        // every cell is pushed once and popped once, start was pushed up front
        assert_eq!(steps, 2 * 54 - 1);
        assert!(state.grid().is_perfect_maze());
    }

    #[test]
    fn advance_does_not_touch_its_input() {
        let state = create_generator(Grid::new(4, 4).unwrap(), Rng::new(5)).unwrap();
        let before = state.clone();
        let next = advance(&state).unwrap();
        assert_eq!(state, before);
        assert_ne!(next.stack(), state.stack());
        assert_eq!(next.grid().passage_count(), 1);
    }

    #[test]
    fn path_follows_open_passages() {
        let mut state = create_generator(Grid::new(6, 6).unwrap(), Rng::new(21)).unwrap();
        for _ in 0..20 {
            state = advance(&state).unwrap();
            for (a, b) in state.path_segments() {
                assert!(state.grid().is_open(a, b));
            }
            assert_eq!(state.current(), state.stack().last().copied());
        }
    }

    #[test]
    fn seeded_solve_is_deterministic() {
        let a = solve(Grid::new(15, 10).unwrap(), Rng::new(42)).unwrap();
        let b = solve(Grid::new(15, 10).unwrap(), Rng::new(42)).unwrap();
        assert_eq!(a, b);
        let c = solve(Grid::new(15, 10).unwrap(), Rng::new(43)).unwrap();
        assert!(c.is_perfect_maze());
    }

    #[test]
    fn unseeded_solves_are_perfect_mazes() {
        for _ in 0..2 {
            let grid = solve(Grid::new(20, 12).unwrap(), Rng::from_entropy()).unwrap();
            assert!(grid.is_perfect_maze());
            assert_eq!(grid.passage_count(), 20 * 12 - 1);
            assert_eq!(grid.borders().len(), 2 * (20 + 12));
        }
    }

    #[test]
    fn solve_matches_repeated_advance() {
        let grid = Grid::new(7, 5).unwrap();
        let mut state = create_generator(grid.clone(), Rng::new(8)).unwrap();
        while !is_complete(&state) {
            state = advance(&state).unwrap();
        }
        assert_eq!(state.into_grid(), solve(grid, Rng::new(8)).unwrap());
    }
}
