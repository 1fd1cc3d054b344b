use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{MazeError, Result};

/// Default edge length of a wall-group bucket, in cells.
pub const DEFAULT_GROUP_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbor one step in `dir`, or None if it would leave a `w`x`h` grid.
    pub fn step(self, dir: Direction, w: usize, h: usize) -> Option<Cell> {
        let (dx, dy) = dir.delta();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < w && y < h).then_some(Cell { x, y })
    }
}

// Row-major, so sorted cells read like the grid does.
impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Coordinate offset; y grows southwards.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Direction from `a` to `b` if they are 4-adjacent.
    pub fn between(a: Cell, b: Cell) -> Option<Direction> {
        let dx = b.x as isize - a.x as isize;
        let dy = b.y as isize - a.y as isize;
        Direction::ALL.into_iter().find(|d| d.delta() == (dx, dy))
    }
}

/// One side of one cell. An interior boundary is two walls, one per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Wall {
    pub cell: Cell,
    pub direction: Direction,
}

impl Wall {
    pub const fn new(cell: Cell, direction: Direction) -> Self {
        Self { cell, direction }
    }
}

/// Coarse redraw bucket: cell coordinates integer-divided by the group size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub gx: usize,
    pub gy: usize,
}

/// Rectangular maze grid.
///
/// Spatial adjacency and borders never change after construction and are
/// shared between snapshots. Which sides are blocked lives only in `walls`;
/// `wall_groups` buckets the standing interior walls for batched redraws.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    group_size: usize,
    cells: Arc<[Cell]>,
    adjacency: Arc<[Vec<Cell>]>,
    borders: Arc<HashSet<Wall>>,
    walls: HashSet<Wall>,
    wall_groups: HashMap<GroupKey, HashSet<Wall>>,
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.group_size == other.group_size
            && self.walls == other.walls
    }
}

impl Eq for Grid {}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_group_size(width, height, DEFAULT_GROUP_SIZE)
    }

    pub fn with_group_size(width: usize, height: usize, group_size: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        if group_size == 0 {
            return Err(MazeError::InvalidGroupSize);
        }

        let cells: Vec<Cell> = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell::new(x, y)))
            .collect();

        let mut adjacency = Vec::with_capacity(cells.len());
        let mut walls = HashSet::with_capacity(cells.len() * 4);
        let mut borders = HashSet::with_capacity(2 * (width + height));
        for &cell in &cells {
            let mut adjacent = Vec::with_capacity(4);
            for dir in Direction::ALL {
                let wall = Wall::new(cell, dir);
                match cell.step(dir, width, height) {
                    Some(n) => adjacent.push(n),
                    None => {
                        borders.insert(wall);
                    }
                }
                walls.insert(wall);
            }
            adjacency.push(adjacent);
        }

        let mut grid = Self {
            width,
            height,
            group_size,
            cells: cells.into(),
            adjacency: adjacency.into(),
            borders: Arc::new(borders),
            walls,
            wall_groups: HashMap::new(),
        };

        let mut groups: HashMap<GroupKey, HashSet<Wall>> = HashMap::new();
        for wall in grid.interior_walls() {
            groups.entry(grid.group_key(wall.cell)).or_default().insert(*wall);
        }
        grid.wall_groups = groups;
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn walls(&self) -> &HashSet<Wall> {
        &self.walls
    }

    pub fn borders(&self) -> &HashSet<Wall> {
        &self.borders
    }

    pub fn wall_groups(&self) -> &HashMap<GroupKey, HashSet<Wall>> {
        &self.wall_groups
    }

    pub fn interior_walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter().filter(|w| !self.borders.contains(*w))
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        debug_assert!(self.contains(cell));
        cell.y * self.width + cell.x
    }

    pub fn group_key(&self, cell: Cell) -> GroupKey {
        GroupKey {
            gx: cell.x / self.group_size,
            gy: cell.y / self.group_size,
        }
    }

    /// Spatial neighbors. Not affected by wall removal.
    pub fn neighbors(&self, cell: Cell) -> &[Cell] {
        if !self.contains(cell) {
            return &[];
        }
        &self.adjacency[self.idx(cell)]
    }

    /// True if `a` and `b` are adjacent and the wall between them is gone.
    pub fn is_open(&self, a: Cell, b: Cell) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        match Direction::between(a, b) {
            Some(dir) => !self.walls.contains(&Wall::new(a, dir)),
            None => false,
        }
    }

    pub fn open_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.neighbors(cell)
            .iter()
            .copied()
            .filter(move |&n| self.is_open(cell, n))
    }

    pub fn walled_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.neighbors(cell)
            .iter()
            .copied()
            .filter(move |&n| !self.is_open(cell, n))
    }

    /// Number of carved passages (removed interior wall pairs).
    pub fn passage_count(&self) -> usize {
        let interior_total: usize = self.adjacency.iter().map(Vec::len).sum();
        let interior_standing = self.walls.len() - self.borders.len();
        (interior_total - interior_standing) / 2
    }

    /// New grid with the wall between `a` and `b` removed from both sides.
    pub fn remove_wall(&self, a: Cell, b: Cell) -> Result<Grid> {
        let mut next = self.clone();
        next.remove_wall_in_place(a, b)?;
        Ok(next)
    }

    /// Leaves `self` untouched on error.
    pub(crate) fn remove_wall_in_place(&mut self, a: Cell, b: Cell) -> Result<()> {
        let dir = match Direction::between(a, b) {
            Some(dir) if self.contains(a) && self.contains(b) => dir,
            _ => return Err(MazeError::InvalidAdjacency { a, b }),
        };
        let wall_a = Wall::new(a, dir);
        let wall_b = Wall::new(b, dir.opposite());
        if !self.walls.contains(&wall_a) {
            return Err(MazeError::WallAlreadyRemoved { a, b });
        }

        for wall in [wall_a, wall_b] {
            self.walls.remove(&wall);
            let key = self.group_key(wall.cell);
            if let Some(group) = self.wall_groups.get_mut(&key) {
                group.remove(&wall);
            }
        }
        Ok(())
    }

    /// Cells reachable from `start` through open passages.
    pub fn reachable_from(&self, start: Cell) -> HashSet<Cell> {
        let mut seen = HashSet::new();
        if !self.contains(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(cell) = queue.pop_front() {
            for n in self.open_neighbors(cell) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    /// Spanning tree check: connected, and exactly `cells - 1` passages.
    pub fn is_perfect_maze(&self) -> bool {
        let n = self.cells.len();
        self.passage_count() == n - 1 && self.reachable_from(self.cells[0]).len() == n
    }
}
