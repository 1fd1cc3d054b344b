use std::collections::BTreeSet;

use serde::Serialize;

use crate::grid::{Cell, Grid, GroupKey, Wall};

/// Path segment between two consecutive stack cells.
pub type Segment = (Cell, Cell);

/// What a view has to redraw between two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SceneDiff {
    pub changed_groups: Vec<GroupKey>,
    pub removed_walls: Vec<Wall>,
    pub added_segments: Vec<Segment>,
    pub removed_segments: Vec<Segment>,
    /// Stack length after the change; the final backtrack empties a
    /// one-cell path without touching any segment.
    pub path_len: usize,
}

fn segments_from(path: &[Cell], first: usize) -> Vec<Segment> {
    path.windows(2)
        .skip(first)
        .map(|w| (w[0], w[1]))
        .collect()
}

impl SceneDiff {
    pub fn between(prev: &Grid, prev_path: &[Cell], next: &Grid, next_path: &[Cell]) -> Self {
        let mut removed_walls: Vec<Wall> = prev.walls().difference(next.walls()).copied().collect();
        removed_walls.sort();

        let keys: BTreeSet<GroupKey> = prev
            .wall_groups()
            .keys()
            .chain(next.wall_groups().keys())
            .copied()
            .collect();
        let changed_groups = keys
            .into_iter()
            .filter(|k| prev.wall_groups().get(k) != next.wall_groups().get(k))
            .collect();

        // Segment i joins path[i] and path[i + 1]; it survives only if both
        // endpoints sit inside the shared prefix.
        let shared = prev_path
            .iter()
            .zip(next_path)
            .take_while(|(a, b)| a == b)
            .count();
        let first_changed = shared.saturating_sub(1);

        Self {
            changed_groups,
            removed_walls,
            added_segments: segments_from(next_path, first_changed),
            removed_segments: segments_from(prev_path, first_changed),
            path_len: next_path.len(),
        }
    }

    /// Everything in `grid` and `path`, for the first draw.
    pub fn full(grid: &Grid, path: &[Cell]) -> Self {
        let mut changed_groups: Vec<GroupKey> = grid.wall_groups().keys().copied().collect();
        changed_groups.sort();
        Self {
            changed_groups,
            removed_walls: Vec::new(),
            added_segments: segments_from(path, 0),
            removed_segments: Vec::new(),
            path_len: path.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_groups.is_empty()
            && self.removed_walls.is_empty()
            && self.added_segments.is_empty()
            && self.removed_segments.is_empty()
    }
}
