use std::collections::{HashSet, VecDeque};

use rayon::prelude::*;

use crate::config::Params;
use crate::error::Result;
use crate::grid::{Cell, Direction, Grid, GroupKey, Wall};

const BACKGROUND: [u8; 4] = [250, 250, 247, 255];
const FLOOR: [u8; 4] = [255, 255, 255, 255];
const WALL: [u8; 4] = [34, 34, 40, 255];
const PATH: [u8; 4] = [214, 64, 69, 255];
const CURRENT: [u8; 4] = [240, 160, 30, 255];
const DEPTH_NEAR: [u8; 4] = [70, 130, 180, 255];
const DEPTH_FAR: [u8; 4] = [230, 120, 60, 255];

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

/// Line endpoints of a wall in cell units: (x1, y1, x2, y2) offsets.
fn wall_offsets(dir: Direction) -> [usize; 4] {
    match dir {
        Direction::North => [0, 0, 1, 0],
        Direction::South => [0, 1, 1, 1],
        Direction::East => [1, 0, 1, 1],
        Direction::West => [0, 0, 0, 1],
    }
}

/// Wall as a pixel-space line, relative to the maze origin.
pub fn wall_line(wall: &Wall, cell_size: u32) -> [u32; 4] {
    let [x1, y1, x2, y2] = wall_offsets(wall.direction);
    let (x, y) = (wall.cell.x, wall.cell.y);
    [
        ((x + x1) as u32) * cell_size,
        ((y + y1) as u32) * cell_size,
        ((x + x2) as u32) * cell_size,
        ((y + y2) as u32) * cell_size,
    ]
}

/// Path segment as a line between cell centers.
pub fn segment_line(a: Cell, b: Cell, cell_size: u32) -> [u32; 4] {
    let mid = cell_size / 2;
    [
        a.x as u32 * cell_size + mid,
        a.y as u32 * cell_size + mid,
        b.x as u32 * cell_size + mid,
        b.y as u32 * cell_size + mid,
    ]
}

fn svg_line(out: &mut String, [x1, y1, x2, y2]: [u32; 4]) {
    out.push_str(&format!(
        "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"/>"
    ));
}

fn sorted(walls: impl Iterator<Item = Wall>) -> Vec<Wall> {
    let mut v: Vec<Wall> = walls.collect();
    v.sort();
    v
}

/// SVG for one wall group, `<g>` included. Views redraw at this granularity.
pub fn render_wall_group(grid: &Grid, key: GroupKey, cell_size: u32) -> String {
    let mut out = format!("<g class=\"walls\" data-group=\"{}-{}\">", key.gx, key.gy);
    if let Some(group) = grid.wall_groups().get(&key) {
        for wall in sorted(group.iter().copied()) {
            svg_line(&mut out, wall_line(&wall, cell_size));
        }
    }
    out.push_str("</g>");
    out
}

/// Full snapshot as SVG: borders, one group per wall bucket, then the path.
pub fn render_svg(grid: &Grid, path: &[Cell], params: &Params) -> Result<String> {
    let cs = params.cell_size;
    let pad = params.padding;
    // the raster canvas carries one extra pixel for the closing wall line
    let (width, height) = params.canvas_size(grid.width(), grid.height())?;
    let (width, height) = (width - 1, height - 1);

    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         stroke=\"#222228\" stroke-linecap=\"square\">"
    );
    out.push_str(&format!("<g transform=\"translate({pad}, {pad})\">"));

    out.push_str("<g class=\"borders\" stroke-width=\"2\">");
    for wall in sorted(grid.borders().iter().copied()) {
        svg_line(&mut out, wall_line(&wall, cs));
    }
    out.push_str("</g>");

    let mut keys: Vec<GroupKey> = grid.wall_groups().keys().copied().collect();
    keys.sort();
    for key in keys {
        out.push_str(&render_wall_group(grid, key, cs));
    }

    out.push_str("<g class=\"path\" stroke=\"#d64045\">");
    for w in path.windows(2) {
        svg_line(&mut out, segment_line(w[0], w[1], cs));
    }
    out.push_str("</g></g></svg>");
    Ok(out)
}

#[inline]
fn ordered(a: Cell, b: Cell) -> (Cell, Cell) {
    if a <= b { (a, b) } else { (b, a) }
}

/// True if pixel (gx, gy), relative to the maze origin, lies on a standing wall.
fn is_wall_pixel(grid: &Grid, gx: usize, gy: usize, cs: usize) -> bool {
    let (w, h) = (grid.width(), grid.height());
    let has = |x: usize, y: usize, dir: Direction| {
        grid.walls().contains(&Wall::new(Cell::new(x, y), dir))
    };

    // Horizontal line on the top edge of row r, column c.
    let h_wall = |c: usize, r: usize| {
        c < w
            && ((r < h && has(c, r, Direction::North))
                || (r > 0 && r <= h && has(c, r - 1, Direction::South)))
    };
    // Vertical line on the left edge of column k, row r.
    let v_wall = |k: usize, r: usize| {
        r < h
            && ((k < w && has(k, r, Direction::West))
                || (k > 0 && k <= w && has(k - 1, r, Direction::East)))
    };

    let (c, r) = (gx / cs, gy / cs);
    let on_h = gy % cs == 0 && (h_wall(c, r) || (gx % cs == 0 && c > 0 && h_wall(c - 1, r)));
    let on_v = gx % cs == 0 && (v_wall(c, r) || (gy % cs == 0 && r > 0 && v_wall(c, r - 1)));
    on_h || on_v
}

/// True if offset (lx, ly) inside `cell` lies on a path segment through it.
fn on_path_segment(
    cell: Cell,
    lx: usize,
    ly: usize,
    mid: usize,
    linked: impl Fn(Cell, Cell) -> bool,
) -> bool {
    let west = cell.x.checked_sub(1).map(|x| Cell::new(x, cell.y));
    let north = cell.y.checked_sub(1).map(|y| Cell::new(cell.x, y));
    let across = ly == mid
        && ((lx >= mid && linked(cell, Cell::new(cell.x + 1, cell.y)))
            || (lx <= mid && west.is_some_and(|n| linked(n, cell))));
    let down = lx == mid
        && ((ly >= mid && linked(cell, Cell::new(cell.x, cell.y + 1)))
            || (ly <= mid && north.is_some_and(|n| linked(n, cell))));
    across || down
}

/// Rasterize a snapshot: walls, carved floor, DFS path and its head.
/// Size is `params.canvas_size(grid.width(), grid.height())`.
pub fn render_rgba(grid: &Grid, path: &[Cell], params: &Params) -> Result<Vec<u8>> {
    let (cw, ch) = params.canvas_size(grid.width(), grid.height())?;
    let (cw, ch) = (cw as usize, ch as usize);
    let cs = params.cell_size as usize;
    let pad = params.padding as usize;
    let mid = cs / 2;
    let (mw, mh) = (grid.width() * cs, grid.height() * cs);

    let on_path: HashSet<(Cell, Cell)> = path.windows(2).map(|w| ordered(w[0], w[1])).collect();
    let head = path.last().copied();
    let linked = |a: Cell, b: Cell| on_path.contains(&ordered(a, b));

    let mut rgba = vec![0u8; cw * ch * 4];
    rgba.par_chunks_mut(cw * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for px in 0..cw {
                let color = match (px.checked_sub(pad), py.checked_sub(pad)) {
                    (Some(gx), Some(gy)) if gx <= mw && gy <= mh => {
                        if is_wall_pixel(grid, gx, gy, cs) {
                            WALL
                        } else if gx == mw || gy == mh {
                            BACKGROUND
                        } else {
                            let cell = Cell::new(gx / cs, gy / cs);
                            let (lx, ly) = (gx % cs, gy % cs);
                            let at_head = head == Some(cell)
                                && lx.abs_diff(mid) <= 1
                                && ly.abs_diff(mid) <= 1;
                            if at_head {
                                CURRENT
                            } else if on_path_segment(cell, lx, ly, mid, &linked) {
                                PATH
                            } else {
                                FLOOR
                            }
                        }
                    }
                    _ => BACKGROUND,
                };
                row[px * 4..px * 4 + 4].copy_from_slice(&color);
            }
        });

    Ok(rgba)
}

/// Passage distance of every cell from the first cell, row-major.
/// Unreachable cells get `u32::MAX`.
pub fn passage_distances(grid: &Grid) -> Vec<u32> {
    let w = grid.width();
    let mut dist = vec![u32::MAX; grid.cells().len()];
    let start = grid.cells()[0];
    dist[start.y * w + start.x] = 0;
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        let d = dist[cell.y * w + cell.x];
        for n in grid.open_neighbors(cell) {
            let slot = &mut dist[n.y * w + n.x];
            if *slot == u32::MAX {
                *slot = d + 1;
                queue.push_back(n);
            }
        }
    }
    dist
}

/// Diagnostic: floor shaded by passage distance from the top-left cell.
pub fn render_depth(grid: &Grid, params: &Params) -> Result<Vec<u8>> {
    let (cw, ch) = params.canvas_size(grid.width(), grid.height())?;
    let (cw, ch) = (cw as usize, ch as usize);
    let cs = params.cell_size as usize;
    let pad = params.padding as usize;
    let (mw, mh) = (grid.width() * cs, grid.height() * cs);

    let dist = passage_distances(grid);
    let max = dist.iter().copied().filter(|&d| d != u32::MAX).max().unwrap_or(0).max(1) as f32;

    let mut rgba = vec![0u8; cw * ch * 4];
    rgba.par_chunks_mut(cw * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for px in 0..cw {
                let color = match (px.checked_sub(pad), py.checked_sub(pad)) {
                    (Some(gx), Some(gy)) if gx <= mw && gy <= mh => {
                        if is_wall_pixel(grid, gx, gy, cs) {
                            WALL
                        } else if gx == mw || gy == mh {
                            BACKGROUND
                        } else {
                            match dist[(gy / cs) * grid.width() + gx / cs] {
                                u32::MAX => BACKGROUND,
                                d => lerp_color(DEPTH_NEAR, DEPTH_FAR, d as f32 / max),
                            }
                        }
                    }
                    _ => BACKGROUND,
                };
                row[px * 4..px * 4 + 4].copy_from_slice(&color);
            }
        });

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MazeError;

    fn pixel(rgba: &[u8], w: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * w + x) * 4;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    #[test]
    fn svg_has_one_group_per_bucket() {
        let grid = Grid::new(12, 3).unwrap();
        let svg = render_svg(&grid, &[], &Params::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"140\" height=\"50\""));
        assert_eq!(svg.matches("class=\"walls\"").count(), 3);
        assert_eq!(svg.matches("<line").count(), grid.walls().len());
    }

    #[test]
    fn svg_draws_path_segments() {
        let grid = Grid::new(3, 1).unwrap();
        let path = [Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)];
        let svg = render_svg(&grid, &path, &Params::default()).unwrap();
        assert!(svg.contains("<line x1=\"5\" y1=\"5\" x2=\"15\" y2=\"5\"/>"));
        assert!(svg.contains("<line x1=\"15\" y1=\"5\" x2=\"25\" y2=\"5\"/>"));
    }

    #[test]
    fn wall_lines_match_sides() {
        let cell = Cell::new(2, 3);
        assert_eq!(wall_line(&Wall::new(cell, Direction::North), 10), [20, 30, 30, 30]);
        assert_eq!(wall_line(&Wall::new(cell, Direction::South), 10), [20, 40, 30, 40]);
        assert_eq!(wall_line(&Wall::new(cell, Direction::East), 10), [30, 30, 30, 40]);
        assert_eq!(wall_line(&Wall::new(cell, Direction::West), 10), [20, 30, 20, 40]);
    }

    #[test]
    fn raster_shows_carved_passage() {
        let params = Params { cell_size: 10, padding: 2, ..Params::default() };
        let grid = Grid::new(2, 1).unwrap();
        let (w, h) = params.canvas_size(2, 1).unwrap();
        assert_eq!((w, h), (25, 15));
        let w = w as usize;

        let before = render_rgba(&grid, &[], &params).unwrap();
        assert_eq!(before.len(), w * h as usize * 4);
        // interior wall between the two cells at gx = 10, gy = 3
        assert_eq!(pixel(&before, w, 12, 5), WALL);
        assert_eq!(pixel(&before, w, 0, 0), BACKGROUND);

        let carved = grid.remove_wall(Cell::new(0, 0), Cell::new(1, 0)).unwrap();
        let path = [Cell::new(0, 0), Cell::new(1, 0)];
        let after = render_rgba(&carved, &path, &params).unwrap();
        // gy = 5 is the path row through cell centers
        assert_eq!(pixel(&after, w, 12, 7), PATH);
        assert_eq!(pixel(&after, w, 12, 5), FLOOR);
        // borders stay
        assert_eq!(pixel(&after, w, 2, 5), WALL);
        assert_eq!(pixel(&after, w, 22, 5), WALL);
    }

    #[test]
    fn oversized_canvas_is_an_error_not_an_allocation() {
        let grid = Grid::new(200, 200).unwrap();
        let params = Params { cell_size: 1000, ..Params::default() };
        let err = MazeError::InvalidCanvas { width: 200, height: 200 };
        assert_eq!(render_rgba(&grid, &[], &params), Err(err.clone()));
        assert_eq!(render_depth(&grid, &params), Err(err.clone()));
        assert_eq!(render_svg(&grid, &[], &params), Err(err));
    }

    #[test]
    fn distances_follow_passages() {
        let grid = Grid::new(3, 1).unwrap();
        let grid = grid.remove_wall(Cell::new(0, 0), Cell::new(1, 0)).unwrap();
        assert_eq!(passage_distances(&grid), vec![0, 1, u32::MAX]);
    }
}
