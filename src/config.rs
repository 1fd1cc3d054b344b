use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};
use crate::grid::DEFAULT_GROUP_SIZE;

/// Largest raster we agree to allocate, in pixels (128 MiB of RGBA).
pub const MAX_CANVAS_PIXELS: u64 = 32 * 1024 * 1024;

/// Tunable parameters; the server accepts any subset as JSON overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Grid
    pub wall_group_size: usize,

    // Animation
    pub tick_interval_ms: u64,

    // Rendering, in pixels
    pub cell_size: u32,
    pub padding: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wall_group_size: DEFAULT_GROUP_SIZE,
            tick_interval_ms: 50,
            cell_size: 10,
            padding: 10,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.wall_group_size == 0 {
            return Err(MazeError::InvalidGroupSize);
        }
        if self.cell_size == 0 {
            return Err(MazeError::InvalidCellSize);
        }
        if self.tick_interval_ms == 0 {
            return Err(MazeError::InvalidTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    /// Output image size for a `w`x`h` maze, including the closing wall pixel.
    /// Fails if the size overflows or exceeds `MAX_CANVAS_PIXELS`.
    pub fn canvas_size(&self, w: usize, h: usize) -> Result<(u32, u32)> {
        let invalid = || MazeError::InvalidCanvas { width: w, height: h };
        if self.cell_size == 0 {
            return Err(MazeError::InvalidCellSize);
        }
        let side = |cells: usize| -> Option<u32> {
            u32::try_from(cells)
                .ok()?
                .checked_mul(self.cell_size)?
                .checked_add(self.padding.checked_mul(2)?)?
                .checked_add(1)
        };
        let (cw, ch) = (side(w).ok_or_else(invalid)?, side(h).ok_or_else(invalid)?);
        if cw as u64 * ch as u64 > MAX_CANVAS_PIXELS {
            return Err(invalid());
        }
        Ok((cw, ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: Params = serde_json::from_str(r#"{"cell_size": 4}"#).unwrap();
        assert_eq!(params.cell_size, 4);
        assert_eq!(params.wall_group_size, 5);
        assert_eq!(params.tick_interval_ms, 50);
    }

    #[test]
    fn zero_group_size_is_rejected() {
        let params = Params { wall_group_size: 0, ..Params::default() };
        assert_eq!(params.validate(), Err(MazeError::InvalidGroupSize));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let params: Params = serde_json::from_str(r#"{"tick_interval_ms": 0}"#).unwrap();
        assert_eq!(params.validate(), Err(MazeError::InvalidTickInterval));
        let params = Params { cell_size: 0, ..Params::default() };
        assert_eq!(params.validate(), Err(MazeError::InvalidCellSize));
        assert_eq!(params.canvas_size(4, 4), Err(MazeError::InvalidCellSize));
    }

    #[test]
    fn canvas_size_includes_padding_and_closing_line() {
        assert_eq!(Params::default().canvas_size(60, 30), Ok((621, 321)));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let huge: Params = serde_json::from_str(r#"{"cell_size": 100000000}"#).unwrap();
        assert_eq!(huge.validate(), Ok(()));
        assert_eq!(
            huge.canvas_size(60, 30),
            Err(MazeError::InvalidCanvas { width: 60, height: 30 })
        );

        // fits the cell limit, but would need ~160 GB of pixels
        let big = Params { cell_size: 1000, ..Params::default() };
        assert_eq!(
            big.canvas_size(200, 200),
            Err(MazeError::InvalidCanvas { width: 200, height: 200 })
        );

        let pad = Params { padding: u32::MAX, ..Params::default() };
        assert!(pad.canvas_size(1, 1).is_err());
    }
}
