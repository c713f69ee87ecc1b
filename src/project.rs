//! Projection of normalized landmarks onto pixel-space canvas coordinates.
//!
//! The estimator emits coordinates normalized to the frame; everything
//! downstream (circle fits, millimeter conversions, overlay layout) works in
//! pixels. This module is the single place where that conversion happens, and
//! where flat landmark indices are assembled into the structured point sets
//! the measurement builders consume.

use nalgebra::Point2;

use crate::landmark::{Landmarks, NoseTopology};

/// Pixel dimensions of the target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Projects the landmark at `index` into pixel space.
///
/// Returns [`None`] when the landmark is absent.
pub fn project(
    landmarks: &Landmarks,
    index: impl Into<usize>,
    res: Resolution,
) -> Option<Point2<f32>> {
    let lm = landmarks.get(index.into())?;
    Some(Point2::new(
        lm.x * res.width() as f32,
        lm.y * res.height() as f32,
    ))
}

/// Projects a pair of landmarks atomically.
///
/// Returns [`None`] if *either* landmark is missing; a partial pair is never
/// returned.
pub fn project_pair(
    landmarks: &Landmarks,
    a: impl Into<usize>,
    b: impl Into<usize>,
    res: Resolution,
) -> Option<(Point2<f32>, Point2<f32>)> {
    Some((project(landmarks, a, res)?, project(landmarks, b, res)?))
}

/// Projects a fixed set of landmarks atomically.
pub fn project_all<I: Into<usize>, const N: usize>(
    landmarks: &Landmarks,
    indices: [I; N],
    res: Resolution,
) -> Option<[Point2<f32>; N]> {
    let mut out = [Point2::origin(); N];
    for (slot, index) in out.iter_mut().zip(indices) {
        *slot = project(landmarks, index, res)?;
    }
    Some(out)
}

/// A grid of projected points: ordered rows of optional pixel-space cells.
///
/// This is the one canonical grid shape in the crate. Each cell is
/// independently null-safe: a hole in the topology or a missing landmark
/// leaves a `None` cell without invalidating the rest of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    rows: Vec<Vec<Option<Point2<f32>>>>,
}

impl PointGrid {
    /// Wraps already-projected rows. This is the boundary where any other
    /// historical grid shape gets converted.
    pub fn from_rows(rows: Vec<Vec<Option<Point2<f32>>>>) -> Self {
        Self { rows }
    }

    /// Projects the nose topology onto pixel space, cell by cell.
    pub fn project_nose(landmarks: &Landmarks, res: Resolution) -> Self {
        let topology = NoseTopology::get();
        let rows = topology
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.and_then(|idx| project(landmarks, idx as usize, res)))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<Option<Point2<f32>>>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Option<Point2<f32>>]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of columns in the widest row.
    pub fn cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the cell at `(row, col)`, flattening structural holes.
    pub fn cell(&self, row: usize, col: usize) -> Option<Point2<f32>> {
        self.rows.get(row)?.get(col).copied().flatten()
    }

    /// The bridge row of a nose grid.
    pub fn bridge_row(&self) -> Option<&[Option<Point2<f32>>]> {
        self.row(NoseTopology::ROW_BRIDGE)
    }

    /// The pad row of a nose grid.
    pub fn pad_row(&self) -> Option<&[Option<Point2<f32>>]> {
        self.row(NoseTopology::ROW_PADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Idx, NOSE_COLS, NOSE_ROWS};
    use approx::assert_relative_eq;

    fn res() -> Resolution {
        Resolution::new(640, 480)
    }

    fn landmarks_with(entries: &[(usize, [f32; 3])]) -> Landmarks {
        let mut positions = vec![[f32::NAN, f32::NAN, f32::NAN]; crate::landmark::NUM_LANDMARKS];
        for &(i, pos) in entries {
            positions[i] = pos;
        }
        Landmarks::from_positions(positions)
    }

    #[test]
    fn projection_scales_to_pixels() {
        let lms = Landmarks::from_positions([[0.5, 0.25, 0.0]]);
        let p = project(&lms, 0usize, res()).unwrap();
        assert_relative_eq!(p.x, 320.0);
        assert_relative_eq!(p.y, 120.0);
    }

    #[test]
    fn pair_projection_is_atomic() {
        let lms = landmarks_with(&[(Idx::LeftEyeOuterCorner as usize, [0.3, 0.4, 0.0])]);
        // The inner corner is NaN, so the whole pair must fail.
        assert_eq!(
            project_pair(&lms, Idx::LeftEyeOuterCorner, Idx::LeftEyeInnerCorner, res()),
            None
        );
    }

    #[test]
    fn nose_grid_keeps_holes_per_cell() {
        let mut positions = vec![[0.5, 0.5, 0.0]; crate::landmark::NUM_LANDMARKS];
        positions[6] = [f32::NAN, 0.0, 0.0]; // center of the bridge row
        let grid = PointGrid::project_nose(&Landmarks::from_positions(positions), res());

        assert_eq!(grid.rows().len(), NOSE_ROWS);
        assert_eq!(grid.cols(), NOSE_COLS);
        // Structural holes at the sellion corners.
        assert_eq!(grid.cell(0, 0), None);
        // The NaN landmark only empties its own cell.
        assert_eq!(grid.cell(1, 3), None);
        assert!(grid.cell(1, 2).is_some());
    }
}
