//! Nose-grid metrics: bridge width, pad span, pad height, and the two
//! heuristic angles used for eyeglass fitting.

use nalgebra::Point2;

use crate::geom;
use crate::project::PointGrid;

use super::valid_scale;

/// Extents of one grid row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    /// Horizontal extent over the row's valid points.
    pub width_px: f32,
    /// Mean y over the row's valid points.
    pub mid_y: f32,
    /// Point at the smallest x.
    pub left: Point2<f32>,
    /// Point at the largest x.
    pub right: Point2<f32>,
}

/// Scans a row left to right and returns its extents.
///
/// Ties on x keep the first point observed; callers must not rely on a
/// particular winner among duplicate x values. Returns [`None`] for rows
/// with fewer than two valid points.
pub fn row_metrics(row: &[Option<Point2<f32>>]) -> Option<RowMetrics> {
    let mut valid = 0usize;
    let mut sum_y = 0.0;
    let mut left: Option<Point2<f32>> = None;
    let mut right: Option<Point2<f32>> = None;

    for p in row.iter().flatten() {
        valid += 1;
        sum_y += p.y;
        if left.map_or(true, |l| p.x < l.x) {
            left = Some(*p);
        }
        if right.map_or(true, |r| p.x > r.x) {
            right = Some(*p);
        }
    }
    if valid < 2 {
        return None;
    }

    let (left, right) = (left?, right?);
    Some(RowMetrics {
        width_px: right.x - left.x,
        mid_y: sum_y / valid as f32,
        left,
        right,
    })
}

/// The three points the pad-angle overlay draws its arms between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadAngleLines {
    /// Shared origin of both arms (topmost mid-column point).
    pub apex: Point2<f32>,
    /// End of the reference arm, straight down the mid column.
    pub line_a_end: Point2<f32>,
    /// End of the diagonal arm.
    pub line_b_end: Point2<f32>,
}

/// The full set of nose measurements for one frame.
///
/// Widths and the pad height are required; the two angles are heuristic and
/// individually absent when their probe points are not available. Either way
/// the struct is rebuilt from scratch every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoseMetrics {
    pub bridge_width_mm: f32,
    pub pad_span_mm: f32,
    pub pad_height_mm: f32,
    pub pad_angle_deg: Option<f32>,
    pub pad_angle_lines: Option<PadAngleLines>,
    pub flare_angle_deg: Option<f32>,
    pub bridge: RowMetrics,
    pub pads: RowMetrics,
}

impl NoseMetrics {
    /// Computes nose metrics over a projected nose grid.
    pub fn compute(grid: &PointGrid, mm_per_px: f32) -> Option<Self> {
        let mm_per_px = valid_scale(mm_per_px)?;
        let bridge = row_metrics(grid.bridge_row()?)?;
        let pads = row_metrics(grid.pad_row()?)?;

        let bridge_width_mm = bridge.width_px * mm_per_px;
        let pad_span_mm = pads.width_px * mm_per_px;
        if !(bridge_width_mm > 0.0) || !(pad_span_mm > 0.0) {
            return None;
        }
        let pad_height_mm = (pads.mid_y - bridge.mid_y).abs() * mm_per_px;

        let (pad_angle_deg, pad_angle_lines) = match pad_angle(grid) {
            Some((deg, lines)) => (Some(deg), Some(lines)),
            None => (None, None),
        };

        Some(Self {
            bridge_width_mm,
            pad_span_mm,
            pad_height_mm,
            pad_angle_deg,
            pad_angle_lines,
            flare_angle_deg: flare_angle(grid),
            bridge,
            pads,
        })
    }
}

/// Probes the slope of the nose flank below the bridge.
///
/// Walks the middle column from row 1 through row 3 for the first two valid
/// points, then continues diagonally (row and column advancing together) from
/// the top point for a third. The reported angle sits between the straight-
/// down arm and the diagonal arm. This is a local-curvature proxy, not a
/// standardized anatomical angle.
fn pad_angle(grid: &PointGrid) -> Option<(f32, PadAngleLines)> {
    let mid_col = grid.cols() / 2;

    let mut top: Option<(usize, Point2<f32>)> = None;
    let mut bottom: Option<Point2<f32>> = None;
    for row in 1..=3 {
        if let Some(p) = grid.cell(row, mid_col) {
            if top.is_none() {
                top = Some((row, p));
            } else {
                bottom = Some(p);
                break;
            }
        }
    }
    let ((top_row, top_mid), bottom_mid) = (top?, bottom?);

    let mut diag = None;
    let (mut row, mut col) = (top_row + 1, mid_col + 1);
    while row < grid.rows().len() && col < grid.cols() {
        if let Some(p) = grid.cell(row, col) {
            diag = Some(p);
            break;
        }
        row += 1;
        col += 1;
    }
    let diag = diag?;

    let deg = geom::angle_between(bottom_mid - top_mid, diag - top_mid)?.to_degrees();
    Some((
        deg,
        PadAngleLines {
            apex: top_mid,
            line_a_end: bottom_mid,
            line_b_end: diag,
        },
    ))
}

/// Angle at which the nostril flanks spread from the pad row's center.
fn flare_angle(grid: &PointGrid) -> Option<f32> {
    let row = grid.pad_row()?;
    let mid = row.len() / 2;
    let center = (*row.get(mid)?)?;
    let left = (*row.get(mid.checked_sub(1)?)?)?;
    let right = (*row.get(mid + 1)?)?;

    geom::angle_between(left - center, right - center).map(f32::to_degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{NOSE_COLS, NOSE_ROWS};
    use approx::assert_relative_eq;

    /// Mirror-symmetric synthetic grid: row `r` sits at y = 10r, columns
    /// spread ±3px per step from a 100px center line that descends with the
    /// rows.
    fn symmetric_grid() -> PointGrid {
        let rows = (0..NOSE_ROWS)
            .map(|r| {
                (0..NOSE_COLS)
                    .map(|c| {
                        let off = c as f32 - (NOSE_COLS / 2) as f32;
                        Some(Point2::new(100.0 + off * 3.0, r as f32 * 10.0))
                    })
                    .collect()
            })
            .collect();
        PointGrid::from_rows(rows)
    }

    #[test]
    fn row_scan_is_first_observed_on_ties() {
        let row = vec![
            Some(Point2::new(5.0, 1.0)),
            Some(Point2::new(5.0, 2.0)),
            Some(Point2::new(1.0, 3.0)),
        ];
        let m = row_metrics(&row).unwrap();
        assert_eq!(m.left, Point2::new(1.0, 3.0));
        // Both candidates share x = 5; the first observed wins.
        assert_eq!(m.right, Point2::new(5.0, 1.0));
        assert_relative_eq!(m.width_px, 4.0);
        assert_relative_eq!(m.mid_y, 2.0);
    }

    #[test]
    fn row_needs_two_points() {
        assert_eq!(row_metrics(&[None, Some(Point2::new(1.0, 1.0)), None]), None);
        assert_eq!(row_metrics(&[]), None);
    }

    #[test]
    fn symmetric_grid_metrics() {
        let grid = symmetric_grid();
        let metrics = NoseMetrics::compute(&grid, 0.5).unwrap();

        // 6 column steps of 3 px each, at 0.5 mm/px.
        assert_relative_eq!(metrics.bridge_width_mm, 9.0, epsilon = 1e-4);
        assert_relative_eq!(metrics.pad_span_mm, 9.0, epsilon = 1e-4);
        // Rows 1 and 4 are 30 px apart.
        assert_relative_eq!(metrics.pad_height_mm, 15.0, epsilon = 1e-4);
    }

    #[test]
    fn flare_angle_matches_hand_computation() {
        let grid = symmetric_grid();
        let metrics = NoseMetrics::compute(&grid, 0.5).unwrap();

        // Neighbors sit 3 px to either side at the same y, so the two arms
        // point in exactly opposite directions.
        assert_relative_eq!(metrics.flare_angle_deg.unwrap(), 180.0, epsilon = 1e-3);
    }

    #[test]
    fn flare_angle_needs_three_points() {
        let mut rows: Vec<Vec<Option<Point2<f32>>>> = symmetric_grid().rows().to_vec();
        rows[crate::landmark::NoseTopology::ROW_PADS][NOSE_COLS / 2 - 1] = None;
        let metrics = NoseMetrics::compute(&PointGrid::from_rows(rows), 0.5).unwrap();
        assert_eq!(metrics.flare_angle_deg, None);
    }

    #[test]
    fn pad_angle_walks_mid_column_then_diagonal() {
        let grid = symmetric_grid();
        let metrics = NoseMetrics::compute(&grid, 0.5).unwrap();
        let lines = metrics.pad_angle_lines.unwrap();

        // Rows 1 and 2 of the mid column, then the diagonal hit at (2, 4).
        assert_eq!(lines.apex, Point2::new(100.0, 10.0));
        assert_eq!(lines.line_a_end, Point2::new(100.0, 20.0));
        assert_eq!(lines.line_b_end, Point2::new(103.0, 20.0));

        // Arms (0, 10) and (3, 10): acos(100 / (10 · √109)).
        let expected = (100.0 / (10.0 * 109.0_f32.sqrt())).acos().to_degrees();
        assert_relative_eq!(metrics.pad_angle_deg.unwrap(), expected, epsilon = 1e-3);
    }

    #[test]
    fn pad_angle_skips_holes_in_mid_column() {
        let mut rows: Vec<Vec<Option<Point2<f32>>>> = symmetric_grid().rows().to_vec();
        let mid = NOSE_COLS / 2;
        rows[1][mid] = None; // top probe moves down one row
        let grid = PointGrid::from_rows(rows);
        let metrics = NoseMetrics::compute(&grid, 0.5).unwrap();
        let lines = metrics.pad_angle_lines.unwrap();
        assert_eq!(lines.apex, Point2::new(100.0, 20.0));
        assert_eq!(lines.line_a_end, Point2::new(100.0, 30.0));
    }

    #[test]
    fn missing_bridge_row_fails_whole_measurement() {
        let mut rows: Vec<Vec<Option<Point2<f32>>>> = symmetric_grid().rows().to_vec();
        for cell in &mut rows[crate::landmark::NoseTopology::ROW_BRIDGE] {
            *cell = None;
        }
        assert_eq!(NoseMetrics::compute(&PointGrid::from_rows(rows), 0.5), None);
    }
}
