//! Per-frame face landmark storage and the Face Mesh index topology.
//!
//! Landmarks are produced by an external estimator using MediaPipe's
//! [Face Mesh] topology (468 points, extended to 478 with iris refinement).
//! This crate never runs inference itself; it consumes one read-only
//! [`Landmarks`] collection per frame.
//!
//! [Face Mesh]: https://google.github.io/mediapipe/solutions/face_mesh.html

use once_cell::sync::Lazy;

/// Number of landmarks with iris refinement enabled.
pub const NUM_LANDMARKS: usize = 478;

/// A single tracked face point.
///
/// `x` and `y` are normalized to the frame (0..1); `z` is relative depth in
/// the estimator's convention (negative is closer to the camera).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One frame's worth of landmarks.
///
/// Recreated every frame from the estimator output and never mutated here.
/// Indexing is infallible-by-`Option`: out-of-range indices and non-finite
/// entries both read as absent, so a partially tracked face degrades into
/// missing measurements rather than errors.
#[derive(Debug, Clone, Default)]
pub struct Landmarks {
    positions: Vec<Landmark>,
}

impl Landmarks {
    /// Wraps a frame of landmark positions.
    pub fn new(positions: Vec<Landmark>) -> Self {
        Self { positions }
    }

    /// Builds a collection from the estimator's flat `[x, y, z]` output.
    pub fn from_positions(positions: impl IntoIterator<Item = [f32; 3]>) -> Self {
        Self {
            positions: positions
                .into_iter()
                .map(|[x, y, z]| Landmark::new(x, y, z))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the landmark at `index`, or [`None`] if it is out of range or
    /// carries non-finite coordinates.
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.positions
            .get(index)
            .copied()
            .filter(Landmark::is_finite)
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.positions.iter().copied()
    }

    /// Whether the collection covers the iris-refined topology.
    pub fn has_iris(&self) -> bool {
        self.positions.len() >= NUM_LANDMARKS
    }
}

/// Assigns a name to the landmark indices this crate measures between.
///
/// "Left" and "Right" are relative to the input image, not from the PoV of
/// the depicted person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idx {
    LeftEyeOuterCorner = 33,
    LeftEyeInnerCorner = 133,
    RightEyeInnerCorner = 362,
    RightEyeOuterCorner = 263,
    FaceLeftEdge = 234,
    FaceRightEdge = 454,
    LeftIrisCenter = 468,
    LeftIrisRight = 469,
    LeftIrisTop = 470,
    LeftIrisLeft = 471,
    LeftIrisBottom = 472,
    RightIrisCenter = 473,
    RightIrisRight = 474,
    RightIrisTop = 475,
    RightIrisLeft = 476,
    RightIrisBottom = 477,
}

impl From<Idx> for usize {
    #[inline]
    fn from(idx: Idx) -> usize {
        idx as usize
    }
}

/// The four points on the left iris ring, fit by the iris measurement.
pub const LEFT_IRIS_RING: [Idx; 4] = [
    Idx::LeftIrisRight,
    Idx::LeftIrisTop,
    Idx::LeftIrisLeft,
    Idx::LeftIrisBottom,
];

/// The four points on the right iris ring.
pub const RIGHT_IRIS_RING: [Idx; 4] = [
    Idx::RightIrisRight,
    Idx::RightIrisTop,
    Idx::RightIrisLeft,
    Idx::RightIrisBottom,
];

/// Number of rows in the nose index grid.
pub const NOSE_ROWS: usize = 8;
/// Number of columns in the nose index grid.
pub const NOSE_COLS: usize = 7;

/// The nose sampled as a grid of Face Mesh indices.
///
/// Rows run top to bottom from the sellion to the nostril base, columns left
/// to right across the nose. Cells without a usable mesh point are `None`;
/// the projector keeps the holes so row metrics can skip them per cell.
#[derive(Debug, Clone)]
pub struct NoseTopology {
    rows: [[Option<u16>; NOSE_COLS]; NOSE_ROWS],
}

impl NoseTopology {
    /// Row index of the nose bridge (where an eyeglass bridge rests).
    pub const ROW_BRIDGE: usize = 1;
    /// Row index of the nose-pad contact area.
    pub const ROW_PADS: usize = 4;

    /// Returns the shared default topology.
    pub fn get() -> &'static NoseTopology {
        static TOPOLOGY: Lazy<NoseTopology> = Lazy::new(|| NoseTopology {
            rows: [
                // Sellion level; the outermost columns have no mesh point here.
                [None, Some(245), Some(193), Some(168), Some(417), Some(465), None],
                // Bridge row.
                [Some(114), Some(188), Some(122), Some(6), Some(351), Some(412), Some(343)],
                [Some(217), Some(174), Some(196), Some(197), Some(419), Some(399), Some(437)],
                [Some(126), Some(198), Some(236), Some(195), Some(456), Some(420), Some(355)],
                // Pad row.
                [Some(129), Some(209), Some(131), Some(5), Some(360), Some(429), Some(358)],
                [Some(49), Some(48), Some(51), Some(4), Some(281), Some(278), Some(279)],
                [Some(64), Some(219), Some(45), Some(1), Some(275), Some(439), Some(294)],
                [Some(240), Some(75), Some(44), Some(2), Some(274), Some(305), Some(460)],
            ],
        });
        &TOPOLOGY
    }

    #[inline]
    pub fn rows(&self) -> &[[Option<u16>; NOSE_COLS]; NOSE_ROWS] {
        &self.rows
    }

    #[inline]
    pub fn bridge_row(&self) -> &[Option<u16>; NOSE_COLS] {
        &self.rows[Self::ROW_BRIDGE]
    }

    #[inline]
    pub fn pad_row(&self) -> &[Option<u16>; NOSE_COLS] {
        &self.rows[Self::ROW_PADS]
    }
}
