//! Overlay layout: rails, brackets, angle arcs, and collision-free labels.
//!
//! The engine is a small per-frame state machine. [`Overlay::begin_frame`]
//! clears the collision registry and the leader-line budget; the `draw_*`
//! calls that follow lay elements out independently, registering every placed
//! label so later labels can avoid it. Placement order is significant (the
//! first label wins contested space), so draw calls must stay sequential.

mod canvas;
mod collision;
mod eg;
mod policy;

pub use canvas::{Canvas, Color, DrawCmd, HAlign, RecordingCanvas, TextSize, VAlign};
pub use collision::{CollisionBox, CollisionRegistry};
pub use eg::EgCanvas;
pub use policy::{Category, Compact, DetailLevel, Focus, RenderPolicy};

use nalgebra::{Point2, Vector2};

use crate::geom;

/// Distance from a rail (or arc) to the center of its label.
const LABEL_GAP: f32 = 16.0;
/// Lateral shift applied to the fallback label candidates.
const LABEL_NUDGE: f32 = 12.0;
/// Padding added around measured text when testing for collisions.
const LABEL_PAD: f32 = 4.0;
/// Stroke width used for leader lines.
const LEADER_STROKE: f32 = 1.0;
/// Samples per segment when smoothing contours.
const CONTOUR_SAMPLES: usize = 8;

/// How a rail's offset direction is resolved from its base segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetDir {
    /// 90° counterclockwise from the base direction.
    Perpendicular,
    /// Along the base direction.
    Parallel,
    Horizontal,
    Vertical,
    /// An explicit angle in radians.
    Angle(f32),
    /// An explicit direction vector (normalized internally).
    Vector(Vector2<f32>),
}

/// Geometry of an offset rail, valid for the duration of one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailGeometry {
    /// Rail endpoint offset from the base segment's first point.
    pub a: Point2<f32>,
    /// Rail endpoint offset from the base segment's second point.
    pub b: Point2<f32>,
    pub mid: Point2<f32>,
    /// Direction angle of the rail, in radians.
    pub angle: f32,
    pub base_dir: Vector2<f32>,
    pub off_dir: Vector2<f32>,
}

/// Derives the rail parallel to `a`–`b`, shifted by `offset` along the
/// resolved direction.
///
/// Returns [`None`] for zero-length base segments, unresolvable offset
/// directions, and non-finite results.
pub fn rail_geometry(
    a: Point2<f32>,
    b: Point2<f32>,
    offset: f32,
    dir: OffsetDir,
) -> Option<RailGeometry> {
    let base_dir = geom::normalize(b - a);
    if base_dir == Vector2::zeros() {
        return None;
    }
    let off_dir = match dir {
        OffsetDir::Perpendicular => geom::perp(base_dir),
        OffsetDir::Parallel => base_dir,
        OffsetDir::Horizontal => Vector2::x(),
        OffsetDir::Vertical => Vector2::y(),
        OffsetDir::Angle(theta) => Vector2::new(theta.cos(), theta.sin()),
        OffsetDir::Vector(v) => geom::normalize(v),
    };
    if off_dir == Vector2::zeros() {
        return None;
    }

    let ra = geom::translate(a, off_dir, offset)?;
    let rb = geom::translate(b, off_dir, offset)?;
    Some(RailGeometry {
        a: ra,
        b: rb,
        mid: nalgebra::center(&ra, &rb),
        angle: geom::angle_of(rb, ra),
        base_dir,
        off_dir,
    })
}

/// A measurement rail to draw: base segment, offset, label.
#[derive(Debug, Clone)]
pub struct RailSpec<'a> {
    pub base_a: Point2<f32>,
    pub base_b: Point2<f32>,
    pub offset: f32,
    pub dir: OffsetDir,
    pub label: Option<&'a str>,
    pub category: Category,
    pub color: Color,
    pub stroke_width: f32,
    /// Draw connector ticks from the rail back to the base endpoints.
    pub ticks: bool,
    /// Request a leader line when the label cannot sit at its primary spot.
    pub leader: bool,
}

impl<'a> RailSpec<'a> {
    pub fn new(base_a: Point2<f32>, base_b: Point2<f32>, category: Category) -> Self {
        Self {
            base_a,
            base_b,
            offset: 12.0,
            dir: OffsetDir::Perpendicular,
            label: None,
            category,
            color: Color::WHITE,
            stroke_width: 2.0,
            ticks: true,
            leader: false,
        }
    }

    pub fn offset(mut self, offset: f32, dir: OffsetDir) -> Self {
        self.offset = offset;
        self.dir = dir;
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn leader(mut self, leader: bool) -> Self {
        self.leader = leader;
        self
    }
}

/// An angle overlay to draw: two arms from an origin plus an arc between.
#[derive(Debug, Clone)]
pub struct AngleSpec<'a> {
    pub origin: Point2<f32>,
    pub arm_a: Point2<f32>,
    pub arm_b: Point2<f32>,
    pub radius: f32,
    pub label: Option<&'a str>,
    pub category: Category,
    pub color: Color,
    pub stroke_width: f32,
    pub draw_arms: bool,
}

impl<'a> AngleSpec<'a> {
    pub fn new(
        origin: Point2<f32>,
        arm_a: Point2<f32>,
        arm_b: Point2<f32>,
        category: Category,
    ) -> Self {
        Self {
            origin,
            arm_a,
            arm_b,
            radius: 24.0,
            label: None,
            category,
            color: Color::WHITE,
            stroke_width: 2.0,
            draw_arms: true,
        }
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// The overlay layout engine.
pub struct Overlay {
    policy: RenderPolicy,
    registry: CollisionRegistry,
    leaders_used: usize,
}

impl Overlay {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy: policy.sanitized(),
            registry: CollisionRegistry::new(),
            leaders_used: 0,
        }
    }

    /// Starts a new frame: clears the collision registry and the leader
    /// budget. There is no matching end-of-frame call; the registry simply
    /// lives until the next `begin_frame`.
    pub fn begin_frame(&mut self) {
        self.registry.reset();
        self.leaders_used = 0;
    }

    /// Replaces the render policy (sanitizing it first).
    pub fn set_policy(&mut self, policy: RenderPolicy) {
        self.policy = policy.sanitized();
    }

    #[inline]
    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    #[inline]
    pub fn registry(&self) -> &CollisionRegistry {
        &self.registry
    }

    /// Leader lines spent so far this frame.
    #[inline]
    pub fn leaders_used(&self) -> usize {
        self.leaders_used
    }

    /// Draws a measurement rail with optional ticks and label.
    ///
    /// Returns the rail geometry, or [`None`] when the rail was not drawn
    /// (hidden category or degenerate base segment). A dropped *label* does
    /// not make the call fail; the rail itself still draws.
    pub fn draw_rail<C: Canvas>(
        &mut self,
        canvas: &mut C,
        spec: &RailSpec<'_>,
    ) -> Option<RailGeometry> {
        let alpha = self.policy.category_alpha(spec.category)?;
        let rail = rail_geometry(spec.base_a, spec.base_b, spec.offset, spec.dir)?;
        let color = spec.color.fade(alpha);

        canvas.stroke_polyline(&[rail.a, rail.b], color, spec.stroke_width);
        if spec.ticks && !self.policy.compact.hide_connectors {
            canvas.stroke_polyline(&[rail.a, spec.base_a], color, LEADER_STROKE);
            canvas.stroke_polyline(&[rail.b, spec.base_b], color, LEADER_STROKE);
        }

        if let Some(text) = spec.label {
            // The label sits on the same side of the base as the rail.
            let label_dir = if spec.offset < 0.0 {
                -rail.off_dir
            } else {
                rail.off_dir
            };
            let placed = self.place_label(
                canvas,
                text,
                rail.mid,
                label_dir,
                LABEL_GAP,
                rail.angle,
                color,
            );
            if let Some((candidate, pos)) = placed {
                // The label had to move away from the rail; connect the two
                // if the frame's leader budget still allows it.
                if spec.leader && candidate > 0 {
                    if self.leaders_used < self.policy.max_leaders {
                        canvas.stroke_polyline(&[rail.mid, pos], color, LEADER_STROKE);
                        self.leaders_used += 1;
                    } else {
                        log::trace!("leader budget exhausted, label {text:?} drawn bare");
                    }
                }
            }
        }
        Some(rail)
    }

    /// Draws the angle between two arms as an arc plus label.
    ///
    /// Returns the drawn angle in degrees, or [`None`] when the overlay was
    /// skipped (hidden category, degenerate arms, or magnitude below the
    /// policy's `min_angle_deg` threshold).
    pub fn draw_angle<C: Canvas>(&mut self, canvas: &mut C, spec: &AngleSpec<'_>) -> Option<f32> {
        let alpha = self.policy.category_alpha(spec.category)?;
        if spec.arm_a == spec.origin || spec.arm_b == spec.origin {
            return None;
        }

        let ang_a = geom::angle_of(spec.arm_a, spec.origin);
        let ang_b = geom::angle_of(spec.arm_b, spec.origin);
        // `angle_delta` always yields the shorter way around, which is the
        // same as flipping start and end whenever the raw delta exceeds π.
        let sweep = geom::angle_delta(ang_a, ang_b);
        let deg = sweep.abs().to_degrees();
        if deg < self.policy.min_angle_deg {
            return None;
        }

        let color = spec.color.fade(alpha);
        if spec.draw_arms && self.policy.detail_level != DetailLevel::Minimal {
            canvas.stroke_polyline(&[spec.origin, spec.arm_a], color, spec.stroke_width);
            canvas.stroke_polyline(&[spec.origin, spec.arm_b], color, spec.stroke_width);
        }
        canvas.stroke_arc(
            spec.origin,
            spec.radius,
            ang_a,
            sweep,
            color,
            spec.stroke_width,
        );

        if let Some(text) = spec.label {
            let bisector = ang_a + sweep / 2.0;
            let arc_mid = geom::point_on_ray(spec.origin, bisector, spec.radius);
            let out = Vector2::new(bisector.cos(), bisector.sin());
            let placed =
                self.place_label(canvas, text, arc_mid, out, LABEL_GAP, 0.0, color);
            if let Some((candidate, pos)) = placed {
                if candidate > 0 {
                    canvas.stroke_polyline(&[arc_mid, pos], color, LEADER_STROKE);
                }
            }
        }
        Some(deg)
    }

    /// Strokes a smoothed curve through `points`, if the policy enables
    /// contours.
    pub fn draw_contour<C: Canvas>(
        &mut self,
        canvas: &mut C,
        points: &[Point2<f32>],
        category: Category,
        color: Color,
        stroke_width: f32,
    ) {
        if !self.policy.contours_enabled() {
            return;
        }
        let Some(alpha) = self.policy.category_alpha(category) else {
            return;
        };
        if points.len() < 2 {
            return;
        }
        let curve = geom::catmull_rom(points, CONTOUR_SAMPLES);
        canvas.stroke_polyline(&curve, color.fade(alpha), stroke_width);
    }

    /// Places `text` at the first non-colliding candidate position.
    ///
    /// Candidates are `anchor ± dir·dist` followed by two laterally nudged
    /// variants of the primary spot. If every candidate collides the label is
    /// silently dropped; a colliding label is never drawn.
    ///
    /// Returns the chosen candidate index and position.
    fn place_label<C: Canvas>(
        &mut self,
        canvas: &mut C,
        text: &str,
        anchor: Point2<f32>,
        dir: Vector2<f32>,
        dist: f32,
        rotation: f32,
        color: Color,
    ) -> Option<(usize, Point2<f32>)> {
        let size = canvas.measure_text(text);
        let lateral = geom::perp(dir);
        // The lateral fallbacks must clear the label's own footprint, so the
        // nudge scales with the measured text width.
        let nudge = size.width / 2.0 + LABEL_NUDGE;
        let primary = anchor + dir * dist;
        let candidates = [
            primary,
            anchor - dir * dist,
            primary + lateral * nudge,
            primary - lateral * nudge,
        ];

        for (i, &pos) in candidates.iter().enumerate() {
            let bbox =
                CollisionBox::centered(pos, size.width + LABEL_PAD, size.height + LABEL_PAD);
            if !self.registry.would_collide(&bbox) {
                self.registry.register(bbox);
                canvas.fill_text(
                    text,
                    pos,
                    geom::upright_angle(rotation),
                    HAlign::Center,
                    VAlign::Middle,
                    color,
                );
                return Some((i, pos));
            }
        }
        log::trace!("label {text:?} dropped: all candidate positions collide");
        None
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new(RenderPolicy::default())
    }
}
