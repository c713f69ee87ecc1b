//! The per-frame measurement pipeline.
//!
//! [`Session`] owns everything that survives between frames: the temporal
//! stabilizers and the presence gate. Each call to [`Session::process`]
//! rebuilds every measurement from scratch out of that frame's landmarks;
//! there is no cross-frame mutation of measurement state, only of filter
//! state.

use std::time::{Duration, Instant};

use crate::calib::Calibration;
use crate::filter::{DeadbandEma, Filter, Kalman, Presence};
use crate::landmark::{Idx, Landmarks, LEFT_IRIS_RING, RIGHT_IRIS_RING};
use crate::measure::{Ipd, IrisMeasurement, NoseMetrics, Span, FAR_PD_FACTOR};
use crate::overlay::{AngleSpec, Canvas, Category, Color, OffsetDir, Overlay, RailSpec};
use crate::project::{self, PointGrid, Resolution};

/// Tunables of the measurement pipeline. All of these have workable defaults;
/// none is an invariant of the algorithms themselves.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub calibration: Calibration,
    /// Near-to-far PD correction factor.
    pub far_pd_factor: f32,
    /// Blend rate of the iris-diameter EMA.
    pub iris_alpha: f32,
    /// Dead band of the iris-diameter EMA, in pixels.
    pub iris_deadband_px: f32,
    /// Blend rate of the displayed-distance EMA.
    pub distance_alpha: f32,
    /// Dead band of the displayed-distance EMA, in centimeters.
    pub distance_deadband_cm: f32,
    /// Process noise of the IPD Kalman filter.
    pub ipd_process_noise: f32,
    /// Measurement noise of the IPD Kalman filter.
    pub ipd_measurement_noise: f32,
    /// How long a displayed value survives continuous signal absence.
    pub visibility_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            far_pd_factor: FAR_PD_FACTOR,
            iris_alpha: 0.3,
            iris_deadband_px: 0.25,
            distance_alpha: 0.2,
            distance_deadband_cm: 0.5,
            ipd_process_noise: 0.01,
            ipd_measurement_noise: 0.5,
            visibility_timeout: Duration::from_millis(800),
        }
    }
}

/// Everything measured in one frame.
///
/// Every field is recomputed whole each frame; absent inputs yield [`None`],
/// never a stale or partially updated value. The one exception is
/// `distance_cm`, which is a *displayed* value and outlives brief signal
/// loss until the visibility timeout expires.
#[derive(Debug, Clone, Default)]
pub struct FrameMeasurements {
    /// The calibration factor used for this frame's measurements.
    pub mm_per_px: Option<f32>,
    /// Smoothed iris diameter feeding the calibration.
    pub iris_diameter_px: Option<f32>,
    pub left_iris: Option<IrisMeasurement>,
    pub right_iris: Option<IrisMeasurement>,
    /// Smoothed camera-to-subject distance.
    pub distance_cm: Option<f32>,
    pub ipd: Option<Ipd>,
    pub face_width: Option<Span>,
    pub left_eye_width: Option<Span>,
    pub right_eye_width: Option<Span>,
    pub nose: Option<NoseMetrics>,
    /// The projected nose grid, kept for contour drawing.
    pub nose_grid: Option<PointGrid>,
}

/// Owns the cross-frame filter state and runs the per-frame pipeline.
pub struct Session {
    config: SessionConfig,
    iris_ema: DeadbandEma,
    distance_ema: DeadbandEma,
    ipd_kalman: Kalman,
    presence: Presence,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            iris_ema: DeadbandEma::new(config.iris_alpha, config.iris_deadband_px),
            distance_ema: DeadbandEma::new(config.distance_alpha, config.distance_deadband_cm),
            ipd_kalman: Kalman::new(config.ipd_process_noise, config.ipd_measurement_noise),
            presence: Presence::new(config.visibility_timeout),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The current smoothed iris diameter, if any.
    ///
    /// Retained across brief signal loss; cleared once the visibility
    /// timeout elapses.
    #[inline]
    pub fn smoothed_iris_diameter_px(&self) -> Option<f32> {
        self.iris_ema.value()
    }

    /// Clears all cross-frame state back to a fresh session.
    pub fn reset(&mut self) {
        self.iris_ema.reset();
        self.distance_ema.reset();
        self.ipd_kalman.reset();
        self.presence.reset();
    }

    /// Processes one frame of landmarks.
    ///
    /// An absent or empty landmark list means no face was detected: all
    /// measurements come back [`None`]. Filter state is retained across such
    /// frames until the signal has been gone for the configured visibility
    /// timeout, at which point the stabilizers reset.
    pub fn process(
        &mut self,
        landmarks: Option<&Landmarks>,
        res: Resolution,
        now: Instant,
    ) -> FrameMeasurements {
        let Some(lms) = landmarks.filter(|lms| !lms.is_empty()) else {
            return self.process_absent(now);
        };

        let left_iris = iris_measurement(lms, LEFT_IRIS_RING, Idx::LeftIrisCenter, res);
        let right_iris = iris_measurement(lms, RIGHT_IRIS_RING, Idx::RightIrisCenter, res);

        let raw_diameter = match (&left_iris, &right_iris) {
            (Some(l), Some(r)) => Some((l.diameter_px + r.diameter_px) / 2.0),
            (Some(l), None) => Some(l.diameter_px),
            (None, Some(r)) => Some(r.diameter_px),
            (None, None) => None,
        };

        if let Some(raw) = raw_diameter {
            self.presence.mark(now);
            self.iris_ema.push(raw);
        } else if self.signal_expired(now) {
            self.expire(now);
        }

        let iris_diameter_px = self
            .presence
            .visible_at(now)
            .then(|| self.iris_ema.value())
            .flatten();

        let mm_per_px = iris_diameter_px.and_then(|d| self.config.calibration.mm_per_pixel(d));
        let distance_cm = iris_diameter_px
            .and_then(|d| self.config.calibration.estimate_distance_cm(d))
            .map(|raw| self.distance_ema.push(raw));

        // With no calibration factor every builder below yields None; the
        // frame still reports the raw iris fits.
        let scale = mm_per_px.unwrap_or(f32::NAN);

        let ipd = project::project_pair(lms, Idx::LeftIrisCenter, Idx::RightIrisCenter, res)
            .and_then(|(left, right)| {
                Ipd::compute(left, right, scale, self.config.far_pd_factor)
            })
            .map(|ipd| {
                let near_mm = self.ipd_kalman.push(ipd.near_mm);
                Ipd {
                    near_mm,
                    far_mm: near_mm * self.config.far_pd_factor,
                    ..ipd
                }
            });

        let face_width = project::project_pair(lms, Idx::FaceLeftEdge, Idx::FaceRightEdge, res)
            .and_then(|(left, right)| Span::between(left, right, scale));
        let left_eye_width =
            project::project_pair(lms, Idx::LeftEyeOuterCorner, Idx::LeftEyeInnerCorner, res)
                .and_then(|(a, b)| Span::between(a, b, scale));
        let right_eye_width =
            project::project_pair(lms, Idx::RightEyeInnerCorner, Idx::RightEyeOuterCorner, res)
                .and_then(|(a, b)| Span::between(a, b, scale));

        let nose_grid = PointGrid::project_nose(lms, res);
        let nose = NoseMetrics::compute(&nose_grid, scale);

        FrameMeasurements {
            mm_per_px,
            iris_diameter_px,
            left_iris,
            right_iris,
            distance_cm,
            ipd,
            face_width,
            left_eye_width,
            right_eye_width,
            nose,
            nose_grid: Some(nose_grid),
        }
    }

    fn process_absent(&mut self, now: Instant) -> FrameMeasurements {
        let distance_cm = self
            .presence
            .visible_at(now)
            .then(|| self.distance_ema.value())
            .flatten();
        let iris_diameter_px = self
            .presence
            .visible_at(now)
            .then(|| self.iris_ema.value())
            .flatten();
        if self.signal_expired(now) {
            self.expire(now);
        }
        FrameMeasurements {
            distance_cm,
            iris_diameter_px,
            ..Default::default()
        }
    }

    fn signal_expired(&self, now: Instant) -> bool {
        self.presence.last_seen().is_some() && !self.presence.visible_at(now)
    }

    fn expire(&mut self, now: Instant) {
        let gone = now.saturating_duration_since(self.presence.last_seen().unwrap_or(now));
        log::debug!("signal lost for {gone:?}, resetting stabilizers");
        self.reset();
    }
}

impl FrameMeasurements {
    /// Lays this frame's measurements out through the overlay engine.
    ///
    /// Starts a fresh overlay frame; the caller keeps ownership of the
    /// engine (and with it the policy) and the canvas.
    pub fn draw<C: Canvas>(&self, overlay: &mut Overlay, canvas: &mut C) {
        const FACE_COLOR: Color = Color::GREEN;
        const EYE_COLOR: Color = Color::CYAN;
        const NOSE_COLOR: Color = Color::YELLOW;

        overlay.begin_frame();

        if let Some(face) = &self.face_width {
            let label = format!("face {:.1} mm", face.value_mm);
            overlay.draw_rail(
                canvas,
                &RailSpec::new(face.left, face.right, Category::Face)
                    .offset(24.0, OffsetDir::Perpendicular)
                    .label(&label)
                    .color(FACE_COLOR),
            );
        }

        if let Some(ipd) = &self.ipd {
            let label = format!("PD {:.1}/{:.1} mm", ipd.near_mm, ipd.far_mm);
            overlay.draw_rail(
                canvas,
                &RailSpec::new(ipd.left, ipd.right, Category::Eyes)
                    .offset(-18.0, OffsetDir::Perpendicular)
                    .label(&label)
                    .color(EYE_COLOR),
            );
        }

        if overlay.policy().eye_rails_enabled() {
            for eye in [&self.left_eye_width, &self.right_eye_width]
                .into_iter()
                .flatten()
            {
                let label = format!("{:.1} mm", eye.value_mm);
                overlay.draw_rail(
                    canvas,
                    &RailSpec::new(eye.left, eye.right, Category::Eyes)
                        .offset(10.0, OffsetDir::Perpendicular)
                        .label(&label)
                        .color(EYE_COLOR)
                        .leader(true),
                );
            }
        }

        if let Some(nose) = &self.nose {
            let bridge_label = format!("bridge {:.1} mm", nose.bridge_width_mm);
            overlay.draw_rail(
                canvas,
                &RailSpec::new(nose.bridge.left, nose.bridge.right, Category::Nose)
                    .offset(-10.0, OffsetDir::Perpendicular)
                    .label(&bridge_label)
                    .color(NOSE_COLOR),
            );

            let pad_label = match nose.flare_angle_deg {
                Some(flare) => format!("pads {:.1} mm, flare {:.0}°", nose.pad_span_mm, flare),
                None => format!("pads {:.1} mm", nose.pad_span_mm),
            };
            overlay.draw_rail(
                canvas,
                &RailSpec::new(nose.pads.left, nose.pads.right, Category::Nose)
                    .offset(12.0, OffsetDir::Perpendicular)
                    .label(&pad_label)
                    .color(NOSE_COLOR),
            );

            if let (Some(deg), Some(lines)) = (nose.pad_angle_deg, nose.pad_angle_lines) {
                let label = format!("{deg:.0}°");
                overlay.draw_angle(
                    canvas,
                    &AngleSpec::new(lines.apex, lines.line_a_end, lines.line_b_end, Category::Nose)
                        .radius(14.0)
                        .label(&label)
                        .color(NOSE_COLOR),
                );
            }
        }

        if let Some(grid) = &self.nose_grid {
            let mid = grid.cols() / 2;
            let profile: Vec<_> = (0..grid.rows().len())
                .filter_map(|row| grid.cell(row, mid))
                .collect();
            overlay.draw_contour(canvas, &profile, Category::Nose, NOSE_COLOR, 1.0);
        }
    }
}

fn iris_measurement(
    lms: &Landmarks,
    ring: [Idx; 4],
    pupil: Idx,
    res: Resolution,
) -> Option<IrisMeasurement> {
    let ring = project::project_all(lms, ring, res)?;
    let pupil = project::project(lms, pupil, res)?;
    IrisMeasurement::fit(ring, pupil)
}
