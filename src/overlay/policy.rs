//! Declarative control over which overlay elements get drawn.

/// How much of the overlay to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Headline measurements only.
    Minimal,
    /// Everything except per-eye rails and contours.
    #[default]
    Standard,
    /// All elements.
    Full,
}

/// Which measurement group the viewer is currently inspecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// No focus; every group draws at full opacity.
    #[default]
    Global,
    Face,
    Eyes,
    Nose,
}

/// The measurement group an overlay element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Face,
    Eyes,
    Nose,
}

/// Styling for de-emphasized elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compact {
    /// Opacity factor for groups outside the current focus.
    pub alpha_secondary: f32,
    /// Suppresses the connector ticks between rails and their base segments.
    pub hide_connectors: bool,
}

impl Default for Compact {
    fn default() -> Self {
        Self {
            alpha_secondary: 0.35,
            hide_connectors: false,
        }
    }
}

/// Per-frame render configuration, supplied by the embedding application.
///
/// Read-only during a frame. Out-of-range values are clamped when the policy
/// is sanitized, never treated as errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPolicy {
    pub detail_level: DetailLevel,
    pub focus: Focus,
    /// Leader-line budget per frame (eye-width labels).
    pub max_leaders: usize,
    /// Angle overlays with a smaller magnitude than this are not drawn.
    pub min_angle_deg: f32,
    pub compact: Compact,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::default(),
            focus: Focus::default(),
            max_leaders: 2,
            min_angle_deg: 2.0,
            compact: Compact::default(),
        }
    }
}

impl RenderPolicy {
    /// Clamps all numeric settings into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.min_angle_deg = if self.min_angle_deg.is_finite() {
            self.min_angle_deg.max(0.0)
        } else {
            Self::default().min_angle_deg
        };
        self.compact.alpha_secondary = if self.compact.alpha_secondary.is_finite() {
            self.compact.alpha_secondary.clamp(0.0, 1.0)
        } else {
            Compact::default().alpha_secondary
        };
        self
    }

    /// Returns the opacity factor for `category`, or [`None`] when the
    /// category is not drawn under the current focus.
    pub fn category_alpha(&self, category: Category) -> Option<f32> {
        let secondary = self.compact.alpha_secondary;
        match (self.focus, category) {
            (Focus::Global, _) => Some(1.0),
            (Focus::Face, Category::Face) => Some(1.0),
            (Focus::Face, _) => Some(secondary),
            (Focus::Eyes, Category::Eyes) => Some(1.0),
            (Focus::Eyes, Category::Face) => Some(secondary),
            (Focus::Eyes, Category::Nose) => None,
            (Focus::Nose, Category::Nose) => Some(1.0),
            (Focus::Nose, Category::Face) => Some(secondary),
            (Focus::Nose, Category::Eyes) => None,
        }
    }

    /// Whether per-eye rails are drawn at all.
    pub fn eye_rails_enabled(&self) -> bool {
        self.detail_level != DetailLevel::Minimal
    }

    /// Whether smoothed contour strokes are drawn.
    pub fn contours_enabled(&self) -> bool {
        self.detail_level == DetailLevel::Full
    }
}
