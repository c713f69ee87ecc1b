//! Millimeter-scale facial measurements from face-mesh landmarks.
//!
//! Feed this crate the per-frame landmark output of a MediaPipe Face Mesh
//! style estimator (478 normalized points with iris refinement) and it
//! computes physically calibrated measurements: interpupillary distance,
//! face and eye widths, and a set of nose metrics used for eyeglass fitting.
//! Calibration uses the near-constant adult iris diameter as the
//! pixel-to-millimeter reference.
//!
//! The crate also lays the measurements out as an annotated overlay (rails,
//! brackets, angle arcs) with collision-free label placement, against an
//! abstract drawing surface.
//!
//! # Coordinates
//!
//! Landmarks come in normalized to the frame (0..1, y pointing down); all
//! internal geometry is in pixel space after projection. Angles follow
//! `atan2` conventions in that space.

use log::LevelFilter;

pub mod calib;
pub mod filter;
pub mod geom;
pub mod landmark;
pub mod measure;
pub mod overlay;
pub mod project;
pub mod session;
pub mod timer;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and this crate
/// will log at *trace* level. Otherwise, they will log at *debug* level.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
