//! Demo driver: runs a synthetic face through the measurement pipeline.
//!
//! There is no camera or estimator here (those live in the embedding
//! application); instead a fake face drifts toward the camera over a few
//! dozen frames, exercising calibration, smoothing, and overlay layout.

use std::time::{Duration, Instant};

use anyhow::Result;

use facemm::landmark::{Idx, Landmarks, NoseTopology, NUM_LANDMARKS};
use facemm::overlay::{Overlay, RecordingCanvas, RenderPolicy};
use facemm::project::Resolution;
use facemm::session::{Session, SessionConfig};
use facemm::timer::Timer;

/// Builds one frame of synthetic landmarks for a face whose iris spans
/// `iris_px` pixels on a 1280×720 canvas.
fn synthetic_frame(iris_px: f32) -> Landmarks {
    let mut positions = vec![[0.5, 0.5, 0.0]; NUM_LANDMARKS];
    let r = iris_px / 2.0 / 1280.0;

    for (cx, ring_base) in [(0.42, Idx::LeftIrisCenter as usize), (0.58, Idx::RightIrisCenter as usize)] {
        let cy = 0.4;
        positions[ring_base] = [cx, cy, 0.0];
        positions[ring_base + 1] = [cx + r, cy, 0.0];
        positions[ring_base + 2] = [cx, cy - r, 0.0];
        positions[ring_base + 3] = [cx - r, cy, 0.0];
        positions[ring_base + 4] = [cx, cy + r, 0.0];
    }

    positions[Idx::FaceLeftEdge as usize] = [0.25, 0.5, 0.0];
    positions[Idx::FaceRightEdge as usize] = [0.75, 0.5, 0.0];
    positions[Idx::LeftEyeOuterCorner as usize] = [0.38, 0.4, 0.0];
    positions[Idx::LeftEyeInnerCorner as usize] = [0.46, 0.4, 0.0];
    positions[Idx::RightEyeInnerCorner as usize] = [0.54, 0.4, 0.0];
    positions[Idx::RightEyeOuterCorner as usize] = [0.62, 0.4, 0.0];

    for (row_i, row) in NoseTopology::get().rows().iter().enumerate() {
        for (col_i, idx) in row.iter().enumerate() {
            if let Some(idx) = idx {
                let x = 0.47 + col_i as f32 * 0.01;
                let y = 0.42 + row_i as f32 * 0.015;
                positions[*idx as usize] = [x, y, 0.0];
            }
        }
    }

    Landmarks::from_positions(positions)
}

fn main() -> Result<()> {
    facemm::init_logger!();

    let res = Resolution::new(1280, 720);
    let mut session = Session::new(SessionConfig::default());
    let t_process = Timer::new("process");

    let start = Instant::now();
    let mut last = None;
    for frame_no in 0..60 {
        // The face drifts toward the camera: the iris grows from 18 to 24 px.
        let iris_px = 18.0 + frame_no as f32 * 0.1;
        let landmarks = synthetic_frame(iris_px);
        let now = start + Duration::from_millis(frame_no * 33);

        let frame = t_process.time(|| session.process(Some(&landmarks), res, now));
        if let (Some(ipd), Some(dist)) = (&frame.ipd, frame.distance_cm) {
            log::info!(
                "frame {frame_no}: PD {:.1}/{:.1} mm at {dist:.0} cm",
                ipd.near_mm,
                ipd.far_mm,
            );
        }
        last = Some(frame);
    }
    log::info!("{t_process}");

    // Lay the final frame out through the overlay engine and dump the
    // resulting draw list.
    let frame = last.expect("at least one frame was processed");
    let mut overlay = Overlay::new(RenderPolicy::default());
    let mut canvas = RecordingCanvas::new();
    frame.draw(&mut overlay, &mut canvas);

    println!("final frame overlay ({} commands):", canvas.commands().len());
    for cmd in canvas.commands() {
        println!("  {cmd:?}");
    }
    if let Some(nose) = &frame.nose {
        println!(
            "nose: bridge {:.1} mm, pads {:.1} mm, height {:.1} mm",
            nose.bridge_width_mm, nose.pad_span_mm, nose.pad_height_mm
        );
    }
    Ok(())
}
