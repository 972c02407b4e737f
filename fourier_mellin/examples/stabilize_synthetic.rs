//! Example: Stabilize a synthetic drifting sequence
//!
//! This example demonstrates continuous registration:
//! 1. Generate a frame and a sequence that drifts, rotates and zooms slowly
//! 2. Feed the frames in order to `FourierMellinContinuous`
//! 3. Print the measured per-frame step against the true one, and the
//!    accumulated motion that stabilization removes
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=fourier_mellin=debug cargo run --release --features testing --example stabilize_synthetic
//! ```

use std::time::Instant;

use fourier_mellin::testing::synthetic;
use fourier_mellin::{
    ContinuousFrame, FourierMellin, FourierMellinContinuous, RegistrationConfig, Transform,
};
use tracing_subscriber::EnvFilter;

const SIZE: usize = 256;
const FRAMES: usize = 12;

fn main() {
    init_tracing();

    let config = RegistrationConfig {
        pull_to_center: 0.05,
        edge_crop: 0.05,
        ..Default::default()
    };
    let stateless = FourierMellin::with_config(SIZE, SIZE, config).expect("Valid frame size");
    let mut engine = FourierMellinContinuous::from_setup(stateless.setup().clone());

    let first = synthetic::blob_image(SIZE, SIZE, 3, 42);
    let true_step = Transform::new(1.5, -0.75, 0.8, 1.005, 1.0);

    println!("Stabilizing {FRAMES} frames of {SIZE}x{SIZE}");
    println!("True step: {true_step}\n");

    let mut motion = Transform::identity();
    let start = Instant::now();
    for index in 0..FRAMES {
        let frame = stateless
            .get_transformed(&first, &motion)
            .expect("Frame has the engine size");
        motion += true_step;

        match engine.register(&frame).expect("Frame has the engine size") {
            ContinuousFrame::ReferenceInitialized => {
                println!("Frame {index:2}: reference");
            }
            ContinuousFrame::Registered {
                step, accumulated, ..
            } => {
                println!("Frame {index:2}: step {step}");
                println!("          accumulated {accumulated}");
            }
        }
    }

    let elapsed = start.elapsed();
    println!(
        "\n{FRAMES} frames in {:.1} ms ({:.1} ms/frame)",
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / FRAMES as f64
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
