//! # VHS Pipeline
//!
//! Make clean digital video look like it was played off a worn VHS tape.
//!
//! A fixed set of range-bounded settings drives two interchangeable
//! strategies: an in-process frame pipeline that runs every decoded frame
//! through the pixel effects, and a filter-graph compiler that expresses
//! the same look as an ffmpeg filter chain for whole-clip processing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vhs_pipeline::{
//!     config::{Config, Strategy},
//!     engine::ProcessRequest,
//!     video::LogProgress,
//!     VhsEngine,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = VhsEngine::new(Config::default())?;
//! let settings = engine.resolve_settings(Some("worn"), None)?;
//!
//! let request = ProcessRequest {
//!     input: "home_movie.mp4".into(),
//!     output: "home_movie_vhs.mp4".into(),
//!     settings,
//!     strategy: Strategy::FrameLoop,
//!     seed: None,
//! };
//! engine.process(&request, &LogProgress).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`settings`] - Parameters, presets and the shared effect mapping
//! - [`effects`] - Pure per-frame pixel transforms
//! - [`pipeline`] - Ordered per-frame processing with ghosting state
//! - [`filtergraph`] - Settings to ffmpeg filter chain compiler
//! - [`video`] - Job orchestration, progress, cancellation and ffmpeg I/O
//! - [`config`] - Configuration management
//!
//! ## Processing a single frame
//!
//! ```rust
//! use vhs_pipeline::{FramePipeline, Preset, video::Frame};
//!
//! let mut pipeline = FramePipeline::seeded(&Preset::Authentic.settings(), 7);
//! let frame = Frame::new_filled(64, 48, [90, 120, 200, 255]);
//! let degraded = pipeline.process_frame(frame).unwrap();
//! assert_eq!(degraded.dimensions(), (64, 48));
//! ```

pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod filtergraph;
pub mod pipeline;
pub mod settings;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    engine::VhsEngine,
    error::{Result, VhsError},
    filtergraph::compile,
    pipeline::FramePipeline,
    settings::{Preset, VhsSettings},
};
