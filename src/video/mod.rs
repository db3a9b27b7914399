//! # Video Orchestrator
//!
//! Drives a clip through one of two strategies and owns everything around
//! the pixels: the job state machine, progress, cancellation and the
//! per-job scratch directory.
//!
//! - [`FrameLoopJob`] seeks every frame through a [`FrameSource`], runs it
//!   through the [`FramePipeline`](crate::pipeline::FramePipeline) and hands
//!   it to a [`FrameSink`] for encoding.
//! - [`BatchJob`] compiles the settings to a filter graph and submits the
//!   whole clip to a [`VideoTool`].
//!
//! The ffmpeg-backed collaborators live in [`ffmpeg`].

pub mod batch;
pub mod ffmpeg;
pub mod frame_loop;
pub mod job;
pub mod progress;
pub mod types;

pub use batch::{BatchJob, ToolRequest, VideoTool};
pub use ffmpeg::{FfmpegFrameSource, FfmpegTool, PngSequenceSink};
pub use frame_loop::{FrameLoopJob, FrameSink, FrameSource};
pub use job::{
    CancelFlag, JobOutcome, JobState, JobStateMachine, JobSummary, JobWorkspace, RunStatus,
};
pub use progress::{LogProgress, PhaseProgress, ProgressSink, ProgressTracker};
pub use types::{Frame, SourceInfo};
