use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::error::{JobFailure, Result, VhsError, VideoError};
use crate::pipeline::FramePipeline;
use crate::settings::VhsSettings;
use crate::video::job::{
    CancelFlag, JobOutcome, JobState, JobStateMachine, JobSummary, JobWorkspace, RunStatus,
};
use crate::video::progress::{PhaseProgress, ProgressSink, ProgressTracker};
use crate::video::types::{Frame, SourceInfo};

/// Share of overall progress given to extraction and processing
const PROCESSING_SHARE: f64 = 50.0;

/// Total capture attempts per frame
const SEEK_ATTEMPTS: u32 = 2;

/// Decoded frames from a clip, addressed by timestamp
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn probe(&mut self) -> Result<SourceInfo>;

    /// Decode the frame shown at `timestamp` seconds.
    ///
    /// Fails with [`VideoError::EndOfStream`] when the clip has no frame there.
    async fn capture(&mut self, timestamp: f64) -> Result<Frame>;
}

/// Collects processed frames and encodes them into the output file
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    /// Called once before the first frame with the job's scratch directory
    async fn begin(&mut self, workspace: &Path, info: &SourceInfo) -> Result<()>;

    async fn push(&mut self, index: usize, frame: Frame) -> Result<()>;

    /// Encode the pushed frames at `fps` into `output`
    async fn finish(
        &mut self,
        fps: f64,
        output: &Path,
        progress: &PhaseProgress<'_>,
        cancel: &CancelFlag,
    ) -> Result<RunStatus>;
}

/// Frame-by-frame strategy: seek, process, collect, encode
pub struct FrameLoopJob<S, K> {
    source: S,
    sink: K,
    settings: VhsSettings,
    seed: Option<u64>,
    seek_timeout: Duration,
    temp_root: Option<PathBuf>,
    cancel: CancelFlag,
}

impl<S: FrameSource, K: FrameSink> FrameLoopJob<S, K> {
    pub fn new(source: S, sink: K, settings: &VhsSettings) -> Self {
        Self {
            source,
            sink,
            settings: settings.clamped(),
            seed: None,
            seek_timeout: Duration::from_secs(5),
            temp_root: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_seek_timeout(mut self, seek_timeout: Duration) -> Self {
        self.seek_timeout = seek_timeout;
        self
    }

    pub fn with_temp_root(mut self, temp_root: Option<PathBuf>) -> Self {
        self.temp_root = temp_root;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the job to completion, cancellation or failure.
    ///
    /// The workspace is removed on every path and nothing is written to
    /// `output` unless the encode finished.
    pub async fn run(
        mut self,
        output: &Path,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<JobOutcome, JobFailure> {
        let mut machine = JobStateMachine::new();
        let tracker = ProgressTracker::new(progress);

        let workspace = match JobWorkspace::create(self.temp_root.as_deref()) {
            Ok(workspace) => workspace,
            Err(e) => {
                let _ = machine.transition(JobState::Failed);
                return Err(JobFailure::new(e));
            }
        };

        let result = self.execute(&mut machine, &workspace, output, &tracker).await;
        workspace.close();

        match result {
            Ok(JobOutcome::Cancelled) => {
                let _ = machine.transition(JobState::Cancelled);
                info!("Frame-loop job cancelled at {:.0}%", tracker.percent());
                Ok(JobOutcome::Cancelled)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let _ = machine.transition(JobState::Failed);
                let failure = JobFailure::new(e);
                error!("Frame-loop job failed: {}", failure);
                Err(failure)
            }
        }
    }

    async fn execute(
        &mut self,
        machine: &mut JobStateMachine,
        workspace: &JobWorkspace,
        output: &Path,
        tracker: &ProgressTracker<'_>,
    ) -> Result<JobOutcome> {
        let started = Instant::now();

        machine.transition(JobState::Extracting)?;
        tracker.report(0.0, "Probing source");
        let info = self.source.probe().await?;

        let fps = self.settings.target_fps;
        let total = info.frame_count(fps);
        info!(
            "Source: {}x{} {:.2}s, {} frames at {} fps",
            info.width, info.height, info.duration, total, fps
        );

        if total == 0 {
            machine.transition(JobState::Done)?;
            tracker.report(100.0, "No frames to process");
            return Ok(JobOutcome::Done(JobSummary {
                output: None,
                frames_processed: 0,
                elapsed: started.elapsed(),
            }));
        }

        if self.cancel.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }

        self.sink.begin(workspace.path(), &info).await?;
        machine.transition(JobState::Processing)?;

        let mut pipeline = match self.seed {
            Some(seed) => FramePipeline::seeded(&self.settings, seed),
            None => FramePipeline::new(&self.settings),
        };

        for index in 0..total {
            if self.cancel.is_cancelled() {
                return Ok(JobOutcome::Cancelled);
            }

            let timestamp = info.timestamp_for(index, fps);
            let frame = match self.capture_with_retry(timestamp).await {
                Ok(frame) => frame,
                Err(VhsError::Video(VideoError::EndOfStream { .. })) if index > 0 => {
                    warn!(
                        "Source ended at {:.3}s, keeping {} of {} frames",
                        timestamp, index, total
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let processed = pipeline.process_frame(frame)?;
            self.sink.push(index, processed).await?;

            let done = index + 1;
            tracker.report(
                done as f64 / total as f64 * PROCESSING_SHARE,
                &format!("Processed frame {}/{}", done, total),
            );
        }

        if self.cancel.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }

        machine.transition(JobState::Encoding)?;
        let staged = workspace.staged_output(output);
        let phase = tracker.phase(PROCESSING_SHARE, 100.0);
        if self.sink.finish(fps, &staged, &phase, &self.cancel).await? == RunStatus::Cancelled {
            return Ok(JobOutcome::Cancelled);
        }

        let output = workspace.commit(&staged, output)?;
        machine.transition(JobState::Done)?;
        tracker.report(100.0, "Done");

        let summary = JobSummary {
            output: Some(output),
            frames_processed: pipeline.frames_processed(),
            elapsed: started.elapsed(),
        };
        info!(
            "Frame-loop job finished: {} frames in {:.1}s",
            summary.frames_processed,
            summary.elapsed.as_secs_f64()
        );
        Ok(JobOutcome::Done(summary))
    }

    async fn capture_with_retry(&mut self, timestamp: f64) -> Result<Frame> {
        for attempt in 1..=SEEK_ATTEMPTS {
            match timeout(self.seek_timeout, self.source.capture(timestamp)).await {
                Ok(Err(e)) if e.is_recoverable() && attempt < SEEK_ATTEMPTS => warn!(
                    "Capture at {:.3}s failed (attempt {}/{}): {}",
                    timestamp, attempt, SEEK_ATTEMPTS, e
                ),
                Ok(frame) => return frame,
                Err(_) => warn!(
                    "Seek to {:.3}s timed out (attempt {}/{})",
                    timestamp, attempt, SEEK_ATTEMPTS
                ),
            }
        }

        Err(VideoError::SeekTimeout {
            timestamp,
            timeout_ms: self.seek_timeout.as_millis() as u64,
        }
        .into())
    }
}
