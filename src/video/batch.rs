use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info};

use crate::config::EncodeConfig;
use crate::error::{JobFailure, Result};
use crate::filtergraph;
use crate::settings::VhsSettings;
use crate::video::job::{
    CancelFlag, JobOutcome, JobState, JobStateMachine, JobSummary, JobWorkspace, RunStatus,
};
use crate::video::progress::{PhaseProgress, ProgressSink, ProgressTracker};
use crate::video::types::SourceInfo;

/// Progress reached once the graph is compiled; the tool run fills the rest
const COMPILED_PERCENT: f64 = 5.0;

/// One whole-clip invocation of the external tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Serialized `-vf` chain
    pub filter_graph: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Source duration in seconds, used to turn tool timestamps into progress
    pub duration: Option<f64>,
    pub encode: EncodeConfig,
}

/// External video tool that applies a filter graph to a whole clip
#[allow(async_fn_in_trait)]
pub trait VideoTool {
    async fn probe(&mut self, input: &Path) -> Result<SourceInfo>;

    /// Run the request to completion, or stop early once `cancel` is set
    async fn run(
        &mut self,
        request: &ToolRequest,
        progress: &PhaseProgress<'_>,
        cancel: &CancelFlag,
    ) -> Result<RunStatus>;
}

/// Batch strategy: compile the settings once and hand the clip to the tool
pub struct BatchJob<T> {
    tool: T,
    input: PathBuf,
    settings: VhsSettings,
    encode: EncodeConfig,
    temp_root: Option<PathBuf>,
    cancel: CancelFlag,
}

impl<T: VideoTool> BatchJob<T> {
    pub fn new(tool: T, input: impl Into<PathBuf>, settings: &VhsSettings) -> Self {
        Self {
            tool,
            input: input.into(),
            settings: settings.clamped(),
            encode: EncodeConfig::default(),
            temp_root: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_encode(mut self, encode: EncodeConfig) -> Self {
        self.encode = encode;
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
                info!("Filter-graph job cancelled at {:.0}%", tracker.percent());
                Ok(JobOutcome::Cancelled)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let _ = machine.transition(JobState::Failed);
                let failure = JobFailure::new(e);
                error!("Filter-graph job failed: {}", failure);
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
        let info = self.tool.probe(&self.input).await?;

        machine.transition(JobState::Processing)?;
        let graph = filtergraph::compile(&self.settings)?;
        info!("Filter graph ({} filters): {}", graph.len(), graph);
        tracker.report(COMPILED_PERCENT, "Filter graph compiled");

        if self.cancel.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }

        machine.transition(JobState::Encoding)?;
        let staged = workspace.staged_output(output);
        let request = ToolRequest {
            filter_graph: graph.to_filter_string(),
            input: self.input.clone(),
            output: staged.clone(),
            duration: Some(info.duration).filter(|d| d.is_finite() && *d > 0.0),
            encode: self.encode.clone(),
        };

        let phase = tracker.phase(COMPILED_PERCENT, 100.0);
        let status = self.tool.run(&request, &phase, &self.cancel).await?;
        if status == RunStatus::Cancelled || self.cancel.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }

        let output = workspace.commit(&staged, output)?;
        machine.transition(JobState::Done)?;
        tracker.report(100.0, "Done");

        let frames = info
            .fps
            .map(|fps| info.frame_count(fps) as u64)
            .unwrap_or_default();
        let summary = JobSummary {
            output: Some(output),
            frames_processed: frames,
            elapsed: started.elapsed(),
        };
        info!(
            "Filter-graph job finished in {:.1}s",
            summary.elapsed.as_secs_f64()
        );
        Ok(JobOutcome::Done(summary))
    }
}
