use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, Strategy};
use crate::error::{JobFailure, Result};
use crate::settings::{merge_overrides, resolve_preset, SettingsOverride, VhsSettings};
use crate::video::{
    BatchJob, CancelFlag, FfmpegFrameSource, FfmpegTool, FrameLoopJob, JobOutcome,
    PngSequenceSink, ProgressSink,
};

/// One clip to degrade
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub settings: VhsSettings,
    pub strategy: Strategy,
    /// Fixed seed for noise and tracking glitches
    pub seed: Option<u64>,
}

/// Entry point tying configuration, settings and the two job strategies together
///
/// The engine builds fresh ffmpeg collaborators for every job from its
/// configuration, so nothing is shared between runs except the cancel flag.
pub struct VhsEngine {
    config: Config,
    cancel: CancelFlag,
}

impl VhsEngine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelFlag::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle that stops the running job at its next checkpoint
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Preset (or the configured default) with an optional JSON override file on top
    pub fn resolve_settings(
        &self,
        preset: Option<&str>,
        overrides: Option<&Path>,
    ) -> Result<VhsSettings> {
        let preset = preset.unwrap_or(&self.config.job.default_preset);
        let base = resolve_preset(preset)?;
        debug!("Base preset: {}", preset);

        match overrides {
            Some(path) => {
                let partial = SettingsOverride::from_json_file(path)?;
                debug!("Applying overrides from {:?}", path);
                Ok(merge_overrides(&base, &partial))
            }
            None => Ok(base),
        }
    }

    pub async fn process(
        &self,
        request: &ProcessRequest,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<JobOutcome, JobFailure> {
        info!("📼 Starting VHS job");
        info!("   Input: {:?}", request.input);
        info!("   Output: {:?}", request.output);
        info!("   Strategy: {}", request.strategy);

        let job = &self.config.job;
        let tools = self.config.tools.clone();

        let outcome = match request.strategy {
            Strategy::FrameLoop => {
                let source =
                    FfmpegFrameSource::new(tools.clone(), &request.input, job.max_input_bytes);
                let sink =
                    PngSequenceSink::new(tools, self.config.encode.clone(), &request.input);

                FrameLoopJob::new(source, sink, &request.settings)
                    .with_seed(request.seed)
                    .with_seek_timeout(Duration::from_millis(job.seek_timeout_ms))
                    .with_temp_root(job.temp_root.clone())
                    .with_cancel_flag(self.cancel.clone())
                    .run(&request.output, progress)
                    .await
            }
            Strategy::FilterGraph => {
                let tool = FfmpegTool::new(tools, job.max_input_bytes);

                BatchJob::new(tool, &request.input, &request.settings)
                    .with_encode(self.config.encode.clone())
                    .with_temp_root(job.temp_root.clone())
                    .with_cancel_flag(self.cancel.clone())
                    .run(&request.output, progress)
                    .await
            }
        }?;

        match &outcome {
            JobOutcome::Done(summary) => info!(
                "🎉 Job complete: {} frames in {:.1}s",
                summary.frames_processed,
                summary.elapsed.as_secs_f64()
            ),
            JobOutcome::Cancelled => info!("Job cancelled, no output written"),
        }
        Ok(outcome)
    }
}
