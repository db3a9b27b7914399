use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{JobError, Result};

/// Lifecycle of one processing job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Extracting,
    Processing,
    Encoding,
    Done,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn name(self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Extracting => "extracting",
            JobState::Processing => "processing",
            JobState::Encoding => "encoding",
            JobState::Done => "done",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Cancelled)
    }

    /// Forward edges only. `Extracting -> Done` covers clips with no frames.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        match (self, next) {
            (Idle, Extracting)
            | (Extracting, Processing)
            | (Extracting, Done)
            | (Processing, Encoding)
            | (Encoding, Done) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated job state holder
#[derive(Debug)]
pub struct JobStateMachine {
    state: JobState,
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStateMachine {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn transition(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        debug!("Job state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Cooperative cancellation shared between a job and whoever may stop it
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of an external step that can be interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    /// Final output location; `None` when the clip had no frames
    pub output: Option<PathBuf>,
    pub frames_processed: u64,
    pub elapsed: Duration,
}

/// How a job ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Done(JobSummary),
    Cancelled,
}

impl JobOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled)
    }

    pub fn summary(&self) -> Option<&JobSummary> {
        match self {
            JobOutcome::Done(summary) => Some(summary),
            JobOutcome::Cancelled => None,
        }
    }
}

/// Per-job scratch directory, deleted when the job ends however it ends
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    pub fn create(temp_root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vhs-job-");
        let dir = match temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        debug!("Created job workspace {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the encoder writes before the result is moved into place.
    /// Keeps the destination's extension so the muxer is chosen the same way.
    pub fn staged_output(&self, destination: &Path) -> PathBuf {
        let extension = destination
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("mp4");
        self.dir.path().join(format!("output.{}", extension))
    }

    /// Move a finished staged file to its destination
    pub fn commit(&self, staged: &Path, destination: &Path) -> Result<PathBuf> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::rename(staged, destination).is_err() {
            // rename fails across filesystems
            std::fs::copy(staged, destination).map_err(|e| {
                let _ = std::fs::remove_file(destination);
                e
            })?;
            std::fs::remove_file(staged)?;
        }

        Ok(destination.to_path_buf())
    }

    /// Remove the directory now, logging rather than failing
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove job workspace {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VhsError;
    use tempfile::tempdir;

    #[test]
    fn test_happy_path_transitions() {
        let mut machine = JobStateMachine::new();
        for next in [
            JobState::Extracting,
            JobState::Processing,
            JobState::Encoding,
            JobState::Done,
        ] {
            machine.transition(next).unwrap();
        }
        assert_eq!(machine.state(), JobState::Done);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut machine = JobStateMachine::new();
        let err = machine.transition(JobState::Encoding).unwrap_err();
        assert!(matches!(err, VhsError::Job(JobError::InvalidTransition { .. })));
        assert_eq!(machine.state(), JobState::Idle);

        machine.transition(JobState::Extracting).unwrap();
        machine.transition(JobState::Cancelled).unwrap();
        assert!(machine.transition(JobState::Failed).is_err());
        assert!(machine.transition(JobState::Done).is_err());
    }

    #[test]
    fn test_empty_clip_edge() {
        assert!(JobState::Extracting.can_transition_to(JobState::Done));
        assert!(!JobState::Processing.can_transition_to(JobState::Done));
        assert!(!JobState::Done.can_transition_to(JobState::Cancelled));
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_workspace_commit_and_cleanup() {
        let root = tempdir().unwrap();
        let dest_dir = tempdir().unwrap();
        let destination = dest_dir.path().join("nested").join("out.mkv");

        let workspace = JobWorkspace::create(Some(root.path())).unwrap();
        let staged = workspace.staged_output(&destination);
        assert!(staged.ends_with("output.mkv"));
        std::fs::write(&staged, b"encoded").unwrap();

        let committed = workspace.commit(&staged, &destination).unwrap();
        assert_eq!(std::fs::read(&committed).unwrap(), b"encoded");
        assert!(!staged.exists());

        workspace.close();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
