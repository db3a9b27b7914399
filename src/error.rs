use thiserror::Error;

/// Main error type for the VHS pipeline
#[derive(Error, Debug)]
pub enum VhsError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Filter graph error: {0}")]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings and preset errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("Failed to parse settings from {source_name}: {reason}")]
    ParseFailed { source_name: String, reason: String },
}

/// Errors raised while reading, processing or encoding video
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot read source video {path}: {reason}")]
    SourceRead { path: String, reason: String },

    #[error("Seek to {timestamp:.3}s did not settle within {timeout_ms}ms")]
    SeekTimeout { timestamp: f64, timeout_ms: u64 },

    #[error("Source has no frame at {timestamp:.3}s")]
    EndOfStream { timestamp: f64 },

    #[error("Encoding failed: {reason}")]
    Encode { reason: String },

    #[error("Frame processing failed in {stage}: {reason}")]
    FrameProcessing { stage: &'static str, reason: String },
}

/// Filter-graph compilation errors
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Setting {setting} = {value} cannot be expressed as a filter argument")]
    UnsupportedSetting { setting: &'static str, value: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Job state machine errors
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Convenience type alias for Results using VhsError
pub type Result<T> = std::result::Result<T, VhsError>;

/// A fatal job error tagged with the stage that produced it
#[derive(Error, Debug)]
#[error("{stage} stage failed: {error}")]
pub struct JobFailure {
    pub stage: String,
    #[source]
    pub error: VhsError,
}

impl JobFailure {
    pub fn new(error: VhsError) -> Self {
        Self {
            stage: error.stage().to_string(),
            error,
        }
    }

    pub fn user_message(&self) -> String {
        format!("{} (stage: {})", self.error.user_message(), self.stage)
    }
}

impl VhsError {
    /// Name of the pipeline stage this error belongs to
    pub fn stage(&self) -> &str {
        match self {
            Self::Settings(_) => "settings",
            Self::Video(VideoError::SourceRead { .. } | VideoError::EndOfStream { .. }) => "extract",
            Self::Video(VideoError::SeekTimeout { .. }) => "seek",
            Self::Video(VideoError::Encode { .. }) => "encode",
            Self::Video(VideoError::FrameProcessing { stage, .. }) => stage,
            Self::Filter(_) => "compile",
            Self::Config(_) => "config",
            Self::Job(_) => "job",
            Self::Io(_) => "io",
        }
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Video(VideoError::SeekTimeout { .. }) | Self::Io(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Settings(SettingsError::UnknownPreset { name }) => {
                format!(
                    "Preset '{}' not found. Available presets: clean, authentic, worn, degraded",
                    name
                )
            }
            Self::Video(VideoError::SourceRead { path, .. }) => {
                format!(
                    "Could not read video file '{}'. Please check the file exists and is a supported format.",
                    path
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
