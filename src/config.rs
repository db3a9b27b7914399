use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::settings::Preset;

/// Main configuration for the VHS pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output encoding parameters
    pub encode: EncodeConfig,

    /// Job orchestration settings
    pub job: JobConfig,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Pixel processing settings
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.encode.validate()?;
        self.job.validate()?;
        self.tools.validate()?;
        self.processing.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Output encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Video codec passed to `-c:v`
    pub codec: String,

    /// Encoder speed preset
    pub preset: String,

    /// Constant rate factor (0-51, lower is better quality)
    pub crf: u8,

    pub pixel_format: String,

    pub audio_codec: String,

    pub audio_bitrate: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

impl EncodeConfig {
    /// Encoder arguments placed between the inputs and the output path
    pub fn output_args(&self) -> Vec<String> {
        let crf = self.crf.to_string();
        [
            "-c:v",
            self.codec.as_str(),
            "-preset",
            self.preset.as_str(),
            "-crf",
            crf.as_str(),
            "-pix_fmt",
            self.pixel_format.as_str(),
            "-c:a",
            self.audio_codec.as_str(),
            "-b:a",
            self.audio_bitrate.as_str(),
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.crf > 51 {
            return Err(invalid("encode.crf", self.crf).into());
        }

        for (key, value) in [
            ("encode.codec", &self.codec),
            ("encode.preset", &self.preset),
            ("encode.pixel_format", &self.pixel_format),
            ("encode.audio_codec", &self.audio_codec),
            ("encode.audio_bitrate", &self.audio_bitrate),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(key, "<empty>").into());
            }
        }

        Ok(())
    }
}

/// Which way a clip gets degraded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Extract, process and re-encode every frame in-process
    #[default]
    FrameLoop,
    /// Compile the settings to an ffmpeg filter chain and run it once
    FilterGraph,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FrameLoop => f.write_str("frame-loop"),
            Strategy::FilterGraph => f.write_str("filter-graph"),
        }
    }
}

/// Job orchestration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub strategy: Strategy,

    /// Preset used when none is given on the command line
    pub default_preset: String,

    /// Parent directory for per-job workspaces; system temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,

    /// Upper bound on a single frame grab
    pub seek_timeout_ms: u64,

    /// Inputs larger than this are rejected before any work starts
    pub max_input_bytes: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            default_preset: Preset::default().name().to_string(),
            temp_root: None,
            seek_timeout_ms: 5_000,
            max_input_bytes: 500 * 1024 * 1024,
        }
    }
}

impl JobConfig {
    fn validate(&self) -> Result<()> {
        self.default_preset.parse::<Preset>()?;

        if self.seek_timeout_ms == 0 {
            return Err(invalid("job.seek_timeout_ms", self.seek_timeout_ms).into());
        }

        if self.max_input_bytes == 0 {
            return Err(invalid("job.max_input_bytes", self.max_input_bytes).into());
        }

        Ok(())
    }
}

/// Locations of the external video tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg.as_os_str().is_empty() {
            return Err(invalid("tools.ffmpeg", "<empty>").into());
        }
        if self.ffprobe.as_os_str().is_empty() {
            return Err(invalid("tools.ffprobe", "<empty>").into());
        }
        Ok(())
    }
}

/// Pixel processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads for row-parallel effects
    pub threads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(invalid("processing.threads", self.threads).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SettingsError, VhsError};
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encode.crf, 23);
        assert_eq!(config.job.default_preset, "authentic");
        assert_eq!(config.job.strategy, Strategy::FrameLoop);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("vhs.toml");

        let mut original = Config::default();
        original.job.strategy = Strategy::FilterGraph;
        original.job.temp_root = Some(dir.path().to_path_buf());
        original.encode.crf = 18;

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[job]\nstrategy = \"filter-graph\"\nseek_timeout_ms = 250\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.job.strategy, Strategy::FilterGraph);
        assert_eq!(config.job.seek_timeout_ms, 250);
        assert_eq!(config.encode, EncodeConfig::default());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempdir().unwrap();
        let err = Config::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, VhsError::Config(ConfigError::FileNotFound { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[job\nstrategy = 3").unwrap();
        let err = Config::from_file(&bad).unwrap_err();
        assert!(matches!(err, VhsError::Config(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.encode.crf = 60;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.processing.threads = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.job.default_preset = "pristine".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            VhsError::Settings(SettingsError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_output_args() {
        let args = EncodeConfig::default().output_args();
        assert_eq!(args[..2], ["-c:v", "libx264"]);
        assert!(args.windows(2).any(|w| w == ["-crf", "23"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    }
}
