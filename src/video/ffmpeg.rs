//! ffmpeg CLI implementations of the orchestrator collaborators.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{EncodeConfig, ToolsConfig};
use crate::error::{Result, VideoError};
use crate::video::batch::{ToolRequest, VideoTool};
use crate::video::frame_loop::{FrameSink, FrameSource};
use crate::video::job::{CancelFlag, RunStatus};
use crate::video::progress::PhaseProgress;
use crate::video::types::{Frame, SourceInfo};

/// How often a running encode checks the cancel flag
const CANCEL_POLL: Duration = Duration::from_millis(100);

const FRAME_PATTERN: &str = "frame_%06d.png";

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Reject inputs that are missing or larger than `max_bytes`
pub fn check_input(path: &Path, max_bytes: u64) -> Result<u64> {
    let size = std::fs::metadata(path)
        .map_err(|e| VideoError::SourceRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .len();

    if size > max_bytes {
        return Err(VideoError::SourceRead {
            path: path.display().to_string(),
            reason: format!("file is {} bytes, limit is {}", size, max_bytes),
        }
        .into());
    }
    Ok(size)
}

/// Read duration, dimensions and audio presence with ffprobe
pub async fn probe_source(ffprobe: &Path, input: &Path) -> Result<SourceInfo> {
    let source_error = |reason: String| VideoError::SourceRead {
        path: input.display().to_string(),
        reason,
    };

    let output = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| source_error(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(source_error(format!("ffprobe failed: {}", stderr.trim())).into());
    }

    parse_probe(&output.stdout).map_err(|reason| source_error(reason).into())
}

fn parse_probe(json: &[u8]) -> std::result::Result<SourceInfo, String> {
    let probe: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| format!("unreadable ffprobe output: {}", e))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream".to_string())?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // the container duration covers the longest stream, often the audio
    let duration = parse_seconds(video.duration.as_deref())
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|f| parse_seconds(f.duration.as_deref()))
        })
        .unwrap_or(0.0);

    Ok(SourceInfo {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps: parse_frame_rate(video.avg_frame_rate.as_deref())
            .or_else(|| parse_frame_rate(video.r_frame_rate.as_deref())),
        has_audio,
    })
}

/// `"30000/1001"` or `"25"` to frames per second; `0/0` is unknown
pub fn parse_frame_rate(rate: Option<&str>) -> Option<f64> {
    let rate = rate?;
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

/// Encoded position in seconds from one `-progress` line
fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // both are microseconds
        "out_time_us" | "out_time_ms" => value.parse::<i64>().ok().map(|us| us.max(0) as f64 / 1e6),
        _ => None,
    }
}

/// Run ffmpeg with `-progress pipe:1`, streaming progress and honoring cancellation.
///
/// `total_secs` is the expected output duration; without it only the start
/// and end of the phase are reported.
async fn run_with_progress(
    ffmpeg: &Path,
    args: &[String],
    total_secs: Option<f64>,
    progress: &PhaseProgress<'_>,
    cancel: &CancelFlag,
) -> Result<RunStatus> {
    debug!("Running {:?} {}", ffmpeg, args.join(" "));

    let mut child = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| VideoError::Encode {
            reason: format!("failed to start {}: {}", ffmpeg.display(), e),
        })?;

    let stdout = child.stdout.take().ok_or_else(|| VideoError::Encode {
        reason: "ffmpeg stdout was not captured".to_string(),
    })?;
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut text = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut text).await;
        }
        text
    });

    progress.report(0.0, "Encoding");
    let mut lines = BufReader::new(stdout).lines();
    let mut poll = tokio::time::interval(CANCEL_POLL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let (Some(position), Some(total)) = (parse_progress_line(&line), total_secs) {
                    let fraction = position / total;
                    progress.report(fraction, &format!("Encoding {:.0}%", fraction.min(1.0) * 100.0));
                }
            }
            _ = poll.tick() => {
                if cancel.is_cancelled() {
                    info!("Cancelling ffmpeg run");
                    let _ = child.kill().await;
                    return Ok(RunStatus::Cancelled);
                }
            }
        }
    }

    let status = child.wait().await?;
    let stderr = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(VideoError::Encode {
            reason: format!("ffmpeg exited with {}: {}", status, stderr.trim()),
        }
        .into());
    }

    progress.report(1.0, "Encoded");
    Ok(RunStatus::Completed)
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Frame grabs through one short ffmpeg process per timestamp
pub struct FfmpegFrameSource {
    tools: ToolsConfig,
    input: PathBuf,
    max_input_bytes: u64,
}

impl FfmpegFrameSource {
    pub fn new(tools: ToolsConfig, input: impl Into<PathBuf>, max_input_bytes: u64) -> Self {
        Self {
            tools,
            input: input.into(),
            max_input_bytes,
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    async fn probe(&mut self) -> Result<SourceInfo> {
        let size = check_input(&self.input, self.max_input_bytes)?;
        let info = probe_source(&self.tools.ffprobe, &self.input).await?;
        debug!("Probed {:?} ({} bytes): {:?}", self.input, size, info);
        Ok(info)
    }

    async fn capture(&mut self, timestamp: f64) -> Result<Frame> {
        // dropped on seek timeout, which kills the process
        let output = Command::new(&self.tools.ffmpeg)
            .args(["-v", "error", "-ss"])
            .arg(format!("{:.3}", timestamp))
            .arg("-i")
            .arg(&self.input)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VideoError::SourceRead {
                path: path_arg(&self.input),
                reason: format!("failed to run ffmpeg: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::SourceRead {
                path: path_arg(&self.input),
                reason: format!("frame grab at {:.3}s failed: {}", timestamp, stderr.trim()),
            }
            .into());
        }
        // ffmpeg exits cleanly with nothing to show past the last frame
        if output.stdout.is_empty() {
            return Err(VideoError::EndOfStream { timestamp }.into());
        }

        let png = output.stdout;
        let decoded = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&png, image::ImageFormat::Png)
                .map(|image| image.to_rgba8())
        })
        .await
        .map_err(|e| VideoError::SourceRead {
            path: path_arg(&self.input),
            reason: format!("frame decoder stopped: {}", e),
        })?;

        let buffer = decoded.map_err(|e| VideoError::SourceRead {
            path: path_arg(&self.input),
            reason: format!("undecodable frame at {:.3}s: {}", timestamp, e),
        })?;
        Ok(Frame::new(buffer))
    }
}

/// Writes frames as a numbered PNG sequence, then encodes it in one pass
pub struct PngSequenceSink {
    tools: ToolsConfig,
    encode: EncodeConfig,
    /// Audio is taken from here when the source has any
    input: PathBuf,
    frames_dir: Option<PathBuf>,
    has_audio: bool,
    frame_count: usize,
}

impl PngSequenceSink {
    pub fn new(tools: ToolsConfig, encode: EncodeConfig, input: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            encode,
            input: input.into(),
            frames_dir: None,
            has_audio: false,
            frame_count: 0,
        }
    }

    fn frames_dir(&self) -> Result<&Path> {
        self.frames_dir.as_deref().ok_or_else(|| {
            VideoError::Encode {
                reason: "frame sink used before begin".to_string(),
            }
            .into()
        })
    }

    fn encode_args(&self, frames_dir: &Path, fps: f64, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-framerate".into(),
            fps.to_string(),
            "-i".into(),
            path_arg(&frames_dir.join(FRAME_PATTERN)),
        ];

        if self.has_audio {
            args.extend([
                "-i".into(),
                path_arg(&self.input),
                "-map".into(),
                "0:v:0".into(),
                "-map".into(),
                "1:a:0?".into(),
                "-shortest".into(),
            ]);
        }

        args.extend(self.encode.output_args());
        args.extend([
            "-progress".into(),
            "pipe:1".into(),
            "-nostats".into(),
            path_arg(output),
        ]);
        args
    }
}

impl FrameSink for PngSequenceSink {
    async fn begin(&mut self, workspace: &Path, info: &SourceInfo) -> Result<()> {
        let frames_dir = workspace.join("frames");
        tokio::fs::create_dir_all(&frames_dir).await?;
        self.frames_dir = Some(frames_dir);
        self.has_audio = info.has_audio;
        self.frame_count = 0;
        Ok(())
    }

    async fn push(&mut self, index: usize, frame: Frame) -> Result<()> {
        let path = self.frames_dir()?.join(format!("frame_{:06}.png", index));
        tokio::task::spawn_blocking(move || frame.save_png(&path))
            .await
            .map_err(|e| VideoError::Encode {
                reason: format!("frame writer stopped at frame {}: {}", index, e),
            })?
            .map_err(|e| VideoError::Encode {
                reason: format!("failed to save frame {}: {}", index, e),
            })?;
        self.frame_count += 1;
        Ok(())
    }

    async fn finish(
        &mut self,
        fps: f64,
        output: &Path,
        progress: &PhaseProgress<'_>,
        cancel: &CancelFlag,
    ) -> Result<RunStatus> {
        let frames_dir = self.frames_dir()?.to_path_buf();
        info!("Encoding {} frames at {} fps", self.frame_count, fps);

        let args = self.encode_args(&frames_dir, fps, output);
        let total_secs = Some(self.frame_count as f64 / fps).filter(|t| *t > 0.0);
        run_with_progress(&self.tools.ffmpeg, &args, total_secs, progress, cancel).await
    }
}

/// Whole-clip filter runs through a single ffmpeg process
pub struct FfmpegTool {
    tools: ToolsConfig,
    max_input_bytes: u64,
}

impl FfmpegTool {
    pub fn new(tools: ToolsConfig, max_input_bytes: u64) -> Self {
        Self {
            tools,
            max_input_bytes,
        }
    }

    fn filter_args(request: &ToolRequest) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-i".into(),
            path_arg(&request.input),
            "-vf".into(),
            request.filter_graph.clone(),
        ];
        args.extend(request.encode.output_args());
        args.extend([
            "-progress".into(),
            "pipe:1".into(),
            "-nostats".into(),
            path_arg(&request.output),
        ]);
        args
    }
}

impl VideoTool for FfmpegTool {
    async fn probe(&mut self, input: &Path) -> Result<SourceInfo> {
        check_input(input, self.max_input_bytes)?;
        probe_source(&self.tools.ffprobe, input).await
    }

    async fn run(
        &mut self,
        request: &ToolRequest,
        progress: &PhaseProgress<'_>,
        cancel: &CancelFlag,
    ) -> Result<RunStatus> {
        let args = Self::filter_args(request);
        run_with_progress(&self.tools.ffmpeg, &args, request.duration, progress, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VhsError;
    use tempfile::tempdir;

    const PROBE_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1280, "height": 720,
             "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001", "duration": "9.5"},
            {"codec_type": "audio", "duration": "9.4"}
        ],
        "format": {"duration": "10.010000"}
    }"#;

    #[test]
    fn test_parse_probe() {
        let info = parse_probe(PROBE_JSON.as_bytes()).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
        assert_eq!(info.duration, 9.5);
        assert!((info.fps.unwrap() - 29.97).abs() < 0.01);
        assert!(info.has_audio);
    }

    #[test]
    fn test_longer_audio_does_not_extend_frame_range() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "avg_frame_rate": "30/1", "duration": "9.500000"},
                {"codec_type": "audio", "duration": "10.010000"}
            ],
            "format": {"duration": "10.010000"}
        }"#;
        let info = parse_probe(json.as_bytes()).unwrap();
        assert_eq!(info.duration, 9.5);

        let total = info.frame_count(30.0);
        assert_eq!(total, 285);
        assert!(info.timestamp_for(total - 1, 30.0) < 9.5);
    }

    #[test]
    fn test_format_duration_is_fallback() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 320, "height": 240}],
            "format": {"duration": "4.25"}
        }"#;
        let info = parse_probe(json.as_bytes()).unwrap();
        assert_eq!(info.duration, 4.25);
        assert!(!info.has_audio);
        assert_eq!(info.fps, None);
    }

    #[test]
    fn test_parse_probe_without_video() {
        let err = parse_probe(br#"{"streams": [{"codec_type": "audio"}]}"#).unwrap_err();
        assert_eq!(err, "no video stream");
        assert!(parse_probe(b"not json").is_err());
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate(Some("25/1")), Some(25.0));
        assert_eq!(parse_frame_rate(Some("24")), Some(24.0));
        assert_eq!(parse_frame_rate(Some("0/0")), None);
        assert_eq!(parse_frame_rate(Some("abc")), None);
        assert_eq!(parse_frame_rate(None), None);
    }

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(parse_progress_line("out_time_us=2500000"), Some(2.5));
        assert_eq!(parse_progress_line("out_time_ms=1000000\n"), Some(1.0));
        assert_eq!(parse_progress_line("out_time_us=N/A"), None);
        assert_eq!(parse_progress_line("progress=continue"), None);
    }

    #[test]
    fn test_input_size_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        assert_eq!(check_input(&path, 64).unwrap(), 64);
        let err = check_input(&path, 63).unwrap_err();
        assert!(matches!(err, VhsError::Video(VideoError::SourceRead { .. })));
        assert_eq!(err.stage(), "extract");
        assert!(check_input(&dir.path().join("missing.mp4"), 64).is_err());
    }

    #[test]
    fn test_filter_args() {
        let request = ToolRequest {
            filter_graph: "gblur=sigma=1,vignette=angle=0.3".to_string(),
            input: PathBuf::from("in.mp4"),
            output: PathBuf::from("out.mp4"),
            duration: Some(3.0),
            encode: EncodeConfig::default(),
        };
        let args = FfmpegTool::filter_args(&request);
        assert!(args.windows(2).any(|w| w == ["-vf", "gblur=sigma=1,vignette=angle=0.3"]));
        assert!(args.windows(2).any(|w| w == ["-progress", "pipe:1"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_sequence_args_map_audio_only_when_present() {
        let mut sink = PngSequenceSink::new(
            ToolsConfig::default(),
            EncodeConfig::default(),
            "source.mov",
        );
        let frames = Path::new("/work/frames");

        let args = sink.encode_args(frames, 30.0, Path::new("/work/output.mp4"));
        assert!(args.windows(2).any(|w| w == ["-framerate", "30"]));
        assert!(!args.iter().any(|a| a == "source.mov"));

        sink.has_audio = true;
        let args = sink.encode_args(frames, 24.0, Path::new("/work/output.mp4"));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a:0?"]));
        assert!(args.iter().any(|a| a == "source.mov"));
    }

    #[tokio::test]
    async fn test_sink_writes_png_frames() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new(ToolsConfig::default(), EncodeConfig::default(), "in.mp4");
        let info = SourceInfo {
            duration: 1.0,
            width: 4,
            height: 2,
            fps: None,
            has_audio: false,
        };

        assert!(sink.push(0, Frame::new_black(4, 2)).await.is_err());

        sink.begin(dir.path(), &info).await.unwrap();
        sink.push(0, Frame::new_filled(4, 2, [9, 8, 7, 255])).await.unwrap();
        assert_eq!(sink.frame_count, 1);

        let saved = image::open(dir.path().join("frames").join("frame_000000.png")).unwrap();
        assert_eq!(saved.to_rgba8().get_pixel(3, 1).0, [9, 8, 7, 255]);
    }
}
