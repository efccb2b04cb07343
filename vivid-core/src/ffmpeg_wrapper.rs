use anyhow::{Context, Result};
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Video encoder used for the enhancement encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    /// NVIDIA NVENC hardware encoding (CPU decoding).
    Nvenc,
    /// Software x264 encoding.
    X264,
}

impl VideoEncoder {
    /// Pick NVENC when an NVIDIA GPU is present, x264 otherwise.
    pub fn detect() -> Self {
        if has_nvidia_gpu() {
            VideoEncoder::Nvenc
        } else {
            VideoEncoder::X264
        }
    }
}

/// FFmpeg command builder for the itsscale + color correction encode.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    itsscale: Option<f64>,
    video_filter: Option<String>,
    encoder: VideoEncoder,
    overwrite: bool,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            itsscale: None,
            video_filter: None,
            encoder: VideoEncoder::X264,
            overwrite: false,
        }
    }

    /// Scale input presentation timestamps without re-sampling.
    /// Applied as an input option, so it must precede `-i`.
    pub fn itsscale(mut self, multiplier: f64) -> Self {
        self.itsscale = Some(multiplier);
        self
    }

    /// Set the combined video filter chain (`-vf`). An empty string
    /// means no filtering and is ignored.
    pub fn video_filter(mut self, filter: &str) -> Self {
        if !filter.is_empty() {
            self.video_filter = Some(filter.to_string());
        }
        self
    }

    pub fn encoder(mut self, encoder: VideoEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Enable overwrite without asking
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Build the FFmpeg command line.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");

        if self.overwrite {
            cmd.arg("-y");
        }

        if let Some(scale) = self.itsscale {
            cmd.args(["-itsscale", &scale.to_string()]);
        }

        cmd.arg("-i");
        cmd.arg(&self.input);

        match self.encoder {
            VideoEncoder::Nvenc => {
                cmd.args([
                    "-c:v",
                    "h264_nvenc",
                    "-preset",
                    "fast",
                    "-profile:v",
                    "main",
                    "-cq",
                    "20",
                    "-pix_fmt",
                    "yuv420p",
                    "-c:a",
                    "copy",
                ]);
            }
            VideoEncoder::X264 => {
                cmd.args([
                    "-c:v",
                    "libx264",
                    "-preset",
                    "medium",
                    "-profile:v",
                    "main",
                    "-crf",
                    "20",
                    "-pix_fmt",
                    "yuv420p",
                    "-movflags",
                    "+faststart",
                    "-c:a",
                    "copy",
                ]);
            }
        }

        if let Some(ref filter) = self.video_filter {
            cmd.args(["-vf", filter]);
        }

        cmd.arg(&self.output);

        cmd
    }

    /// Execute the FFmpeg command, reporting progress as a percentage.
    ///
    /// Progress is derived from the `Duration:` header and `time=`
    /// updates on stderr. Blocks until the encode finishes; a non-zero
    /// exit status is an error carrying the captured output.
    pub fn execute<F>(&self, progress_callback: F) -> Result<()>
    where
        F: Fn(f64) + Send + 'static,
    {
        let mut cmd = self.build();
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        log::info!("Executing FFmpeg command: {:?}", cmd);

        let mut child = cmd.spawn().context("Failed to spawn FFmpeg process")?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr"))?;

        // FFmpeg writes both the stream headers and the encode status
        // line to stderr
        let reader_thread = thread::spawn(move || {
            let reader = BufReader::new(stderr);
            let duration_regex = Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap();
            let progress_regex = Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap();

            let mut total_duration: Option<f64> = None;
            let mut all_output = String::new();

            for line in reader.lines().map_while(Result::ok) {
                all_output.push_str(&line);
                all_output.push('\n');

                if total_duration.is_none()
                    && let Some(caps) = duration_regex.captures(&line)
                {
                    total_duration = Some(timestamp_seconds(&caps));
                }

                if let Some(caps) = progress_regex.captures(&line)
                    && let Some(duration) = total_duration
                    && duration > 0.0
                {
                    let current_time = timestamp_seconds(&caps);
                    progress_callback((current_time / duration * 100.0).min(100.0));
                }
            }
            all_output
        });

        let status = child.wait().context("Failed to wait for FFmpeg process")?;

        let all_output = reader_thread
            .join()
            .unwrap_or_else(|_| String::from("Failed to get output"));

        if !status.success() {
            log::error!("FFmpeg failed with output:\n{}", all_output);
            anyhow::bail!(
                "FFmpeg failed with exit code: {:?}. Check logs for details.",
                status.code()
            );
        }

        Ok(())
    }
}

fn timestamp_seconds(caps: &regex::Captures<'_>) -> f64 {
    let hours: f64 = caps[1].parse().unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let seconds: f64 = caps[3].parse().unwrap_or(0.0);
    let centis: f64 = caps[4].parse().unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds + centis / 100.0
}

/// Check if FFmpeg is available and return version info
pub fn check_ffmpeg() -> Result<String> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .context("FFmpeg not found. Please install FFmpeg.")?;

    let version = String::from_utf8_lossy(&output.stdout);

    let version_regex = Regex::new(r"ffmpeg version (\S+)").unwrap();
    if let Some(caps) = version_regex.captures(&version) {
        Ok(caps[1].to_string())
    } else {
        Ok("unknown".to_string())
    }
}

/// Check if an NVIDIA GPU is available for hardware encoding.
pub fn has_nvidia_gpu() -> bool {
    Command::new("nvidia-smi")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
