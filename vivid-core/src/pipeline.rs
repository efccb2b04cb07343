use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::combiner::combine;
use crate::ffmpeg_wrapper::{FfmpegCommand, VideoEncoder};
use crate::handbrake_wrapper::HandBrakeCommand;
use crate::presets::{NONE_PRESET, PresetStore};

/// One video enhancement run: optional HandBrake compression, then an
/// FFmpeg encode applying the itsscale multiplier and the combined
/// color correction filter.
pub struct EnhanceJob {
    input_path: PathBuf,
    output_path: Option<PathBuf>,
    itsscale: f64,
    preset_ids: Vec<String>,
    handbrake: bool,
}

/// File sizes before and after the run, in MiB.
#[derive(Debug, Clone)]
pub struct SizeReport {
    pub original_mb: f64,
    pub final_mb: f64,
}

impl SizeReport {
    /// Compare two files on disk; `None` when either is missing.
    pub fn compare(original: impl AsRef<Path>, enhanced: impl AsRef<Path>) -> Option<Self> {
        let original_bytes = std::fs::metadata(original).ok()?.len();
        let final_bytes = std::fs::metadata(enhanced).ok()?.len();
        Some(Self {
            original_mb: original_bytes as f64 / (1024.0 * 1024.0),
            final_mb: final_bytes as f64 / (1024.0 * 1024.0),
        })
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.original_mb == 0.0 {
            0.0
        } else {
            (self.original_mb - self.final_mb) / self.original_mb * 100.0
        }
    }
}

/// Result of a completed enhancement run.
#[derive(Debug, Clone)]
pub struct EnhanceOutcome {
    pub output: PathBuf,
    /// Present only when HandBrake preprocessing was requested.
    pub size_report: Option<SizeReport>,
}

impl EnhanceJob {
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input_path: input.as_ref().to_path_buf(),
            output_path: None,
            itsscale: 1.0,
            preset_ids: Vec::new(),
            handbrake: false,
        }
    }

    /// Explicit output path; a name derived from the input and the
    /// selected options is generated when unset.
    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn itsscale(mut self, multiplier: f64) -> Self {
        self.itsscale = multiplier;
        self
    }

    /// Ordered preset ids to combine; duplicates allowed.
    pub fn presets(mut self, ids: Vec<String>) -> Self {
        self.preset_ids = ids;
        self
    }

    /// Enable the HandBrake compression pass before encoding.
    pub fn handbrake(mut self, enabled: bool) -> Self {
        self.handbrake = enabled;
        self
    }

    /// Run the enhancement pipeline.
    pub fn run(&self, store: &PresetStore) -> Result<EnhanceOutcome> {
        let combined_filter = combine(store, &self.preset_ids)?;

        let base = self
            .input_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .context("Input path has no usable file name")?;

        let output = match &self.output_path {
            Some(path) => path.clone(),
            None => PathBuf::from(output_filename(base, &self.preset_ids, self.handbrake)),
        };

        // HandBrake failures degrade to the original input rather than
        // aborting the run
        let mut intermediate: Option<PathBuf> = None;
        let encode_input = if self.handbrake {
            let compressed = PathBuf::from(format!("{base}_compressed.mp4"));
            log::info!("Applying HandBrake preprocessing...");
            match HandBrakeCommand::new(&self.input_path, &compressed).run() {
                Ok(()) => {
                    log::info!("HandBrake preprocessing completed: {}", compressed.display());
                    intermediate = Some(compressed.clone());
                    compressed
                }
                Err(err) => {
                    log::warn!(
                        "HandBrake preprocessing failed ({}), proceeding with original file",
                        err
                    );
                    self.input_path.clone()
                }
            }
        } else {
            self.input_path.clone()
        };

        let applied: Vec<&str> = self
            .preset_ids
            .iter()
            .filter(|id| id.as_str() != NONE_PRESET)
            .filter_map(|id| store.get(id).map(|preset| preset.name.as_str()))
            .collect();
        if !applied.is_empty() {
            log::info!("Applying: {}", applied.join(" + "));
        }
        if !combined_filter.is_empty() {
            log::info!("Combined filter: {}", combined_filter);
        }

        let encoder = VideoEncoder::detect();
        match encoder {
            VideoEncoder::Nvenc => {
                log::info!("NVIDIA GPU detected, encoding with h264_nvenc");
            }
            VideoEncoder::X264 => {
                log::info!("No NVIDIA GPU found, encoding with libx264");
            }
        }

        let cmd = FfmpegCommand::new(&encode_input, &output)
            .itsscale(self.itsscale)
            .video_filter(&combined_filter)
            .encoder(encoder)
            .overwrite();

        // Set up progress bar
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Encoding...");

        let pb_clone = pb.clone();
        cmd.execute(move |progress| {
            pb_clone.set_position(progress as u64);
        })?;
        pb.finish_with_message("Encoding complete!");

        if let Some(compressed) = &intermediate {
            match std::fs::remove_file(compressed) {
                Ok(()) => log::info!("Cleaned up intermediate file: {}", compressed.display()),
                Err(err) => log::warn!(
                    "Could not remove intermediate file {}: {}",
                    compressed.display(),
                    err
                ),
            }
        }

        let size_report = if self.handbrake {
            SizeReport::compare(&self.input_path, &output)
        } else {
            None
        };

        log::info!("Video enhancement completed successfully!");
        log::info!("Output saved to: {}", output.display());

        Ok(EnhanceOutcome {
            output,
            size_report,
        })
    }
}

/// Output name derived from the input stem and the selected options:
/// `{base}_final{preset_suffix}{compression_suffix}.mp4`.
pub fn output_filename(base: &str, preset_ids: &[String], compressed: bool) -> String {
    let preset_suffix = match preset_ids {
        [] => String::new(),
        [only] if only.as_str() == NONE_PRESET => String::new(),
        [only] => format!("_{only}"),
        _ => "_enhanced".to_string(),
    };
    let compression_suffix = if compressed { "_compressed" } else { "" };
    format!("{base}_final{preset_suffix}{compression_suffix}.mp4")
}
