use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// HandBrake compression pass applied before the enhancement encode.
///
/// Uses the Production Standard preset at RF 27 with the `slower`
/// encoder preset, passing common audio codecs through untouched.
#[derive(Debug, Clone)]
pub struct HandBrakeCommand {
    input: PathBuf,
    output: PathBuf,
}

impl HandBrakeCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Build the HandBrakeCLI command line.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new("HandBrakeCLI");
        cmd.arg("-i");
        cmd.arg(&self.input);
        cmd.arg("-o");
        cmd.arg(&self.output);
        cmd.args([
            "--preset",
            "Production Standard",
            "--quality",
            "27",
            "--encoder-preset",
            "slower",
            "--audio-copy-mask",
            "aac,ac3,eac3,truehd,dts,dtshd,mp3,flac",
            "--audio-fallback",
            "av_aac",
        ]);
        cmd
    }

    /// Run the compression synchronously, inheriting HandBrake's own
    /// console output.
    pub fn run(&self) -> Result<()> {
        let mut cmd = self.build();
        log::info!("Executing HandBrake command: {:?}", cmd);

        let status = cmd
            .status()
            .context("Failed to spawn HandBrakeCLI process")?;

        if !status.success() {
            anyhow::bail!(
                "HandBrake preprocessing failed with exit code: {:?}",
                status.code()
            );
        }

        Ok(())
    }
}

/// Check if HandBrakeCLI is available and return version info
pub fn check_handbrake() -> Result<String> {
    let output = Command::new("HandBrakeCLI")
        .arg("--version")
        .output()
        .context("HandBrakeCLI not found. Please install HandBrake.")?;

    let version = String::from_utf8_lossy(&output.stdout);

    let version_regex = Regex::new(r"HandBrake\s+(\S+)").unwrap();
    if let Some(caps) = version_regex.captures(&version) {
        Ok(caps[1].to_string())
    } else {
        Ok("unknown".to_string())
    }
}

/// Check if HandBrakeCLI is available.
pub fn has_handbrake() -> bool {
    Command::new("HandBrakeCLI")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn command_matches_production_standard_settings() {
        let cmd = HandBrakeCommand::new("in.mp4", "in_compressed.mp4").build();

        assert_eq!(cmd.get_program(), OsStr::new("HandBrakeCLI"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-i",
                "in.mp4",
                "-o",
                "in_compressed.mp4",
                "--preset",
                "Production Standard",
                "--quality",
                "27",
                "--encoder-preset",
                "slower",
                "--audio-copy-mask",
                "aac,ac3,eac3,truehd,dts,dtshd,mp3,flac",
                "--audio-fallback",
                "av_aac",
            ]
        );
    }
}
