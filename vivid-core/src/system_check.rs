use crate::ffmpeg_wrapper::{check_ffmpeg, has_nvidia_gpu};
use crate::handbrake_wrapper::check_handbrake;

/// Availability of the external tools the pipeline depends on.
///
/// FFmpeg is required; the NVIDIA GPU and HandBrakeCLI are optional
/// and only change which features are offered.
#[derive(Debug, Clone)]
pub struct SystemReport {
    pub ffmpeg_version: Option<String>,
    pub nvidia_gpu: bool,
    pub handbrake_version: Option<String>,
}

impl SystemReport {
    /// Probe the system for all external dependencies.
    pub fn gather() -> Self {
        Self {
            ffmpeg_version: check_ffmpeg().ok(),
            nvidia_gpu: has_nvidia_gpu(),
            handbrake_version: check_handbrake().ok(),
        }
    }

    /// The only hard requirement.
    pub fn ffmpeg_available(&self) -> bool {
        self.ffmpeg_version.is_some()
    }

    pub fn handbrake_available(&self) -> bool {
        self.handbrake_version.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffmpeg_availability_tracks_version_presence() {
        let report = SystemReport {
            ffmpeg_version: Some("7.1".to_string()),
            nvidia_gpu: false,
            handbrake_version: None,
        };
        assert!(report.ffmpeg_available());
        assert!(!report.handbrake_available());

        let report = SystemReport {
            ffmpeg_version: None,
            nvidia_gpu: true,
            handbrake_version: Some("1.8.2".to_string()),
        };
        assert!(!report.ffmpeg_available());
        assert!(report.handbrake_available());
    }
}
