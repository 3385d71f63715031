pub mod directory;
pub mod mjpeg;
pub mod polling;

use std::path::Path;
use std::time::Duration;

use hand_rps_common::config::CameraConfig;
use hand_rps_common::frame::{Frame, FrameError};

use directory::DirectorySource;
use mjpeg::MjpegSource;
use polling::PollingSource;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP connection failed: {0}")]
    HttpConnect(reqwest::Error),
    #[error("HTTP stream error: {0}")]
    HttpStream(reqwest::Error),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("cannot read {0}: {1}")]
    Directory(String, std::io::Error),
    #[error("no jpg/jpeg/png images in {0}")]
    NoImages(String),
    #[error("unknown camera source '{0}', expected 'mjpeg', 'polling' or 'directory'")]
    UnknownKind(String),
    #[error("frame stream closed")]
    Closed,
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Produces at most one frame per call.
///
/// `Ok(None)` means nothing new this tick; both that and `Err` make the
/// caller skip the tick.
pub trait FrameSource {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// The configured source, chosen by `camera.source`.
pub enum CameraSource {
    Mjpeg(MjpegSource),
    Polling(PollingSource),
    Directory(DirectorySource),
}

impl CameraSource {
    /// Must be called inside a tokio runtime: the MJPEG reader is spawned here.
    pub fn open(config: &CameraConfig) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        match config.source.as_str() {
            "mjpeg" => Ok(Self::Mjpeg(MjpegSource::spawn(config.url.clone(), timeout))),
            "polling" => Ok(Self::Polling(PollingSource::new(config.url.clone(), timeout)?)),
            "directory" => Ok(Self::Directory(DirectorySource::open(
                Path::new(&config.directory),
                config.loop_directory,
            )?)),
            other => Err(SourceError::UnknownKind(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mjpeg(_) => "mjpeg",
            Self::Polling(_) => "polling",
            Self::Directory(_) => "directory",
        }
    }
}

impl FrameSource for CameraSource {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        match self {
            Self::Mjpeg(s) => s.read().await,
            Self::Polling(s) => s.read().await,
            Self::Directory(s) => s.read().await,
        }
    }
}
