use std::path::{Path, PathBuf};

use chrono::Utc;
use hand_rps_common::frame::Frame;
use tracing::{info, warn};

use super::{FrameSource, SourceError};

const EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Replays still images from a directory in file-name order.
pub struct DirectorySource {
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
    seq: u64,
}

impl DirectorySource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SourceError::Directory(dir.display().to_string(), e))?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SourceError::NoImages(dir.display().to_string()));
        }
        info!(
            dir = %dir.display(),
            count = files.len(),
            looping,
            "replaying frames from directory"
        );
        Ok(Self {
            files,
            next: 0,
            looping,
            seq: 0,
        })
    }
}

impl FrameSource for DirectorySource {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.next >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.files[self.next];
        self.next += 1;
        if self.next == self.files.len() && !self.looping {
            info!(dir = ?path.parent(), "last frame of directory reached");
        }

        let data = tokio::fs::read(path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to read frame file");
            SourceError::Directory(path.display().to_string(), e)
        })?;
        let frame = Frame::decode(&data, Utc::now().timestamp_millis(), self.seq)?;
        self.seq += 1;
        Ok(Some(frame))
    }
}
