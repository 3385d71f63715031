use std::time::Duration;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures_util::StreamExt;
use hand_rps_common::frame::Frame;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::{FrameSource, SourceError};

const BOUNDARY: &[u8] = b"--frame\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Parse state for the MJPEG multipart stream.
enum ParseState {
    /// Looking for the boundary marker `--frame\r\n`.
    SeekingBoundary,
    /// Found boundary, now looking for end of headers `\r\n\r\n`.
    SeekingHeaderEnd,
    /// Collecting JPEG bytes until the next boundary.
    CollectingJpeg,
}

/// Incremental splitter for a `multipart/x-mixed-replace` body.
///
/// Chunks may cut a boundary or a header block anywhere; a part is only
/// emitted once the boundary that follows it has been seen.
pub struct MjpegParser {
    buffer: BytesMut,
    state: ParseState,
    jpeg_start: usize,
}

impl MjpegParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256 * 1024),
            state: ParseState::SeekingBoundary,
            jpeg_start: 0,
        }
    }

    /// Feed one network chunk and return every JPEG it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);
        let mut parts = Vec::new();

        loop {
            match self.state {
                ParseState::SeekingBoundary => {
                    if let Some(pos) = find_subsequence(&self.buffer, BOUNDARY) {
                        let _ = self.buffer.split_to(pos + BOUNDARY.len());
                        self.state = ParseState::SeekingHeaderEnd;
                    } else {
                        // Keep the tail in case the boundary spans chunks
                        if self.buffer.len() > BOUNDARY.len() {
                            let _ = self.buffer.split_to(self.buffer.len() - BOUNDARY.len());
                        }
                        break;
                    }
                }
                ParseState::SeekingHeaderEnd => {
                    if let Some(pos) = find_subsequence(&self.buffer, HEADER_END) {
                        let _ = self.buffer.split_to(pos + HEADER_END.len());
                        self.jpeg_start = 0;
                        self.state = ParseState::CollectingJpeg;
                    } else {
                        break;
                    }
                }
                ParseState::CollectingJpeg => {
                    let Some(pos) = find_subsequence(&self.buffer[self.jpeg_start..], BOUNDARY)
                    else {
                        // Skip already scanned bytes next time
                        self.jpeg_start = self.buffer.len().saturating_sub(BOUNDARY.len());
                        break;
                    };
                    let jpeg_end = self.jpeg_start + pos;
                    let end = if self.buffer[..jpeg_end].ends_with(b"\r\n") {
                        jpeg_end - 2
                    } else {
                        jpeg_end
                    };

                    let part = self.buffer.split_to(jpeg_end + BOUNDARY.len());
                    if end > 0 {
                        parts.push(part.freeze().slice(..end));
                    }
                    self.state = ParseState::SeekingHeaderEnd;
                }
            }
        }
        parts
    }
}

impl Default for MjpegParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume the MJPEG stream forever, publishing the newest JPEG.
/// Reconnects with exponential backoff on failure and returns once every
/// receiver is gone.
pub async fn run_mjpeg_reader(
    url: String,
    connect_timeout: Duration,
    tx: watch::Sender<Option<Bytes>>,
) {
    let mut backoff = Duration::from_secs(2);
    let max_backoff = Duration::from_secs(30);

    while !tx.is_closed() {
        info!(url = %url, "connecting to MJPEG stream");
        match consume_stream(&url, connect_timeout, &tx).await {
            Ok(()) => {
                info!("stream ended cleanly, reconnecting");
                backoff = Duration::from_secs(2);
            }
            Err(e) => {
                error!(error = %e, "stream error, reconnecting in {:?}", backoff);
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(max_backoff);
    }
    debug!("MJPEG reader stopping, no receivers left");
}

async fn consume_stream(
    url: &str,
    connect_timeout: Duration,
    tx: &watch::Sender<Option<Bytes>>,
) -> Result<(), SourceError> {
    let client = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(SourceError::HttpConnect)?;
    let response = client.get(url).send().await.map_err(SourceError::HttpConnect)?;

    if !response.status().is_success() {
        return Err(SourceError::HttpStatus(response.status().as_u16()));
    }
    info!(status = %response.status(), "connected to MJPEG stream");

    let mut byte_stream = response.bytes_stream();
    let mut parser = MjpegParser::new();
    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk.map_err(SourceError::HttpStream)?;
        for jpeg in parser.push(&chunk) {
            debug!(bytes = jpeg.len(), "MJPEG part received");
            if tx.send(Some(jpeg)).is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Reads the latest part published by [`run_mjpeg_reader`].
pub struct MjpegSource {
    rx: watch::Receiver<Option<Bytes>>,
    seq: u64,
}

impl MjpegSource {
    /// Spawn the reader task and return a source bound to it.
    pub fn spawn(url: String, connect_timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(run_mjpeg_reader(url, connect_timeout, tx));
        Self::from_receiver(rx)
    }

    pub fn from_receiver(rx: watch::Receiver<Option<Bytes>>) -> Self {
        Self { rx, seq: 0 }
    }
}

impl FrameSource for MjpegSource {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        // A part already handed out is never decoded twice.
        if !self.rx.has_changed().map_err(|_| SourceError::Closed)? {
            return Ok(None);
        }
        let Some(jpeg) = self.rx.borrow_and_update().clone() else {
            return Ok(None);
        };
        let frame = Frame::decode(&jpeg, Utc::now().timestamp_millis(), self.seq)?;
        self.seq += 1;
        Ok(Some(frame))
    }
}

/// Find the position of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
