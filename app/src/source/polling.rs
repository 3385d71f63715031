use std::time::Duration;

use chrono::Utc;
use hand_rps_common::frame::Frame;
use tracing::debug;

use super::{FrameSource, SourceError};

/// Fetches a single JPEG per read from a snapshot endpoint.
pub struct PollingSource {
    client: reqwest::Client,
    url: String,
    seq: u64,
}

impl PollingSource {
    pub fn new(url: String, connect_timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout)
            .build()
            .map_err(SourceError::HttpConnect)?;
        Ok(Self {
            client,
            url,
            seq: 0,
        })
    }
}

impl FrameSource for PollingSource {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(SourceError::HttpConnect)?;
        if !resp.status().is_success() {
            return Err(SourceError::HttpStatus(resp.status().as_u16()));
        }
        let jpeg = resp.bytes().await.map_err(SourceError::HttpStream)?;
        if jpeg.is_empty() {
            debug!(url = %self.url, "camera returned an empty body");
            return Ok(None);
        }

        let frame = Frame::decode(&jpeg, Utc::now().timestamp_millis(), self.seq)?;
        self.seq += 1;
        Ok(Some(frame))
    }
}
