use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use tracing::trace;

/// A camera frame with capture metadata.
///
/// Every frame handed to the recognizer has the dimensions the source was
/// configured with; sources call [`Frame::normalized`] before returning.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Unix millis at the time the frame was read from the source.
    pub captured_at_ms: i64,
    pub seq: u64,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at_ms: i64, seq: u64) -> Self {
        Self {
            image,
            captured_at_ms,
            seq,
        }
    }

    /// Decode an encoded image (JPEG from a camera, PNG from disk).
    pub fn decode(data: &[u8], captured_at_ms: i64, seq: u64) -> Result<Self, FrameError> {
        if data.is_empty() {
            return Err(FrameError::Empty);
        }
        let image = image::load_from_memory(data)
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .to_rgb8();
        Ok(Self::new(image, captured_at_ms, seq))
    }

    /// Resize to exactly `width` x `height` unless the frame already matches.
    pub fn normalized(mut self, width: u32, height: u32) -> Self {
        if self.image.dimensions() != (width, height) {
            trace!(
                from = ?self.image.dimensions(),
                to = ?(width, height),
                seq = self.seq,
                "resizing frame"
            );
            self.image =
                image::imageops::resize(&self.image, width, height, FilterType::Triangle);
        }
        self
    }

    /// Capture time as UTC, falling back to now for out-of-range stamps.
    pub fn captured_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.captured_at_ms).unwrap_or_else(Utc::now)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Encode an RGB image as JPEG, used for preview frames.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .map_err(|e| FrameError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Encode an RGB image as PNG, used for gesture icons.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, FrameError> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| FrameError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame payload is empty")]
    Empty,
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn jpeg_decode_keeps_metadata() {
        let img = RgbImage::from_pixel(32, 24, Rgb([200, 150, 120]));
        let jpeg = encode_jpeg(&img, 90).unwrap();
        let frame = Frame::decode(&jpeg, 1708300000000, 42).unwrap();
        assert_eq!(frame.captured_at_ms, 1708300000000);
        assert_eq!(frame.seq, 42);
        assert_eq!((frame.width(), frame.height()), (32, 24));
    }

    #[test]
    fn capture_time_is_utc() {
        let frame = Frame::new(RgbImage::new(1, 1), 1708300000123, 0);
        assert_eq!(
            frame.captured_at().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            "2024-02-18T23:46:40.123Z"
        );
    }

    #[test]
    fn decode_empty_payload() {
        assert!(matches!(Frame::decode(&[], 0, 0), Err(FrameError::Empty)));
    }

    #[test]
    fn decode_garbage_payload() {
        let result = Frame::decode(&[0x00, 0x01, 0x02, 0x03], 0, 0);
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn normalized_resizes_to_target() {
        let frame = Frame::new(RgbImage::new(320, 240), 0, 0).normalized(640, 480);
        assert_eq!((frame.width(), frame.height()), (640, 480));
    }

    #[test]
    fn png_starts_with_signature() {
        let png = encode_png(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
