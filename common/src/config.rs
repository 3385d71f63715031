use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub contour: ContourConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// One of "mjpeg", "polling" or "directory".
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default)]
    pub loop_directory: bool,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Color representation a skin range predicate is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    YCrCb,
    Hsv,
}

/// Inclusive per-channel range. Channels follow the order of the color
/// space name (Y, Cr, Cb or H, S, V); hue is stored as degrees / 2.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkinRange {
    pub space: ColorSpace,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterConfig {
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    #[serde(default = "default_bilateral_radius")]
    pub bilateral_radius: u32,
    #[serde(default = "default_bilateral_sigma")]
    pub bilateral_sigma_color: f32,
    #[serde(default = "default_bilateral_sigma")]
    pub bilateral_sigma_space: f32,
    #[serde(default = "default_close_radius")]
    pub close_radius: u8,
    #[serde(default = "default_open_radius")]
    pub open_radius: u8,
    #[serde(default = "default_median_radius")]
    pub median_radius: u32,
    #[serde(default = "default_skin_ranges")]
    pub ranges: Vec<SkinRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContourConfig {
    #[serde(default = "default_min_contour_area")]
    pub min_area: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_min_hand_area")]
    pub min_hand_area: f64,
    #[serde(default = "default_min_solidity")]
    pub min_solidity: f64,
    #[serde(default = "default_defect_angle_min")]
    pub defect_angle_min: f64,
    #[serde(default = "default_defect_angle_max")]
    pub defect_angle_max: f64,
    /// Minimum far-point distance from the hull edge, in pixels.
    #[serde(default = "default_min_defect_depth")]
    pub min_defect_depth: f64,
    /// Far points must lie above this fraction of the bounding box height.
    #[serde(default = "default_defect_height_fraction")]
    pub defect_height_fraction: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_gesture_timeout_ms")]
    pub gesture_timeout_ms: u64,
    #[serde(default = "default_best_of")]
    pub best_of: u32,
    #[serde(default = "default_game_mode")]
    pub mode: String,
    /// Fixed seed for the computer's random moves. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_player_images")]
    pub player_images_dir: String,
    #[serde(default = "default_computer_images")]
    pub computer_images_dir: String,
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_true")]
    pub annotate: bool,
    /// Read operator commands from stdin.
    #[serde(default = "default_true")]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            url: default_url(),
            directory: default_directory(),
            loop_directory: false,
            width: default_width(),
            height: default_height(),
            tick_ms: default_tick_ms(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            blur_sigma: default_blur_sigma(),
            bilateral_radius: default_bilateral_radius(),
            bilateral_sigma_color: default_bilateral_sigma(),
            bilateral_sigma_space: default_bilateral_sigma(),
            close_radius: default_close_radius(),
            open_radius: default_open_radius(),
            median_radius: default_median_radius(),
            ranges: default_skin_ranges(),
        }
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            min_area: default_min_contour_area(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_hand_area: default_min_hand_area(),
            min_solidity: default_min_solidity(),
            defect_angle_min: default_defect_angle_min(),
            defect_angle_max: default_defect_angle_max(),
            min_defect_depth: default_min_defect_depth(),
            defect_height_fraction: default_defect_height_fraction(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gesture_timeout_ms: default_gesture_timeout_ms(),
            best_of: default_best_of(),
            mode: default_game_mode(),
            seed: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_port(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            player_images_dir: default_player_images(),
            computer_images_dir: default_computer_images(),
            jpeg_quality: default_quality(),
            annotate: true,
            console: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_source() -> String {
    "mjpeg".into()
}
fn default_url() -> String {
    "http://127.0.0.1:8000/stream".into()
}
fn default_directory() -> String {
    "frames".into()
}
fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_tick_ms() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_blur_sigma() -> f32 {
    0.8
}
fn default_bilateral_radius() -> u32 {
    2
}
fn default_bilateral_sigma() -> f32 {
    75.0
}
fn default_close_radius() -> u8 {
    4
}
fn default_open_radius() -> u8 {
    2
}
fn default_median_radius() -> u32 {
    2
}
fn default_skin_ranges() -> Vec<SkinRange> {
    vec![
        SkinRange {
            space: ColorSpace::YCrCb,
            lower: [60, 135, 85],
            upper: [255, 180, 135],
        },
        SkinRange {
            space: ColorSpace::Hsv,
            lower: [0, 15, 100],
            upper: [20, 170, 255],
        },
        SkinRange {
            space: ColorSpace::Hsv,
            lower: [170, 15, 100],
            upper: [180, 170, 255],
        },
    ]
}
fn default_min_contour_area() -> f64 {
    5000.0
}
fn default_min_hand_area() -> f64 {
    7000.0
}
fn default_min_solidity() -> f64 {
    0.7
}
fn default_defect_angle_min() -> f64 {
    30.0
}
fn default_defect_angle_max() -> f64 {
    85.0
}
fn default_min_defect_depth() -> f64 {
    46.875
}
fn default_defect_height_fraction() -> f64 {
    0.8
}
fn default_gesture_timeout_ms() -> u64 {
    2000
}
fn default_best_of() -> u32 {
    1
}
fn default_game_mode() -> String {
    "normal".into()
}
fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    8080
}
fn default_player_images() -> String {
    "assets/player".into()
}
fn default_computer_images() -> String {
    "assets/computer".into()
}
fn default_quality() -> u8 {
    80
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.camera.source, "mjpeg");
        assert_eq!(config.camera.tick_ms, 30);
        assert_eq!(config.segmenter.ranges.len(), 3);
        assert_eq!(config.contour.min_area, 5000.0);
        assert_eq!(config.gesture.min_hand_area, 7000.0);
        assert_eq!(config.game.gesture_timeout_ms, 2000);
        assert!(config.game.seed.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [camera]
            source = "directory"
            directory = "/tmp/hands"

            [game]
            best_of = 3
            seed = 7

            [[segmenter.ranges]]
            space = "hsv"
            lower = [0, 10, 60]
            upper = [25, 200, 255]
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.source, "directory");
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.game.best_of, 3);
        assert_eq!(config.game.seed, Some(7));
        assert_eq!(config.game.mode, "normal");
        assert_eq!(config.segmenter.ranges.len(), 1);
        assert_eq!(config.segmenter.ranges[0].space, ColorSpace::Hsv);
        assert_eq!(config.segmenter.close_radius, 4);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = Config::parse(include_str!("../../config.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(shipped.camera.url, defaults.camera.url);
        assert_eq!(shipped.segmenter.ranges, defaults.segmenter.ranges);
        assert_eq!(shipped.gesture.min_defect_depth, defaults.gesture.min_defect_depth);
        assert_eq!(shipped.game.mode, defaults.game.mode);
        assert_eq!(shipped.api.port, defaults.api.port);
        assert_eq!(shipped.presentation.jpeg_quality, defaults.presentation.jpeg_quality);
    }

    #[test]
    fn bad_color_space_is_a_parse_error() {
        let err = Config::parse(
            r#"
            [[segmenter.ranges]]
            space = "lab"
            lower = [0, 0, 0]
            upper = [255, 255, 255]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
