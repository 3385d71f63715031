use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bytes::Bytes;
use hand_rps_common::frame::encode_png;
use hand_rps_common::gesture::Gesture;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use tracing::{info, warn};

pub const ICON_SIZE: u32 = 100;
const PLACEHOLDER: Rgb<u8> = Rgb([220, 220, 220]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Computer,
}

impl FromStr for Side {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(Self::Player),
            "computer" => Ok(Self::Computer),
            other => Err(AssetError::UnknownSide(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load {0}: {1}")]
    Load(PathBuf, image::ImageError),
    #[error("unknown side '{0}', expected 'player' or 'computer'")]
    UnknownSide(String),
}

/// PNG icons per side and gesture, encoded once at startup.
///
/// Lookups never fail: anything that could not be loaded is served as a
/// flat placeholder.
pub struct GestureImages {
    icons: HashMap<(Side, Gesture), Bytes>,
    placeholder: Bytes,
}

impl GestureImages {
    pub fn load(player_dir: &Path, computer_dir: &Path) -> Self {
        let placeholder = placeholder_png();
        let mut icons = HashMap::new();

        for (side, dir) in [(Side::Player, player_dir), (Side::Computer, computer_dir)] {
            for gesture in Gesture::ALL {
                let path = dir.join(format!("{}.png", gesture.as_str()));
                match load_icon(&path) {
                    Ok(icon) => match encode_png(&icon) {
                        Ok(png) => {
                            icons.insert((side, gesture), Bytes::from(png));
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to encode icon")
                        }
                    },
                    // Unknown has no artwork by default.
                    Err(_) if gesture == Gesture::Unknown => {}
                    Err(e) => warn!(error = %e, "gesture image missing, using placeholder"),
                }
            }
        }

        info!(loaded = icons.len(), "gesture images ready");
        Self { icons, placeholder }
    }

    pub fn png(&self, side: Side, gesture: Gesture) -> Bytes {
        self.icons
            .get(&(side, gesture))
            .cloned()
            .unwrap_or_else(|| self.placeholder.clone())
    }
}

fn load_icon(path: &Path) -> Result<RgbImage, AssetError> {
    let icon = image::open(path)
        .map_err(|e| AssetError::Load(path.to_path_buf(), e))?
        .to_rgb8();
    if icon.dimensions() == (ICON_SIZE, ICON_SIZE) {
        return Ok(icon);
    }
    Ok(image::imageops::resize(&icon, ICON_SIZE, ICON_SIZE, FilterType::Triangle))
}

fn placeholder_png() -> Bytes {
    let image = RgbImage::from_pixel(ICON_SIZE, ICON_SIZE, PLACEHOLDER);
    match encode_png(&image) {
        Ok(png) => Bytes::from(png),
        Err(e) => {
            warn!(error = %e, "failed to encode placeholder icon");
            Bytes::new()
        }
    }
}
