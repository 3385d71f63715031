use hand_rps_common::config::GestureConfig;
use hand_rps_common::gesture::Gesture;

use crate::features::Features;

/// Maps contour features to a gesture by counting finger gaps.
///
/// Stateless: every frame is judged on its own.
pub struct GestureClassifier {
    min_area: f64,
    min_solidity: f64,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            min_area: config.min_hand_area,
            min_solidity: config.min_solidity,
        }
    }

    pub fn classify(&self, features: &Features) -> Gesture {
        self.classify_counts(features.area, features.solidity, features.defect_count())
    }

    pub fn classify_counts(&self, area: f64, solidity: f64, defects: usize) -> Gesture {
        if area < self.min_area || solidity < self.min_solidity {
            return Gesture::Unknown;
        }
        match defects {
            0 => Gesture::Rock,
            1 => Gesture::Scissors,
            _ => Gesture::Paper,
        }
    }
}
