use hand_rps_common::config::Config;
use hand_rps_common::gesture::Gesture;
use image::RgbImage;
use tracing::debug;

use crate::annotate::draw_features;
use crate::classify::GestureClassifier;
use crate::contour::ContourExtractor;
use crate::features::{FeatureExtractor, Features};
use crate::segment::SkinSegmenter;

/// Result of running the pipeline on a frame that contained a hand.
#[derive(Debug, Clone)]
pub struct Detection {
    pub gesture: Gesture,
    pub features: Features,
}

/// The per-frame pipeline: segment, pick the hand contour, measure, classify.
pub struct HandRecognizer {
    segmenter: SkinSegmenter,
    contours: ContourExtractor,
    features: FeatureExtractor,
    classifier: GestureClassifier,
    annotate: bool,
}

impl HandRecognizer {
    pub fn new(config: &Config) -> Self {
        Self {
            segmenter: SkinSegmenter::new(&config.segmenter),
            contours: ContourExtractor::new(config.contour.min_area),
            features: FeatureExtractor::new(&config.gesture),
            classifier: GestureClassifier::new(&config.gesture),
            annotate: config.presentation.annotate,
        }
    }

    /// Run every stage on `frame`, drawing feedback onto it when enabled.
    ///
    /// `None` means no hand-sized skin region was found.
    pub fn detect(&self, frame: &mut RgbImage) -> Option<Detection> {
        let mask = self.segmenter.segment(frame);
        let contour = self.contours.extract(&mask)?;
        let features = self.features.extract(contour);
        let gesture = self.classifier.classify(&features);

        debug!(
            gesture = %gesture,
            defects = features.defect_count(),
            area = features.area,
            "hand detected"
        );

        if self.annotate {
            draw_features(frame, &features, gesture);
        }
        Some(Detection { gesture, features })
    }
}
