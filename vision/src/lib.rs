//! Single-frame hand gesture recognition.
//!
//! A frame goes through [`SkinSegmenter`] (color thresholds + morphology),
//! [`ContourExtractor`] (largest external region), [`FeatureExtractor`]
//! (hull, solidity, finger gaps) and [`GestureClassifier`]. [`HandRecognizer`]
//! chains the four stages.

pub mod annotate;
pub mod classify;
pub mod color;
pub mod contour;
pub mod features;
pub mod geometry;
pub mod recognizer;
pub mod segment;

pub use classify::GestureClassifier;
pub use contour::{Contour, ContourExtractor};
pub use features::{Defect, FeatureExtractor, Features};
pub use recognizer::{Detection, HandRecognizer};
pub use segment::SkinSegmenter;
