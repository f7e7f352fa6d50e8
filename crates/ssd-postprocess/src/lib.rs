#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for detection post-processing.
pub mod error;

/// Bounding box representation, SSD box decoding and IoU.
pub mod boxes;

/// Score activation functions: stable softmax and logistic sigmoid.
pub mod activation;

/// Greedy per-class non-max suppression.
pub mod nms;

/// The post-processor orchestrating decoding, normalization and suppression.
pub mod postprocessor;

pub use crate::boxes::{decode_box, BoundingBox, BoxScales};
pub use crate::error::PostprocessError;
pub use crate::postprocessor::{SsdPostProcessor, SsdPostProcessorBuilder};

/// A detected object decoded from one frame.
///
/// Detections live for exactly one frame: they are created by
/// [`SsdPostProcessor::decode`], handed to the consumer, and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Index of the detected class in the model's class table.
    pub class_index: usize,
    /// Human-readable name of the detected class.
    pub class_name: String,
    /// Confidence of the detection, in `[0, 1]`.
    pub score: f32,
    /// The detected box in normalized corner form.
    pub bbox: BoundingBox,
}
