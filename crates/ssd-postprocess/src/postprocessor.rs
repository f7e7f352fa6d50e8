use log::debug;
use ssd_anchors::{AnchorGrid, AnchorGridConfig};

use crate::activation::{sigmoid, softmax};
use crate::boxes::{decode_box, BoxScales};
use crate::error::PostprocessError;
use crate::nms::{non_max_suppression, sort_by_score, Candidate};
use crate::Detection;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;
const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
const DEFAULT_MAX_DETECTIONS: usize = 100;

/// Builder for the SSD post-processor.
///
/// This struct provides a convenient way to configure and create an
/// [`SsdPostProcessor`] instance. All values are fixed at construction; the
/// resulting post-processor is immutable.
pub struct SsdPostProcessorBuilder {
    anchor_config: AnchorGridConfig,
    class_names: Vec<String>,
    expected_anchor_count: Option<usize>,
    multi_class: bool,
    box_scales: BoxScales,
    score_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
}

impl SsdPostProcessorBuilder {
    /// Creates a new builder with default thresholds.
    ///
    /// # Arguments
    ///
    /// * `anchor_config` - The anchor generator parameters of the trained
    ///   model.
    /// * `class_names` - The class table, index-aligned with the class
    ///   tensor columns. Index 0 is the background slot.
    ///
    /// Starts in single-label mode; see [`Self::with_multi_class`] for the
    /// mode SSD MobileNet COCO exports are usually run in.
    pub fn new(anchor_config: AnchorGridConfig, class_names: Vec<String>) -> Self {
        Self {
            anchor_config,
            class_names,
            expected_anchor_count: None,
            multi_class: false,
            box_scales: BoxScales::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }

    /// Checks the generated grid against the anchor count the model declares
    /// (e.g. 1917 for SSD MobileNet v1). Building fails on a mismatch.
    pub fn with_expected_anchor_count(mut self, count: usize) -> Self {
        self.expected_anchor_count = Some(count);
        self
    }

    /// Selects multi-label mode: every class is activated independently with
    /// a sigmoid instead of a joint softmax, so one anchor may be reported as
    /// several classes. SSD MobileNet COCO exports (including the model
    /// behind [`AnchorGridConfig::ssd_mobilenet_v1`]) are typically run this
    /// way, so enable it when targeting that preset.
    pub fn with_multi_class(mut self, multi_class: bool) -> Self {
        self.multi_class = multi_class;
        self
    }

    /// Sets the decode calibration constants of the model.
    pub fn with_box_scales(mut self, box_scales: BoxScales) -> Self {
        self.box_scales = box_scales;
        self
    }

    /// Sets the minimum normalized score for a candidate detection.
    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Sets the IoU above which overlapping same-class boxes are suppressed.
    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    /// Sets the global cap on the number of returned detections.
    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }

    /// Builds and returns an [`SsdPostProcessor`] instance.
    ///
    /// # Returns
    ///
    /// A `Result` containing the post-processor, or a [`PostprocessError`]
    /// if the configuration does not describe a usable model.
    pub fn build(self) -> Result<SsdPostProcessor, PostprocessError> {
        if self.class_names.len() < 2 {
            return Err(PostprocessError::TooFewClasses(self.class_names.len()));
        }

        let anchors = AnchorGrid::new(&self.anchor_config)?;

        if let Some(expected) = self.expected_anchor_count {
            if anchors.len() != expected {
                return Err(PostprocessError::AnchorCountMismatch {
                    expected,
                    found: anchors.len(),
                });
            }
        }

        debug!(
            "built post-processor: {} anchors, {} classes, multi_class={}",
            anchors.len(),
            self.class_names.len(),
            self.multi_class
        );

        Ok(SsdPostProcessor {
            anchors,
            class_names: self.class_names,
            multi_class: self.multi_class,
            box_scales: self.box_scales,
            score_threshold: self.score_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        })
    }
}

/// Decodes raw SSD output tensors into a ranked list of detections.
///
/// The post-processor owns the anchor grid and the class table and is
/// otherwise stateless: [`SsdPostProcessor::decode`] takes `&self`, performs
/// no I/O and touches no shared mutable state, so one instance may serve
/// concurrent frames.
pub struct SsdPostProcessor {
    anchors: AnchorGrid,
    class_names: Vec<String>,
    multi_class: bool,
    box_scales: BoxScales,
    score_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
}

impl SsdPostProcessor {
    /// Returns the anchor grid the tensors must be index-aligned with.
    #[inline]
    pub fn anchors(&self) -> &AnchorGrid {
        &self.anchors
    }

    /// Returns the class table, index 0 being the background slot.
    #[inline]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Returns the number of classes, background included.
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Decodes one frame's raw tensors into detections.
    ///
    /// # Arguments
    ///
    /// * `box_offsets` - Row-major `[num_anchors, 4]` tensor of
    ///   `[dx, dy, dw, dh]` offsets, in anchor order.
    /// * `class_logits` - Row-major `[num_anchors, num_classes]` tensor of
    ///   raw logits, in anchor order.
    ///
    /// # Returns
    ///
    /// The surviving detections, score descending, capped at the configured
    /// maximum. An empty list is a valid steady-state result, not an error;
    /// errors are reserved for tensors that do not match the anchor grid.
    pub fn decode(
        &self,
        box_offsets: &[f32],
        class_logits: &[f32],
    ) -> Result<Vec<Detection>, PostprocessError> {
        let num_anchors = self.anchors.len();
        let num_classes = self.class_names.len();

        if box_offsets.len() != num_anchors * 4 {
            return Err(PostprocessError::BoxTensorSizeMismatch {
                expected: num_anchors * 4,
                found: box_offsets.len(),
                anchors: num_anchors,
            });
        }
        if class_logits.len() != num_anchors * num_classes {
            return Err(PostprocessError::ClassTensorSizeMismatch {
                expected: num_anchors * num_classes,
                found: class_logits.len(),
                anchors: num_anchors,
                classes: num_classes,
            });
        }

        let mut per_class: Vec<Vec<Candidate>> = vec![Vec::new(); num_classes];
        let mut scores = vec![0.0f32; num_classes];

        for (anchor_index, (anchor, logits)) in self
            .anchors
            .iter()
            .zip(class_logits.chunks_exact(num_classes))
            .enumerate()
        {
            if self.multi_class {
                for (score, &logit) in scores.iter_mut().zip(logits) {
                    *score = sigmoid(logit);
                }
            } else {
                scores.copy_from_slice(logits);
                softmax(&mut scores);
            }

            // the box is decoded at most once per anchor, and only if some
            // class clears the threshold
            let mut bbox = None;

            // class 0 is the background slot, never a detection
            for (class_index, &score) in scores.iter().enumerate().skip(1) {
                if score < self.score_threshold {
                    continue;
                }
                let bbox = *bbox.get_or_insert_with(|| {
                    let row = &box_offsets[anchor_index * 4..anchor_index * 4 + 4];
                    decode_box(
                        anchor,
                        [row[0], row[1], row[2], row[3]],
                        &self.box_scales,
                    )
                });
                per_class[class_index].push(Candidate {
                    bbox,
                    score,
                    class_index,
                    anchor_index,
                });
            }
        }

        let num_candidates: usize = per_class.iter().map(Vec::len).sum();

        let mut survivors = Vec::new();
        for candidates in per_class {
            if candidates.is_empty() {
                continue;
            }
            survivors.extend(non_max_suppression(candidates, self.iou_threshold));
        }

        sort_by_score(&mut survivors);
        survivors.truncate(self.max_detections);

        debug!(
            "{} candidates above threshold, {} detections after suppression",
            num_candidates,
            survivors.len()
        );

        Ok(survivors
            .into_iter()
            .map(|c| Detection {
                class_index: c.class_index,
                class_name: self.class_names[c.class_index].clone(),
                score: c.score,
                bbox: c.bbox,
            })
            .collect())
    }
}
