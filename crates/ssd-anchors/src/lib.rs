#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for anchor grid generation.
pub mod error;

use std::ops::Index;

use crate::error::AnchorError;

/// A fixed reference box in normalized image coordinates.
///
/// Anchors are the coordinate basis an SSD network expresses its box
/// predictions against. They are generated once from the model configuration
/// and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Normalized x coordinate of the box center, in `[0, 1]`.
    pub cx: f32,
    /// Normalized y coordinate of the box center, in `[0, 1]`.
    pub cy: f32,
    /// Normalized box width, in `[0, 1]`.
    pub w: f32,
    /// Normalized box height, in `[0, 1]`.
    pub h: f32,
}

/// Size of one feature map emitted by an SSD detection head, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMapSize {
    /// Number of cells along the horizontal axis.
    pub width: usize,
    /// Number of cells along the vertical axis.
    pub height: usize,
}

/// Configuration of the SSD anchor generator.
///
/// These values are metadata of the trained model, not tunables. They must
/// match the anchor layout the network was trained against or every decoded
/// box is meaningless. The parameterization follows the TensorFlow Object
/// Detection API `ssd_anchor_generator`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGridConfig {
    /// Feature map sizes, one per detection head, in the order the network
    /// emits predictions.
    pub feature_maps: Vec<FeatureMapSize>,
    /// Anchor scale assigned to the first feature map.
    pub min_scale: f32,
    /// Anchor scale assigned to the last feature map.
    pub max_scale: f32,
    /// Aspect ratios (width / height) generated for every cell.
    pub aspect_ratios: Vec<f32>,
    /// Replace the first layer's anchors with the reduced three-box set
    /// (scale 0.1 at ratio 1, layer scale at ratios 2 and 1/2).
    pub reduce_boxes_in_lowest_layer: bool,
    /// When set, emit one extra anchor per cell at this aspect ratio with a
    /// scale interpolated between the current and next layer.
    pub interpolated_scale_aspect_ratio: Option<f32>,
}

impl AnchorGridConfig {
    /// Configuration of the SSD MobileNet v1 anchor layout (1917 anchors).
    ///
    /// # Examples
    ///
    /// ```
    /// use ssd_anchors::{AnchorGrid, AnchorGridConfig};
    ///
    /// let grid = AnchorGrid::new(&AnchorGridConfig::ssd_mobilenet_v1()).unwrap();
    /// assert_eq!(grid.len(), 1917);
    /// ```
    pub fn ssd_mobilenet_v1() -> Self {
        Self {
            feature_maps: [(19, 19), (10, 10), (5, 5), (3, 3), (2, 2), (1, 1)]
                .iter()
                .map(|&(width, height)| FeatureMapSize { width, height })
                .collect(),
            min_scale: 0.2,
            max_scale: 0.95,
            aspect_ratios: vec![1.0, 2.0, 0.5, 3.0, 1.0 / 3.0],
            reduce_boxes_in_lowest_layer: true,
            interpolated_scale_aspect_ratio: Some(1.0),
        }
    }

    fn validate(&self) -> Result<(), AnchorError> {
        if self.feature_maps.is_empty() {
            return Err(AnchorError::EmptyFeatureMaps);
        }
        for fm in &self.feature_maps {
            if fm.width == 0 || fm.height == 0 {
                return Err(AnchorError::InvalidFeatureMapSize(fm.width, fm.height));
            }
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale <= 1.0) {
            return Err(AnchorError::InvalidScaleRange(
                self.min_scale,
                self.max_scale,
            ));
        }
        if self.aspect_ratios.is_empty() {
            return Err(AnchorError::EmptyAspectRatios);
        }
        for &ratio in &self.aspect_ratios {
            if ratio <= 0.0 {
                return Err(AnchorError::InvalidAspectRatio(ratio));
            }
        }
        if let Some(ratio) = self.interpolated_scale_aspect_ratio {
            if ratio <= 0.0 {
                return Err(AnchorError::InvalidAspectRatio(ratio));
            }
        }
        Ok(())
    }

    /// Anchor scale of the given layer, interpolated linearly between
    /// `min_scale` and `max_scale`.
    fn layer_scale(&self, layer: usize) -> f32 {
        let num_layers = self.feature_maps.len();
        if num_layers == 1 {
            self.min_scale
        } else {
            self.min_scale
                + (self.max_scale - self.min_scale) * layer as f32 / (num_layers - 1) as f32
        }
    }
}

/// The fixed, ordered anchor sequence of an SSD network.
///
/// The grid is generated once at startup and shared read-only by all decode
/// calls. Its ordering is a hard external contract: anchor `i` corresponds to
/// row `i` of the network's box and class tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGrid {
    anchors: Vec<Anchor>,
}

impl AnchorGrid {
    /// Generates the anchor grid for the given configuration.
    ///
    /// The generation is deterministic and pure: the same configuration
    /// always yields an identical anchor sequence. Layers are emitted in
    /// order, cells row-major within a layer, and the per-cell boxes in the
    /// order established by the configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - The anchor generator parameters of the trained model.
    ///
    /// # Returns
    ///
    /// The generated grid, or an [`AnchorError`] if the configuration is
    /// invalid.
    pub fn new(config: &AnchorGridConfig) -> Result<Self, AnchorError> {
        config.validate()?;

        let num_layers = config.feature_maps.len();
        let mut anchors = Vec::new();

        for (layer, fm) in config.feature_maps.iter().enumerate() {
            let scale = config.layer_scale(layer);
            let scale_next = if layer + 1 < num_layers {
                config.layer_scale(layer + 1)
            } else {
                1.0
            };

            // (scale, aspect ratio) pairs emitted for every cell of this layer
            let mut cell_boxes = Vec::new();
            if layer == 0 && config.reduce_boxes_in_lowest_layer {
                cell_boxes.push((0.1, 1.0));
                cell_boxes.push((scale, 2.0));
                cell_boxes.push((scale, 0.5));
            } else {
                for &ratio in &config.aspect_ratios {
                    cell_boxes.push((scale, ratio));
                }
                if let Some(ratio) = config.interpolated_scale_aspect_ratio {
                    cell_boxes.push(((scale * scale_next).sqrt(), ratio));
                }
            }

            anchors.reserve(fm.width * fm.height * cell_boxes.len());

            for y in 0..fm.height {
                for x in 0..fm.width {
                    let cx = (x as f32 + 0.5) / fm.width as f32;
                    let cy = (y as f32 + 0.5) / fm.height as f32;
                    for &(scale, ratio) in &cell_boxes {
                        let ratio_sqrt = ratio.sqrt();
                        anchors.push(Anchor {
                            cx,
                            cy,
                            w: (scale * ratio_sqrt).clamp(0.0, 1.0),
                            h: (scale / ratio_sqrt).clamp(0.0, 1.0),
                        });
                    }
                }
            }
        }

        Ok(Self { anchors })
    }

    /// Returns the total number of anchors in the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if the grid contains no anchors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Returns the anchors as a slice, in tensor-row order.
    #[inline]
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Returns an iterator over the anchors, in tensor-row order.
    pub fn iter(&self) -> std::slice::Iter<'_, Anchor> {
        self.anchors.iter()
    }
}

impl Index<usize> for AnchorGrid {
    type Output = Anchor;

    fn index(&self, index: usize) -> &Anchor {
        &self.anchors[index]
    }
}

impl<'a> IntoIterator for &'a AnchorGrid {
    type Item = &'a Anchor;
    type IntoIter = std::slice::Iter<'a, Anchor>;

    fn into_iter(self) -> Self::IntoIter {
        self.anchors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_layer_config() -> AnchorGridConfig {
        AnchorGridConfig {
            feature_maps: vec![FeatureMapSize {
                width: 1,
                height: 1,
            }],
            min_scale: 0.5,
            max_scale: 0.5,
            aspect_ratios: vec![1.0],
            reduce_boxes_in_lowest_layer: false,
            interpolated_scale_aspect_ratio: None,
        }
    }

    #[test]
    fn test_single_cell_single_ratio() -> Result<(), AnchorError> {
        let grid = AnchorGrid::new(&single_layer_config())?;
        assert_eq!(grid.len(), 1);

        let anchor = grid[0];
        assert_relative_eq!(anchor.cx, 0.5);
        assert_relative_eq!(anchor.cy, 0.5);
        assert_relative_eq!(anchor.w, 0.5);
        assert_relative_eq!(anchor.h, 0.5);

        Ok(())
    }

    #[test]
    fn test_aspect_ratio_shapes_box() -> Result<(), AnchorError> {
        let mut config = single_layer_config();
        config.aspect_ratios = vec![4.0];

        let grid = AnchorGrid::new(&config)?;
        let anchor = grid[0];

        // ratio 4 doubles the width and halves the height
        assert_relative_eq!(anchor.w, 1.0);
        assert_relative_eq!(anchor.h, 0.25);

        Ok(())
    }

    #[test]
    fn test_cell_centers_row_major() -> Result<(), AnchorError> {
        let mut config = single_layer_config();
        config.feature_maps = vec![FeatureMapSize {
            width: 2,
            height: 2,
        }];

        let grid = AnchorGrid::new(&config)?;
        assert_eq!(grid.len(), 4);

        let centers: Vec<(f32, f32)> = grid.iter().map(|a| (a.cx, a.cy)).collect();
        assert_eq!(
            centers,
            vec![(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)]
        );

        Ok(())
    }

    #[test]
    fn test_ssd_mobilenet_v1_count() -> Result<(), AnchorError> {
        let grid = AnchorGrid::new(&AnchorGridConfig::ssd_mobilenet_v1())?;

        // 19x19 cells at 3 boxes, then 10x10 + 5x5 + 3x3 + 2x2 + 1x1 at 6
        assert_eq!(grid.len(), 1917);

        Ok(())
    }

    #[test]
    fn test_ssd_mobilenet_v1_bounds() -> Result<(), AnchorError> {
        let grid = AnchorGrid::new(&AnchorGridConfig::ssd_mobilenet_v1())?;

        for anchor in &grid {
            assert!(anchor.cx >= 0.0 && anchor.cx <= 1.0);
            assert!(anchor.cy >= 0.0 && anchor.cy <= 1.0);
            assert!(anchor.w > 0.0 && anchor.w <= 1.0);
            assert!(anchor.h > 0.0 && anchor.h <= 1.0);
        }

        Ok(())
    }

    #[test]
    fn test_generation_is_deterministic() -> Result<(), AnchorError> {
        let config = AnchorGridConfig::ssd_mobilenet_v1();
        let grid_a = AnchorGrid::new(&config)?;
        let grid_b = AnchorGrid::new(&config)?;
        assert_eq!(grid_a, grid_b);

        Ok(())
    }

    #[test]
    fn test_reduced_lowest_layer() -> Result<(), AnchorError> {
        let mut config = single_layer_config();
        config.reduce_boxes_in_lowest_layer = true;

        let grid = AnchorGrid::new(&config)?;
        assert_eq!(grid.len(), 3);
        assert_relative_eq!(grid[0].w, 0.1);
        assert_relative_eq!(grid[0].h, 0.1);

        Ok(())
    }

    #[test]
    fn test_empty_feature_maps() {
        let mut config = single_layer_config();
        config.feature_maps.clear();
        assert_eq!(
            AnchorGrid::new(&config),
            Err(AnchorError::EmptyFeatureMaps)
        );
    }

    #[test]
    fn test_zero_sized_feature_map() {
        let mut config = single_layer_config();
        config.feature_maps = vec![FeatureMapSize {
            width: 4,
            height: 0,
        }];
        assert_eq!(
            AnchorGrid::new(&config),
            Err(AnchorError::InvalidFeatureMapSize(4, 0))
        );
    }

    #[test]
    fn test_invalid_scale_range() {
        let mut config = single_layer_config();
        config.min_scale = 0.9;
        config.max_scale = 0.2;
        assert_eq!(
            AnchorGrid::new(&config),
            Err(AnchorError::InvalidScaleRange(0.9, 0.2))
        );
    }

    #[test]
    fn test_empty_aspect_ratios() {
        let mut config = single_layer_config();
        config.aspect_ratios.clear();
        assert_eq!(
            AnchorGrid::new(&config),
            Err(AnchorError::EmptyAspectRatios)
        );
    }

    #[test]
    fn test_negative_aspect_ratio() {
        let mut config = single_layer_config();
        config.aspect_ratios = vec![-1.0];
        assert_eq!(
            AnchorGrid::new(&config),
            Err(AnchorError::InvalidAspectRatio(-1.0))
        );
    }
}
