use ssd_anchors::Anchor;

/// A box in normalized corner form `[xmin, ymin, xmax, ymax]`.
///
/// Coordinates produced by [`decode_box`] are clamped so that
/// `0 <= xmin <= xmax <= 1` and `0 <= ymin <= ymax <= 1`. A zero-area box is
/// a valid value; it simply never overlaps anything.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Normalized left edge.
    pub xmin: f32,
    /// Normalized top edge.
    pub ymin: f32,
    /// Normalized right edge.
    pub xmax: f32,
    /// Normalized bottom edge.
    pub ymax: f32,
}

impl BoundingBox {
    /// Creates a new box from its normalized corner coordinates.
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns the area of the box, zero for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0) * (self.ymax - self.ymin).max(0.0)
    }

    /// Intersection over union with another box, in `[0, 1]`.
    ///
    /// Returns `0.0` when the boxes do not overlap or either box has zero
    /// area.
    ///
    /// # Examples
    ///
    /// ```
    /// use ssd_postprocess::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
    /// let b = BoundingBox::new(0.25, 0.0, 0.75, 0.5);
    ///
    /// assert_eq!(a.iou(&a), 1.0);
    /// assert_eq!(a.iou(&b), b.iou(&a));
    /// ```
    pub fn iou(&self, other: &Self) -> f32 {
        let inter_xmin = self.xmin.max(other.xmin);
        let inter_ymin = self.ymin.max(other.ymin);
        let inter_xmax = self.xmax.min(other.xmax);
        let inter_ymax = self.ymax.min(other.ymax);

        let intersection =
            (inter_xmax - inter_xmin).max(0.0) * (inter_ymax - inter_ymin).max(0.0);
        if intersection <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Calibration constants of the SSD box coding.
///
/// These are metadata of the trained model, fixed at construction. The
/// defaults (0.1 and 0.2) match the TensorFlow Object Detection API export
/// used by SSD MobileNet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxScales {
    /// Scale applied to the predicted center offsets.
    pub center: f32,
    /// Scale applied to the predicted size offsets.
    pub size: f32,
}

impl Default for BoxScales {
    fn default() -> Self {
        Self {
            center: 0.1,
            size: 0.2,
        }
    }
}

/// Decodes one anchor-relative offset into a clamped corner-form box.
///
/// Applies the standard SSD box coding: the center offsets are scaled by the
/// anchor size, the size offsets are exponentiated, and the resulting corners
/// are clamped to `[0, 1]`.
///
/// # Arguments
///
/// * `anchor` - The reference box the offset is expressed against.
/// * `offset` - The network-predicted `[dx, dy, dw, dh]` tuple.
/// * `scales` - The decode calibration constants of the model.
///
/// # Examples
///
/// ```
/// use ssd_anchors::Anchor;
/// use ssd_postprocess::{decode_box, BoxScales};
///
/// let anchor = Anchor { cx: 0.5, cy: 0.5, w: 0.2, h: 0.2 };
/// let bbox = decode_box(&anchor, [0.0, 0.0, 0.0, 0.0], &BoxScales::default());
///
/// assert_eq!(bbox.xmin, 0.4);
/// assert_eq!(bbox.ymax, 0.6);
/// ```
pub fn decode_box(anchor: &Anchor, offset: [f32; 4], scales: &BoxScales) -> BoundingBox {
    let [dx, dy, dw, dh] = offset;

    let cx = dx * scales.center * anchor.w + anchor.cx;
    let cy = dy * scales.center * anchor.h + anchor.cy;
    let w = (dw * scales.size).exp() * anchor.w;
    let h = (dh * scales.size).exp() * anchor.h;

    BoundingBox {
        xmin: (cx - 0.5 * w).clamp(0.0, 1.0),
        ymin: (cy - 0.5 * h).clamp(0.0, 1.0),
        xmax: (cx + 0.5 * w).clamp(0.0, 1.0),
        ymax: (cy + 0.5 * h).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_zero_offset_recovers_anchor() {
        let anchor = Anchor {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.4,
        };
        let bbox = decode_box(&anchor, [0.0, 0.0, 0.0, 0.0], &BoxScales::default());

        assert_relative_eq!(bbox.xmin, 0.4);
        assert_relative_eq!(bbox.ymin, 0.3);
        assert_relative_eq!(bbox.xmax, 0.6);
        assert_relative_eq!(bbox.ymax, 0.7);
    }

    #[test]
    fn test_decode_center_offset() {
        let anchor = Anchor {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.2,
        };
        // dx of 5.0 at center scale 0.1 shifts the center by 0.1 anchor widths
        let bbox = decode_box(&anchor, [5.0, 0.0, 0.0, 0.0], &BoxScales::default());

        assert_relative_eq!(bbox.xmin, 0.5);
        assert_relative_eq!(bbox.xmax, 0.7);
        assert_relative_eq!(bbox.ymin, 0.4);
        assert_relative_eq!(bbox.ymax, 0.6);
    }

    #[test]
    fn test_decode_size_offset_is_exponential() {
        let anchor = Anchor {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.2,
        };
        let scales = BoxScales::default();
        let bbox = decode_box(&anchor, [0.0, 0.0, 5.0, 5.0], &scales);

        // exp(5.0 * 0.2) = e, so the box grows by that factor
        let expected_half = 0.5 * 0.2 * std::f32::consts::E;
        assert_relative_eq!(bbox.xmin, 0.5 - expected_half, epsilon = 1e-6);
        assert_relative_eq!(bbox.xmax, 0.5 + expected_half, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_clamps_to_unit_square() {
        let anchor = Anchor {
            cx: 0.9,
            cy: 0.1,
            w: 0.5,
            h: 0.5,
        };
        let bbox = decode_box(&anchor, [10.0, -10.0, 10.0, 10.0], &BoxScales::default());

        assert!(bbox.xmin >= 0.0 && bbox.xmin <= bbox.xmax && bbox.xmax <= 1.0);
        assert!(bbox.ymin >= 0.0 && bbox.ymin <= bbox.ymax && bbox.ymax <= 1.0);
    }

    #[test]
    fn test_decode_degenerate_box_has_zero_area() {
        // anchor fully outside the left edge collapses to a zero-area box
        let anchor = Anchor {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.2,
        };
        let bbox = decode_box(&anchor, [-200.0, 0.0, 0.0, 0.0], &BoxScales::default());

        assert_relative_eq!(bbox.xmin, 0.0);
        assert_relative_eq!(bbox.xmax, 0.0);
        assert_relative_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_iou_symmetry() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let b = BoundingBox::new(0.25, 0.25, 0.75, 0.75);

        assert_relative_eq!(a.iou(&b), b.iou(&a));
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 0.4, 0.4);
        let b = BoundingBox::new(0.6, 0.6, 1.0, 1.0);

        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_zero_area_is_zero() {
        let a = BoundingBox::new(0.5, 0.5, 0.5, 0.5);
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        assert_relative_eq!(a.iou(&b), 0.0);
        assert_relative_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let b = BoundingBox::new(0.25, 0.0, 0.75, 0.5);

        // intersection 0.125, union 0.375
        assert_relative_eq!(a.iou(&b), 1.0 / 3.0, epsilon = 1e-6);
    }
}
