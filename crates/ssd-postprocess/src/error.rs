/// Errors that can occur when post-processing detection tensors.
///
/// All of these indicate a caller or integration bug: either the
/// configuration does not match the trained model, or the per-frame tensors
/// do not match the configuration. Empty frames and degenerate boxes are
/// valid outputs, not errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PostprocessError {
    /// Anchor grid generation failed.
    #[error(transparent)]
    AnchorError(#[from] ssd_anchors::error::AnchorError),

    /// The generated anchor grid does not match the declared anchor count.
    #[error("The anchor grid holds {found} anchors, the model declares {expected}")]
    AnchorCountMismatch {
        /// Anchor count declared by the model.
        expected: usize,
        /// Anchor count produced by the configuration.
        found: usize,
    },

    /// The class-name table needs a background entry plus at least one class.
    #[error("At least two class names are required (background plus one class), got {0}")]
    TooFewClasses(usize),

    /// The box tensor length does not match the anchor grid.
    #[error("The box tensor holds {found} values, expected {expected} ({anchors} anchors x 4)")]
    BoxTensorSizeMismatch {
        /// Expected number of values.
        expected: usize,
        /// Number of values received.
        found: usize,
        /// Number of anchors in the grid.
        anchors: usize,
    },

    /// The class tensor length does not match the anchor grid and class table.
    #[error(
        "The class tensor holds {found} values, expected {expected} ({anchors} anchors x {classes} classes)"
    )]
    ClassTensorSizeMismatch {
        /// Expected number of values.
        expected: usize,
        /// Number of values received.
        found: usize,
        /// Number of anchors in the grid.
        anchors: usize,
        /// Number of classes in the table.
        classes: usize,
    },
}
