/// Errors that can occur when generating an anchor grid.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnchorError {
    /// The configuration contains no feature maps.
    #[error("The configuration contains no feature maps")]
    EmptyFeatureMaps,

    /// A feature map has a zero-sized dimension.
    #[error("Invalid feature map size {0}x{1}, dimensions must be non-zero")]
    InvalidFeatureMapSize(usize, usize),

    /// The scale range must satisfy 0 < min <= max <= 1.
    #[error("Invalid scale range [{0}, {1}], expected 0 < min <= max <= 1")]
    InvalidScaleRange(f32, f32),

    /// The configuration contains no aspect ratios.
    #[error("The configuration contains no aspect ratios")]
    EmptyAspectRatios,

    /// An aspect ratio is not strictly positive.
    #[error("Invalid aspect ratio {0}, expected a strictly positive value")]
    InvalidAspectRatio(f32),
}
