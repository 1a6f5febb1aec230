use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cluster count must be between 1 and 256, got {0}")]
    InvalidClusterCount(usize),

    #[error("canvas dimensions cannot be zero")]
    ZeroCanvas,

    #[error("cell size must be at least 1, got {0}")]
    InvalidCellSize(u32),

    #[error("site count must be at least 1, got {0}")]
    InvalidSiteCount(usize),

    #[error("degenerate point set: {points} points produced no triangulation")]
    DegenerateGeometry { points: usize },

    #[error("failed to write summary csv: {0}")]
    Csv(#[from] csv::Error),
}
