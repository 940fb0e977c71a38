use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("invalid frame: {width}x{height}, {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
