pub mod error;
pub mod ffmpeg;
pub mod finder;
pub mod frame;
pub mod histogram;
pub mod image_sequence;
pub mod similarity;
pub mod source;

pub use error::FrameSourceError;
pub use ffmpeg::FfmpegFrameSource;
pub use finder::{
    search_frames, NoopObserver, SearchConfig, SearchObserver, SearchResult, SearchState,
};
pub use frame::Frame;
pub use histogram::{Histogram, HISTOGRAM_BINS};
pub use image_sequence::ImageSequenceSource;
pub use similarity::correlation;
pub use source::{open_source, FrameSource, MemoryFrameSource};
