//! 帧来源：顺序、单向读取

use std::collections::VecDeque;
use std::path::Path;

use log::{info, warn};

use super::error::FrameSourceError;
use super::ffmpeg::FfmpegFrameSource;
use super::frame::Frame;
use super::image_sequence::ImageSequenceSource;

pub trait FrameSource {
    /// 读取下一帧，`Ok(None)` 表示流结束
    fn read_next(&mut self) -> Result<Option<Frame>, FrameSourceError>;

    /// 释放底层资源，可重复调用
    fn release(&mut self);

    fn describe(&self) -> String;
}

/// 按路径打开帧来源：目录视为图片序列，文件交给 ffmpeg 解码
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>, FrameSourceError> {
    if !path.exists() {
        return Err(FrameSourceError::NotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        let source = ImageSequenceSource::open(path)?;
        if source.is_empty() {
            warn!("🖼️ Image sequence {} contains no images", path.display());
        } else {
            info!("🖼️ Opening image sequence: {} ({} frames)", path.display(), source.len());
        }
        Ok(Box::new(source))
    } else {
        info!("🎬 Opening video via ffmpeg: {}", path.display());
        Ok(Box::new(FfmpegFrameSource::open(path)?))
    }
}

/// 内存帧来源，可在指定读取次数时模拟读取失败
pub struct MemoryFrameSource {
    frames: VecDeque<Frame>,
    reads: u64,
    fail_at: Option<u64>,
    release_count: u32,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            reads: 0,
            fail_at: None,
            release_count: 0,
        }
    }

    /// 第 `read` 次读取（从 1 开始）返回错误
    pub fn failing_at(mut self, read: u64) -> Self {
        self.fail_at = Some(read);
        self
    }

    pub fn release_count(&self) -> u32 {
        self.release_count
    }

    pub fn is_released(&self) -> bool {
        self.release_count > 0
    }
}

impl FrameSource for MemoryFrameSource {
    fn read_next(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        if self.is_released() {
            return Ok(None);
        }

        self.reads += 1;
        if self.fail_at == Some(self.reads) {
            return Err(FrameSourceError::Decode(format!(
                "simulated failure at read {}",
                self.reads
            )));
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.release_count += 1;
        self.frames.clear();
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
