//! 循环点搜索：基准帧 -> 跳过窗口 -> 逐帧比较

use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::FrameSourceError;
use super::frame::Frame;
use super::histogram::Histogram;
use super::similarity::correlation;
use super::source::FrameSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub video_path: PathBuf,
    /// 0 与 1 都表示第一帧
    pub base_frame: u64,
    pub skip_frames: u64,
    pub similarity_threshold: f64,
    pub debug: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::new(),
            base_frame: 0,
            skip_frames: 60,
            similarity_threshold: 0.95,
            debug: false,
        }
    }
}

impl SearchConfig {
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            ..Default::default()
        }
    }

    pub fn with_base_frame(mut self, base_frame: u64) -> Self {
        self.base_frame = base_frame;
        self
    }

    pub fn with_skip_frames(mut self, skip_frames: u64) -> Self {
        self.skip_frames = skip_frames;
        self
    }

    pub fn with_threshold(mut self, similarity_threshold: f64) -> Self {
        self.similarity_threshold = similarity_threshold;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 基准帧在流中的位置（从 1 开始）
    pub fn base_position(&self) -> u64 {
        self.base_frame.max(1)
    }

    /// 索引不超过该值的帧不参与比较
    pub fn skip_boundary(&self) -> u64 {
        self.base_position().saturating_add(self.skip_frames)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResult {
    Success { matched: Option<u64> },
    Failure { message: String },
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Success { .. })
    }

    pub fn matched_frame(&self) -> Option<u64> {
        match self {
            SearchResult::Success { matched } => *matched,
            SearchResult::Failure { .. } => None,
        }
    }

    /// 兼容旧约定：未找到或失败时为 -1
    pub fn matched_index(&self) -> i64 {
        self.matched_frame().map(|idx| idx as i64).unwrap_or(-1)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SearchResult::Failure { message } => Some(message),
            SearchResult::Success { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    AcquireBase,
    SkipWindow,
    Compare,
    Found(u64),
    EndOfStream,
    Fatal(String),
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchState::Found(_) | SearchState::EndOfStream | SearchState::Fatal(_)
        )
    }

    fn into_result(self) -> Option<SearchResult> {
        match self {
            SearchState::Found(idx) => Some(SearchResult::Success { matched: Some(idx) }),
            SearchState::EndOfStream => Some(SearchResult::Success { matched: None }),
            SearchState::Fatal(message) => Some(SearchResult::Failure { message }),
            _ => None,
        }
    }
}

/// 搜索过程回调（调试输出等）
pub trait SearchObserver {
    fn frame_skipped(&mut self, _index: u64) {}

    fn frame_compared(&mut self, _index: u64, _score: f64) {}
}

pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

struct SearchDriver<'a> {
    config: &'a SearchConfig,
    source_name: String,
    state: SearchState,
    frame_index: u64,
    base_histogram: Option<Histogram>,
}

impl<'a> SearchDriver<'a> {
    fn new(config: &'a SearchConfig, source_name: String) -> Self {
        Self {
            config,
            source_name,
            state: SearchState::AcquireBase,
            frame_index: 0,
            base_histogram: None,
        }
    }

    fn step(
        &mut self,
        read: Result<Option<Frame>, FrameSourceError>,
        observer: &mut dyn SearchObserver,
    ) {
        let next = match (&self.state, read) {
            (SearchState::AcquireBase, Ok(Some(frame))) => {
                self.frame_index += 1;
                if self.frame_index < self.config.base_position() {
                    SearchState::AcquireBase
                } else {
                    self.base_histogram = Some(Histogram::from_frame(&frame));
                    self.after_base()
                }
            }
            (SearchState::AcquireBase, read) => {
                if let Err(e) = &read {
                    warn!("Frame read failed at {}: {}", self.frame_index + 1, e);
                }
                SearchState::Fatal(self.acquire_failure_message())
            }

            (SearchState::SkipWindow, Ok(Some(_frame))) => {
                self.frame_index += 1;
                observer.frame_skipped(self.frame_index);
                if self.frame_index >= self.config.skip_boundary() {
                    SearchState::Compare
                } else {
                    SearchState::SkipWindow
                }
            }

            (SearchState::Compare, Ok(Some(frame))) => {
                self.frame_index += 1;
                let hist = Histogram::from_frame(&frame);
                drop(frame);

                let score = match &self.base_histogram {
                    Some(base) => correlation(base, &hist),
                    None => f64::NEG_INFINITY,
                };
                observer.frame_compared(self.frame_index, score);

                if score >= self.config.similarity_threshold {
                    SearchState::Found(self.frame_index)
                } else {
                    SearchState::Compare
                }
            }

            (SearchState::SkipWindow | SearchState::Compare, Ok(None)) => SearchState::EndOfStream,
            (SearchState::SkipWindow | SearchState::Compare, Err(e)) => {
                warn!(
                    "Frame read failed after frame {}, treating as end of stream: {}",
                    self.frame_index, e
                );
                SearchState::EndOfStream
            }

            (terminal, _) => terminal.clone(),
        };

        self.state = next;
    }

    fn after_base(&self) -> SearchState {
        if self.frame_index >= self.config.skip_boundary() {
            SearchState::Compare
        } else {
            SearchState::SkipWindow
        }
    }

    fn acquire_failure_message(&self) -> String {
        if self.frame_index == 0 {
            format!("failed to read video: {}", self.source_name)
        } else {
            format!(
                "failed to read base frame: base_frame_index={}, last_read_frame_index={}",
                self.config.base_frame, self.frame_index
            )
        }
    }
}

/// 在帧来源上执行一次搜索；无论结果如何都会释放来源
pub fn search_frames(
    source: &mut dyn FrameSource,
    config: &SearchConfig,
    observer: &mut dyn SearchObserver,
) -> SearchResult {
    let mut driver = SearchDriver::new(config, source.describe());

    let result = loop {
        if let Some(result) = driver.state.clone().into_result() {
            break result;
        }
        let read = source.read_next();
        driver.step(read, observer);
    };

    source.release();
    result
}
