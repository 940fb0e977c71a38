//! 视频循环点查找

use crate::core::video::{
    open_source, search_frames, FrameSource, NoopObserver, SearchConfig, SearchObserver,
    SearchResult,
};
use log::{debug, error, info};

/// 循环点查找器 - 持有不可变配置，可重复调用
///
/// ```no_run
/// use loop_point_finder::api::video::LoopPointFinder;
/// use loop_point_finder::core::video::SearchConfig;
///
/// let finder = LoopPointFinder::new(SearchConfig::new("loop.mp4").with_skip_frames(30));
/// let result = finder.search();
/// println!("{}", result.matched_index());
/// ```
pub struct LoopPointFinder {
    config: SearchConfig,
}

impl LoopPointFinder {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 打开 `video_path` 并搜索
    pub fn search(&self) -> SearchResult {
        info!("🎬 LPF: {}", self.config.video_path.display());

        match open_source(&self.config.video_path) {
            Ok(mut source) => self.search_source(source.as_mut()),
            Err(e) => {
                error!("❌ Failed to open {}: {}", self.config.video_path.display(), e);
                SearchResult::Failure {
                    message: format!(
                        "failed to read video: {}",
                        self.config.video_path.display()
                    ),
                }
            }
        }
    }

    /// 在已打开的帧来源上搜索，结束后来源被释放
    pub fn search_source(&self, source: &mut dyn FrameSource) -> SearchResult {
        let result = if self.config.debug {
            let mut observer = LogObserver;
            search_frames(source, &self.config, &mut observer)
        } else {
            search_frames(source, &self.config, &mut NoopObserver)
        };

        match &result {
            SearchResult::Success { matched: Some(idx) } => {
                info!("✅ Similar frame found! Frame{}.", idx)
            }
            SearchResult::Success { matched: None } => info!(
                "No similar frame found. (Thr={})",
                self.config.similarity_threshold
            ),
            SearchResult::Failure { message } => error!("❌ {}", message),
        }

        result
    }
}

/// 调试观察者：逐帧输出跳过 / 相似度
pub struct LogObserver;

impl SearchObserver for LogObserver {
    fn frame_skipped(&mut self, index: u64) {
        debug!("LPF#search: Frame{:05} - skipped.", index);
    }

    fn frame_compared(&mut self, index: u64, score: f64) {
        debug!("LPF#search: Frame{:05} = {}", index, score);
    }
}

pub fn search(config: SearchConfig) -> SearchResult {
    LoopPointFinder::new(config).search()
}
