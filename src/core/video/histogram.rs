use super::frame::Frame;

pub const HISTOGRAM_BINS: usize = 256;

/// 灰度直方图特征（256 bins，L2 归一化）
///
/// 只有同一提取流程生成的直方图之间才可比较。
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [f32; HISTOGRAM_BINS],
}

impl Histogram {
    pub fn from_frame(frame: &Frame) -> Self {
        Self::from_luma(frame.luma())
    }

    pub fn from_luma<I>(luma: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut counts = [0u32; HISTOGRAM_BINS];
        for val in luma {
            counts[val as usize] += 1;
        }

        let norm = counts
            .iter()
            .map(|&c| c as f64 * c as f64)
            .sum::<f64>()
            .sqrt();

        let mut bins = [0f32; HISTOGRAM_BINS];
        if norm > 0.0 {
            for (bin, &count) in bins.iter_mut().zip(counts.iter()) {
                *bin = (count as f64 / norm) as f32;
            }
        }

        Self { bins }
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }
}
