use super::error::FrameSourceError;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub frame_number: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, frame_number: u64) -> Self {
        Self {
            width,
            height,
            data,
            frame_number,
        }
    }

    /// 校验尺寸与数据长度，空帧 / 残帧直接拒绝
    pub fn try_new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        frame_number: u64,
    ) -> Result<Self, FrameSourceError> {
        let expected = width as usize * height as usize * 4;
        if expected == 0 || data.len() != expected {
            return Err(FrameSourceError::InvalidFrame {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self::new(width, height, data, frame_number))
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// 灰度值迭代器（BT.601 整数权重，四舍五入）
    pub fn luma(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.chunks_exact(4).map(|rgba| {
            ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114 + 500) / 1000)
                as u8
        })
    }
}
