use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::FrameSourceError;
use super::frame::Frame;
use super::source::FrameSource;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 图片序列帧来源，按文件名自然排序逐张解码（frame_2 在 frame_10 之前）
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    released: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, FrameSourceError> {
        if !dir.is_dir() {
            return Err(FrameSourceError::NotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && Self::is_image(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            cursor: 0,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// 自然排序：数字段按数值比较，其余按小写字符串比较
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let parts_a = split_numeric(a);
    let parts_b = split_numeric(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        let ord = match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb).then_with(|| pa.len().cmp(&pb.len())),
            _ => pa.to_lowercase().cmp(&pb.to_lowercase()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    parts_a.len().cmp(&parts_b.len()).then_with(|| a.cmp(b))
}

fn split_numeric(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_digit = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        if prev_digit.is_some_and(|prev| prev != is_digit) {
            parts.push(&s[start..i]);
            start = i;
        }
        prev_digit = Some(is_digit);
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

impl FrameSource for ImageSequenceSource {
    fn read_next(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        if self.released || self.cursor >= self.files.len() {
            return Ok(None);
        }

        let path = &self.files[self.cursor];
        self.cursor += 1;

        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        Frame::try_new(width, height, image.into_raw(), self.cursor as u64).map(Some)
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str, fill: u8) {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([fill, fill, fill, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_reads_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", 200);
        write_frame(dir.path(), "frame_001.png", 10);
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.read_next().unwrap().unwrap();
        assert_eq!(first.frame_number, 1);
        assert_eq!(first.data[0], 10);

        let second = source.read_next().unwrap().unwrap();
        assert_eq!(second.frame_number, 2);
        assert_eq!(second.data[0], 200);

        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn test_unpadded_names_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_10.png", 100);
        write_frame(dir.path(), "frame_2.png", 20);
        write_frame(dir.path(), "frame_1.png", 10);

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        let fills: Vec<u8> = std::iter::from_fn(|| source.read_next().unwrap())
            .map(|frame| frame.data[0])
            .collect();
        assert_eq!(fills, vec![10, 20, 100]);
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["f10.png", "f2.png", "F1.png", "f20.png", "f02.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["F1.png", "f2.png", "f02.png", "f10.png", "f20.png"]);
    }

    #[test]
    fn test_corrupt_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001.png"), b"garbage").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert!(source.read_next().is_err());
    }

    #[test]
    fn test_release_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "0001.png", 1);

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        source.release();
        source.release();
        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn test_open_missing_dir() {
        assert!(ImageSequenceSource::open(Path::new("/nonexistent/frames")).is_err());
    }
}
