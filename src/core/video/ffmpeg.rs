//! ffmpeg 子进程解码，rawvideo RGBA 管道逐帧读取

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, warn};

use super::error::FrameSourceError;
use super::frame::Frame;
use super::source::FrameSource;

const DECODE_ARGS: [&str; 6] = ["-f", "rawvideo", "-pix_fmt", "rgba", "-an", "-"];

pub struct FfmpegFrameSource {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    frame_number: u64,
}

impl FfmpegFrameSource {
    pub fn open(path: &Path) -> Result<Self, FrameSourceError> {
        if !path.exists() {
            return Err(FrameSourceError::NotFound(path.to_path_buf()));
        }
        if !Self::is_available() {
            return Err(FrameSourceError::Decode(
                "ffmpeg/ffprobe not found in PATH".to_string(),
            ));
        }

        let (width, height) = probe_dimensions(path)?;
        debug!("[FFmpeg] {}: {}x{}", path.display(), width, height);

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(DECODE_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FrameSourceError::Decode(format!("ffmpeg execution failed: {}", e)))?;

        let stdout = child.stdout.take();

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child: Some(child),
            stdout,
            frame_number: 0,
        })
    }

    /// ffmpeg 与 ffprobe 是否都可执行
    pub fn is_available() -> bool {
        ["ffmpeg", "ffprobe"].iter().all(|tool| {
            Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        })
    }
}

impl FrameSource for FfmpegFrameSource {
    fn read_next(&mut self) -> Result<Option<Frame>, FrameSourceError> {
        let stdout = match self.stdout.as_mut() {
            Some(stdout) => stdout,
            None => return Ok(None),
        };

        let frame = read_frame(stdout, self.width, self.height, self.frame_number + 1)?;
        if frame.is_some() {
            self.frame_number += 1;
        }
        Ok(frame)
    }

    fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("[FFmpeg] kill: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("[FFmpeg] failed to reap ffmpeg process: {}", e);
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// 从 rawvideo RGBA 流读取一帧；帧边界处 EOF 为流结束，帧中途 EOF 为错误
fn read_frame<R: Read>(
    reader: &mut R,
    width: u32,
    height: u32,
    frame_number: u64,
) -> Result<Option<Frame>, FrameSourceError> {
    let frame_size = width as usize * height as usize * 4;
    let mut buf = vec![0u8; frame_size];
    let filled = read_full(reader, &mut buf)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < frame_size {
        return Err(FrameSourceError::Decode(format!(
            "truncated frame: {} of {} bytes",
            filled, frame_size
        )));
    }

    Frame::try_new(width, height, buf, frame_number).map(Some)
}

/// 读满缓冲区或遇到 EOF，返回实际读取字节数
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameSourceError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn probe_dimensions(path: &Path) -> Result<(u32, u32), FrameSourceError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| FrameSourceError::Probe(format!("ffprobe execution failed: {}", e)))?;

    if !output.status.success() {
        return Err(FrameSourceError::Probe(format!(
            "ffprobe exited with {}",
            output.status
        )));
    }

    parse_dimensions(&String::from_utf8_lossy(&output.stdout))
}

fn parse_dimensions(json: &str) -> Result<(u32, u32), FrameSourceError> {
    let data: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| FrameSourceError::Probe(format!("failed to parse ffprobe JSON: {}", e)))?;

    let stream = data
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .ok_or_else(|| FrameSourceError::Probe("no video stream found".to_string()))?;

    let dim = |key: &str| {
        stream
            .get(key)
            .and_then(|v| v.as_u64())
            .filter(|&v| v > 0 && v <= u32::MAX as u64)
            .map(|v| v as u32)
            .ok_or_else(|| FrameSourceError::Probe(format!("missing stream {}", key)))
    };

    Ok((dim("width")?, dim("height")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::finder::{search_frames, NoopObserver, SearchConfig};
    use std::io::Cursor;

    #[test]
    fn test_parse_dimensions() {
        let json = r#"{"programs": [], "streams": [{"width": 1920, "height": 1080}]}"#;
        assert_eq!(parse_dimensions(json).unwrap(), (1920, 1080));
    }

    #[test]
    fn test_parse_dimensions_no_stream() {
        assert!(parse_dimensions(r#"{"streams": []}"#).is_err());
        assert!(parse_dimensions(r#"{"streams": [{"width": 0, "height": 10}]}"#).is_err());
        assert!(parse_dimensions("not json").is_err());
    }

    #[test]
    fn test_read_full() {
        let mut reader = Cursor::new(vec![1u8; 10]);
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 2);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_frame_sequence() {
        let mut stream = vec![10u8; 2 * 2 * 4];
        stream.extend(vec![200u8; 2 * 2 * 4]);
        let mut reader = Cursor::new(stream);

        let first = read_frame(&mut reader, 2, 2, 1).unwrap().unwrap();
        assert_eq!((first.width, first.height, first.frame_number), (2, 2, 1));
        assert_eq!(first.data, vec![10u8; 16]);

        let second = read_frame(&mut reader, 2, 2, 2).unwrap().unwrap();
        assert_eq!(second.data, vec![200u8; 16]);

        assert!(read_frame(&mut reader, 2, 2, 3).unwrap().is_none());
    }

    #[test]
    fn test_read_frame_truncated() {
        let mut reader = Cursor::new(vec![0u8; 2 * 2 * 4 + 5]);

        assert!(read_frame(&mut reader, 2, 2, 1).unwrap().is_some());
        let err = read_frame(&mut reader, 2, 2, 2).unwrap_err();
        assert!(matches!(err, FrameSourceError::Decode(_)), "{}", err);
    }

    fn make_clip(path: &Path) -> bool {
        // 红 4 帧 + 蓝 4 帧 + 红 4 帧，无损编码
        let color = |c: &str| format!("color=c={}:s=32x24:r=4:d=1", c);
        Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-f", "lavfi", "-i", color("red").as_str()])
            .args(["-f", "lavfi", "-i", color("blue").as_str()])
            .args(["-f", "lavfi", "-i", color("red").as_str()])
            .args(["-filter_complex", "[0:v][1:v][2:v]concat=n=3:v=1:a=0"])
            .args(["-c:v", "ffv1"])
            .arg(path)
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_decode_generated_clip() {
        if !FfmpegFrameSource::is_available() {
            eprintln!("ffmpeg not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.mkv");
        assert!(make_clip(&path));

        let mut source = FfmpegFrameSource::open(&path).unwrap();
        let mut count = 0;
        while let Some(frame) = source.read_next().unwrap() {
            count += 1;
            assert_eq!((frame.width, frame.height), (32, 24));
            assert_eq!(frame.frame_number, count);
        }
        assert_eq!(count, 12);

        source.release();
        source.release();
        assert!(source.read_next().unwrap().is_none());

        let config = SearchConfig::new(&path)
            .with_base_frame(1)
            .with_skip_frames(3)
            .with_threshold(0.99);
        let mut source = FfmpegFrameSource::open(&path).unwrap();
        let result = search_frames(&mut source, &config, &mut NoopObserver);
        assert_eq!(result.matched_frame(), Some(9));
        source.release();
    }

    #[test]
    fn test_open_nonexistent() {
        let result = FfmpegFrameSource::open(Path::new("/nonexistent/video.mkv"));
        assert!(matches!(result, Err(FrameSourceError::NotFound(_))));
    }
}
