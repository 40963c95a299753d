//! ffmpeg CLI 解码后端
//!
//! 打开时用 ffprobe 读取尺寸与总帧数（容器未声明 nb_frames 时退回
//! -count_frames 实数），读帧时每次单独起一个 ffmpeg 进程解码目标帧，
//! 相当于每读必先定位，正确性不依赖任何解码器缓冲行为。

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};
use once_cell::sync::Lazy;
use serde::Deserialize;

use super::FrameSource;
use crate::core::{ExtractError, Frame};

static FFMPEG: Lazy<String> =
    Lazy::new(|| std::env::var("FRAMESIFT_FFMPEG").unwrap_or_else(|_| "ffmpeg".into()));
static FFPROBE: Lazy<String> =
    Lazy::new(|| std::env::var("FRAMESIFT_FFPROBE").unwrap_or_else(|_| "ffprobe".into()));

const CHANNELS: u32 = 3; // rgb24

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

/// ffprobe 的数值字段以字符串形式给出
#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    nb_read_frames: Option<String>,
}

/// 视频文件帧源
pub struct VideoReader {
    path: PathBuf,
    n_frames: usize,
    width: u32,
    height: u32,
}

impl VideoReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();

        let stream = probe(&path, false)?;
        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(ExtractError::SourceUnavailable(format!(
                    "no video stream dimensions in '{}'",
                    path.display()
                )))
            }
        };

        // mkv 等容器不在头部声明帧数，退回逐帧计数
        let n_frames = match parse_count(&stream.nb_frames) {
            Some(n) => n,
            None => {
                debug!("nb_frames not declared, counting frames of {}", path.display());
                parse_count(&probe(&path, true)?.nb_read_frames).ok_or_else(|| {
                    ExtractError::SourceUnavailable(format!(
                        "could not determine frame count of '{}'",
                        path.display()
                    ))
                })?
            }
        };

        info!(
            "🎬 opened {}: {} frames at {}x{}",
            path.display(),
            n_frames,
            width,
            height
        );

        Ok(Self {
            path,
            n_frames,
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for VideoReader {
    fn n_frames(&self) -> usize {
        self.n_frames
    }

    fn frame_width(&self) -> u32 {
        self.width
    }

    fn frame_height(&self) -> u32 {
        self.height
    }

    fn read_frame(&mut self, idx: usize) -> Result<Frame, ExtractError> {
        if idx >= self.n_frames {
            return Err(ExtractError::FrameRead {
                frame: idx,
                reason: format!("index out of range (video has {} frames)", self.n_frames),
            });
        }

        let output = Command::new(&*FFMPEG)
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(&self.path)
            .arg("-vf")
            .arg(format!("select=eq(n\\,{idx})"))
            .arg("-vsync")
            .arg("0")
            .arg("-frames:v")
            .arg("1")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("pipe:1")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExtractError::FrameRead {
                frame: idx,
                reason: format!("failed to run {}: {}", &*FFMPEG, e),
            })?;

        if !output.status.success() {
            return Err(ExtractError::FrameRead {
                frame: idx,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let expected = (self.width * self.height * CHANNELS) as usize;
        if output.stdout.len() != expected {
            return Err(ExtractError::FrameRead {
                frame: idx,
                reason: format!(
                    "decoder returned {} bytes, expected {}",
                    output.stdout.len(),
                    expected
                ),
            });
        }

        Ok(Frame::new(self.width, self.height, CHANNELS, output.stdout))
    }
}

fn probe(path: &Path, count_frames: bool) -> Result<ProbeStream, ExtractError> {
    let mut cmd = Command::new(&*FFPROBE);
    cmd.arg("-v").arg("error").arg("-select_streams").arg("v:0");
    if count_frames {
        cmd.arg("-count_frames");
    }
    cmd.arg("-show_entries")
        .arg("stream=width,height,nb_frames,nb_read_frames")
        .arg("-of")
        .arg("json")
        .arg(path);

    let output = cmd.output().map_err(|e| {
        ExtractError::SourceUnavailable(format!("failed to run {}: {}", &*FFPROBE, e))
    })?;

    if !output.status.success() {
        return Err(ExtractError::SourceUnavailable(format!(
            "'{}' isn't opening with ffprobe: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&output.stdout)?
        .ok_or_else(|| {
            ExtractError::SourceUnavailable(format!("no video stream in '{}'", path.display()))
        })
}

fn parse_probe_output(bytes: &[u8]) -> Result<Option<ProbeStream>, ExtractError> {
    let parsed: ProbeOutput = serde_json::from_slice(bytes).map_err(|e| {
        ExtractError::SourceUnavailable(format!("unexpected ffprobe output: {e}"))
    })?;
    Ok(parsed.streams.into_iter().next())
}

fn parse_count(field: &Option<String>) -> Option<usize> {
    field.as_deref().and_then(|v| v.parse().ok())
}
