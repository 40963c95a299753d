use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::info;
use thiserror::Error;

use super::extract::ExtractResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("frame {0} has an unsupported channel layout")]
    UnsupportedFrame(usize),
}

/// 选中帧落盘 - 每帧一个 PNG，命名为 {视频文件名主干}__{批内下标}.png
pub fn export_frames_to_directory(
    result: &ExtractResult,
    video_path: &Path,
    directory: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(directory)?;

    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());

    let mut written = Vec::with_capacity(result.len());
    for (&idx, frame) in result
        .extracted_frame_indices
        .iter()
        .zip(&result.extracted_frames)
    {
        let image = frame.to_image().ok_or(ExportError::UnsupportedFrame(idx))?;
        let path = directory.join(format!("{stem}__{idx}.png"));
        image.save_with_format(&path, ImageFormat::Png)?;
        written.push(path);
    }

    info!("exported {} frames to {}", written.len(), directory.display());
    Ok(written)
}
