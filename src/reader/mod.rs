//! 视频帧读取边界
//!
//! FrameSource 是解码后端与管线之间的接缝：管线只依赖 trait，
//! 下游各阶段都能用内存帧批独立测试。生产实现为 VideoReader。

pub mod video;

pub use video::VideoReader;

use log::debug;

use crate::core::{ExtractError, Frame};

/// 平均帧默认采样数
pub const DEFAULT_AVERAGE_SAMPLES: usize = 10;

/// 顺序/随机访问的视频帧源
pub trait FrameSource {
    /// 视频总帧数
    fn n_frames(&self) -> usize;

    fn frame_width(&self) -> u32;

    fn frame_height(&self) -> u32;

    /// 读取第 idx 帧。每次读取前都重新定位，不依赖解码器缓冲状态。
    /// 解码失败返回 FrameRead，绝不静默跳帧。
    fn read_frame(&mut self, idx: usize) -> Result<Frame, ExtractError>;

    /// 平均帧 - 等间隔采样 nframes_to_use 帧（视频更短则取更少），
    /// 逐像素整数四舍五入均值。仅用于参考帧预览，不参与选帧。
    fn read_average_frame(&mut self, nframes_to_use: usize) -> Result<Frame, ExtractError> {
        let total = self.n_frames();
        if total == 0 {
            return Err(ExtractError::InsufficientFrames { got: 0, need: 1 });
        }

        let step = (total / nframes_to_use.max(1)).max(1);
        let mut sums: Vec<u64> = Vec::new();
        let mut count = 0u64;

        let mut first: Option<Frame> = None;
        for idx in (0..total).step_by(step) {
            let frame = self.read_frame(idx)?;
            if sums.is_empty() {
                sums = vec![0u64; frame.sample_count()];
            }
            for (acc, &v) in sums.iter_mut().zip(frame.data.iter()) {
                *acc += v as u64;
            }
            count += 1;
            if first.is_none() {
                first = Some(frame);
            }
        }

        debug!("average frame from {} samples (step {})", count, step);

        let first = first.expect("at least one frame was read");
        let data = sums
            .iter()
            .map(|&sum| ((sum + count / 2) / count) as u8)
            .collect();
        Ok(Frame::new(first.width, first.height, first.channels, data))
    }
}

/// 内存帧源 - 测试与离线批处理用
pub struct MockFrameSource {
    frames: Vec<Frame>,
    fail_at: Option<usize>,
}

impl MockFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            fail_at: None,
        }
    }

    /// 读到指定帧时注入解码失败
    pub fn failing_at(frames: Vec<Frame>, fail_at: usize) -> Self {
        Self {
            frames,
            fail_at: Some(fail_at),
        }
    }
}

impl FrameSource for MockFrameSource {
    fn n_frames(&self) -> usize {
        self.frames.len()
    }

    fn frame_width(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.width)
    }

    fn frame_height(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.height)
    }

    fn read_frame(&mut self, idx: usize) -> Result<Frame, ExtractError> {
        if self.fail_at == Some(idx) {
            return Err(ExtractError::FrameRead {
                frame: idx,
                reason: "injected decode failure".into(),
            });
        }
        self.frames.get(idx).cloned().ok_or(ExtractError::FrameRead {
            frame: idx,
            reason: "frame index out of range".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_reads_in_range() {
        let mut source = MockFrameSource::new(vec![
            Frame::filled(4, 4, 1, 10),
            Frame::filled(4, 4, 1, 20),
        ]);

        assert_eq!(source.n_frames(), 2);
        assert_eq!(source.frame_width(), 4);
        assert_eq!(source.read_frame(1).unwrap().data[0], 20);
        assert!(matches!(
            source.read_frame(2),
            Err(ExtractError::FrameRead { frame: 2, .. })
        ));
    }

    #[test]
    fn test_mock_source_injected_failure() {
        let mut source =
            MockFrameSource::failing_at(vec![Frame::filled(4, 4, 1, 0); 5], 3);

        assert!(source.read_frame(2).is_ok());
        assert!(matches!(
            source.read_frame(3),
            Err(ExtractError::FrameRead { frame: 3, .. })
        ));
    }

    #[test]
    fn test_average_frame_shape_and_mean() {
        let mut source = MockFrameSource::new(vec![
            Frame::filled(6, 4, 3, 0),
            Frame::filled(6, 4, 3, 100),
            Frame::filled(6, 4, 3, 101),
        ]);

        let average = source.read_average_frame(DEFAULT_AVERAGE_SAMPLES).unwrap();
        assert_eq!(average.width, 6);
        assert_eq!(average.height, 4);
        assert_eq!(average.channels, 3);
        // (0 + 100 + 101 + 1) / 3 rounds to 67
        assert!(average.data.iter().all(|&v| v == 67));
    }

    #[test]
    fn test_average_frame_uses_stride_on_long_source() {
        let frames: Vec<Frame> = (0..40u32)
            .map(|i| Frame::filled(2, 2, 1, (i * 6) as u8))
            .collect();
        let mut source = MockFrameSource::new(frames);

        // step = 40 / 10 = 4 -> samples frames 0, 4, 8, ... 36
        let average = source.read_average_frame(10).unwrap();
        let expected: u64 = (0..40).step_by(4).map(|i| i as u64 * 6).sum();
        let expected = ((expected + 5) / 10) as u8;
        assert!(average.data.iter().all(|&v| v == expected));
    }

    #[test]
    fn test_average_frame_empty_source_rejected() {
        let mut source = MockFrameSource::new(Vec::new());
        assert!(matches!(
            source.read_average_frame(10),
            Err(ExtractError::InsufficientFrames { got: 0, need: 1 })
        ));
    }
}
