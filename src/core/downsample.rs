use super::error::ExtractError;
use super::frame::Frame;

/// 面积平均下采样。缩小时自带抗锯齿，低分辨率描述子更能代表帧内容，
/// 聚类效果好于最近邻/双线性。
///
/// 输出尺寸为 floor(原尺寸 / level)，level=1 为逐像素拷贝。
pub fn downsample(frame: &Frame, level: u32) -> Result<Frame, ExtractError> {
    if level < 1 {
        return Err(ExtractError::InvalidParameter(
            "downsample level must be a positive integer".into(),
        ));
    }

    if level == 1 {
        return Ok(frame.clone());
    }

    let out_w = frame.width / level;
    let out_h = frame.height / level;
    if out_w == 0 || out_h == 0 {
        return Err(ExtractError::InvalidParameter(format!(
            "downsample level {} exceeds frame dimensions {}x{}",
            level, frame.width, frame.height
        )));
    }

    let w = frame.width as usize;
    let ch = frame.channels as usize;
    let block = level as usize;
    let area = (block * block) as u32;

    let mut data = Vec::with_capacity(out_w as usize * out_h as usize * ch);
    for by in 0..out_h as usize {
        for bx in 0..out_w as usize {
            for c in 0..ch {
                let mut sum = 0u32;
                for py in by * block..(by + 1) * block {
                    let row_offset = py * w * ch;
                    for px in bx * block..(bx + 1) * block {
                        sum += frame.data[row_offset + px * ch + c] as u32;
                    }
                }
                data.push(((sum + area / 2) / area) as u8);
            }
        }
    }

    Ok(Frame::new(out_w, out_h, frame.channels, data))
}
