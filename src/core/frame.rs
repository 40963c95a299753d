use image::DynamicImage;

/// 帧数据结构 - (height, width, channels) 行优先 u8 采样
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * channels) as usize);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// 单色填充帧
    pub fn filled(width: u32, height: u32, channels: u32, value: u8) -> Self {
        Self::new(
            width,
            height,
            channels,
            vec![value; (width * height * channels) as usize],
        )
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// 同尺寸判断（batch 内所有帧必须同形状）
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    #[inline]
    pub fn sample(&self, x: u32, y: u32, channel: u32) -> u8 {
        let idx = ((y * self.width + x) * self.channels + channel) as usize;
        self.data[idx]
    }

    /// 一行像素的切片（含所有通道）
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = (self.width * self.channels) as usize;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// 转为 image 缓冲用于编码落盘，支持灰度与 RGB
    pub fn to_image(&self) -> Option<DynamicImage> {
        match self.channels {
            1 => image::GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8),
            3 => image::RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8),
            _ => None,
        }
    }
}
