use super::frame::Frame;

/// 裁剪矩形 - 保留 [y0,y1) 行与 [x0,x1) 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl CropRect {
    pub fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// 整帧矩形
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            x1: width as usize,
            y0: 0,
            y1: height as usize,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// 纯裁剪函数。越界坐标按帧边界截断，结果可为空帧；
/// 矩形合法性由调用方负责（UI 层用 CropBounds 约束）。
pub fn crop(frame: &Frame, rect: &CropRect) -> Frame {
    let x0 = rect.x0.min(frame.width as usize);
    let x1 = rect.x1.min(frame.width as usize).max(x0);
    let y0 = rect.y0.min(frame.height as usize);
    let y1 = rect.y1.min(frame.height as usize).max(y0);

    let out_w = x1 - x0;
    let out_h = y1 - y0;
    let ch = frame.channels as usize;

    let mut data = Vec::with_capacity(out_w * out_h * ch);
    for y in y0..y1 {
        let row = frame.row(y as u32);
        data.extend_from_slice(&row[x0 * ch..x1 * ch]);
    }

    Frame::new(out_w as u32, out_h as u32, frame.channels, data)
}

pub fn crop_batch(frames: &[Frame], rect: &CropRect) -> Vec<Frame> {
    frames.iter().map(|f| crop(f, rect)).collect()
}

/// 裁剪边界状态 - 带校验的显式状态转移，
/// 非法提案（如 x0 >= x1）被拒绝并保留当前值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    x0: usize,
    x1: usize,
    x_max: usize,
    y0: usize,
    y1: usize,
    y_max: usize,
}

impl CropBounds {
    /// 以整帧尺寸初始化
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            x1: width as usize,
            x_max: width as usize,
            y0: 0,
            y1: height as usize,
            y_max: height as usize,
        }
    }

    pub fn x0(&self) -> usize {
        self.x0
    }

    pub fn x1(&self) -> usize {
        self.x1
    }

    pub fn y0(&self) -> usize {
        self.y0
    }

    pub fn y1(&self) -> usize {
        self.y1
    }

    pub fn x_max(&self) -> usize {
        self.x_max
    }

    pub fn y_max(&self) -> usize {
        self.y_max
    }

    /// 返回实际生效的值
    pub fn set_x0(&mut self, proposed: usize) -> usize {
        if proposed < self.x1 {
            self.x0 = proposed;
        }
        self.x0
    }

    pub fn set_x1(&mut self, proposed: usize) -> usize {
        if proposed > self.x0 && proposed <= self.x_max {
            self.x1 = proposed;
        }
        self.x1
    }

    pub fn set_y0(&mut self, proposed: usize) -> usize {
        if proposed < self.y1 {
            self.y0 = proposed;
        }
        self.y0
    }

    pub fn set_y1(&mut self, proposed: usize) -> usize {
        if proposed > self.y0 && proposed <= self.y_max {
            self.y1 = proposed;
        }
        self.y1
    }

    pub fn rect(&self) -> CropRect {
        CropRect {
            x0: self.x0,
            x1: self.x1,
            y0: self.y0,
            y1: self.y1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(x as u8);
                data.push(y as u8);
                data.push(0);
            }
        }
        Frame::new(width, height, 3, data)
    }

    #[test]
    fn test_crop_shape() {
        let frame = gradient_frame(20, 10);
        let out = crop(&frame, &CropRect::new(3, 15, 2, 8));

        assert_eq!(out.width, 12);
        assert_eq!(out.height, 6);
        assert_eq!(out.channels, 3);
        assert_eq!(out.sample_count(), 12 * 6 * 3);
    }

    #[test]
    fn test_crop_preserves_pixels() {
        let frame = gradient_frame(20, 10);
        let out = crop(&frame, &CropRect::new(3, 15, 2, 8));

        // (0,0) of the crop is (3,2) of the source
        assert_eq!(out.sample(0, 0, 0), 3);
        assert_eq!(out.sample(0, 0, 1), 2);
        assert_eq!(out.sample(11, 5, 0), 14);
        assert_eq!(out.sample(11, 5, 1), 7);
    }

    #[test]
    fn test_crop_out_of_range_truncates() {
        let frame = gradient_frame(20, 10);
        let out = crop(&frame, &CropRect::new(15, 100, 5, 100));

        assert_eq!(out.width, 5);
        assert_eq!(out.height, 5);
    }

    #[test]
    fn test_crop_fully_out_of_range_is_empty() {
        let frame = gradient_frame(20, 10);
        let out = crop(&frame, &CropRect::new(30, 40, 0, 10));

        assert_eq!(out.width, 0);
        assert_eq!(out.sample_count(), 0);
    }

    #[test]
    fn test_crop_batch_same_rect() {
        let frames = vec![gradient_frame(20, 10), gradient_frame(20, 10)];
        let out = crop_batch(&frames, &CropRect::new(0, 10, 0, 5));

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|f| f.width == 10 && f.height == 5));
    }

    #[test]
    fn test_bounds_start_at_full_frame() {
        let bounds = CropBounds::full_frame(20, 10);
        assert_eq!(bounds.x0(), 0);
        assert_eq!(bounds.x1(), 20);
        assert_eq!(bounds.x_max(), 20);
        assert_eq!(bounds.y0(), 0);
        assert_eq!(bounds.y1(), 10);
        assert_eq!(bounds.y_max(), 10);
    }

    #[test]
    fn test_bounds_reject_crossing_proposals() {
        let mut bounds = CropBounds::full_frame(20, 10);

        assert_eq!(bounds.set_x1(5), 5);
        // x0 may not cross x1
        assert_eq!(bounds.set_x0(5), 0);
        assert_eq!(bounds.set_x0(4), 4);
        // x1 may not cross x0 nor exceed x_max
        assert_eq!(bounds.set_x1(4), 5);
        assert_eq!(bounds.set_x1(25), 5);

        assert_eq!(bounds.set_y1(3), 3);
        assert_eq!(bounds.set_y0(3), 0);
        assert_eq!(bounds.set_y0(2), 2);
    }

    #[test]
    fn test_bounds_rect_roundtrip() {
        let mut bounds = CropBounds::full_frame(20, 10);
        bounds.set_x0(2);
        bounds.set_x1(18);
        bounds.set_y0(1);
        bounds.set_y1(9);

        assert_eq!(bounds.rect(), CropRect::new(2, 18, 1, 9));
        assert!(!bounds.rect().is_degenerate());
    }
}
